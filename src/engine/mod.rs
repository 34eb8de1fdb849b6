//! The parsing engine: reader, lexical units, command table and tree
//! builder.

pub mod builder;
pub mod commands;
pub mod reader;
pub mod unit;

pub use builder::{build_fragment, build_tree, env_name};
pub use reader::Reader;
pub use unit::{ScriptArg, Unit, UnitKind};
