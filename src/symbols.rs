//! Static symbol and style tables.
//!
//! One table per family: Greek letters, letter-like identifiers,
//! operator/relation symbols, text escapes, accents, text sizes, text
//! styles and list kinds. Entities are numeric character references so the
//! output does not depend on a DTD.

use phf::{phf_map, phf_set};

/// Greek letters, rendered as `<mi>` in math.
pub static GREEK_LETTERS: phf::Map<&'static str, &'static str> = phf_map! {
    "alpha" => "&#x03B1;",
    "beta" => "&#x03B2;",
    "gamma" => "&#x03B3;",
    "delta" => "&#x03B4;",
    "epsilon" => "&#x03F5;",
    "varepsilon" => "&#x03B5;",
    "zeta" => "&#x03B6;",
    "eta" => "&#x03B7;",
    "theta" => "&#x03B8;",
    "vartheta" => "&#x03D1;",
    "iota" => "&#x03B9;",
    "kappa" => "&#x03BA;",
    "lambda" => "&#x03BB;",
    "mu" => "&#x03BC;",
    "nu" => "&#x03BD;",
    "xi" => "&#x03BE;",
    "pi" => "&#x03C0;",
    "varpi" => "&#x03D6;",
    "rho" => "&#x03C1;",
    "varrho" => "&#x03F1;",
    "sigma" => "&#x03C3;",
    "varsigma" => "&#x03C2;",
    "tau" => "&#x03C4;",
    "upsilon" => "&#x03C5;",
    "phi" => "&#x03D5;",
    "varphi" => "&#x03C6;",
    "chi" => "&#x03C7;",
    "psi" => "&#x03C8;",
    "omega" => "&#x03C9;",
    "Gamma" => "&#x0393;",
    "Delta" => "&#x0394;",
    "Theta" => "&#x0398;",
    "Lambda" => "&#x039B;",
    "Xi" => "&#x039E;",
    "Pi" => "&#x03A0;",
    "Sigma" => "&#x03A3;",
    "Upsilon" => "&#x03A5;",
    "Phi" => "&#x03A6;",
    "Psi" => "&#x03A8;",
    "Omega" => "&#x03A9;",
};

/// Letter-like symbols, also `<mi>`.
pub static LETTER_SYMBOLS: phf::Map<&'static str, &'static str> = phf_map! {
    "infty" => "&#x221E;",
    "hbar" => "&#x210F;",
    "ell" => "&#x2113;",
    "Re" => "&#x211C;",
    "Im" => "&#x2111;",
    "aleph" => "&#x2135;",
    "imath" => "&#x0131;",
    "jmath" => "&#x0237;",
    "wp" => "&#x2118;",
    "partial" => "&#x2202;",
    "emptyset" => "&#x2205;",
};

/// Operators, relations, arrows and delimiters, rendered as `<mo>`.
pub static OPERATOR_SYMBOLS: phf::Map<&'static str, &'static str> = phf_map! {
    "pm" => "&#x00B1;",
    "mp" => "&#x2213;",
    "times" => "&#x00D7;",
    "div" => "&#x00F7;",
    "cdot" => "&#x22C5;",
    "ast" => "&#x2217;",
    "star" => "&#x22C6;",
    "circ" => "&#x2218;",
    "bullet" => "&#x2022;",
    "leq" => "&#x2264;",
    "le" => "&#x2264;",
    "geq" => "&#x2265;",
    "ge" => "&#x2265;",
    "neq" => "&#x2260;",
    "ne" => "&#x2260;",
    "ll" => "&#x226A;",
    "gg" => "&#x226B;",
    "approx" => "&#x2248;",
    "equiv" => "&#x2261;",
    "sim" => "&#x223C;",
    "simeq" => "&#x2243;",
    "cong" => "&#x2245;",
    "propto" => "&#x221D;",
    "nabla" => "&#x2207;",
    "sum" => "&#x2211;",
    "prod" => "&#x220F;",
    "coprod" => "&#x2210;",
    "int" => "&#x222B;",
    "oint" => "&#x222E;",
    "iint" => "&#x222C;",
    "cup" => "&#x222A;",
    "cap" => "&#x2229;",
    "setminus" => "&#x2216;",
    "subset" => "&#x2282;",
    "supset" => "&#x2283;",
    "subseteq" => "&#x2286;",
    "supseteq" => "&#x2287;",
    "in" => "&#x2208;",
    "notin" => "&#x2209;",
    "ni" => "&#x220B;",
    "forall" => "&#x2200;",
    "exists" => "&#x2203;",
    "neg" => "&#x00AC;",
    "lnot" => "&#x00AC;",
    "wedge" => "&#x2227;",
    "land" => "&#x2227;",
    "vee" => "&#x2228;",
    "lor" => "&#x2228;",
    "oplus" => "&#x2295;",
    "ominus" => "&#x2296;",
    "otimes" => "&#x2297;",
    "oslash" => "&#x2298;",
    "perp" => "&#x22A5;",
    "parallel" => "&#x2225;",
    "mid" => "&#x2223;",
    "angle" => "&#x2220;",
    "triangle" => "&#x25B3;",
    "ldots" => "&#x2026;",
    "cdots" => "&#x22EF;",
    "vdots" => "&#x22EE;",
    "ddots" => "&#x22F1;",
    "leftarrow" => "&#x2190;",
    "gets" => "&#x2190;",
    "rightarrow" => "&#x2192;",
    "to" => "&#x2192;",
    "leftrightarrow" => "&#x2194;",
    "Leftarrow" => "&#x21D0;",
    "Rightarrow" => "&#x21D2;",
    "Leftrightarrow" => "&#x21D4;",
    "uparrow" => "&#x2191;",
    "downarrow" => "&#x2193;",
    "Uparrow" => "&#x21D1;",
    "Downarrow" => "&#x21D3;",
    "mapsto" => "&#x21A6;",
    "longrightarrow" => "&#x27F6;",
    "longleftarrow" => "&#x27F5;",
    "hookrightarrow" => "&#x21AA;",
    "langle" => "&#x27E8;",
    "rangle" => "&#x27E9;",
    "lfloor" => "&#x230A;",
    "rfloor" => "&#x230B;",
    "lceil" => "&#x2308;",
    "rceil" => "&#x2309;",
    "prime" => "&#x2032;",
    "dagger" => "&#x2020;",
    "ddagger" => "&#x2021;",
    "amalg" => "&#x2A3F;",
    "wr" => "&#x2240;",
    "odot" => "&#x2299;",
    "bigcup" => "&#x22C3;",
    "bigcap" => "&#x22C2;",
    "bigoplus" => "&#x2A01;",
    "bigotimes" => "&#x2A02;",
    "vdash" => "&#x22A2;",
    "dashv" => "&#x22A3;",
    "models" => "&#x22A7;",
    "top" => "&#x22A4;",
    "bot" => "&#x22A5;",
    "because" => "&#x2235;",
    "therefore" => "&#x2234;",
};

/// Function-name commands rendered upright (`<mi>` with no italics).
pub static FUNCTION_NAMES: phf::Set<&'static str> = phf_set! {
    "sin", "cos", "tan", "cot", "sec", "csc",
    "arcsin", "arccos", "arctan",
    "sinh", "cosh", "tanh", "coth",
    "exp", "log", "ln", "lg",
    "min", "max", "sup", "inf",
    "lim", "liminf", "limsup",
    "arg", "deg", "det", "dim", "gcd", "hom", "ker", "Pr", "mod",
};

/// Single-symbol and named text escapes, rendered in prose.
pub static TEXT_ESCAPES: phf::Map<&'static str, &'static str> = phf_map! {
    "%" => "%",
    "$" => "$",
    "#" => "#",
    "_" => "_",
    "{" => "{",
    "}" => "}",
    "&" => "&#x26;",
    " " => " ",
    "," => "&#x2009;",
    ";" => " ",
    "~" => "~",
    "^" => "^",
    "ss" => "&#x00DF;",
    "ae" => "&#x00E6;",
    "AE" => "&#x00C6;",
    "oe" => "&#x0153;",
    "OE" => "&#x0152;",
    "o" => "&#x00F8;",
    "O" => "&#x00D8;",
    "aa" => "&#x00E5;",
    "AA" => "&#x00C5;",
    "copyright" => "&#x00A9;",
    "dag" => "&#x2020;",
    "ddag" => "&#x2021;",
    "S" => "&#x00A7;",
    "P" => "&#x00B6;",
    "pounds" => "&#x00A3;",
    "euro" => "&#x20AC;",
    "dots" => "&#x2026;",
    "textbackslash" => "&#x5C;",
    "textasciitilde" => "~",
    "textbar" => "|",
    "textless" => "&#x3C;",
    "textgreater" => "&#x3E;",
    "LaTeX" => "LaTeX",
    "TeX" => "TeX",
};

/// True if `name` is a zero-argument symbol command from any family.
pub fn is_symbol(name: &str) -> bool {
    GREEK_LETTERS.contains_key(name)
        || LETTER_SYMBOLS.contains_key(name)
        || OPERATOR_SYMBOLS.contains_key(name)
        || FUNCTION_NAMES.contains(name)
        || TEXT_ESCAPES.contains_key(name)
}

/// Math accents. One variant per accent; `params` is the family's static
/// table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accent {
    Hat,
    Check,
    Breve,
    Acute,
    Grave,
    Tilde,
    Bar,
    Vec,
    Dot,
    Ddot,
    WideHat,
    WideTilde,
    OverRightArrow,
}

#[derive(Debug, Clone, Copy)]
pub struct AccentSpec {
    pub entity: &'static str,
    pub stretchy: bool,
}

impl Accent {
    pub fn from_command(name: &str) -> Option<Accent> {
        Some(match name {
            "hat" => Accent::Hat,
            "check" => Accent::Check,
            "breve" => Accent::Breve,
            "acute" => Accent::Acute,
            "grave" => Accent::Grave,
            "tilde" => Accent::Tilde,
            "bar" => Accent::Bar,
            "vec" => Accent::Vec,
            "dot" => Accent::Dot,
            "ddot" => Accent::Ddot,
            "widehat" => Accent::WideHat,
            "widetilde" => Accent::WideTilde,
            "overrightarrow" => Accent::OverRightArrow,
            _ => return None,
        })
    }

    pub fn params(self) -> AccentSpec {
        match self {
            Accent::Hat => AccentSpec { entity: "&#x5E;", stretchy: false },
            Accent::Check => AccentSpec { entity: "&#x2C7;", stretchy: false },
            Accent::Breve => AccentSpec { entity: "&#x2D8;", stretchy: false },
            Accent::Acute => AccentSpec { entity: "&#xB4;", stretchy: false },
            Accent::Grave => AccentSpec { entity: "&#x60;", stretchy: false },
            Accent::Tilde => AccentSpec { entity: "&#x7E;", stretchy: false },
            Accent::Bar => AccentSpec { entity: "&#xAF;", stretchy: false },
            Accent::Vec => AccentSpec { entity: "&#x2192;", stretchy: false },
            Accent::Dot => AccentSpec { entity: "&#x2D9;", stretchy: false },
            Accent::Ddot => AccentSpec { entity: "&#xA8;", stretchy: false },
            Accent::WideHat => AccentSpec { entity: "&#x5E;", stretchy: true },
            Accent::WideTilde => AccentSpec { entity: "&#x7E;", stretchy: true },
            Accent::OverRightArrow => AccentSpec { entity: "&#x2192;", stretchy: true },
        }
    }
}

/// Text sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSize {
    Tiny,
    ScriptSize,
    FootnoteSize,
    Small,
    NormalSize,
    Large,
    Larger,
    Largest,
    Huge,
    Hugest,
}

impl TextSize {
    pub fn from_command(name: &str) -> Option<TextSize> {
        Some(match name {
            "tiny" => TextSize::Tiny,
            "scriptsize" => TextSize::ScriptSize,
            "footnotesize" => TextSize::FootnoteSize,
            "small" => TextSize::Small,
            "normalsize" => TextSize::NormalSize,
            "large" => TextSize::Large,
            "Large" => TextSize::Larger,
            "LARGE" => TextSize::Largest,
            "huge" => TextSize::Huge,
            "Huge" => TextSize::Hugest,
            _ => return None,
        })
    }

    /// CSS font-size value for the size
    pub fn css_size(self) -> &'static str {
        match self {
            TextSize::Tiny => "0.5em",
            TextSize::ScriptSize => "0.7em",
            TextSize::FootnoteSize => "0.8em",
            TextSize::Small => "0.9em",
            TextSize::NormalSize => "1em",
            TextSize::Large => "1.2em",
            TextSize::Larger => "1.44em",
            TextSize::Largest => "1.73em",
            TextSize::Huge => "2.07em",
            TextSize::Hugest => "2.49em",
        }
    }
}

/// Text styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextStyle {
    Bold,
    Italic,
    Emphasis,
    Typewriter,
    SmallCaps,
    SansSerif,
    Roman,
    Slanted,
    Underline,
}

#[derive(Debug, Clone, Copy)]
pub struct TextStyleSpec {
    /// XHTML element to wrap the content in
    pub element: &'static str,
    /// Inline style attribute, if the element alone is not enough
    pub style: Option<&'static str>,
}

impl TextStyle {
    pub fn from_command(name: &str) -> Option<TextStyle> {
        Some(match name {
            "textbf" | "bf" | "bfseries" => TextStyle::Bold,
            "textit" | "it" | "itshape" => TextStyle::Italic,
            "emph" | "em" => TextStyle::Emphasis,
            "texttt" | "tt" | "ttfamily" => TextStyle::Typewriter,
            "textsc" | "scshape" => TextStyle::SmallCaps,
            "textsf" | "sffamily" => TextStyle::SansSerif,
            "textrm" | "rmfamily" => TextStyle::Roman,
            "textsl" | "slshape" => TextStyle::Slanted,
            "underline" | "uline" => TextStyle::Underline,
            _ => return None,
        })
    }

    pub fn params(self) -> TextStyleSpec {
        match self {
            TextStyle::Bold => TextStyleSpec { element: "b", style: None },
            TextStyle::Italic => TextStyleSpec { element: "i", style: None },
            TextStyle::Emphasis => TextStyleSpec { element: "em", style: None },
            TextStyle::Typewriter => TextStyleSpec { element: "tt", style: None },
            TextStyle::SmallCaps => TextStyleSpec {
                element: "span",
                style: Some("font-variant: small-caps"),
            },
            TextStyle::SansSerif => TextStyleSpec {
                element: "span",
                style: Some("font-family: sans-serif"),
            },
            TextStyle::Roman => TextStyleSpec {
                element: "span",
                style: Some("font-family: serif"),
            },
            TextStyle::Slanted => TextStyleSpec {
                element: "span",
                style: Some("font-style: oblique"),
            },
            TextStyle::Underline => TextStyleSpec { element: "u", style: None },
        }
    }
}

/// Math font commands and the MathML `mathvariant` they map to.
pub static MATH_FONTS: phf::Map<&'static str, &'static str> = phf_map! {
    "mathbf" => "bold",
    "boldsymbol" => "bold-italic",
    "mathit" => "italic",
    "mathrm" => "normal",
    "mathsf" => "sans-serif",
    "mathtt" => "monospace",
    "mathcal" => "script",
    "mathbb" => "double-struck",
    "mathfrak" => "fraktur",
};

/// List kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Itemize,
    Enumerate,
    Description,
}

impl ListKind {
    pub fn from_environment(name: &str) -> Option<ListKind> {
        Some(match name {
            "itemize" => ListKind::Itemize,
            "enumerate" => ListKind::Enumerate,
            "description" => ListKind::Description,
            _ => return None,
        })
    }

    /// (list element, item element) pair for the kind
    pub fn elements(self) -> (&'static str, &'static str) {
        match self {
            ListKind::Itemize => ("ul", "li"),
            ListKind::Enumerate => ("ol", "li"),
            ListKind::Description => ("dl", "dd"),
        }
    }
}

/// Zero-argument commands that are not symbols: spacing, rules, layout
/// switches. The builder must not capture trailing groups for these.
pub static NO_ARG_COMMANDS: phf::Set<&'static str> = phf_set! {
    "par", "hline", "toprule", "midrule", "bottomrule",
    "centering", "raggedright", "raggedleft", "noindent", "indent",
    "maketitle", "tableofcontents", "listoffigures", "listoftables",
    "appendix", "newpage", "clearpage", "pagebreak", "linebreak",
    "bigskip", "medskip", "smallskip", "quad", "qquad",
    "limits", "nolimits", "displaystyle", "textstyle",
    "scriptstyle", "scriptscriptstyle",
    "hfill", "vfill", "protect", "relax",
    "tiny", "scriptsize", "footnotesize", "small", "normalsize",
    "large", "Large", "LARGE", "huge", "Huge",
    "bf", "bfseries", "it", "itshape", "em", "tt", "ttfamily",
    "scshape", "sffamily", "rmfamily", "slshape",
    "left", "right", "big", "Big", "bigg", "Bigg",
};
