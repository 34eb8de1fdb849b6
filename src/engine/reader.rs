//! The LaTeX reader: turns preformatted source text into lexical units.
//!
//! The reader is line-oriented. Balanced constructs (brace groups, math
//! spans, verbatim bodies) pull additional physical lines when their
//! closing delimiter is not on the current one; a blank line while
//! scanning default text synthesizes a paragraph-break unit (the `\par`
//! primitive). Verbatim capture is a carried flag, not recursion.

use lazy_static::lazy_static;
use regex::Regex;

use super::unit::{ScriptArg, Unit, UnitKind};
use crate::error::{ConversionError, ConversionResult};

lazy_static! {
    /// A command name: letters with an optional trailing star
    static ref COMMAND_NAME: Regex = Regex::new(r"^[A-Za-z]+\*?").unwrap();
}

const END_VERBATIM: &str = "\\end{verbatim}";

/// Character-class dispatch reader over the source lines.
pub struct Reader {
    lines: Vec<String>,
    /// 0-based current line
    line: usize,
    /// byte offset into the current line
    col: usize,
    /// true while inside the raw capture region of a verbatim environment
    verbatim: bool,
    /// true when re-lexing the contents of a balanced span; suppresses
    /// paragraph-break synthesis
    in_group: bool,
}

impl Reader {
    pub fn new(source: &str) -> Self {
        Reader {
            lines: source.split('\n').map(str::to_string).collect(),
            line: 0,
            col: 0,
            verbatim: false,
            in_group: false,
        }
    }

    /// Reader over the contents of an already-balanced span (brace group,
    /// math span, option block). Blank lines are plain whitespace here.
    pub fn for_group(content: &str) -> Self {
        Reader {
            in_group: true,
            ..Reader::new(content)
        }
    }

    /// 1-based (line, column) of the read position
    pub fn position(&self) -> (usize, usize) {
        (self.line + 1, self.col)
    }

    fn rest(&self) -> &str {
        match self.lines.get(self.line) {
            Some(line) => &line[self.col.min(line.len())..],
            None => "",
        }
    }

    fn at_eof(&self) -> bool {
        self.line >= self.lines.len()
    }

    fn at_line_end(&self) -> bool {
        match self.lines.get(self.line) {
            Some(line) => self.col >= line.len(),
            None => true,
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn advance_char(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.col += c.len_utf8();
        Some(c)
    }

    /// Skip spaces/tabs on the current line, returns true if any skipped
    fn skip_inline_ws(&mut self) -> bool {
        let mut skipped = false;
        while let Some(c) = self.peek_char() {
            if c == ' ' || c == '\t' {
                self.col += 1;
                skipped = true;
            } else {
                break;
            }
        }
        skipped
    }

    fn lex_error(&self, construct: &str, line: usize, column: usize) -> ConversionError {
        ConversionError::LexError {
            construct: construct.to_string(),
            line,
            column,
        }
    }

    /// Produce the next lexical unit, or `None` at end of input.
    ///
    /// `math` is the caller's current math-mode flag; it changes the text
    /// stop set and enables `^`/`_` script scanning.
    pub fn next_unit(&mut self, math: bool) -> ConversionResult<Option<Unit>> {
        if self.verbatim {
            let line = self.line + 1;
            let content = self.read_verbatim()?;
            return Ok(Some(Unit {
                kind: UnitKind::Verbatim(content),
                ws_before: false,
                line,
            }));
        }

        let mut ws = self.skip_inline_ws();

        // Cross line boundaries; a run of blank lines in default text is a
        // paragraph break.
        loop {
            if self.at_eof() {
                return Ok(None);
            }
            if !self.at_line_end() {
                break;
            }
            self.line += 1;
            self.col = 0;
            ws = true;
            if !math && !self.in_group {
                let mut blank = false;
                while self.line < self.lines.len() && self.lines[self.line].trim().is_empty() {
                    self.line += 1;
                    blank = true;
                }
                if blank {
                    return Ok(Some(Unit {
                        kind: UnitKind::Par,
                        ws_before: true,
                        line: self.line,
                    }));
                }
            }
            ws |= self.skip_inline_ws();
        }

        let start_line = self.line + 1;
        let start_col = self.col;
        let c = self.peek_char().expect("not at line end");

        let kind = match c {
            '\\' => {
                self.advance_char();
                self.read_command(start_line)?
            }
            '$' => {
                self.advance_char();
                let display = self.peek_char() == Some('$');
                if display {
                    self.advance_char();
                }
                let body = self.read_math_span(display, start_line, start_col)?;
                if display {
                    UnitKind::DisplayMath(body)
                } else {
                    UnitKind::InlineMath(body)
                }
            }
            '{' => {
                self.advance_char();
                UnitKind::Group(self.read_group_body(start_line, start_col)?)
            }
            '}' => {
                return Err(ConversionError::ParseError {
                    message: "unexpected closing brace".into(),
                    line: Some(start_line),
                });
            }
            '%' => {
                self.advance_char();
                let comment = self.rest().to_string();
                self.col = self.lines[self.line].len();
                UnitKind::Comment(comment)
            }
            '&' => {
                self.advance_char();
                UnitKind::CellSep
            }
            '^' | '_' if math => {
                self.advance_char();
                let arg = self.read_script_arg(start_line, start_col)?;
                UnitKind::Script {
                    sup: c == '^',
                    arg,
                }
            }
            _ => UnitKind::Text(self.read_text_run(math)),
        };

        Ok(Some(Unit {
            kind,
            ws_before: ws,
            line: start_line,
        }))
    }

    /// Read a command after the backslash has been consumed: a letter run
    /// with an optional trailing star, or a single symbol.
    fn read_command(&mut self, start_line: usize) -> ConversionResult<UnitKind> {
        if self.at_line_end() {
            // lone backslash at end of line; preformatting keeps real
            // line-break commands off this path
            return Ok(UnitKind::Text("\\".into()));
        }
        let found = COMMAND_NAME
            .find(self.rest())
            .map(|m| (m.as_str().to_string(), m.end()));
        let name = match found {
            Some((name, len)) => {
                self.col += len;
                name
            }
            None => {
                let symbol = self.advance_char().expect("symbol command");
                symbol.to_string()
            }
        };

        if name == "begin" {
            let saved = (self.line, self.col);
            let mut probe_ok = false;
            self.skip_inline_ws();
            if self.peek_char() == Some('{') {
                self.advance_char();
                let env = self.read_group_body(start_line, saved.1)?;
                if env.trim() == "verbatim" {
                    probe_ok = true;
                }
            }
            if probe_ok {
                // Enter raw-capture mode; read_verbatim clears the flag
                // once it has seen the closing marker.
                self.verbatim = true;
                let content = self.read_verbatim()?;
                return Ok(UnitKind::Verbatim(content));
            }
            self.line = saved.0;
            self.col = saved.1;
        }

        Ok(UnitKind::Command(name))
    }

    /// Balanced-brace scan after the opening brace; escaped `\{`/`\}` are
    /// not delimiters.
    fn read_group_body(&mut self, start_line: usize, start_col: usize) -> ConversionResult<String> {
        let mut out = String::new();
        let mut depth = 1usize;
        loop {
            if self.at_line_end() {
                self.line += 1;
                self.col = 0;
                if self.at_eof() {
                    return Err(self.lex_error("brace group", start_line, start_col));
                }
                out.push('\n');
                continue;
            }
            let c = self.advance_char().expect("not at line end");
            match c {
                '\\' => {
                    out.push('\\');
                    if let Some(next) = self.advance_char() {
                        out.push(next);
                    }
                }
                '{' => {
                    depth += 1;
                    out.push('{');
                }
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(out);
                    }
                    out.push('}');
                }
                _ => out.push(c),
            }
        }
    }

    /// Balanced scan of a math span; `$` inside a brace group does not
    /// terminate the span.
    fn read_math_span(
        &mut self,
        display: bool,
        start_line: usize,
        start_col: usize,
    ) -> ConversionResult<String> {
        let mut out = String::new();
        let mut depth = 0i32;
        loop {
            if self.at_line_end() {
                self.line += 1;
                self.col = 0;
                if self.at_eof() {
                    return Err(self.lex_error("math span", start_line, start_col));
                }
                out.push(' ');
                continue;
            }
            let c = self.advance_char().expect("not at line end");
            match c {
                '\\' => {
                    out.push('\\');
                    if let Some(next) = self.advance_char() {
                        out.push(next);
                    }
                }
                '{' => {
                    depth += 1;
                    out.push('{');
                }
                '}' => {
                    depth -= 1;
                    out.push('}');
                }
                '$' if depth <= 0 => {
                    if !display {
                        return Ok(out);
                    }
                    if self.peek_char() == Some('$') {
                        self.advance_char();
                        return Ok(out);
                    }
                    return Err(ConversionError::ParseError {
                        message: "single '$' inside display math".into(),
                        line: Some(self.line + 1),
                    });
                }
                _ => out.push(c),
            }
        }
    }

    /// A script argument: one brace group, one command, or one character.
    fn read_script_arg(
        &mut self,
        start_line: usize,
        start_col: usize,
    ) -> ConversionResult<ScriptArg> {
        self.skip_inline_ws();
        match self.peek_char() {
            Some('{') => {
                self.advance_char();
                Ok(ScriptArg::Group(
                    self.read_group_body(start_line, start_col)?,
                ))
            }
            Some('\\') => {
                self.advance_char();
                match self.read_command(start_line)? {
                    UnitKind::Command(name) => Ok(ScriptArg::Command(name)),
                    _ => Err(ConversionError::ParseError {
                        message: "invalid script argument".into(),
                        line: Some(start_line),
                    }),
                }
            }
            Some(c) => {
                self.advance_char();
                Ok(ScriptArg::Char(c))
            }
            None => Err(ConversionError::ParseError {
                message: "missing script argument".into(),
                line: Some(start_line),
            }),
        }
    }

    /// Scan a plain text run up to the next stop character or end of line.
    /// Math mode additionally stops at `^`/`_`.
    fn read_text_run(&mut self, math: bool) -> String {
        let rest = self.rest();
        let mut end = rest.len();
        for (idx, c) in rest.char_indices() {
            let stop = matches!(c, '\\' | '{' | '}' | '$' | '%' | '&')
                || (math && matches!(c, '^' | '_'));
            if stop {
                end = idx;
                break;
            }
        }
        let run = rest[..end].to_string();
        self.col += end;
        run
    }

    /// Raw capture up to the literal `\end{verbatim}`.
    fn read_verbatim(&mut self) -> ConversionResult<String> {
        let start_line = self.line + 1;
        let start_col = self.col;
        let mut out = String::new();
        loop {
            if self.at_eof() {
                return Err(self.lex_error("verbatim environment", start_line, start_col));
            }
            let rest = self.rest().to_string();
            if let Some(idx) = rest.find(END_VERBATIM) {
                out.push_str(&rest[..idx]);
                self.col += idx + END_VERBATIM.len();
                self.verbatim = false;
                return Ok(out);
            }
            out.push_str(&rest);
            out.push('\n');
            self.line += 1;
            self.col = 0;
        }
    }

    /// Argument scanning: skip whitespace, comments and single newlines
    /// (but never a blank line) between a command and its arguments.
    fn skip_arg_separators(&mut self) {
        loop {
            self.skip_inline_ws();
            if self.peek_char() == Some('%') {
                self.col = self.lines[self.line].len();
                continue;
            }
            if self.at_line_end() && !self.at_eof() {
                let next = self.line + 1;
                if next < self.lines.len() && !self.lines[next].trim().is_empty() {
                    self.line = next;
                    self.col = 0;
                    continue;
                }
            }
            break;
        }
    }

    /// Consume a `[...]` option block if one is next, returning its raw
    /// contents. Braces protect `]` inside the block.
    pub fn try_read_option(&mut self) -> ConversionResult<Option<String>> {
        let saved = (self.line, self.col);
        self.skip_arg_separators();
        if self.peek_char() != Some('[') {
            self.line = saved.0;
            self.col = saved.1;
            return Ok(None);
        }
        let start_line = self.line + 1;
        let start_col = self.col;
        self.advance_char();
        let mut out = String::new();
        let mut depth = 0i32;
        loop {
            if self.at_line_end() {
                self.line += 1;
                self.col = 0;
                if self.at_eof() {
                    return Err(self.lex_error("option block", start_line, start_col));
                }
                out.push('\n');
                continue;
            }
            let c = self.advance_char().expect("not at line end");
            match c {
                '\\' => {
                    out.push('\\');
                    if let Some(next) = self.advance_char() {
                        out.push(next);
                    }
                }
                '{' => {
                    depth += 1;
                    out.push('{');
                }
                '}' => {
                    depth -= 1;
                    out.push('}');
                }
                ']' if depth <= 0 => return Ok(Some(out)),
                _ => out.push(c),
            }
        }
    }

    /// Consume a `{...}` value group if one is next.
    pub fn try_read_group_arg(&mut self) -> ConversionResult<Option<String>> {
        let saved = (self.line, self.col);
        self.skip_arg_separators();
        if self.peek_char() != Some('{') {
            self.line = saved.0;
            self.col = saved.1;
            return Ok(None);
        }
        let start_line = self.line + 1;
        let start_col = self.col;
        self.advance_char();
        let body = self.read_group_body(start_line, start_col)?;
        Ok(Some(body))
    }
}

/// Re-segment a multi-character text run encountered in math mode into
/// letter-runs, digit-runs and single punctuation, inserting U+2062
/// INVISIBLE TIMES between adjacent letter/digit/parenthesis boundaries.
/// `2x(` becomes `2`, `⁢`, `x`, `⁢`, `(`.
pub fn segment_math_text(text: &str) -> Vec<String> {
    #[derive(Clone, Copy, PartialEq)]
    enum Class {
        Letter,
        Digit,
        Open,
        Close,
        Other,
    }

    let mut tokens: Vec<(String, Class)> = Vec::new();
    for c in text.chars() {
        if c.is_whitespace() {
            continue;
        }
        let class = if c.is_ascii_alphabetic() {
            Class::Letter
        } else if c.is_ascii_digit() {
            Class::Digit
        } else if c == '(' || c == '[' {
            Class::Open
        } else if c == ')' || c == ']' {
            Class::Close
        } else {
            Class::Other
        };
        match tokens.last_mut() {
            Some((run, Class::Letter)) if class == Class::Letter => run.push(c),
            Some((run, Class::Digit)) if class == Class::Digit || c == '.' => run.push(c),
            _ => tokens.push((c.to_string(), class)),
        }
    }

    let mut out = Vec::with_capacity(tokens.len() * 2);
    for (i, (token, class)) in tokens.iter().enumerate() {
        if i > 0 {
            let prev = tokens[i - 1].1;
            let juxtaposed = matches!(prev, Class::Letter | Class::Digit | Class::Close)
                && matches!(class, Class::Letter | Class::Digit | Class::Open);
            if juxtaposed {
                out.push("\u{2062}".to_string());
            }
        }
        out.push(token.clone());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn units(source: &str) -> Vec<UnitKind> {
        let mut reader = Reader::new(source);
        let mut out = Vec::new();
        while let Some(unit) = reader.next_unit(false).unwrap() {
            out.push(unit.kind);
        }
        out
    }

    #[test]
    fn command_names_take_a_trailing_star() {
        let got = units("\\section*{A}");
        assert_eq!(got[0], UnitKind::Command("section*".into()));
        assert_eq!(got[1], UnitKind::Group("A".into()));
    }

    #[test]
    fn symbol_commands_are_single_char() {
        let got = units("\\%x");
        assert_eq!(got[0], UnitKind::Command("%".into()));
        assert_eq!(got[1], UnitKind::Text("x".into()));
    }

    #[test]
    fn groups_balance_across_lines() {
        let got = units("{a\nb}");
        assert_eq!(got, vec![UnitKind::Group("a\nb".into())]);
    }

    #[test]
    fn escaped_braces_do_not_close_groups() {
        let got = units("{a\\}b}");
        assert_eq!(got, vec![UnitKind::Group("a\\}b".into())]);
    }

    #[test]
    fn math_spans_track_braces() {
        let got = units("$\\mbox{a$b}c$");
        assert_eq!(got, vec![UnitKind::InlineMath("\\mbox{a$b}c".into())]);
    }

    #[test]
    fn display_math_needs_double_dollars() {
        let got = units("$$x$$");
        assert_eq!(got, vec![UnitKind::DisplayMath("x".into())]);
    }

    #[test]
    fn comments_run_to_end_of_line() {
        let got = units("a%rest\nb");
        assert_eq!(
            got,
            vec![
                UnitKind::Text("a".into()),
                UnitKind::Comment("rest".into()),
                UnitKind::Text("b".into()),
            ]
        );
    }

    #[test]
    fn blank_line_synthesizes_par() {
        let got = units("a\n\nb");
        assert_eq!(
            got,
            vec![
                UnitKind::Text("a".into()),
                UnitKind::Par,
                UnitKind::Text("b".into()),
            ]
        );
    }

    #[test]
    fn no_par_inside_group_reader() {
        let mut reader = Reader::for_group("a\n\nb");
        let mut got = Vec::new();
        while let Some(unit) = reader.next_unit(false).unwrap() {
            got.push(unit.kind);
        }
        assert_eq!(got, vec![UnitKind::Text("a".into()), UnitKind::Text("b".into())]);
    }

    #[test]
    fn scripts_lex_in_math_mode_only() {
        let mut reader = Reader::new("x^2");
        let first = reader.next_unit(true).unwrap().unwrap();
        assert_eq!(first.kind, UnitKind::Text("x".into()));
        let second = reader.next_unit(true).unwrap().unwrap();
        assert_eq!(
            second.kind,
            UnitKind::Script {
                sup: true,
                arg: ScriptArg::Char('2'),
            }
        );
    }

    #[test]
    fn script_arg_forms() {
        let mut reader = Reader::new("_\\max^{n+1}");
        let sub = reader.next_unit(true).unwrap().unwrap();
        assert_eq!(
            sub.kind,
            UnitKind::Script {
                sup: false,
                arg: ScriptArg::Command("max".into()),
            }
        );
        let sup = reader.next_unit(true).unwrap().unwrap();
        assert_eq!(
            sup.kind,
            UnitKind::Script {
                sup: true,
                arg: ScriptArg::Group("n+1".into()),
            }
        );
    }

    #[test]
    fn verbatim_captures_raw_text() {
        let got = units("\\begin{verbatim}\nx^2 \\foo {\n\\end{verbatim}after");
        assert_eq!(got[0], UnitKind::Verbatim("\nx^2 \\foo {\n".into()));
        assert_eq!(got[1], UnitKind::Text("after".into()));
    }

    #[test]
    fn unterminated_group_is_a_lex_error() {
        let mut reader = Reader::new("{abc");
        let err = reader.next_unit(false).unwrap_err();
        assert!(err.to_string().contains("brace group"));
    }

    #[test]
    fn unterminated_math_is_a_lex_error() {
        let mut reader = Reader::new("$x+1");
        let err = reader.next_unit(false).unwrap_err();
        assert!(err.to_string().contains("math span"));
    }

    #[test]
    fn whitespace_before_flag_is_tracked() {
        let mut reader = Reader::new("a \\beta");
        let first = reader.next_unit(false).unwrap().unwrap();
        assert!(!first.ws_before);
        let second = reader.next_unit(false).unwrap().unwrap();
        assert!(second.ws_before);
    }

    #[test]
    fn option_scanning_restores_position_when_absent() {
        let mut reader = Reader::new("x");
        assert_eq!(reader.try_read_option().unwrap(), None);
        let unit = reader.next_unit(false).unwrap().unwrap();
        assert_eq!(unit.kind, UnitKind::Text("x".into()));
    }

    #[test]
    fn option_scanning_crosses_a_single_newline() {
        let mut reader = Reader::new("\n[a=1]");
        assert_eq!(reader.try_read_option().unwrap(), Some("a=1".into()));
    }

    #[test]
    fn math_segmentation_inserts_invisible_times() {
        assert_eq!(segment_math_text("2x("), vec!["2", "\u{2062}", "x", "\u{2062}", "("]);
        assert_eq!(segment_math_text("x+1"), vec!["x", "+", "1"]);
        assert_eq!(segment_math_text("3.14"), vec!["3.14"]);
        assert_eq!(segment_math_text("(a)(b)"), vec!["(", "a", ")", "\u{2062}", "(", "b", ")"]);
    }
}
