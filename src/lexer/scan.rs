// STD Dependencies -----------------------------------------------------------
use std::collections::HashMap;


// External Dependencies ------------------------------------------------------
use lazy_static::lazy_static;


// Internal Dependencies ------------------------------------------------------
use crate::error::PreprocError;
use super::token::{Token, TokenKind};
use super::{Lexer, StartCondition};


// Statics --------------------------------------------------------------------
lazy_static! {
    static ref DIRECTIVES: HashMap<&'static str, TokenKind> = {
        let mut directives = HashMap::with_capacity(12);
        directives.insert("include", TokenKind::Include);
        directives.insert("ifdef", TokenKind::Ifdef);
        directives.insert("ifndef", TokenKind::Ifndef);
        directives.insert("else", TokenKind::Else);
        directives.insert("elsif", TokenKind::Elsif);
        directives.insert("endif", TokenKind::Endif);
        directives.insert("undef", TokenKind::Undef);
        directives.insert("undefineall", TokenKind::Undefineall);
        directives.insert("define", TokenKind::Define);
        directives.insert("line", TokenKind::Line);
        directives.insert("error", TokenKind::Error);
        directives
    };
}

fn takes_operand(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Include | TokenKind::Define | TokenKind::Undef
            | TokenKind::Ifdef | TokenKind::Ifndef | TokenKind::Elsif
            | TokenKind::Error
    )
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}


// Scanning Rules --------------------------------------------------------------
impl Lexer {

    /// Produces the next token from the buffer stack under the current start
    /// condition. An exhausted top buffer yields EOF; the driver decides
    /// whether that means the end of an unput or the end of the file.
    pub fn next_token(&mut self) -> Token {
        if self.buffers.last().map_or(true, |buffer| buffer.is_exhausted()) {
            return Token::eof();
        }
        match self.condition() {
            StartCondition::Initial => self.scan_initial(),
            StartCondition::DefForm => self.scan_def_form(),
            StartCondition::DefValue => self.scan_def_value(),
            StartCondition::DefArg => self.scan_def_arg(),
            StartCondition::IncFilename => self.scan_inc_filename()
        }
    }

    // Mid-token reads cross buffer boundaries so that file slabs and unput
    // boundaries never split an accumulated construct
    fn peek(&self, mut offset: usize) -> Option<char> {
        for buffer in self.buffers.iter().rev() {
            let remaining = buffer.remaining();
            if offset < remaining {
                return buffer.peek_at(offset);
            }
            offset -= remaining;
        }
        None
    }

    fn bump(&mut self) -> Option<char> {
        loop {
            match self.buffers.last_mut() {
                None => return None,
                Some(buffer) => if let Some(c) = buffer.advance() {
                    return Some(c);
                }
            }
            if self.buffers.len() > 1 {
                self.buffers.pop();

            } else {
                return None;
            }
        }
    }

    fn scan_initial(&mut self) -> Token {
        match self.peek(0) {
            None => Token::eof(),
            Some('\n') => {
                self.bump();
                self.fileline.inc_lineno(1);
                Token::new(TokenKind::White, "\n")
            },
            Some(' ') | Some('\t') | Some('\r') => {
                let mut text = String::new();
                while let Some(c) = self.peek(0) {
                    if c == ' ' || c == '\t' || c == '\r' {
                        self.bump();
                        text.push(c);

                    } else {
                        break;
                    }
                }
                Token::new(TokenKind::White, text)
            },
            Some('/') if self.peek(1) == Some('/') => self.scan_line_comment(),
            Some('/') if self.peek(1) == Some('*') => self.scan_block_comment(),
            Some('"') => self.scan_string(),
            Some('`') => self.scan_tick(),
            Some(c) if is_name_start(c) => Token::new(TokenKind::Symbol, self.scan_name()),
            // Kept single so the include driver can recognize `include <...>
            Some('<') => {
                self.bump();
                Token::new(TokenKind::Text, "<")
            },
            Some(c) => {
                let mut text = String::new();
                self.bump();
                text.push(c);
                while let Some(c) = self.peek(0) {
                    match c {
                        '\n' | ' ' | '\t' | '\r' | '/' | '"' | '`' | '<' => break,
                        c if is_name_start(c) => break,
                        _ => {
                            self.bump();
                            text.push(c);
                        }
                    }
                }
                Token::new(TokenKind::Text, text)
            }
        }
    }

    fn scan_name(&mut self) -> String {
        let mut name = String::new();
        while let Some(c) = self.peek(0) {
            // $ continues an identifier, matching simulator behavior
            if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
                self.bump();
                name.push(c);

            } else {
                break;
            }
        }
        name
    }

    fn scan_tick(&mut self) -> Token {
        self.bump();
        match self.peek(0) {
            Some(c) if is_name_start(c) => {
                let name = self.scan_name();
                match DIRECTIVES.get(name.as_str()) {
                    Some(&TokenKind::Line) => self.scan_line_directive(),
                    Some(&kind) => {
                        let mut text = format!("`{}", name);
                        if takes_operand(kind) {
                            while let Some(c) = self.peek(0) {
                                if c == ' ' || c == '\t' {
                                    self.bump();
                                    text.push(c);

                                } else {
                                    break;
                                }
                            }
                        }
                        Token::new(kind, text)
                    },
                    None => Token::new(TokenKind::DefRef, format!("`{}", name))
                }
            },
            Some('`') => {
                self.bump();
                Token::new(TokenKind::Text, "``")
            },
            _ => Token::new(TokenKind::Text, "`")
        }
    }

    fn scan_string(&mut self) -> Token {
        let mut text = String::new();
        self.bump();
        text.push('"');
        loop {
            match self.peek(0) {
                None => {
                    self.unterminated_string();
                    break;
                },
                // The newline stays behind so line tracking is unaffected
                Some('\n') => {
                    self.unterminated_string();
                    break;
                },
                Some('\\') => {
                    self.bump();
                    text.push('\\');
                    if let Some(c) = self.bump() {
                        if c == '\n' {
                            self.fileline.inc_lineno(1);
                        }
                        text.push(c);
                    }
                },
                Some('"') => {
                    self.bump();
                    text.push('"');
                    break;
                },
                Some(c) => {
                    self.bump();
                    text.push(c);
                }
            }
        }
        Token::new(TokenKind::String, text)
    }

    fn unterminated_string(&mut self) {
        if self.pedantic {
            self.pending_errors.push(PreprocError::new(
                self.fileline.clone(),
                "Unterminated string literal".to_string()
            ));
        }
    }

    fn scan_line_comment(&mut self) -> Token {
        let mut text = String::from("//");
        self.bump();
        self.bump();
        while let Some(c) = self.peek(0) {
            if c == '\n' {
                break;
            }
            self.bump();
            text.push(c);
        }
        Token::new(TokenKind::Comment, text)
    }

    fn scan_block_comment(&mut self) -> Token {
        let mut text = String::from("/*");
        self.bump();
        self.bump();
        loop {
            match self.bump() {
                None => {
                    if self.pedantic {
                        self.pending_errors.push(PreprocError::new(
                            self.fileline.clone(),
                            "Unterminated /* comment".to_string()
                        ));
                    }
                    break;
                },
                Some('\n') => {
                    self.fileline.inc_lineno(1);
                    text.push('\n');
                },
                Some('*') if self.peek(0) == Some('/') => {
                    self.bump();
                    text.push_str("*/");
                    break;
                },
                Some(c) => text.push(c)
            }
        }
        Token::new(TokenKind::Comment, text)
    }

    fn scan_line_directive(&mut self) -> Token {
        let mut text = String::from("`line");
        while let Some(c) = self.peek(0) {
            self.bump();
            text.push(c);
            if c == '\n' {
                break;
            }
        }
        if !self.parse_line_directive(&text) {
            if self.pedantic {
                self.pending_errors.push(PreprocError::new(
                    self.fileline.clone(),
                    format!("Invalid `line directive: {}", text.trim_end())
                ));
            }
            if text.ends_with('\n') {
                self.fileline.inc_lineno(1);
            }
        }
        Token::new(TokenKind::Line, text)
    }

    // `line <lineno> "<filename>" <level>
    fn parse_line_directive(&mut self, text: &str) -> bool {
        let rest = text["`line".len()..].trim_start();
        let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            return false;
        }
        let rest = rest[digits.len()..].trim_start();
        if !rest.starts_with('"') {
            return false;
        }
        let filename_end = match rest[1..].find('"') {
            Some(index) => index,
            None => return false
        };
        let filename = rest[1..1 + filename_end].to_string();
        let tail = rest[filename_end + 2..].trim();
        let level = tail.parse::<usize>().unwrap_or(0);
        if self.pedantic && (tail.is_empty() || tail.chars().any(|c| !c.is_ascii_digit()) || level > 2) {
            return false;
        }
        self.enter_exit = level;
        self.fileline.set_path(filename);
        // The directive states the number of the line that follows it
        self.fileline.set_lineno(digits.parse().unwrap_or(1));
        true
    }

    fn scan_def_form(&mut self) -> Token {
        // Blanks between the define name and its formal list carry nothing
        while let Some(c) = self.peek(0) {
            if c == ' ' || c == '\t' {
                self.bump();

            } else {
                break;
            }
        }
        if self.peek(0) != Some('(') {
            self.pop_condition();
            return Token::new(TokenKind::DefForm, "");
        }
        self.bump();
        self.def_value.push('(');
        let mut depth: usize = 1;
        let mut quote = false;
        loop {
            let c = match self.bump() {
                None => {
                    if self.pedantic {
                        self.pending_errors.push(PreprocError::new(
                            self.fileline.clone(),
                            "Unterminated define formal argument list".to_string()
                        ));
                    }
                    break;
                },
                Some(c) => c
            };
            match c {
                '\\' => {
                    self.def_value.push('\\');
                    if let Some(n) = self.bump() {
                        if n == '\n' {
                            self.fileline.inc_lineno(1);
                        }
                        self.def_value.push(n);
                    }
                },
                '"' => {
                    quote = !quote;
                    self.def_value.push('"');
                },
                '\n' => {
                    self.fileline.inc_lineno(1);
                    self.def_value.push('\n');
                },
                '/' if !quote && self.peek(0) == Some('/') => self.skip_line_comment(),
                '/' if !quote && self.peek(0) == Some('*') => {
                    self.bump();
                    self.skip_block_comment_into_def_value();
                },
                '(' | '{' | '[' if !quote => {
                    depth += 1;
                    self.def_value.push(c);
                },
                ')' | '}' | ']' if !quote => {
                    depth = depth.saturating_sub(1);
                    self.def_value.push(c);
                    if c == ')' && depth == 0 {
                        break;
                    }
                },
                _ => self.def_value.push(c)
            }
        }
        self.pop_condition();
        Token::new(TokenKind::DefForm, "")
    }

    fn scan_def_value(&mut self) -> Token {
        loop {
            let c = match self.bump() {
                // A define body may legitimately end the file
                None => {
                    self.pop_condition();
                    return Token::new(TokenKind::DefValue, "");
                },
                Some(c) => c
            };
            match c {
                '\n' => {
                    self.fileline.inc_lineno(1);
                    self.pop_condition();
                    return Token::new(TokenKind::DefValue, "\n");
                },
                '\\' => match self.peek(0) {
                    // Line continuation: a bare newline is kept so the line
                    // count survives the newline-to-space rewrite
                    Some('\n') => {
                        self.bump();
                        self.fileline.inc_lineno(1);
                        self.def_value.push('\n');
                    },
                    Some(n) => {
                        self.bump();
                        self.def_value.push('\\');
                        self.def_value.push(n);
                    },
                    None => self.def_value.push('\\')
                },
                // `", `\ and `` stay verbatim for the substitution walk
                '`' => match self.peek(0) {
                    Some('"') => {
                        self.bump();
                        self.def_value.push_str("`\"");
                    },
                    Some('\\') => {
                        self.bump();
                        self.def_value.push_str("`\\");
                    },
                    Some('`') => {
                        self.bump();
                        self.def_value.push_str("``");
                    },
                    _ => self.def_value.push('`')
                },
                '"' => {
                    self.def_value.push('"');
                    self.def_string();
                },
                '/' if self.peek(0) == Some('/') => self.skip_line_comment(),
                '/' if self.peek(0) == Some('*') => {
                    self.bump();
                    self.skip_block_comment_into_def_value();
                },
                _ => self.def_value.push(c)
            }
        }
    }

    // Strings pass into the body verbatim; "//" inside one is not a comment
    fn def_string(&mut self) {
        loop {
            match self.peek(0) {
                None => break,
                Some('\n') => break,
                Some('\\') => {
                    self.bump();
                    self.def_value.push('\\');
                    if let Some(c) = self.bump() {
                        if c == '\n' {
                            self.fileline.inc_lineno(1);
                        }
                        self.def_value.push(c);
                    }
                },
                Some('"') => {
                    self.bump();
                    self.def_value.push('"');
                    break;
                },
                Some(c) => {
                    self.bump();
                    self.def_value.push(c);
                }
            }
        }
    }

    fn skip_line_comment(&mut self) {
        self.bump();
        while let Some(c) = self.peek(0) {
            if c == '\n' {
                break;
            }
            self.bump();
        }
    }

    // Comment text is dropped; contained newlines stay in the accumulator so
    // the define machinery can owe them back to the output
    fn skip_block_comment_into_def_value(&mut self) {
        loop {
            match self.bump() {
                None => break,
                Some('\n') => {
                    self.fileline.inc_lineno(1);
                    self.def_value.push('\n');
                },
                Some('*') if self.peek(0) == Some('/') => {
                    self.bump();
                    break;
                },
                _ => {}
            }
        }
        self.def_value.push(' ');
    }

    fn scan_def_arg(&mut self) -> Token {
        loop {
            let c = match self.peek(0) {
                None => return Token::eof(),
                Some(c) => c
            };
            match c {
                '\n' => {
                    self.bump();
                    self.fileline.inc_lineno(1);
                    self.def_value.push('\n');
                },
                ' ' | '\t' | '\r' => {
                    self.bump();
                    self.def_value.push(c);
                },
                '"' => return self.scan_string(),
                '/' if self.peek(1) == Some('/') => return self.scan_line_comment(),
                '/' if self.peek(1) == Some('*') => return self.scan_block_comment(),
                '`' => match self.peek(1) {
                    Some('"') => {
                        self.bump();
                        self.bump();
                        self.def_value.push_str("`\"");
                    },
                    Some('\\') => {
                        self.bump();
                        self.bump();
                        self.def_value.push_str("`\\");
                    },
                    Some('`') => {
                        self.bump();
                        self.bump();
                        self.def_value.push_str("``");
                    },
                    Some(n) if is_name_start(n) => {
                        self.bump();
                        let name = self.scan_name();
                        return Token::new(TokenKind::DefRef, format!("`{}", name));
                    },
                    _ => {
                        self.bump();
                        self.def_value.push('`');
                    }
                },
                // Level 0 is before the opening paren of the argument list,
                // level 1 separates arguments, level 2+ is argument-internal
                '(' => {
                    self.bump();
                    self.paren_level += 1;
                    if self.paren_level > 1 {
                        self.def_value.push('(');

                    } else {
                        return Token::new(TokenKind::Text, "(");
                    }
                },
                ')' => {
                    self.bump();
                    self.paren_level = self.paren_level.saturating_sub(1);
                    if self.paren_level > 0 {
                        self.def_value.push(')');

                    } else {
                        self.pop_condition();
                        return Token::new(TokenKind::DefArg, ")");
                    }
                },
                ',' => {
                    self.bump();
                    if self.paren_level > 1 {
                        self.def_value.push(',');

                    } else {
                        self.pop_condition();
                        return Token::new(TokenKind::DefArg, ",");
                    }
                },
                '{' | '[' => {
                    self.bump();
                    self.paren_level += 1;
                    self.def_value.push(c);
                },
                '}' | ']' => {
                    self.bump();
                    self.paren_level = self.paren_level.saturating_sub(1);
                    self.def_value.push(c);
                },
                c if is_name_start(c) => return Token::new(TokenKind::Symbol, self.scan_name()),
                _ => {
                    self.bump();
                    self.def_value.push(c);
                }
            }
        }
    }

    fn scan_inc_filename(&mut self) -> Token {
        // The driver consumed the opening < as plain text
        let mut text = String::from("<");
        loop {
            match self.peek(0) {
                None => {
                    self.pop_condition();
                    return Token::eof();
                },
                Some('\n') => {
                    self.bump();
                    self.fileline.inc_lineno(1);
                    self.pop_condition();
                    return Token::new(TokenKind::Text, "\n");
                },
                Some('>') => {
                    self.bump();
                    text.push('>');
                    self.pop_condition();
                    return Token::new(TokenKind::String, text);
                },
                Some(c) => {
                    self.bump();
                    text.push(c);
                }
            }
        }
    }

}


// Tests ----------------------------------------------------------------------
#[cfg(test)]
mod test {
    use crate::fileline::FileLine;
    use super::super::Lexer;
    use super::{Token, TokenKind};

    macro_rules! tok {
        ($kind:ident, $text:expr) => {
            Token::new(TokenKind::$kind, $text)
        }
    }

    fn lexer<S: Into<String>>(s: S) -> Lexer {
        let mut lexer = Lexer::new(FileLine::new("main.v", 1), false);
        lexer.scan_bytes_back(&s.into());
        lexer
    }

    fn tokens<S: Into<String>>(s: S) -> Vec<Token> {
        let mut lexer = lexer(s);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            if token.is(TokenKind::Eof) {
                break;
            }
            tokens.push(token);
        }
        tokens
    }

    #[test]
    fn test_empty() {
        assert_eq!(tokens(""), vec![]);
    }

    #[test]
    fn test_whitespace_and_lines() {
        let mut lex = lexer("  \t\nx");
        assert_eq!(lex.next_token(), tok!(White, "  \t"));
        assert_eq!(lex.next_token(), tok!(White, "\n"));
        assert_eq!(lex.fileline().lineno(), 2);
        assert_eq!(lex.next_token(), tok!(Symbol, "x"));
    }

    #[test]
    fn test_text_runs() {
        assert_eq!(tokens("1+2=3;"), vec![tok!(Text, "1+2=3;")]);
        assert_eq!(tokens("a+b"), vec![
            tok!(Symbol, "a"),
            tok!(Text, "+"),
            tok!(Symbol, "b")
        ]);
    }

    #[test]
    fn test_symbols() {
        assert_eq!(tokens("foo$bar baz_9"), vec![
            tok!(Symbol, "foo$bar"),
            tok!(White, " "),
            tok!(Symbol, "baz_9")
        ]);
        assert_eq!(tokens("$display"), vec![
            tok!(Text, "$"),
            tok!(Symbol, "display")
        ]);
    }

    #[test]
    fn test_directives() {
        assert_eq!(tokens("`define  X"), vec![
            tok!(Define, "`define  "),
            tok!(Symbol, "X")
        ]);
        assert_eq!(tokens("`ifdef A"), vec![
            tok!(Ifdef, "`ifdef "),
            tok!(Symbol, "A")
        ]);
        assert_eq!(tokens("`endif"), vec![tok!(Endif, "`endif")]);
        assert_eq!(tokens("`else"), vec![tok!(Else, "`else")]);
        assert_eq!(tokens("`undefineall"), vec![tok!(Undefineall, "`undefineall")]);
        assert_eq!(tokens("`include \"a.v\""), vec![
            tok!(Include, "`include "),
            tok!(String, "\"a.v\"")
        ]);
    }

    #[test]
    fn test_defref_and_bare_ticks() {
        assert_eq!(tokens("`FOO"), vec![tok!(DefRef, "`FOO")]);
        assert_eq!(tokens("`"), vec![tok!(Text, "`")]);
        assert_eq!(tokens("``"), vec![tok!(Text, "``")]);
    }

    #[test]
    fn test_strings() {
        assert_eq!(tokens("\"a\\\"b\""), vec![tok!(String, "\"a\\\"b\"")]);
        let mut lex = lexer("\"abc\nx");
        assert_eq!(lex.next_token(), tok!(String, "\"abc"));
        assert_eq!(lex.next_token(), tok!(White, "\n"));
        assert!(lex.take_errors().is_empty());
    }

    #[test]
    fn test_unterminated_string_pedantic() {
        let mut lex = Lexer::new(FileLine::new("main.v", 1), true);
        lex.scan_bytes_back("\"abc\n");
        assert_eq!(lex.next_token(), tok!(String, "\"abc"));
        assert_eq!(lex.take_errors().len(), 1);
    }

    #[test]
    fn test_comments() {
        assert_eq!(tokens("// note"), vec![tok!(Comment, "// note")]);
        let mut lex = lexer("/* a\nb */c");
        assert_eq!(lex.next_token(), tok!(Comment, "/* a\nb */"));
        assert_eq!(lex.fileline().lineno(), 2);
        assert_eq!(lex.next_token(), tok!(Symbol, "c"));
    }

    #[test]
    fn test_line_directive() {
        let mut lex = lexer("`line 5 \"foo.v\" 0\nx");
        let token = lex.next_token();
        assert_eq!(token.kind, TokenKind::Line);
        assert_eq!(lex.fileline().to_string(), "foo.v:5");
        assert_eq!(lex.enter_exit(), 0);
        assert_eq!(lex.next_token(), tok!(Symbol, "x"));
    }

    #[test]
    fn test_line_directive_exit_level() {
        let mut lex = lexer("`line 8 \"top.v\" 2\n");
        lex.next_token();
        assert_eq!(lex.enter_exit(), 2);
        assert_eq!(lex.fileline().to_string(), "top.v:8");
    }

    #[test]
    fn test_def_form_with_parameters() {
        let mut lex = lexer("(a, b=9) a+b");
        lex.push_state_def_form();
        assert_eq!(lex.next_token(), tok!(DefForm, ""));
        assert_eq!(lex.take_def_value(), "(a, b=9)");
        assert_eq!(lex.next_token(), tok!(White, " "));
    }

    #[test]
    fn test_def_form_without_parameters() {
        let mut lex = lexer(" 42\n");
        lex.push_state_def_form();
        assert_eq!(lex.next_token(), tok!(DefForm, ""));
        assert_eq!(lex.take_def_value(), "");
        assert_eq!(lex.next_token(), tok!(Text, "42"));
    }

    #[test]
    fn test_def_form_nesting() {
        let mut lex = lexer("(a=(1,2), b={3,4})rest");
        lex.push_state_def_form();
        lex.next_token();
        assert_eq!(lex.take_def_value(), "(a=(1,2), b={3,4})");
        assert_eq!(lex.next_token(), tok!(Symbol, "rest"));
    }

    #[test]
    fn test_def_value() {
        let mut lex = lexer("1 + 2\nrest");
        lex.push_state_def_value();
        assert_eq!(lex.next_token(), tok!(DefValue, "\n"));
        assert_eq!(lex.take_def_value(), "1 + 2");
        assert_eq!(lex.fileline().lineno(), 2);
        assert_eq!(lex.next_token(), tok!(Symbol, "rest"));
    }

    #[test]
    fn test_def_value_continuation() {
        let mut lex = lexer("a \\\nb\n");
        lex.push_state_def_value();
        assert_eq!(lex.next_token(), tok!(DefValue, "\n"));
        assert_eq!(lex.take_def_value(), "a \nb");
        assert_eq!(lex.fileline().lineno(), 3);
    }

    #[test]
    fn test_def_value_comments() {
        let mut lex = lexer("v // note\n");
        lex.push_state_def_value();
        lex.next_token();
        assert_eq!(lex.take_def_value(), "v ");

        let mut lex = lexer("a /* x\ny */ b\n");
        lex.push_state_def_value();
        lex.next_token();
        assert_eq!(lex.take_def_value(), "a \n  b");
    }

    #[test]
    fn test_def_value_quote_escapes() {
        let mut lex = lexer("`\"a`\"\n");
        lex.push_state_def_value();
        lex.next_token();
        assert_eq!(lex.take_def_value(), "`\"a`\"");
    }

    #[test]
    fn test_def_value_string_passthrough() {
        let mut lex = lexer("\"//not a comment\"\n");
        lex.push_state_def_value();
        lex.next_token();
        assert_eq!(lex.take_def_value(), "\"//not a comment\"");
    }

    #[test]
    fn test_def_arg_collection() {
        let mut lex = lexer("(1,(2,3))x");
        lex.push_state_def_arg(0);
        assert_eq!(lex.next_token(), tok!(Text, "("));
        assert_eq!(lex.next_token(), tok!(DefArg, ","));
        assert_eq!(lex.take_def_value(), "1");
        lex.push_state_def_arg(1);
        assert_eq!(lex.next_token(), tok!(DefArg, ")"));
        assert_eq!(lex.take_def_value(), "(2,3)");
        assert_eq!(lex.next_token(), tok!(Symbol, "x"));
    }

    #[test]
    fn test_def_arg_strings_and_refs() {
        let mut lex = lexer("(a`M \"x,y\")");
        lex.push_state_def_arg(0);
        assert_eq!(lex.next_token(), tok!(Text, "("));
        assert_eq!(lex.next_token(), tok!(Symbol, "a"));
        assert_eq!(lex.next_token(), tok!(DefRef, "`M"));
        assert_eq!(lex.next_token(), tok!(String, "\"x,y\""));
        assert_eq!(lex.next_token(), tok!(DefArg, ")"));
        assert_eq!(lex.take_def_value(), " ");
    }

    #[test]
    fn test_inc_filename() {
        let mut lex = lexer("foo.v>rest");
        lex.push_state_inc_filename();
        assert_eq!(lex.next_token(), tok!(String, "<foo.v>"));
        assert_eq!(lex.next_token(), tok!(Symbol, "rest"));
    }

    #[test]
    fn test_unput_scans_first() {
        let mut lex = Lexer::new(FileLine::new("main.v", 1), false);
        lex.scan_bytes_back("world");
        lex.scan_bytes("hello ");
        assert_eq!(lex.next_token(), tok!(Symbol, "hello"));
        assert_eq!(lex.next_token(), tok!(White, " "));
        assert_eq!(lex.next_token(), tok!(Eof, ""));
        assert_eq!(lex.buffer_count(), 2);
        lex.pop_buffer();
        assert_eq!(lex.next_token(), tok!(Symbol, "world"));
        assert_eq!(lex.next_token(), tok!(Eof, ""));
    }

    #[test]
    fn test_slabs_scan_in_order() {
        let mut lex = Lexer::new(FileLine::new("main.v", 1), false);
        lex.scan_bytes_back("ab");
        lex.scan_bytes_back("cd ef");
        assert_eq!(lex.next_token(), tok!(Symbol, "abcd"));
        assert_eq!(lex.next_token(), tok!(White, " "));
        assert_eq!(lex.next_token(), tok!(Symbol, "ef"));
    }

}
