// Lexer Tokens ---------------------------------------------------------------
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum TokenKind {
    Eof,
    Include,
    Ifdef,
    Ifndef,
    Else,
    Elsif,
    Endif,
    Undef,
    Undefineall,
    Define,
    Line,
    Symbol,
    String,
    DefForm,
    DefValue,
    Comment,
    Text,
    White,
    DefRef,
    DefArg,
    Error
}

impl TokenKind {

    /// Name used in diagnostics and debug traces.
    pub fn name(self) -> &'static str {
        match self {
            TokenKind::Eof => "EOF",
            TokenKind::Include => "INCLUDE",
            TokenKind::Ifdef => "IFDEF",
            TokenKind::Ifndef => "IFNDEF",
            TokenKind::Else => "ELSE",
            TokenKind::Elsif => "ELSIF",
            TokenKind::Endif => "ENDIF",
            TokenKind::Undef => "UNDEF",
            TokenKind::Undefineall => "UNDEFINEALL",
            TokenKind::Define => "DEFINE",
            TokenKind::Line => "LINE",
            TokenKind::Symbol => "SYMBOL",
            TokenKind::String => "STRING",
            TokenKind::DefForm => "DEFFORM",
            TokenKind::DefValue => "DEFVALUE",
            TokenKind::Comment => "COMMENT",
            TokenKind::Text => "TEXT",
            TokenKind::White => "WHITE",
            TokenKind::DefRef => "DEFREF",
            TokenKind::DefArg => "DEFARG",
            TokenKind::Error => "ERROR"
        }
    }

}

/// A token is transient: the raw text slice that produced it plus its kind.
/// The driver either forwards the text, re-injects it or discards it; tokens
/// are never stored.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String
}

impl Token {

    pub fn new<S: Into<String>>(kind: TokenKind, text: S) -> Self {
        Self {
            kind,
            text: text.into()
        }
    }

    pub fn eof() -> Self {
        Self::new(TokenKind::Eof, "")
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

}
