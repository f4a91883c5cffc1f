// STD Dependencies -----------------------------------------------------------
use std::fmt;


// External Dependencies ------------------------------------------------------
use colored::Colorize;


// Internal Dependencies ------------------------------------------------------
use crate::fileline::FileLine;


// Types ----------------------------------------------------------------------
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Severity {
    Warning,
    Error,
    /// An internal invariant was violated; the preprocessor recovers with a
    /// safe default but the output can no longer be trusted.
    Fatal
}


// Preprocessor Error Abstraction ---------------------------------------------
/// A located diagnostic. These are handed to the host's report sink and never
/// returned across the public API; the preprocessor always continues with
/// whatever output it has accumulated.
#[derive(Debug)]
pub struct PreprocError {
    pub fileline: FileLine,
    pub message: String,
    severity: Severity
}

impl PreprocError {

    pub fn new(fileline: FileLine, message: String) -> Self {
        Self {
            fileline,
            message,
            severity: Severity::Error
        }
    }

    pub fn warning(fileline: FileLine, message: String) -> Self {
        Self {
            fileline,
            message,
            severity: Severity::Warning
        }
    }

    pub fn fatal(fileline: FileLine, message: String) -> Self {
        Self {
            fileline,
            message,
            severity: Severity::Fatal
        }
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }

}

impl fmt::Display for PreprocError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let location = format!(
            "In file \"{}\" on line {}:",
            self.fileline.path().display(),
            self.fileline.lineno()
        );
        match self.severity {
            Severity::Warning => write!(f, "{} {}", location.bright_yellow(), self.message),
            _ => write!(f, "{} {}", location.bright_red(), self.message)
        }
    }
}


// Tests ----------------------------------------------------------------------
#[cfg(test)]
mod test {
    use crate::fileline::FileLine;
    use super::{PreprocError, Severity};

    #[test]
    fn test_error_format() {
        colored::control::set_override(false);
        let err = PreprocError::new(FileLine::new("main.v", 4), "Expecting define name. Found: STRING".to_string());
        assert_eq!(err.to_string(), "In file \"main.v\" on line 4: Expecting define name. Found: STRING");
        assert_eq!(err.severity(), Severity::Error);
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_fatal_format() {
        colored::control::set_override(false);
        let err = PreprocError::fatal(FileLine::new("main.v", 1), "Pop of parser state with nothing on stack".to_string());
        assert!(err.is_fatal());
        assert_eq!(err.to_string(), "In file \"main.v\" on line 1: Pop of parser state with nothing on stack");
    }

    #[test]
    fn test_warning_format() {
        colored::control::set_override(false);
        let err = PreprocError::warning(FileLine::new("main.v", 2), "Redefining existing define: X".to_string());
        assert_eq!(err.severity(), Severity::Warning);
        assert_eq!(err.to_string(), "In file \"main.v\" on line 2: Redefining existing define: X");
    }

}
