// STD Dependencies -----------------------------------------------------------
use std::fs;
use std::io::{Error as IOError, ErrorKind};
use std::path::{Path, PathBuf};


// Internal Dependencies ------------------------------------------------------
use crate::error::PreprocError;


// Types ----------------------------------------------------------------------
/// Failure to read an include file, carrying the path that was attempted.
#[derive(Debug)]
pub struct FileError {
    pub io: IOError,
    pub path: PathBuf
}

/// Comment forwarding policy.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum KeepComments {
    /// Comments are dropped; their newlines are still owed to the output.
    Off,
    /// Comments pass through in the output stream.
    Keep,
    /// Comments are handed to the host's comment sink instead.
    Sub,
    /// Like Sub, also inside macro argument collection.
    Exp
}


// Host Traits ----------------------------------------------------------------
/// Everything the preprocessor needs from its embedder: the macro symbol
/// table, the substitution and comment hooks, the diagnostic sink and the
/// processing policies. `DefineMap` provides a ready-made store for the
/// symbol-table half.
pub trait PreprocHost {

    // Symbol table
    fn def_exists(&self, name: &str) -> bool;

    /// Returns "" when the name is undefined, "0" for an object-like macro
    /// and otherwise the formal parameter source beginning with a `(`.
    fn def_params(&self, name: &str) -> String;

    fn def_value(&self, name: &str) -> String;

    fn define(&mut self, name: &str, value: &str, params: &str);

    fn undef(&mut self, name: &str);

    fn undefineall(&mut self);

    // Hooks
    /// Transform applied to every completed substitution result.
    fn def_substitute(&self, text: String) -> String {
        text
    }

    /// Receives comments under the Sub and Exp keep-comments policies.
    fn comment(&mut self, _text: &str) {}

    /// Diagnostic sink. The preprocessor reports and continues; hosts count
    /// and render errors however they see fit.
    fn report(&mut self, error: PreprocError);

    // Include resolution
    fn include_paths(&self) -> &[PathBuf] {
        &[]
    }

    /// Resolves and reads an include file: relative to the including file
    /// first, then the bare path, then each include search path.
    fn resolve_include(&self, parent: Option<&Path>, child: &Path) -> Result<(PathBuf, String), FileError> {
        let mut candidates = Vec::with_capacity(self.include_paths().len() + 2);
        if child.is_absolute() {
            candidates.push(child.to_path_buf());

        } else {
            if let Some(parent) = parent {
                let mut path = parent.to_path_buf();
                path.set_file_name("");
                path.push(child);
                candidates.push(path);
            }
            candidates.push(child.to_path_buf());
            for base in self.include_paths() {
                let mut path = base.clone();
                path.push(child);
                candidates.push(path);
            }
        }
        let mut last = IOError::new(ErrorKind::NotFound, "file not found");
        for path in candidates {
            match fs::read_to_string(&path) {
                Ok(contents) => return Ok((path, contents)),
                Err(err) => last = err
            }
        }
        Err(FileError {
            io: last,
            path: child.to_path_buf()
        })
    }

    // Policies
    fn keep_comments(&self) -> KeepComments {
        KeepComments::Keep
    }

    fn keep_whitespace(&self) -> bool {
        true
    }

    fn pedantic(&self) -> bool {
        false
    }

    fn line_directives(&self) -> bool {
        false
    }

}
