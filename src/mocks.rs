// STD Dependencies -----------------------------------------------------------
use std::collections::HashMap;
use std::io::{Error as IOError, ErrorKind};
use std::path::{Path, PathBuf};


// Internal Dependencies ------------------------------------------------------
use crate::defines::DefineMap;
use crate::error::{PreprocError, Severity};
use crate::preproc::Preprocessor;
use crate::traits::{FileError, KeepComments, PreprocHost};


// Mock Host ------------------------------------------------------------------
pub struct MockHost {
    pub files: HashMap<PathBuf, String>,
    pub defines: DefineMap,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub comments: Vec<String>,
    pub keep_comments: KeepComments,
    pub keep_whitespace: bool,
    pub pedantic: bool,
    pub line_directives: bool,
    pub upper_substitute: bool
}

impl Default for MockHost {
    fn default() -> Self {
        Self {
            files: HashMap::new(),
            defines: DefineMap::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
            comments: Vec::new(),
            keep_comments: KeepComments::Keep,
            keep_whitespace: true,
            pedantic: false,
            line_directives: false,
            upper_substitute: false
        }
    }
}

impl MockHost {

    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&mut self, path: &str, contents: &str) {
        self.files.insert(PathBuf::from(path), contents.to_string());
    }

}

impl PreprocHost for MockHost {

    fn def_exists(&self, name: &str) -> bool {
        self.defines.exists(name)
    }

    fn def_params(&self, name: &str) -> String {
        self.defines.params(name)
    }

    fn def_value(&self, name: &str) -> String {
        self.defines.value(name)
    }

    fn define(&mut self, name: &str, value: &str, params: &str) {
        self.defines.define(name, value, params);
    }

    fn undef(&mut self, name: &str) {
        self.defines.undef(name);
    }

    fn undefineall(&mut self) {
        self.defines.undefineall();
    }

    fn def_substitute(&self, text: String) -> String {
        if self.upper_substitute {
            text.to_uppercase()

        } else {
            text
        }
    }

    fn comment(&mut self, text: &str) {
        self.comments.push(text.to_string());
    }

    fn report(&mut self, error: PreprocError) {
        if error.severity() == Severity::Warning {
            self.warnings.push(error.to_string());

        } else {
            self.errors.push(error.to_string());
        }
    }

    fn resolve_include(&self, parent: Option<&Path>, child: &Path) -> Result<(PathBuf, String), FileError> {
        if let Some(parent) = parent {
            let mut path = parent.to_path_buf();
            path.set_file_name("");
            path.push(child);
            if let Some(contents) = self.files.get(&path) {
                return Ok((path, contents.clone()));
            }
        }
        match self.files.get(child) {
            Some(contents) => Ok((child.to_path_buf(), contents.clone())),
            None => Err(FileError {
                io: IOError::new(ErrorKind::NotFound, "No mock file provided"),
                path: child.to_path_buf()
            })
        }
    }

    fn keep_comments(&self) -> KeepComments {
        self.keep_comments
    }

    fn keep_whitespace(&self) -> bool {
        self.keep_whitespace
    }

    fn pedantic(&self) -> bool {
        self.pedantic
    }

    fn line_directives(&self) -> bool {
        self.line_directives
    }

}


// Test Helpers ---------------------------------------------------------------
/// Runs the preprocessor over the given host's "main.v" and collects the
/// complete output line by line.
pub fn preprocess_with(host: MockHost) -> (String, MockHost) {
    colored::control::set_override(false);
    let mut preproc = Preprocessor::new(host);
    preproc.open_file("main.v", None);
    let mut out = String::new();
    loop {
        let line = preproc.get_line();
        if line.is_empty() {
            break;
        }
        out.push_str(&line);
    }
    (out, preproc.into_host())
}

pub fn preprocess<S: Into<String>>(source: S) -> (String, MockHost) {
    let mut host = MockHost::new();
    host.add_file("main.v", source.into().as_str());
    preprocess_with(host)
}
