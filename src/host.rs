// STD Dependencies -----------------------------------------------------------
use std::path::PathBuf;


// Internal Dependencies ------------------------------------------------------
use crate::defines::DefineMap;
use crate::error::{PreprocError, Severity};
use crate::traits::{KeepComments, PreprocHost};


// Preprocessor Options -------------------------------------------------------
#[derive(Debug, Clone)]
pub struct PreprocOptions {
    keep_comments: KeepComments,
    keep_whitespace: bool,
    pedantic: bool,
    line_directives: bool,
    include_paths: Vec<PathBuf>
}

impl PreprocOptions {

    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            keep_comments: KeepComments::Keep,
            keep_whitespace: true,
            pedantic: false,
            line_directives: false,
            include_paths: Vec::new()
        }
    }

    pub fn set_keep_comments(&mut self, mode: KeepComments) {
        self.keep_comments = mode;
    }

    pub fn set_discard_whitespace(&mut self) {
        self.keep_whitespace = false;
    }

    pub fn set_pedantic(&mut self) {
        self.pedantic = true;
    }

    pub fn set_line_directives(&mut self) {
        self.line_directives = true;
    }

    pub fn add_include_path(&mut self, path: PathBuf) {
        self.include_paths.push(path);
    }

    pub fn keep_comments(&self) -> KeepComments {
        self.keep_comments
    }

    pub fn keep_whitespace(&self) -> bool {
        self.keep_whitespace
    }

    pub fn pedantic(&self) -> bool {
        self.pedantic
    }

    pub fn line_directives(&self) -> bool {
        self.line_directives
    }

    pub fn include_paths(&self) -> &[PathBuf] {
        &self.include_paths
    }

}


// Filesystem Host Implementation ---------------------------------------------
/// Host backed by the real filesystem and a `DefineMap`, reporting
/// diagnostics to stderr. Embedders with their own symbol table or search
/// rules implement `PreprocHost` directly instead.
pub struct StandardHost {
    defines: DefineMap,
    options: PreprocOptions,
    error_count: usize
}

impl StandardHost {

    pub fn new(options: PreprocOptions) -> Self {
        Self {
            defines: DefineMap::new(),
            options,
            error_count: 0
        }
    }

    pub fn defines(&self) -> &DefineMap {
        &self.defines
    }

    pub fn defines_mut(&mut self) -> &mut DefineMap {
        &mut self.defines
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

}

impl PreprocHost for StandardHost {

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

    fn report(&mut self, error: PreprocError) {
        if error.severity() != Severity::Warning {
            self.error_count += 1;
        }
        eprintln!("{}", error);
    }

    fn include_paths(&self) -> &[PathBuf] {
        self.options.include_paths()
    }

    fn keep_comments(&self) -> KeepComments {
        self.options.keep_comments()
    }

    fn keep_whitespace(&self) -> bool {
        self.options.keep_whitespace()
    }

    fn pedantic(&self) -> bool {
        self.options.pedantic()
    }

    fn line_directives(&self) -> bool {
        self.options.line_directives()
    }

}


// Tests ----------------------------------------------------------------------
#[cfg(test)]
mod test {
    use std::path::PathBuf;
    use crate::traits::{KeepComments, PreprocHost};
    use super::{PreprocOptions, StandardHost};

    #[test]
    fn test_option_defaults() {
        let options = PreprocOptions::new();
        assert_eq!(options.keep_comments(), KeepComments::Keep);
        assert!(options.keep_whitespace());
        assert!(!options.pedantic());
        assert!(!options.line_directives());
        assert!(options.include_paths().is_empty());
    }

    #[test]
    fn test_option_setters() {
        let mut options = PreprocOptions::new();
        options.set_keep_comments(KeepComments::Sub);
        options.set_discard_whitespace();
        options.set_pedantic();
        options.set_line_directives();
        options.add_include_path(PathBuf::from("rtl/includes"));
        assert_eq!(options.keep_comments(), KeepComments::Sub);
        assert!(!options.keep_whitespace());
        assert!(options.pedantic());
        assert!(options.line_directives());
        assert_eq!(options.include_paths(), vec![PathBuf::from("rtl/includes")].as_slice());
    }

    #[test]
    fn test_standard_host_symbol_table() {
        let mut host = StandardHost::new(PreprocOptions::new());
        host.define("X", "42", "");
        assert!(host.def_exists("X"));
        assert_eq!(host.def_params("X"), "0");
        assert_eq!(host.def_value("X"), "42");
        host.undef("X");
        assert!(!host.def_exists("X"));
        host.define("A", "1", "");
        host.undefineall();
        assert_eq!(host.defines().len(), 0);
        assert_eq!(host.error_count(), 0);
    }

}
