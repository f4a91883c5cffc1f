// Modules --------------------------------------------------------------------
pub mod defines;
pub mod error;
pub mod fileline;
pub mod host;
pub mod lexer;
pub mod preproc;
pub mod traits;
#[cfg(test)] mod mocks;


// Exports --------------------------------------------------------------------
pub use self::defines::{Define, DefineMap};
pub use self::error::{PreprocError, Severity};
pub use self::fileline::FileLine;
pub use self::host::{PreprocOptions, StandardHost};
pub use self::preproc::Preprocessor;
pub use self::traits::{FileError, KeepComments, PreprocHost};


// Limits ---------------------------------------------------------------------
/// Maximum depth of nested `include files before an inclusion is rejected as
/// recursive.
pub const INCLUDE_DEPTH_MAX: usize = 500;

/// Maximum number of chained `define substitutions before expansion is
/// aborted.
pub const DEFINE_RECURSION_LEVEL_MAX: usize = 1000;

/// Opened files are handed to the scanner in slabs of this many bytes.
pub const SCAN_SLAB_SIZE: usize = 64 * 1024;
