//! External compiler and test runner adapters

pub mod process;

pub use process::{parse_diagnostics, ProcessCompiler, ProcessTestRunner};
