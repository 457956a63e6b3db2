//! Port trait definitions (Hexagonal Architecture)
//!
//! The synthesis services only talk to the outside world through these
//! traits:
//! - CodeGenerationOracle: produces scenarios and candidate test sources
//! - CompileService / TestExecutionService: validate candidates
//! - FileStore / FileStoreProvider: persist artifacts in a package directory
//! - SourceIndex: looks up other classes the oracle asked to see
//! - ProgressReporter: progress text, fraction and cancellation

pub mod compiler;
pub mod file_store;
pub mod oracle;
pub mod progress;
pub mod source_index;

pub use compiler::{CompileService, TestExecutionService};
pub use file_store::{FileStore, FileStoreProvider};
pub use oracle::CodeGenerationOracle;
pub use progress::{ProgressReporter, SilentProgress};
pub use source_index::SourceIndex;
