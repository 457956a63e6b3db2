//! Artifact stores: package directories on disk, or in memory

pub mod local;
pub mod memory;

pub use local::{package_dir, LocalFileStore, LocalFileStoreProvider};
pub use memory::{InMemoryFileStore, InMemoryFileStoreProvider};
