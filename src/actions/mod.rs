//! File actions module.
//!
//! The only action is deletion: files classified as duplicate or empty are
//! removed permanently (default) or moved to the system trash.
//!
//! ```no_run
//! use dupsweep::actions::{DeleteConfig, DeleteMode, DeletionExecutor};
//!
//! let executor = DeletionExecutor::new(DeleteConfig::default().with_mode(DeleteMode::Trash));
//! assert!(!executor.is_permanent());
//! ```

pub mod delete;

// Re-export commonly used types
pub use delete::{
    verify_unchanged, DeleteConfig, DeleteError, DeleteMode, DeleteResult, DeletionExecutor,
    PermanentRemover, Remover, TrashRemover,
};
