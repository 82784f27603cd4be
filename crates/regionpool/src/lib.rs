//! # regionpool
//!
//! A phase-oriented region allocator. An [`Arena`] reserves one block of
//! virtual memory from the OS and hands out allocations by bumping a cursor.
//! Nothing is freed individually; a [`reset`](Arena::reset) reclaims
//! everything at once, and the region can grow or shrink by relocation.
//!
//! ```text
//! Arena<O: ArenaObserver>
//! ├── Region (mmap'd, page-rounded, owned)
//! │   ├── RegionHeader (first HEADER_SIZE bytes, moves with the data)
//! │   └── allocations [HEADER_SIZE .. cursor)
//! └── observer: NoOpObserver | Diagnostics
//! ```
//!
//! Unix only: the region is managed with `mmap`/`mremap`/`munmap`.
#![warn(missing_docs)]

#[cfg(not(unix))]
compile_error!("regionpool requires a Unix virtual memory API");

pub mod align;
pub mod arena;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod handle;
pub mod header;
pub mod observer;
mod region;
pub mod transfer;

// Re-exports
pub use align::ALIGNMENT;
pub use arena::Arena;
pub use config::ArenaConfig;
pub use diagnostics::{Diagnostics, DiagnosticsReport};
pub use error::{ArenaError, ResizeError, Result};
pub use handle::Allocation;
pub use header::{RegionHeader, HEADER_SIZE};
pub use observer::{ArenaObserver, NoOpObserver};
pub use transfer::{copy, TransferMode};
