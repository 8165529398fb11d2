//! Pagemark
//!
//! Page-anchored paragraph markup for scanned course books: start/end marks,
//! manual and automatic zones, and the per-paragraph health checks that keep
//! a book's markup exportable.
//!
//! # Modules
//!
//! - `marks`: Marks, zones, and placement geometry
//! - `registry`: Paragraph registry and its derived page index
//! - `placement`: Automatic zone placement from lesson objects
//! - `validate`: Pairing and bracket checks, paragraph health
//! - `export`: XML markup records, import and export
//! - `document`: Page-source collaborator (1-based page translation)
//! - `toc`: Course table-of-contents fetch with cancellation
//! - `state`: A lock-guarded session over the registry

pub mod config;
pub mod document;
pub mod error;
pub mod export;
pub mod marks;
pub mod placement;
pub mod registry;
pub mod state;
pub mod toc;
pub mod validate;

pub use config::Config;
pub use error::{MarkupError, Result};
pub use state::MarkupSession;
