//! Request handler module
//!
//! Maps request paths onto the served root and answers with file contents,
//! directory listings or error pages.

pub mod listing;
pub mod path;
pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
