//! HTTP protocol layer module
//!
//! Provides HTTP protocol-related base functionality, decoupled from file
//! resolution: header policy, request head checks, content types, dates
//! and response builders.

pub mod body;
pub mod conditional;
pub mod head;
pub mod mime;
pub mod nocache;
pub mod response;

// Re-export commonly used types
pub use body::ResponseBody;
pub use response::{
    build_304_response, build_400_response, build_404_response, build_405_response,
    build_file_response, build_html_response, encode_rejection, finalize,
};
