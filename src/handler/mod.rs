//! Request handler module
//!
//! Method validation, asset lookup and response building for every request.

pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
