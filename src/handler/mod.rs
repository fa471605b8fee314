//! Request handler module
//!
//! Responsible for request routing dispatch to the bound function.

pub mod router;

// Re-export main entry point
pub use router::handle_request;
