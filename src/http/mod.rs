//! HTTP protocol layer module
//!
//! Response builders shared by routing and the functions themselves.

pub mod response;

// Re-export commonly used builders
pub use response::{build_404_response, build_405_response, build_text_response};
