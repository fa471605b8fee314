//! Routing module
//!
//! Resolves request paths and methods to function bindings.

pub mod table;

pub use table::{RouteMatch, RouteTable};
