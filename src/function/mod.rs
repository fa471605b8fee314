//! Function module
//!
//! Holds the HTTP-triggered functions served by this worker together with
//! their trigger bindings (name, accepted methods, authorization level).

pub mod hello_world;

use hyper::Method;

pub use hello_world::{hello_world, hello_world_binding};

/// Authorization level of an HTTP trigger
///
/// Only anonymous triggers are served; key checks belong to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthLevel {
    /// No key required
    Anonymous,
}

impl AuthLevel {
    /// Value used for `authLevel` in function.json
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
        }
    }
}

/// HTTP trigger binding of a single function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionBinding {
    pub name: &'static str,
    pub methods: &'static [Method],
    pub auth_level: AuthLevel,
}

impl FunctionBinding {
    pub fn accepts(&self, method: &Method) -> bool {
        self.methods.contains(method)
    }

    /// Value for the `Allow` header of a 405 response
    pub fn allow_header(&self) -> String {
        self.methods
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}
