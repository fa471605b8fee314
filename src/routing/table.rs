//! Route table module
//!
//! Maps the function route (`/{prefix}/{name}`) to its binding and filters
//! methods before the function runs.

use hyper::Method;

use crate::function::FunctionBinding;

/// Result of resolving a request against the route table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteMatch {
    /// Path and method match; run the function
    Handler,
    /// Path matches but the trigger does not accept the method
    MethodNotAllowed(FunctionBinding),
    /// No function bound to this path
    NotFound,
}

/// Route table for the functions served by this worker
#[derive(Debug, Clone)]
pub struct RouteTable {
    path: String,
    binding: FunctionBinding,
}

impl RouteTable {
    /// Bind `binding` at `/{route_prefix}/{binding.name}`
    ///
    /// An empty prefix binds the function at the root (`/{name}`).
    pub fn new(route_prefix: &str, binding: FunctionBinding) -> Self {
        let prefix = route_prefix.trim_matches('/');
        let name = binding.name;
        let path = if prefix.is_empty() {
            format!("/{name}")
        } else {
            format!("/{prefix}/{name}")
        };
        Self { path, binding }
    }

    /// Bound route path
    pub fn path(&self) -> &str {
        &self.path
    }

    pub const fn binding(&self) -> &FunctionBinding {
        &self.binding
    }

    /// Resolve a request method and path
    pub fn resolve(&self, method: &Method, path: &str) -> RouteMatch {
        if !match_path(&self.path, path) {
            return RouteMatch::NotFound;
        }

        if self.binding.accepts(method) {
            RouteMatch::Handler
        } else {
            RouteMatch::MethodNotAllowed(self.binding)
        }
    }
}

/// Case-insensitive path comparison, tolerating one trailing slash
fn match_path(route: &str, path: &str) -> bool {
    let path = path.strip_suffix('/').unwrap_or(path);
    route.eq_ignore_ascii_case(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::hello_world_binding;

    fn table(prefix: &str) -> RouteTable {
        RouteTable::new(prefix, hello_world_binding())
    }

    #[test]
    fn test_route_path() {
        assert_eq!(table("api").path(), "/api/HelloWorld");
        assert_eq!(table("/api/").path(), "/api/HelloWorld");
        assert_eq!(table("").path(), "/HelloWorld");
        assert_eq!(table("v1/functions").path(), "/v1/functions/HelloWorld");
    }

    #[test]
    fn test_route_named_after_binding() {
        let binding = FunctionBinding {
            name: "Greeter",
            ..hello_world_binding()
        };
        let routes = RouteTable::new("api", binding);
        assert_eq!(routes.path(), "/api/Greeter");
        assert_eq!(routes.resolve(&Method::GET, "/api/HelloWorld"), RouteMatch::NotFound);
        assert_eq!(routes.resolve(&Method::GET, "/api/greeter"), RouteMatch::Handler);
    }

    #[test]
    fn test_get_and_post_reach_handler() {
        let routes = table("api");
        assert!(matches!(
            routes.resolve(&Method::GET, "/api/HelloWorld"),
            RouteMatch::Handler
        ));
        assert!(matches!(
            routes.resolve(&Method::POST, "/api/HelloWorld"),
            RouteMatch::Handler
        ));
    }

    #[test]
    fn test_other_methods_rejected() {
        let routes = table("api");
        for method in [Method::DELETE, Method::PUT, Method::PATCH, Method::HEAD, Method::OPTIONS] {
            assert_eq!(
                routes.resolve(&method, "/api/HelloWorld"),
                RouteMatch::MethodNotAllowed(hello_world_binding())
            );
        }
    }

    #[test]
    fn test_path_matching() {
        let routes = table("api");
        assert!(matches!(
            routes.resolve(&Method::GET, "/api/helloworld"),
            RouteMatch::Handler
        ));
        assert!(matches!(
            routes.resolve(&Method::GET, "/api/HelloWorld/"),
            RouteMatch::Handler
        ));
        assert_eq!(routes.resolve(&Method::GET, "/"), RouteMatch::NotFound);
        assert_eq!(routes.resolve(&Method::GET, "/api"), RouteMatch::NotFound);
        assert_eq!(routes.resolve(&Method::GET, "/HelloWorld"), RouteMatch::NotFound);
        assert_eq!(
            routes.resolve(&Method::GET, "/api/HelloWorld/extra"),
            RouteMatch::NotFound
        );
    }

    #[test]
    fn test_unknown_path_with_rejected_method_is_not_found() {
        assert_eq!(
            table("api").resolve(&Method::DELETE, "/api/Other"),
            RouteMatch::NotFound
        );
    }

    #[test]
    fn test_empty_prefix() {
        let routes = table("");
        assert!(matches!(
            routes.resolve(&Method::GET, "/HelloWorld"),
            RouteMatch::Handler
        ));
        assert_eq!(routes.resolve(&Method::GET, "/api/HelloWorld"), RouteMatch::NotFound);
    }
}
