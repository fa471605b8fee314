//! `HelloWorld` HTTP trigger
//!
//! Anonymous GET/POST trigger answering every invocation with the same
//! plain-text greeting. Request method filtering happens in routing; the
//! request itself is never inspected.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Request, Response, StatusCode};

use super::{AuthLevel, FunctionBinding};
use crate::http;
use crate::logger;

pub const FUNCTION_NAME: &str = "HelloWorld";
pub const CONTENT_TYPE: &str = "text/plain; charset=utf-8";
pub const GREETING: &str = "Hello World from Azure Functions!";

static METHODS: [Method; 2] = [Method::GET, Method::POST];

pub fn hello_world_binding() -> FunctionBinding {
    FunctionBinding {
        name: FUNCTION_NAME,
        methods: &METHODS,
        auth_level: AuthLevel::Anonymous,
    }
}

/// Run the `HelloWorld` function for one invocation
pub fn hello_world<B>(_req: &Request<B>) -> Response<Full<Bytes>> {
    logger::log_function_info(FUNCTION_NAME, "Rust HTTP trigger function processed a request.");

    http::build_text_response(StatusCode::OK, CONTENT_TYPE, GREETING)
}
