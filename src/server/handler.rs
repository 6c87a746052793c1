//! Route table entries.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::parser::{HttpRequest, Method};
use crate::server::{HttpResponse, Error};

/// The future a handler returns.
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<HttpResponse, Error>> + Send>>;

/// A shareable, type-erased request handler.
pub type HandlerFn = Arc<dyn Fn(HttpRequest) -> HandlerFuture + Send + Sync>;

/// A path, the methods it serves and its handler.
pub struct Route {
    /// The path to match, without a query string.
    pub path: String,
    pub methods: Vec<Method>,
    pub handler: HandlerFn,
}

impl Route {
    /// Whether this route serves `method`.
    ///
    /// HEAD is served by any route that serves GET.
    pub fn accepts(&self, method: Method) -> bool {
        self.methods.contains(&method)
            || (method == Method::HEAD && self.methods.contains(&Method::GET))
    }
}
