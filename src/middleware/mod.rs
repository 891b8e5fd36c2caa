//! Middleware layer.
//!
//! A middleware wraps a handler: it sees the request first, decides whether
//! to call [`Next::run`], and may inspect or replace the response on the way
//! out. Not calling `next` short-circuits the chain: inner middleware and the
//! handler never run.
//!
//! Middleware is attached per route at registration time and composed once.
//! The first middleware in the list is the outermost:
//!
//! ```text
//! router.get("/x", h, [a, b])
//!
//!   request ──► a ──► b ──► h
//!   response ◄── a ◄── b ◄──┘
//! ```
//!
//! ```rust
//! use muxa::middleware::{self, Next};
//! use muxa::{Request, Response, Router, StatusCode};
//!
//! let require_json = middleware::from_fn(|req: Request, next: Next| async move {
//!     match req.header("content-type") {
//!         Some("application/json") => next.run(req).await,
//!         _ => Response::status(StatusCode::UNSUPPORTED_MEDIA_TYPE),
//!     }
//! });
//!
//! # async fn create(_: Request) -> Response { Response::text("") }
//! let app = Router::new()
//!     .post("/users", create, [middleware::logging(), require_json]);
//! ```

pub mod auth;
mod logging;

pub use logging::logging;

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::handler::{BoxFuture, BoxedHandler, ErasedHandler};
use crate::request::Request;
use crate::response::{IntoResponse, Response};

type LayerFn = dyn Fn(Request, Next) -> BoxFuture + Send + Sync + 'static;

/// A handler-to-handler transformer, attached to routes at registration.
///
/// Cloning is cheap: one instance can guard any number of routes.
#[derive(Clone)]
pub struct Middleware(Arc<LayerFn>);

impl fmt::Debug for Middleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Middleware { .. }")
    }
}

/// The rest of the chain, handed to a middleware for one request.
pub struct Next {
    inner: BoxedHandler,
}

impl Next {
    /// Runs the inner middleware and, eventually, the route handler.
    pub async fn run(self, req: Request) -> Response {
        self.inner.call(req).await
    }
}

/// Builds a [`Middleware`] from an async function of `(Request, Next)`.
pub fn from_fn<F, Fut, R>(f: F) -> Middleware
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    Middleware(Arc::new(move |req: Request, next: Next| -> BoxFuture {
        let fut = f(req, next);
        Box::pin(async move { fut.await.into_response() })
    }))
}

/// A handler with one middleware wrapped around it.
struct Layered {
    layer: Middleware,
    next: BoxedHandler,
}

impl ErasedHandler for Layered {
    fn call(&self, req: Request) -> BoxFuture {
        let next = Next { inner: Arc::clone(&self.next) };
        (self.layer.0)(req, next)
    }
}

/// Wraps `handler` so that `layers[0]` runs first.
///
/// Folding from the back makes the last layer the innermost wrapper. With no
/// layers the handler is returned as-is.
pub(crate) fn compose(handler: BoxedHandler, layers: Vec<Middleware>) -> BoxedHandler {
    layers.into_iter().rev().fold(handler, |next, layer| -> BoxedHandler {
        Arc::new(Layered { layer, next })
    })
}
