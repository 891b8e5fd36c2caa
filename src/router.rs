//! Exact-match request router.
//!
//! A route is the pair (method, literal path). Lookup is a single hash lookup:
//! no patterns, no prefixes, no trailing-slash or case normalisation. Anything
//! that is not registered exactly as requested gets `404`.
//!
//! Registered paths are compared against the percent-decoded request path, so
//! `/a b` is reached by `/a%20b` on the wire.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;
use crate::middleware::{compose, Middleware};
use crate::request::Request;
use crate::response::Response;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RouteKey {
    method: Method,
    path: String,
}

/// The application router.
///
/// Build it once at startup, then hand it to [`Server::serve`](crate::Server::serve).
/// Registration consumes and returns `self`, so once the router is being
/// served no further routes can be added.
///
/// Middleware is composed around the handler at registration; the first
/// middleware listed runs first. Registering the same method and path twice
/// keeps only the second registration.
///
/// ```rust
/// use muxa::{middleware, Request, Response, Router};
///
/// # async fn list(_: Request) -> Response { Response::text("") }
/// # async fn create(_: Request) -> Response { Response::text("") }
/// let app = Router::new()
///     .get("/users", list, [])
///     .post("/users", create, [middleware::logging()]);
/// ```
pub struct Router {
    routes: HashMap<RouteKey, BoxedHandler>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new() }
    }

    /// Register a handler for a method + path pair, wrapped in `middleware`.
    pub fn on(
        mut self,
        method: Method,
        path: &str,
        handler: impl Handler,
        middleware: impl IntoIterator<Item = Middleware>,
    ) -> Self {
        let handler = compose(handler.into_boxed_handler(), middleware.into_iter().collect());
        let key = RouteKey { method, path: path.to_owned() };
        if self.routes.insert(key, handler).is_some() {
            debug!(%method, path, "route re-registered, previous handler replaced");
        }
        self
    }

    pub fn get(self, path: &str, handler: impl Handler, middleware: impl IntoIterator<Item = Middleware>) -> Self {
        self.on(Method::Get, path, handler, middleware)
    }

    pub fn post(self, path: &str, handler: impl Handler, middleware: impl IntoIterator<Item = Middleware>) -> Self {
        self.on(Method::Post, path, handler, middleware)
    }

    pub fn put(self, path: &str, handler: impl Handler, middleware: impl IntoIterator<Item = Middleware>) -> Self {
        self.on(Method::Put, path, handler, middleware)
    }

    pub fn delete(self, path: &str, handler: impl Handler, middleware: impl IntoIterator<Item = Middleware>) -> Self {
        self.on(Method::Delete, path, handler, middleware)
    }

    pub fn patch(self, path: &str, handler: impl Handler, middleware: impl IntoIterator<Item = Middleware>) -> Self {
        self.on(Method::Patch, path, handler, middleware)
    }

    pub fn options(self, path: &str, handler: impl Handler, middleware: impl IntoIterator<Item = Middleware>) -> Self {
        self.on(Method::Options, path, handler, middleware)
    }

    /// Number of registered routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Routes one request and produces its response.
    ///
    /// Unknown methods and unregistered paths both answer `404`.
    pub async fn handle(&self, req: Request) -> Response {
        let handler = req.route_path().and_then(|path| self.lookup(req.method(), path));
        match handler {
            Some(handler) => handler.call(req).await,
            None => {
                debug!(method = %req.method(), path = %req.path(), "no route");
                Response::not_found()
            }
        }
    }

    fn lookup(&self, method: &str, path: &str) -> Option<BoxedHandler> {
        let method = method.parse::<Method>().ok()?;
        let key = RouteKey { method, path: path.to_owned() };
        self.routes.get(&key).map(Arc::clone)
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::middleware::{from_fn, Next};
    use crate::StatusCode;

    async fn hello(_req: Request) -> &'static str { "hello" }
    async fn first(_req: Request) -> &'static str { "first" }
    async fn second(_req: Request) -> &'static str { "second" }

    async fn send(router: &Router, method: &str, uri: &str) -> Response {
        router.handle(Request::fake(method, uri)).await
    }

    #[tokio::test]
    async fn exact_match_reaches_handler() {
        let router = Router::new().get("/hello", hello, []);
        let res = send(&router, "GET", "/hello").await;
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.body(), b"hello");
    }

    #[tokio::test]
    async fn query_string_is_not_part_of_the_key() {
        let router = Router::new().get("/hello", hello, []);
        assert_eq!(send(&router, "GET", "/hello?name=x").await.body(), b"hello");
    }

    #[tokio::test]
    async fn near_misses_are_not_found() {
        let router = Router::new().get("/hello", hello, []);
        for (method, uri) in [
            ("GET", "/hello/"),
            ("GET", "/Hello"),
            ("GET", "/hell"),
            ("GET", "/helloo"),
            ("GET", "/"),
            ("POST", "/hello"),
            ("get", "/hello"),
            ("HEAD", "/hello"),
        ] {
            let res = send(&router, method, uri).await;
            assert_eq!(res.status_code(), StatusCode::NOT_FOUND, "{method} {uri}");
            assert_eq!(res.body(), b"404 page not found");
        }
    }

    #[tokio::test]
    async fn every_verb_registers_under_its_own_method() {
        let router = Router::new()
            .get("/r", |_req: Request| async { "get" }, [])
            .post("/r", |_req: Request| async { "post" }, [])
            .put("/r", |_req: Request| async { "put" }, [])
            .delete("/r", |_req: Request| async { "delete" }, [])
            .patch("/r", |_req: Request| async { "patch" }, [])
            .options("/r", |_req: Request| async { "options" }, []);
        assert_eq!(router.len(), 6);

        for (method, body) in [
            ("GET", "get"),
            ("POST", "post"),
            ("PUT", "put"),
            ("DELETE", "delete"),
            ("PATCH", "patch"),
            ("OPTIONS", "options"),
        ] {
            assert_eq!(send(&router, method, "/r").await.body(), body.as_bytes());
        }
    }

    #[tokio::test]
    async fn last_registration_wins() {
        let router = Router::new()
            .get("/dup", first, [])
            .get("/dup", second, []);
        assert_eq!(router.len(), 1);
        assert_eq!(send(&router, "GET", "/dup").await.body(), b"second");
    }

    #[tokio::test]
    async fn paths_are_not_validated() {
        let router = Router::new()
            .get("", hello, [])
            .get("no-leading-slash", hello, []);
        assert_eq!(router.len(), 2);
        // An origin-form URI always has a leading slash, so these never match.
        assert_eq!(send(&router, "GET", "/no-leading-slash").await.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn encoded_requests_reach_decoded_routes() {
        let router = Router::new()
            .get("/a b", hello, [])
            .get("/café", first, []);

        assert_eq!(send(&router, "GET", "/a%20b").await.body(), b"hello");
        assert_eq!(send(&router, "GET", "/caf%C3%A9").await.body(), b"first");
        assert_eq!(send(&router, "GET", "/caf%c3%a9").await.body(), b"first");
    }

    #[tokio::test]
    async fn encoded_registrations_are_literal() {
        let router = Router::new().get("/a%20b", hello, []);
        assert_eq!(send(&router, "GET", "/a%20b").await.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(send(&router, "GET", "/a%2520b").await.body(), b"hello");
    }

    #[tokio::test]
    async fn undecodable_paths_are_not_found() {
        let router = Router::new()
            .get("/caf%FF", hello, [])
            .get("/caf\u{FFFD}", hello, []);
        assert_eq!(send(&router, "GET", "/caf%FF").await.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn middleware_wraps_only_its_route() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        let tag = from_fn(move |req: Request, next: Next| {
            let log = Arc::clone(&log);
            async move {
                log.lock().unwrap().push(req.path().to_owned());
                next.run(req).await
            }
        });

        let router = Router::new()
            .get("/wrapped", hello, [tag])
            .get("/bare", hello, []);

        send(&router, "GET", "/bare").await;
        send(&router, "GET", "/wrapped").await;
        send(&router, "GET", "/missing").await;

        assert_eq!(*seen.lock().unwrap(), ["/wrapped"]);
    }

    #[tokio::test]
    async fn re_registration_drops_old_middleware() {
        let deny = from_fn(|_req: Request, _next: Next| async { StatusCode::FORBIDDEN });
        let router = Router::new()
            .get("/x", hello, [deny])
            .get("/x", hello, []);
        assert_eq!(send(&router, "GET", "/x").await.status_code(), StatusCode::OK);
    }

    #[test]
    fn empty_router() {
        let router = Router::default();
        assert!(router.is_empty());
        assert_eq!(router.len(), 0);
    }
}
