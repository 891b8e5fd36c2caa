//! # muxa
//!
//! An exact-match HTTP router with per-route middleware.
//!
//! ## The contract
//!
//! A route is a method and a literal path. A request reaches a handler only
//! when both match exactly; everything else is `404`. There are no path
//! parameters, wildcards or prefixes, and no `405`.
//!
//! Middleware is listed per route and composed once at registration, first
//! listed outermost. Two middlewares ship with the crate:
//!
//! - [`middleware::logging`]: one `tracing` event per request
//! - [`middleware::auth::BearerAuth`]: HMAC-signed JWT bearer tokens
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use muxa::middleware::{self, auth::BearerAuth};
//! use muxa::{Request, Response, Router, Server, StatusCode};
//!
//! #[tokio::main]
//! async fn main() {
//!     let auth = BearerAuth::from_secret(b"change-me").into_middleware();
//!
//!     let app = Router::new()
//!         .get("/hello", hello, [middleware::logging()])
//!         .post("/notes", create_note, [middleware::logging(), auth]);
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await.unwrap();
//! }
//!
//! async fn hello(_req: Request) -> &'static str {
//!     "hello"
//! }
//!
//! async fn create_note(req: Request) -> Response {
//!     if req.body().is_empty() {
//!         return Response::status(StatusCode::BAD_REQUEST);
//!     }
//!     Response::builder()
//!         .status(StatusCode::CREATED)
//!         .header("location", "/notes/1")
//!         .json(br#"{"id":1}"#.to_vec())
//! }
//! ```

mod error;
mod handler;
mod method;
mod request;
mod response;
mod router;
mod server;

pub mod middleware;

pub use error::Error;
pub use handler::Handler;
pub use http::StatusCode;
pub use method::{Method, UnknownMethod};
pub use middleware::{Middleware, Next};
pub use request::Request;
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
