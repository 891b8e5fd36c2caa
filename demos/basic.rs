//! Minimal muxa example: a public route and a token-protected route.
//!
//! Configuration comes from the environment (a `.env` file is loaded first):
//!
//!   MUXA_ADDR        bind address, default 127.0.0.1:3000
//!   MUXA_JWT_SECRET  HMAC secret for bearer tokens (required)
//!
//! Run with:
//!   MUXA_JWT_SECRET=dev-secret RUST_LOG=muxa=debug,info cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/hello
//!   curl http://localhost:3000/whoami                          → 401
//!   curl -H "Authorization: Bearer $TOKEN" http://localhost:3000/whoami

use std::process::ExitCode;

use muxa::middleware::auth::{BearerAuth, Claims};
use muxa::middleware::{self, Next};
use muxa::{ContentType, Request, Response, Router, Server, StatusCode};
use tracing::error;
use tracing_subscriber::EnvFilter;

const DEFAULT_ADDR: &str = "127.0.0.1:3000";

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let addr = std::env::var("MUXA_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_owned());
    let Ok(secret) = std::env::var("MUXA_JWT_SECRET") else {
        error!("MUXA_JWT_SECRET is not set");
        return ExitCode::FAILURE;
    };

    let auth = BearerAuth::from_secret(secret).into_middleware();
    let powered_by = middleware::from_fn(|req: Request, next: Next| async move {
        let res = next.run(req).await;
        Response::builder()
            .status(res.status_code())
            .header("x-powered-by", "muxa")
            .text(String::from_utf8_lossy(res.body()).into_owned())
    });

    let app = Router::new()
        .get("/hello", hello, [middleware::logging()])
        .get("/whoami", whoami, [middleware::logging(), powered_by, auth.clone()])
        .delete("/session", end_session, [middleware::logging(), auth]);

    if let Err(e) = Server::bind(addr).serve(app).await {
        error!("server error: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

// GET /hello
async fn hello(_req: Request) -> Response {
    Response::builder().bytes(ContentType::Html, b"<h1>Hello, world!</h1>".to_vec())
}

// GET /whoami: the bearer middleware has already verified the token.
async fn whoami(req: Request) -> String {
    let subject = req.extensions().get::<Claims>().and_then(Claims::subject);
    format!("you are {}", subject.unwrap_or("nobody in particular"))
}

// DELETE /session → 204 No Content
async fn end_session(_req: Request) -> Response {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("clear-site-data", "\"cookies\"")
        .no_body()
}
