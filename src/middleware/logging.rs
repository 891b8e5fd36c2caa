//! Request logging.

use tracing::info;

use super::{from_fn, Middleware, Next};
use crate::request::Request;

/// Logs peer address, method and URI of every request, then always delegates.
pub fn logging() -> Middleware {
    from_fn(|req: Request, next: Next| async move {
        let peer = req.remote_addr()
            .map_or_else(|| "-".to_owned(), |addr| addr.to_string());
        info!(peer = %peer, method = %req.method(), uri = %req.uri(), "request");
        next.run(req).await
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::handler::Handler;
    use crate::middleware::compose;

    #[tokio::test]
    async fn always_delegates() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let handler = (move |req: Request| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move { format!("saw {}", req.uri()) }
        })
        .into_boxed_handler();

        let chain = compose(handler, vec![logging()]);
        let peer = "127.0.0.1:9000".parse().unwrap();
        let res = chain.call(Request::fake("DELETE", "/items?id=7").with_remote_addr(peer)).await;

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(res.body(), b"saw /items?id=7");

        chain.call(Request::fake("GET", "/no-peer")).await;
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }
}
