//! Handler trait and type erasure.
//!
//! A [`Router`](crate::Router) holds handlers of different concrete types
//! (a [`Disseminator`](crate::Disseminator), the same wrapped in an
//! [`AccessLog`], a closure in tests) in one table, so it stores them as
//! trait objects:
//!
//! ```text
//! Disseminator::new(repo, "content")       ← concrete pipeline
//!        ↓ AccessLog::new("download", …)   ← optional wrapper
//!        ↓ Arc::new(…) as BoxedHandler     ← shared, type-erased
//! handler.call(req)  at request time       ← one vtable dispatch
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::request::Request;
use crate::response::Response;

/// A heap-allocated, type-erased future that resolves to a [`Response`].
pub type BoxFuture<'a> = Pin<Box<dyn Future<Output = Response> + Send + 'a>>;

/// Something that turns a request into a response.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, req: Request) -> BoxFuture<'_>;
}

/// A type-erased handler shared across concurrent requests.
pub type BoxedHandler = Arc<dyn Handler>;

impl<H: Handler + ?Sized> Handler for Arc<H> {
    fn call(&self, req: Request) -> BoxFuture<'_> {
        (**self).call(req)
    }
}

/// Adapts an `async fn(Request) -> Response` into a [`Handler`].
///
/// ```rust
/// use disadis::{Request, Response, Status, handler_fn};
///
/// let teapot = handler_fn(|_req: Request| async { Response::error(Status::NotFound) });
/// ```
pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    FnHandler(f)
}

/// Returned by [`handler_fn`].
pub struct FnHandler<F>(F);

impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture<'_> {
        Box::pin((self.0)(req))
    }
}

/// Writes one access-log line per request: handler name, client address,
/// method, request URI, status and elapsed time.
pub struct AccessLog<H> {
    name: String,
    inner: H,
}

impl<H: Handler> AccessLog<H> {
    pub fn new(name: impl Into<String>, inner: H) -> Self {
        Self { name: name.into(), inner }
    }
}

impl<H: Handler> Handler for AccessLog<H> {
    fn call(&self, req: Request) -> BoxFuture<'_> {
        Box::pin(async move {
            let start = Instant::now();
            let client = req.real_ip();
            let method = req.method().clone();
            let uri = req.uri().to_owned();

            let resp = self.inner.call(req).await;

            info!(
                handler = %self.name,
                client = %client,
                method = %method,
                uri = %uri,
                status = resp.status().code(),
                elapsed = ?start.elapsed(),
                "request"
            );
            resp
        })
    }
}
