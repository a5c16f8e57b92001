//! HTTP listener.
//!
//! One [`Server`] per port. Each accepted connection gets its own task and
//! every request on it is dispatched through the port's [`Router`]. The
//! router is shared read-only between all connection tasks.
//!
//! A listener runs until its shutdown future resolves; [`Server::serve`]
//! passes one that never does, so in the binary listeners only stop with
//! the process.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::error::Error;
use crate::request::Request;
use crate::response::HttpBody;
use crate::router::Router;

/// The HTTP server for one port.
pub struct Server {
    addr: SocketAddr,
}

impl Server {
    /// Configures the server to bind to `addr` when served.
    pub fn bind(addr: SocketAddr) -> Self {
        Self { addr }
    }

    /// Accepts connections forever.
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        self.serve_with_shutdown(router, std::future::pending()).await
    }

    /// Accepts connections until `shutdown` resolves, then waits for
    /// in-flight connections to finish.
    pub async fn serve_with_shutdown(
        self,
        router: Router,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|source| Error::Bind { addr: self.addr, source })?;
        serve_listener(listener, router, shutdown).await;
        Ok(())
    }
}

/// Serves `router` on an already-bound listener until `shutdown` resolves.
pub async fn serve_listener(
    listener: TcpListener,
    router: Router,
    shutdown: impl Future<Output = ()>,
) {
    let router = Arc::new(router);
    if let Ok(addr) = listener.local_addr() {
        info!(addr = %addr, "disadis listening");
    }

    let mut tasks = tokio::task::JoinSet::new();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;

            () = &mut shutdown => {
                info!(in_flight = tasks.len(), "shutting down listener, draining connections");
                break;
            }

            res = listener.accept() => {
                let (stream, remote_addr) = match res {
                    Ok(v) => v,
                    Err(e) => {
                        error!("accept error: {e}");
                        continue;
                    }
                };

                let router = Arc::clone(&router);
                let io = TokioIo::new(stream);

                tasks.spawn(async move {
                    let svc = service_fn(move |req| {
                        let router = Arc::clone(&router);
                        async move { dispatch(router, req, remote_addr).await }
                    });

                    // Both HTTP/1.1 and HTTP/2, whatever the client speaks.
                    // A client hanging up mid-body lands here too; the body,
                    // and with it the datastream, has been dropped by then.
                    if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                        .serve_connection(io, svc)
                        .await
                    {
                        error!(peer = %remote_addr, "connection error: {e}");
                    }
                });
            }

            Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
        }
    }

    while tasks.join_next().await.is_some() {}
    info!("listener stopped");
}

async fn dispatch(
    router: Arc<Router>,
    req: hyper::Request<Incoming>,
    remote_addr: SocketAddr,
) -> Result<http::Response<HttpBody>, Infallible> {
    let (parts, _body) = req.into_parts();
    let response = router.dispatch(Request::from_parts(parts, remote_addr)).await;
    Ok(response.into_http())
}
