//! # disadis
//!
//! An HTTP gateway that disseminates datastreams out of a digital-object
//! repository. Read-only, `GET` only, with version pinning and conditional
//! GET.
//!
//! ## The contract
//!
//! A client asks for `/<id>` (or `/<id>/<version>`) and gets the current
//! bytes of one configured datastream of object `<prefix><id>`, or `304`
//! when its `If-None-Match` already names the current version. Access can
//! be gated per handler by an [`Authorizer`](auth::Authorizer).
//!
//! What disadis does not do: cache content bytes, write to the
//! repository, transform content, or act as a general proxy.
//!
//! ## Moving parts
//!
//! - [`Disseminator`] — the per-datastream request pipeline
//! - [`Router`] — picks a pipeline by the leading path segment
//! - [`RouteTable`] — the startup-built, immutable port → router map
//! - [`Server`] — one hyper listener per port
//! - [`repository`] and [`auth`] — the two collaborators a pipeline calls
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use disadis::repository::FsRepository;
//! use disadis::{Disseminator, Router, Server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let repo = Arc::new(FsRepository::new("/srv/datastreams"));
//!     let content = Arc::new(Disseminator::new(repo, "content").prefix("vecnet:").versioned(true));
//!
//!     let mut router = Router::builder();
//!     router.add_handler("content", content.clone());
//!     router.set_default(content);
//!
//!     Server::bind("0.0.0.0:8080".parse().unwrap())
//!         .serve(router.build().unwrap())
//!         .await
//!         .unwrap();
//! }
//! ```

mod disseminate;
mod error;
mod handler;
mod path;
mod request;
mod response;
mod router;
mod server;
mod status;

pub mod auth;
pub mod compose;
pub mod config;
pub mod logging;
pub mod repository;
pub mod signal;

pub use compose::RouteTable;
pub use disseminate::Disseminator;
pub use error::Error;
pub use handler::{AccessLog, BoxFuture, BoxedHandler, FnHandler, Handler, handler_fn};
pub use request::Request;
pub use response::{HttpBody, Response, ResponseBuilder};
pub use router::{RouteError, Router, RouterBuilder};
pub use server::{Server, serve_listener};
pub use status::Status;
