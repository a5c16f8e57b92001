//! Startup composition: configuration → per-port routers → listeners.
//!
//! The whole [`RouteTable`] is built before any listener starts. Each
//! configured handler becomes one [`Disseminator`] wrapped in an
//! [`AccessLog`], shared by `Arc` between every segment (and the default
//! slot) it is bound to. Handlers with the same port share a router.

use std::collections::BTreeMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::auth::Authorizer;
use crate::config::{ConfigError, HandlerConfig};
use crate::disseminate::Disseminator;
use crate::error::Error;
use crate::handler::{AccessLog, BoxedHandler};
use crate::repository::Repository;
use crate::router::{Router, RouterBuilder};
use crate::server::Server;

/// Immutable port → router table.
pub struct RouteTable {
    routers: BTreeMap<u16, Router>,
}

impl RouteTable {
    /// Builds one router per distinct port. Handlers are visited in name
    /// order, so when two handlers claim the same segment or the same
    /// default slot, the later name wins.
    pub fn build(
        handlers: &BTreeMap<String, HandlerConfig>,
        repository: Arc<dyn Repository>,
        authorizer: Option<Arc<dyn Authorizer>>,
    ) -> Result<Self, Error> {
        let mut builders: BTreeMap<u16, RouterBuilder> = BTreeMap::new();
        let mut defaults: BTreeMap<u16, &str> = BTreeMap::new();

        for (name, h) in handlers {
            let mut pipeline = Disseminator::new(Arc::clone(&repository), &h.datastream)
                .versioned(h.versioned)
                .prefix(&h.prefix);
            if h.auth {
                let Some(authorizer) = &authorizer else {
                    return Err(ConfigError::Handler {
                        handler: name.clone(),
                        reason: "auth is enabled but no authorizer is configured".into(),
                    }
                    .into());
                };
                pipeline = pipeline.authorizer(Arc::clone(authorizer));
            }

            info!(
                handler = %name,
                datastream = %h.datastream,
                port = h.port,
                auth = h.auth,
                datastream_id = ?h.datastream_id,
                "handler"
            );

            let handler: BoxedHandler = Arc::new(AccessLog::new(name.as_str(), pipeline));
            let router = builders.entry(h.port).or_default();
            if h.is_default() {
                if let Some(previous) = defaults.insert(h.port, name.as_str()) {
                    warn!(port = h.port, previous, handler = %name, "replacing default handler");
                }
                router.set_default(Arc::clone(&handler));
            }
            for segment in h.segments() {
                router.add_handler(segment, Arc::clone(&handler));
            }
        }

        let mut routers = BTreeMap::new();
        for (port, builder) in builders {
            routers.insert(port, builder.build()?);
        }
        Ok(Self { routers })
    }

    pub fn ports(&self) -> impl Iterator<Item = u16> + '_ {
        self.routers.keys().copied()
    }

    pub fn router(&self, port: u16) -> Option<&Router> {
        self.routers.get(&port)
    }

    pub fn is_empty(&self) -> bool { self.routers.is_empty() }

    /// Starts one listener per port on `host` and waits on all of them.
    /// Listeners never stop on their own, so this only returns with the
    /// first listener failure.
    pub async fn run(self, host: IpAddr) -> Result<(), Error> {
        let mut listeners = JoinSet::new();
        for (port, router) in self.routers {
            listeners.spawn(Server::bind(SocketAddr::new(host, port)).serve(router));
        }
        while let Some(res) = listeners.join_next().await {
            res??;
        }
        Ok(())
    }
}
