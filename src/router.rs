//! Leading-segment router.
//!
//! A [`Router`] picks a handler by the first path segment and forwards the
//! rest: `/<segment>/<rest>` reaches the handler registered for `segment`
//! as `/<rest>`. Requests whose first segment matches nothing go, untouched,
//! to the default handler, or get a `404` when there is none.
//!
//! Routers are assembled with a [`RouterBuilder`] and frozen by
//! [`RouterBuilder::build`]; a built router is never modified.

use std::collections::BTreeMap;
use std::sync::Arc;

use matchit::Router as MatchitRouter;

use crate::handler::BoxedHandler;
use crate::request::Request;
use crate::response::Response;
use crate::status::Status;

#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("invalid route segment `{0}`")]
    InvalidSegment(String),
    #[error("cannot register segment `{segment}`: {source}")]
    Insert {
        segment: String,
        source: matchit::InsertError,
    },
}

/// Collects segment bindings before freezing them into a [`Router`].
#[derive(Default)]
pub struct RouterBuilder {
    routes: BTreeMap<String, BoxedHandler>,
    default: Option<BoxedHandler>,
}

impl RouterBuilder {
    pub fn new() -> Self { Self::default() }

    /// Binds `segment` to `handler`. Binding a segment again replaces the
    /// earlier handler.
    pub fn add_handler(&mut self, segment: impl Into<String>, handler: BoxedHandler) -> &mut Self {
        self.routes.insert(segment.into(), handler);
        self
    }

    /// Handler for requests whose first segment matches nothing. Setting it
    /// again replaces the earlier one.
    pub fn set_default(&mut self, handler: BoxedHandler) -> &mut Self {
        self.default = Some(handler);
        self
    }

    pub fn build(self) -> Result<Router, RouteError> {
        let mut tree: MatchitRouter<BoxedHandler> = MatchitRouter::new();
        for (segment, handler) in &self.routes {
            if !is_valid_segment(segment) {
                return Err(RouteError::InvalidSegment(segment.clone()));
            }
            let insert = |route: String, handler: &BoxedHandler, tree: &mut MatchitRouter<BoxedHandler>| {
                tree.insert(route, Arc::clone(handler))
                    .map_err(|source| RouteError::Insert { segment: segment.clone(), source })
            };
            insert(format!("/{segment}"), handler, &mut tree)?;
            insert(format!("/{segment}/{{*rest}}"), handler, &mut tree)?;
        }
        Ok(Router {
            tree,
            segments: self.routes.into_keys().collect(),
            default: self.default,
        })
    }
}

/// Segments become literal route components, so they may not contain
/// separators or route-pattern syntax.
pub fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty() && !segment.contains(['/', '{', '}', '*'])
}

/// Immutable segment → handler table with an optional default.
pub struct Router {
    tree: MatchitRouter<BoxedHandler>,
    segments: Vec<String>,
    default: Option<BoxedHandler>,
}

impl Router {
    pub fn builder() -> RouterBuilder { RouterBuilder::new() }

    /// Registered segments, sorted.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(String::as_str)
    }

    pub fn has_default(&self) -> bool { self.default.is_some() }

    pub async fn dispatch(&self, req: Request) -> Response {
        let path = req.path();
        // `/seg/` routes like `/seg`; handlers ignore a trailing slash anyway.
        let lookup = match path.strip_suffix('/') {
            Some(trimmed) if !trimmed.is_empty() => trimmed,
            _ => path,
        };

        let routed = self.tree.at(lookup).ok().map(|m| {
            let rest = m.params.get("rest").unwrap_or("");
            (Arc::clone(m.value), format!("/{rest}"))
        });

        match routed {
            Some((handler, forwarded)) => handler.call(req.with_path(forwarded)).await,
            None => match &self.default {
                Some(handler) => handler.call(req).await,
                None => Response::error(Status::NotFound),
            },
        }
    }
}
