//! Authorization checks.
//!
//! An [`Authorizer`] answers one question: may this request see the object
//! named by this identifier? The answer is a bare [`Decision`]; the
//! pipeline maps it onto a status and never looks further.
//!
//! Which backend is used is decided once at startup and injected into each
//! [`Disseminator`](crate::Disseminator) that has authorization turned on.

use std::collections::HashSet;

use async_trait::async_trait;
use http::header::AUTHORIZATION;

use crate::request::Request;

/// Outcome of an authorization check.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Decision {
    Allow,
    Deny,
    /// The checker could not find the object. Surfaces as `404`.
    NotFound,
    /// The checker itself failed. Surfaces as `500`.
    Error,
}

#[async_trait]
pub trait Authorizer: Send + Sync + 'static {
    async fn check(&self, req: &Request, pid: &str) -> Decision;
}

/// Allows everything.
pub struct AllowAll;

#[async_trait]
impl Authorizer for AllowAll {
    async fn check(&self, _req: &Request, _pid: &str) -> Decision {
        Decision::Allow
    }
}

/// Allows requests carrying `Authorization: Bearer <token>` for one of a
/// fixed set of tokens; everything else is denied.
pub struct BearerTokens {
    tokens: HashSet<String>,
}

impl BearerTokens {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { tokens: tokens.into_iter().map(Into::into).collect() }
    }

    pub fn is_empty(&self) -> bool { self.tokens.is_empty() }
}

#[async_trait]
impl Authorizer for BearerTokens {
    async fn check(&self, req: &Request, _pid: &str) -> Decision {
        let presented = req
            .header(AUTHORIZATION.as_str())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim);
        match presented {
            Some(token) if self.tokens.contains(token) => Decision::Allow,
            _ => Decision::Deny,
        }
    }
}
