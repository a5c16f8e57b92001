//! The HTTP status codes the gateway can answer with.
//!
//! The dissemination pipeline has a small, closed set of outcomes, so this
//! is a closed enum rather than a raw `u16`. Anything a client can observe
//! from the gateway is one of these.
//!
//! ```rust
//! use disadis::{Response, Status};
//!
//! let resp = Response::error(Status::Forbidden);
//! assert_eq!(resp.status(), Status::Forbidden);
//! ```

use std::fmt;

/// Status codes produced by the gateway.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Status {
    Ok,                  // 200
    NotModified,         // 304
    Unauthorized,        // 401
    Forbidden,           // 403
    NotFound,            // 404
    InternalServerError, // 500
}

impl Status {
    pub fn code(self) -> u16 {
        match self {
            Self::Ok                  => 200,
            Self::NotModified         => 304,
            Self::Unauthorized        => 401,
            Self::Forbidden           => 403,
            Self::NotFound            => 404,
            Self::InternalServerError => 500,
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            Self::Ok                  => "OK",
            Self::NotModified         => "Not Modified",
            Self::Unauthorized        => "Unauthorized",
            Self::Forbidden           => "Forbidden",
            Self::NotFound            => "Not Found",
            Self::InternalServerError => "Internal Server Error",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.reason())
    }
}

impl From<Status> for http::StatusCode {
    fn from(s: Status) -> Self {
        match s {
            Status::Ok                  => http::StatusCode::OK,
            Status::NotModified         => http::StatusCode::NOT_MODIFIED,
            Status::Unauthorized        => http::StatusCode::UNAUTHORIZED,
            Status::Forbidden           => http::StatusCode::FORBIDDEN,
            Status::NotFound            => http::StatusCode::NOT_FOUND,
            Status::InternalServerError => http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
