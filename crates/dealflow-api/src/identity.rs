use std::convert::Infallible;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts, http::HeaderMap};

use dealflow_persist::CallerIdentity;

/// Headers set by the identity gateway after it has verified the caller.
pub const SUBJECT_HEADER: &str = "x-caller-subject";
pub const EMAIL_HEADER: &str = "x-caller-email";
pub const NAME_HEADER: &str = "x-caller-name";

/// The authenticated caller, if any.
///
/// Extraction never rejects; each operation decides whether a missing
/// identity is an error or an empty result.
#[derive(Debug, Clone)]
pub struct Caller(pub Option<CallerIdentity>);

impl Caller {
    pub fn identity(&self) -> Option<&CallerIdentity> {
        self.0.as_ref()
    }
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = header(&parts.headers, SUBJECT_HEADER).map(|subject| CallerIdentity {
            subject,
            email: header(&parts.headers, EMAIL_HEADER),
            name: header(&parts.headers, NAME_HEADER),
        });
        Ok(Caller(identity))
    }
}
