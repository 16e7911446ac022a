//! Basic-auth gate for inbound push calls.

use crate::api::ApiResponse;
use crate::config::BasicAuthCredentials;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    Authorized,
    Forbidden,
}

impl AuthOutcome {
    /// The 403 reply for `Forbidden`, `None` when the call may proceed.
    pub fn rejection(self) -> Option<ApiResponse> {
        match self {
            Self::Authorized => None,
            Self::Forbidden => Some(ApiResponse::forbidden()),
        }
    }
}

/// Checks an `Authorization` header value against the shared credentials.
pub fn authorize(header: Option<&str>, expected: &BasicAuthCredentials) -> AuthOutcome {
    match decode_basic(header) {
        Some((username, password))
            if username == expected.username && password == expected.password =>
        {
            AuthOutcome::Authorized
        }
        Some(_) => {
            warn!("event=api_auth module=api status=forbidden reason=bad_credentials");
            AuthOutcome::Forbidden
        }
        None => {
            warn!("event=api_auth module=api status=forbidden reason=malformed_header");
            AuthOutcome::Forbidden
        }
    }
}

/// `Basic <base64(user:pass)>` to `(user, pass)`; the scheme is
/// case-insensitive and the password may contain `:`.
fn decode_basic(header: Option<&str>) -> Option<(String, String)> {
    let (scheme, payload) = header?.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(payload.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}
