//! Admin password checks.
//!
//! The password may arrive in the `x-admin-password` header, the JSON body's
//! `password` field or the `password` query parameter, checked in that order.

use axum::http::HeaderMap;
use pickntrust_core::Settings;
use tracing::warn;

use crate::error::{ApiError, Result};

/// Header carrying the admin password.
pub const ADMIN_PASSWORD_HEADER: &str = "x-admin-password";

/// How strictly a route requires the password.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAccess {
    /// The password is always required.
    Required,
    /// Outside production a missing password is accepted; a wrong one never is.
    RequiredInProduction,
}

/// Picks the first non-empty password from header, body and query.
pub fn supplied_password<'a>(
    headers: &'a HeaderMap,
    body: Option<&'a str>,
    query: Option<&'a str>,
) -> Option<&'a str> {
    headers
        .get(ADMIN_PASSWORD_HEADER)
        .and_then(|v| v.to_str().ok())
        .into_iter()
        .chain(body)
        .chain(query)
        .map(str::trim)
        .find(|p| !p.is_empty())
}

/// Checks a supplied password against the configured one.
///
/// Without a configured `ADMIN_PASSWORD`, development accepts any password
/// while production refuses admin access entirely.
pub fn verify_admin(settings: &Settings, supplied: Option<&str>, access: AdminAccess) -> Result<()> {
    let Some(password) = supplied else {
        if access == AdminAccess::RequiredInProduction && !settings.is_production() {
            return Ok(());
        }
        return Err(ApiError::Unauthorized("admin password required".to_string()));
    };

    match settings.admin_password.as_deref() {
        Some(expected) if expected == password => Ok(()),
        Some(_) => {
            warn!("Rejected admin request with wrong password");
            Err(ApiError::Unauthorized("invalid admin password".to_string()))
        }
        None if settings.is_production() => Err(ApiError::ServiceUnavailable(
            "admin password not configured".to_string(),
        )),
        None => Ok(()),
    }
}
