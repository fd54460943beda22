use actix_web::HttpRequest;
use secrecy::{ExposeSecret, Secret};

pub const ADMIN_SECRET_HEADER: &str = "X-Admin-Secret";

/// The shared secret guarding the admin surface. A single static string
/// compared for exact equality, not a capability or session token.
pub struct AdminSecret(pub Secret<String>);

#[derive(thiserror::Error, Debug)]
#[error("The admin secret is missing or does not match.")]
pub struct AdminAuthError;

pub fn require_admin(request: &HttpRequest, expected: &AdminSecret) -> Result<(), AdminAuthError> {
    let provided = request
        .headers()
        .get(ADMIN_SECRET_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(AdminAuthError)?;

    if provided == expected.0.expose_secret() {
        Ok(())
    } else {
        Err(AdminAuthError)
    }
}
