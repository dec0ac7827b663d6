//! Preview authorization gate.
//!
//! Two states: published (default) and preview. Entering preview requires
//! the shared secret; the grant is a single HTTP-only capability cookie
//! with no identity and no server-side session. Leaving preview requires
//! nothing: the transition back to the safer state is unprotected on
//! purpose.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use subtle::ConstantTimeEq;
use thiserror::Error;

pub const PREVIEW_COOKIE: &str = "preview_mode";
const PREVIEW_COOKIE_VALUE: &str = "true";
const PREVIEW_MAX_AGE: time::Duration = time::Duration::hours(24);

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("preview secret is not configured")]
    Unconfigured,
    #[error("preview secret mismatch")]
    BadSecret,
}

pub struct PreviewGate {
    secret: Option<String>,
    secure_cookies: bool,
}

impl PreviewGate {
    pub fn new(secret: Option<String>, secure_cookies: bool) -> Self {
        Self {
            secret,
            secure_cookies,
        }
    }

    /// Constant-time comparison against the configured secret.
    pub fn authorize(&self, candidate: &str) -> Result<(), PreviewError> {
        let secret = self.secret.as_ref().ok_or(PreviewError::Unconfigured)?;
        if secret.as_bytes().ct_eq(candidate.as_bytes()).unwrap_u8() == 1 {
            Ok(())
        } else {
            Err(PreviewError::BadSecret)
        }
    }

    /// Cookie granting preview capability. Possession alone is sufficient:
    /// the value carries no identity, the attributes carry the hardening.
    pub fn grant_cookie(&self) -> Cookie<'static> {
        Cookie::build((PREVIEW_COOKIE, PREVIEW_COOKIE_VALUE))
            .http_only(true)
            .secure(self.secure_cookies)
            .same_site(SameSite::Lax)
            .max_age(PREVIEW_MAX_AGE)
            .path("/")
            .build()
    }

    /// Expired clone of the grant cookie, used to clear it client-side.
    pub fn revoke_cookie(&self) -> Cookie<'static> {
        let mut cookie = self.grant_cookie();
        cookie.set_value("");
        cookie.set_max_age(time::Duration::ZERO);
        cookie
    }

    /// Whether the request carries the preview capability.
    pub fn is_preview(jar: &CookieJar) -> bool {
        jar.get(PREVIEW_COOKIE)
            .is_some_and(|cookie| cookie.value() == PREVIEW_COOKIE_VALUE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> PreviewGate {
        PreviewGate::new(Some("abc123".to_string()), false)
    }

    #[test]
    fn matching_secret_authorizes() {
        assert!(gate().authorize("abc123").is_ok());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        assert!(matches!(
            gate().authorize("WRONG"),
            Err(PreviewError::BadSecret)
        ));
        // Length mismatch takes the same path as a content mismatch.
        assert!(matches!(
            gate().authorize("abc1234"),
            Err(PreviewError::BadSecret)
        ));
    }

    #[test]
    fn unconfigured_secret_never_authorizes() {
        let gate = PreviewGate::new(None, false);
        assert!(matches!(
            gate.authorize("abc123"),
            Err(PreviewError::Unconfigured)
        ));
    }

    #[test]
    fn grant_cookie_attributes() {
        let cookie = gate().grant_cookie();
        assert_eq!(cookie.name(), PREVIEW_COOKIE);
        assert_eq!(cookie.value(), "true");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(PREVIEW_MAX_AGE));
        assert_eq!(cookie.secure(), Some(false));

        let production = PreviewGate::new(Some("s".to_string()), true);
        assert_eq!(production.grant_cookie().secure(), Some(true));
    }

    #[test]
    fn revoke_cookie_expires_immediately() {
        let cookie = gate().revoke_cookie();
        assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
        assert_eq!(cookie.value(), "");
    }

    #[test]
    fn jar_detection_requires_the_exact_value() {
        let jar = CookieJar::new().add(Cookie::new(PREVIEW_COOKIE, "true"));
        assert!(PreviewGate::is_preview(&jar));

        let jar = CookieJar::new().add(Cookie::new(PREVIEW_COOKIE, "1"));
        assert!(!PreviewGate::is_preview(&jar));

        assert!(!PreviewGate::is_preview(&CookieJar::new()));
    }
}
