//! Visitor identity: a self-chosen display name carried in a signed cookie.
//!
//! Nothing is stored server side. The cookie is site wide, so a name set on
//! one share follows the browser to every other share.

use axum_extra::extract::cookie::{Cookie, Key, SameSite, SignedCookieJar};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

pub const SESSION_COOKIE: &str = "user-session";

/// Lifetime of a bound name
pub const SESSION_MAX_AGE: time::Duration = time::Duration::days(30);

/// Largest encoded name a cookie can carry. Browsers drop cookies over
///  4 KiB, and the signature and attributes need the rest.
pub const MAX_ENCODED_NAME_BYTES: usize = 3 * 1024;

/// Bind `name` to the session carried by `jar`, replacing any earlier name
pub fn bind(
    jar: SignedCookieJar,
    name: &str,
    secure: bool,
) -> Result<SignedCookieJar, IdentityError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(IdentityError::EmptyName);
    }

    // cookie values can't carry arbitrary text, so the name travels encoded
    let encoded = URL_SAFE_NO_PAD.encode(name);
    if encoded.len() > MAX_ENCODED_NAME_BYTES {
        return Err(IdentityError::NameTooLarge);
    }

    let cookie = Cookie::build((SESSION_COOKIE, encoded))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(SESSION_MAX_AGE);

    Ok(jar.add(cookie))
}

/// The name bound to this session, if any. Cookies that fail signature
///  verification never reach here.
pub fn resolve(jar: &SignedCookieJar) -> Option<String> {
    let cookie = jar.get(SESSION_COOKIE)?;
    let raw = URL_SAFE_NO_PAD.decode(cookie.value()).ok()?;
    let name = String::from_utf8(raw).ok()?;

    if name.trim().is_empty() {
        return None;
    }
    Some(name)
}

/// Signing key from configured secret bytes, or a throwaway key when none
///  is configured
pub fn session_key(secret: Option<&[u8]>) -> Result<Key, IdentityError> {
    match secret {
        Some(bytes) => Key::try_from(bytes).map_err(|_| IdentityError::ShortSecret(bytes.len())),
        None => {
            tracing::warn!("no session secret configured, visitor names will not survive a restart");
            Ok(Key::generate())
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("display name is required")]
    EmptyName,

    #[error("display name does not fit in a session cookie")]
    NameTooLarge,

    #[error("session secret must be at least 64 bytes, got {0}")]
    ShortSecret(usize),
}
