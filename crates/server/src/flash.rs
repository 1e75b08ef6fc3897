//! Flash messages travel to the next request in a cookie holding
//! base64url-encoded JSON.

use api_types::Flash;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};

pub(crate) const FLASH_COOKIE: &str = "flash";

pub(crate) fn encode(flash: &Flash) -> String {
    match serde_json::to_vec(flash) {
        Ok(json) => URL_SAFE_NO_PAD.encode(json),
        Err(err) => {
            tracing::error!("failed to encode flash: {err}");
            String::new()
        }
    }
}

/// Malformed cookies decode to `None`.
pub(crate) fn decode(value: &str) -> Option<Flash> {
    let json = URL_SAFE_NO_PAD.decode(value).ok()?;
    serde_json::from_slice(&json).ok()
}

/// Queue `flash` for the next request.
pub(crate) fn set(jar: CookieJar, flash: Flash) -> CookieJar {
    jar.add(
        Cookie::build((FLASH_COOKIE, encode(&flash)))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax),
    )
}

pub(crate) fn clear(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(FLASH_COOKIE).path("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use api_types::FlashKind;

    #[test]
    fn flash_survives_the_cookie() {
        let flash = Flash::success("Welcome, New User!");
        let value = encode(&flash);
        assert!(!value.contains(' '));
        assert_eq!(decode(&value), Some(flash));
    }

    #[test]
    fn garbage_is_ignored() {
        assert_eq!(decode("not base64!"), None);
        assert_eq!(decode(&URL_SAFE_NO_PAD.encode(b"{\"kind\":1}")), None);
    }

    #[test]
    fn set_adds_cookie() {
        let jar = set(CookieJar::new(), Flash::notice("hi"));
        let cookie = jar.get(FLASH_COOKIE).map(|c| c.value().to_string());
        let flash = cookie.as_deref().and_then(decode);
        assert_eq!(flash.map(|f| f.kind), Some(FlashKind::Notice));
    }
}
