//! Session cookie handling.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::time::Duration;

/// Name of the browser session cookie.
pub const SESSION_COOKIE: &str = "session_token";

/// Session token carried by the request, if any.
pub fn session_token(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE)
        .map(Cookie::value)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Cookie establishing a session.
pub fn session_cookie(token: String, max_age: Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::try_from(max_age).unwrap_or(time::Duration::MAX))
        .secure(secure)
        .build()
}

/// Drop the session cookie from the browser.
pub fn clear_session(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/").build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderMap, HeaderValue};

    fn jar(cookies: &[&'static str]) -> CookieJar {
        let mut headers = HeaderMap::new();
        for cookie in cookies {
            headers.append(header::COOKIE, HeaderValue::from_static(cookie));
        }
        CookieJar::from_headers(&headers)
    }

    fn set_cookie_headers(jar: CookieJar) -> Vec<String> {
        use axum::response::IntoResponse;

        let response = (jar, ()).into_response();
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|value| value.to_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_session_token_found_among_cookies() {
        let jar = jar(&["theme=dark; session_token=abc123; lang=en"]);
        assert_eq!(session_token(&jar).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_session_token_across_cookie_headers() {
        let jar = jar(&["theme=dark", "session_token=xyz"]);
        assert_eq!(session_token(&jar).as_deref(), Some("xyz"));
    }

    #[test]
    fn test_session_token_missing_or_empty() {
        assert!(session_token(&jar(&[])).is_none());
        assert!(session_token(&jar(&["session_token="])).is_none());
        assert!(session_token(&jar(&["other_session_token=abc"])).is_none());
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("tok".into(), Duration::from_secs(60), false);
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), "tok");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(60)));
        assert_ne!(cookie.secure(), Some(true));

        let secure = session_cookie("tok".into(), Duration::from_secs(60), true);
        assert_eq!(secure.secure(), Some(true));
    }

    #[test]
    fn test_clear_session_expires_cookie() {
        let headers = set_cookie_headers(clear_session(jar(&["session_token=abc"])));
        assert_eq!(headers.len(), 1);
        assert!(headers[0].starts_with("session_token=;"));
        assert!(headers[0].contains("Max-Age=0"));
    }
}
