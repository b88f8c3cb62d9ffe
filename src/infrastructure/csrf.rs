//! CSRF token lookup for the dashboard's POST endpoints.
//!
//! Resolution order: `csrftoken` cookie, `<meta name="csrf-token">`, empty.

use wasm_bindgen::JsCast;
use web_sys::HtmlDocument;

pub const CSRF_COOKIE: &str = "csrftoken";
pub const CSRF_HEADER: &str = "X-CSRFToken";
pub const CSRF_META_SELECTOR: &str = r#"meta[name="csrf-token"]"#;

/// Finds `csrftoken` in a `document.cookie` string.
///
/// Only the text between the first and second `=` counts as the value.
pub fn token_from_cookie(cookie: &str) -> Option<String> {
    cookie.split(';').find_map(|pair| {
        let mut parts = pair.trim().split('=');
        match (parts.next(), parts.next()) {
            (Some(CSRF_COOKIE), value) => Some(value.unwrap_or_default().to_string()),
            _ => None,
        }
    })
}

pub fn resolve_token(cookie: &str, meta_content: Option<String>) -> String {
    token_from_cookie(cookie).or(meta_content).unwrap_or_default()
}

/// Token for the current document; empty outside a browser page.
pub fn current_token() -> String {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return String::new();
    };
    let cookie = document
        .dyn_ref::<HtmlDocument>()
        .and_then(|html| html.cookie().ok())
        .unwrap_or_default();
    let meta = document
        .query_selector(CSRF_META_SELECTOR)
        .ok()
        .flatten()
        .and_then(|el| el.get_attribute("content"));
    resolve_token(&cookie, meta)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_wins_over_meta() {
        assert_eq!(resolve_token("sessionid=1; csrftoken=abc", Some("meta".into())), "abc");
        assert_eq!(resolve_token("sessionid=1", Some("meta".into())), "meta");
        assert_eq!(resolve_token("", None), "");
    }

    #[test]
    fn value_stops_at_second_equals() {
        assert_eq!(token_from_cookie("csrftoken=a=b").as_deref(), Some("a"));
        assert_eq!(token_from_cookie("xcsrftoken=zzz"), None);
    }
}
