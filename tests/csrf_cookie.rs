use account_dashboard_wasm::infrastructure::csrf::{resolve_token, token_from_cookie};
use quickcheck::TestResult;
use quickcheck_macros::quickcheck;

fn cookie_safe(raw: &str) -> bool {
    !raw.is_empty() && raw.chars().all(|c| c.is_ascii_alphanumeric() || "-_.".contains(c))
}

#[quickcheck]
fn token_found_among_other_cookies(before: String, token: String, after: String) -> TestResult {
    if !cookie_safe(&before) || !cookie_safe(&token) || !cookie_safe(&after) {
        return TestResult::discard();
    }
    let cookie = format!("a{before}={before}; csrftoken={token}; z{after}={after}");
    TestResult::from_bool(token_from_cookie(&cookie) == Some(token))
}

#[quickcheck]
fn meta_is_used_only_without_cookie(meta: String) -> bool {
    resolve_token("sessionid=abc", Some(meta.clone())) == meta
        && resolve_token("csrftoken=cookie", Some(meta)) == "cookie"
}

#[test]
fn missing_everywhere_is_empty() {
    assert_eq!(resolve_token("", None), "");
    assert_eq!(token_from_cookie("csrftoken"), Some(String::new()));
}
