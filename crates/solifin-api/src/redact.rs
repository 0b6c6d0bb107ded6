use std::borrow::Cow;

/// Cookie names whose values must never reach a log line
const SECRET_COOKIES: [&str; 3] = ["XSRF-TOKEN=", "laravel_session=", "solifin_session="];

/// Header names whose whole value is masked up to end of line
const SECRET_HEADERS: [&str; 3] = ["cookie:", "x-xsrf-token:", "authorization:"];

fn find_ascii_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    let hay = haystack.as_bytes();
    let nee = needle.as_bytes();
    if nee.is_empty() || nee.len() > hay.len() {
        return None;
    }
    (0..=hay.len() - nee.len()).find(|&i| hay[i..i + nee.len()].eq_ignore_ascii_case(nee))
}

fn redact_until(text: &str, marker: &str, stop: impl Fn(char) -> bool) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(idx) = find_ascii_case_insensitive(rest, marker) {
        let value_start = idx + marker.len();
        out.push_str(&rest[..value_start]);
        rest = &rest[value_start..];

        // Keep one separating space after a header name
        if rest.starts_with(' ') {
            out.push(' ');
            rest = &rest[1..];
        }

        let consumed: usize = rest
            .chars()
            .take_while(|ch| !stop(*ch))
            .map(char::len_utf8)
            .sum();
        out.push_str("REDACTED");
        rest = &rest[consumed..];
    }
    out.push_str(rest);
    out
}

/// Mask session cookies and credential headers in free-form text
/// (error messages, debug dumps) before it is logged.
pub fn redact_secrets(input: &str) -> Cow<'_, str> {
    let mut value = input.to_string();

    for header in SECRET_HEADERS {
        value = redact_until(&value, header, |ch| ch == '\n' || ch == '\r');
    }
    for cookie in SECRET_COOKIES {
        value = redact_until(&value, cookie, |ch| ch == ';' || ch.is_whitespace());
    }

    if value == input {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redact_secrets_redacts_cookie_header_line() {
        let input = "Cookie: laravel_session=abc123; theme=dark\nAccept: application/json\n";
        let out = redact_secrets(input).to_string();
        assert!(out.contains("Cookie: REDACTED\n"));
        assert!(out.contains("Accept: application/json\n"));
        assert!(!out.contains("abc123"));
    }

    #[test]
    fn redact_secrets_redacts_inline_cookie_values() {
        let input = "set-cookie XSRF-TOKEN=eyJpdiI6; path=/";
        let out = redact_secrets(input).to_string();
        assert_eq!(out, "set-cookie XSRF-TOKEN=REDACTED; path=/");
    }

    #[test]
    fn redact_secrets_redacts_xsrf_header_case_insensitively() {
        let input = "x-xsrf-token: abc%3D\n";
        assert_eq!(redact_secrets(input), "x-xsrf-token: REDACTED\n");
    }

    #[test]
    fn redact_secrets_borrows_clean_input() {
        let input = "error sending request for url (https://api.solifin.com/whoami)";
        assert!(matches!(redact_secrets(input), Cow::Borrowed(_)));
    }
}
