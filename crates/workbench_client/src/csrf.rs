use std::borrow::Cow;

/// Cookie the backend stores its CSRF token in.
pub const CSRF_COOKIE: &str = "csrftoken";
/// Header that echoes the token back on mutating requests.
pub const CSRF_HEADER: &str = "X-CSRFToken";

/// Read access to the cookies the backend has set.
pub trait CookieAccessor {
    /// The cookies as a `Cookie` request header value, if any are stored.
    fn cookie_header(&self) -> Option<String>;

    fn cookie(&self, name: &str) -> Option<String> {
        parse_cookie(&self.cookie_header()?, name)
    }

    fn csrf_token(&self) -> Option<String> {
        self.cookie(CSRF_COOKIE)
    }
}

/// Looks up `name` in a `Cookie` header. The first entry whose trimmed text
/// starts with exactly `name=` wins; its value is percent-decoded, or kept
/// as-is if it does not decode to UTF-8.
pub fn parse_cookie(header: &str, name: &str) -> Option<String> {
    if name.is_empty() {
        return None;
    }
    let prefix = format!("{name}=");
    header
        .split(';')
        .map(str::trim)
        .find_map(|entry| entry.strip_prefix(prefix.as_str()))
        .map(|raw| {
            urlencoding::decode(raw)
                .map(Cow::into_owned)
                .unwrap_or_else(|_| raw.to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Header(&'static str);

    impl CookieAccessor for Header {
        fn cookie_header(&self) -> Option<String> {
            Some(self.0.to_string())
        }
    }

    #[test]
    fn exact_name_match_is_required() {
        let header = "xcsrftoken=nope; csrftoken=abc123; other=1";
        assert_eq!(parse_cookie(header, "csrftoken").as_deref(), Some("abc123"));
        assert_eq!(parse_cookie(header, "csrf"), None);
    }

    #[test]
    fn values_are_percent_decoded() {
        assert_eq!(
            Header("csrftoken=a%2Fb%20c").csrf_token().as_deref(),
            Some("a/b c")
        );
    }

    #[test]
    fn plus_is_not_a_space() {
        assert_eq!(parse_cookie("t=a+b", "t").as_deref(), Some("a+b"));
    }

    #[test]
    fn missing_cookie_is_none() {
        assert_eq!(Header("").csrf_token(), None);
        assert_eq!(parse_cookie("sessionid=1", "csrftoken"), None);
    }
}
