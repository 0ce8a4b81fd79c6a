/// Path utilities for cleaning, query strings and base-path joining
///
/// All functions are **pure**: given same input, always produce same output with no side effects.
use std::borrow::Cow;

use crate::Params;

/// Characters trimmed from both ends of a path before matching or compiling
const TRIM_CHARS: &[char] = &[' ', '\t', '\n', '\r', '\0', '\x0B', '/'];

/// Cleans a path: trims whitespace and slashes at both ends, drops the query string
///
/// # Examples
///
/// ```
/// use rhtmx_i18n_router::path::clean;
///
/// assert_eq!(clean("/fr/accueil/"), "fr/accueil");
/// assert_eq!(clean("  /users/42?tab=posts"), "users/42");
/// assert_eq!(clean("/"), "");
/// ```
pub fn clean(url: &str) -> &str {
    let path = match url.find('?') {
        Some(pos) => &url[..pos],
        None => url,
    };
    path.trim_matches(TRIM_CHARS)
}

/// Returns the raw text after the first `?`, or an empty string
pub fn query_string(url: &str) -> &str {
    url.split_once('?').map(|(_, query)| query).unwrap_or("")
}

/// Parses a query string into ordered key/value pairs
///
/// Keys and values are percent-decoded (`+` is a space). Empty keys are
/// skipped and the last duplicate wins.
///
/// # Examples
///
/// ```
/// use rhtmx_i18n_router::path::parse_query;
///
/// let params = parse_query("hello=world&name=Jean+Luc&empty=");
/// assert_eq!(params.get("hello").map(String::as_str), Some("world"));
/// assert_eq!(params.get("name").map(String::as_str), Some("Jean Luc"));
/// assert_eq!(params.get("empty").map(String::as_str), Some(""));
/// ```
pub fn parse_query(query: &str) -> Params {
    query
        .trim_start_matches('?')
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let key = decode(key);
            if key.is_empty() {
                None
            } else {
                Some((key, decode(value)))
            }
        })
        .collect()
}

/// Builds an encoded query string, keeping the given key order
///
/// # Examples
///
/// ```
/// use rhtmx_i18n_router::{path::build_query, Params};
///
/// let mut params = Params::new();
/// params.insert("q".to_string(), "rust router".to_string());
/// params.insert("page".to_string(), "2".to_string());
/// assert_eq!(build_query(&params), "q=rust%20router&page=2");
/// ```
pub fn build_query(params: &Params) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{}={}", urlencoding::encode(key), urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Joins an already-cleaned base path and template with a single slash
///
/// # Examples
///
/// ```
/// use rhtmx_i18n_router::path::join_base;
///
/// assert_eq!(join_base("fr", "accueil"), "fr/accueil");
/// assert_eq!(join_base("", "accueil"), "accueil");
/// assert_eq!(join_base("fr", ""), "fr");
/// ```
pub fn join_base<'a>(base: &'a str, path: &'a str) -> Cow<'a, str> {
    match (base.is_empty(), path.is_empty()) {
        (false, false) => Cow::Owned(format!("{}/{}", base, path)),
        (true, _) => Cow::Borrowed(path),
        (false, true) => Cow::Borrowed(base),
    }
}

/// Percent-encodes a parameter value for use inside a path
pub fn encode_param(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

fn decode(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .unwrap_or(spaced)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_strips_whitespace_slashes_and_query() {
        assert_eq!(clean("\t/fr/test-arguments/bonjour/1234567890?hello=world"), "fr/test-arguments/bonjour/1234567890");
        assert_eq!(clean("//a//"), "a");
        assert_eq!(clean("?only=query"), "");
        assert_eq!(clean("/fr/accueil/?a=b"), "fr/accueil");
        assert_eq!(clean(" /fr/accueil/ ?a=b"), "fr/accueil");
        assert_eq!(clean(""), "");
    }

    #[test]
    fn test_query_string() {
        assert_eq!(query_string("/a?b=c&d"), "b=c&d");
        assert_eq!(query_string("/a"), "");
        assert_eq!(query_string("/a?x=1?y=2"), "x=1?y=2");
    }

    #[test]
    fn test_parse_query_decodes_and_keeps_order() {
        let params = parse_query("b=2&a=1&b=3&=skip&flag&c=%C3%A9t%C3%A9");
        let keys: Vec<&str> = params.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["b", "a", "flag", "c"]);
        assert_eq!(params["b"], "3");
        assert_eq!(params["flag"], "");
        assert_eq!(params["c"], "été");
    }

    #[test]
    fn test_parse_query_accepts_leading_question_mark() {
        let params = parse_query("?hello=world");
        assert_eq!(params["hello"], "world");
    }

    #[test]
    fn test_build_query_encodes() {
        let mut params = Params::new();
        params.insert("a b".to_string(), "x&y".to_string());
        assert_eq!(build_query(&params), "a%20b=x%26y");
        assert_eq!(build_query(&Params::new()), "");
    }

    #[test]
    fn test_encode_param() {
        assert_eq!(encode_param("hello world/é"), "hello%20world%2F%C3%A9");
    }
}
