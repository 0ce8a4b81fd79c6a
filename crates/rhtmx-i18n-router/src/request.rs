// File: src/request.rs
// Purpose: Request data the router works from, settable for CLI and tests

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::path;
use crate::Params;

/// Schemes accepted by [`RequestContext::set_scheme`], besides `//`
pub const REQUEST_SCHEMES: &[&str] = &["http", "https", "ftp"];

static HOST_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?$").unwrap());

/// Response type requested by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HttpAccept {
    #[default]
    Html,
    Json,
    Xml,
}

impl HttpAccept {
    /// Detects the type from an `Accept` header (`text/html` first, then
    /// `application/json`, then `application/xml`)
    pub fn from_header(header: &str) -> Self {
        if header.contains("text/html") {
            HttpAccept::Html
        } else if header.contains("application/json") {
            HttpAccept::Json
        } else if header.contains("application/xml") {
            HttpAccept::Xml
        } else {
            HttpAccept::Html
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpAccept::Html => "html",
            HttpAccept::Json => "json",
            HttpAccept::Xml => "xml",
        }
    }
}

impl fmt::Display for HttpAccept {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request context: method, scheme, host, path and query of the current request
///
/// The router never reads process-wide state; the HTTP layer (or a test)
/// fills this in.
///
/// # Examples
///
/// ```
/// use rhtmx_i18n_router::{HttpAccept, RequestContext};
///
/// let request = RequestContext::new()
///     .with_method("post")
///     .with_scheme("https")
///     .with_host("https://www.example.com/")
///     .with_uri("/fr/contact?sent=1")
///     .with_accept("application/json, */*");
///
/// assert_eq!(request.method(), "POST");
/// assert_eq!(request.host(), "www.example.com");
/// assert_eq!(request.path(), "fr/contact");
/// assert_eq!(request.http_accept(), HttpAccept::Json);
/// assert_eq!(request.build_base_url(false, None), "https://www.example.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    method: String,
    scheme: String,
    host: String,
    path: String,
    query: String,
    document_root: String,
    accept: String,
    ajax: bool,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self {
            method: "GET".to_string(),
            scheme: "http".to_string(),
            host: String::new(),
            path: String::new(),
            query: String::new(),
            document_root: String::new(),
            accept: String::new(),
            ajax: false,
        }
    }
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_method(mut self, method: &str) -> Self {
        self.set_method(method);
        self
    }

    /// Ignored unless accepted by [`set_scheme`](Self::set_scheme)
    pub fn with_scheme(mut self, scheme: &str) -> Self {
        self.set_scheme(scheme);
        self
    }

    /// Ignored unless accepted by [`set_host`](Self::set_host)
    pub fn with_host(mut self, host: &str) -> Self {
        self.set_host(host);
        self
    }

    /// Sets the path (without query string), slashes trimmed
    pub fn with_path(mut self, path: &str) -> Self {
        self.path = path.trim_matches('/').to_string();
        self
    }

    /// Sets the raw query string (leading `?` optional)
    pub fn with_query(mut self, query: &str) -> Self {
        self.query = query.trim_start_matches('?').to_string();
        self
    }

    /// Sets path and query from a request URI such as `/fr/page?x=1`
    pub fn with_uri(self, uri: &str) -> Self {
        let (path, query) = uri.split_once('?').unwrap_or((uri, ""));
        self.with_path(path).with_query(query)
    }

    pub fn with_document_root(mut self, root: &str) -> Self {
        self.document_root = root.to_string();
        self
    }

    pub fn with_accept(mut self, accept: &str) -> Self {
        self.accept = accept.to_string();
        self
    }

    pub fn with_ajax(mut self, ajax: bool) -> Self {
        self.ajax = ajax;
        self
    }

    pub fn set_method(&mut self, method: &str) -> &mut Self {
        self.method = method.trim().to_ascii_uppercase();
        self
    }

    /// Forces the scheme; only `http`, `https`, `ftp` or `//` are accepted
    pub fn set_scheme(&mut self, scheme: &str) -> bool {
        let accepted = scheme == "//" || REQUEST_SCHEMES.contains(&scheme);
        if accepted {
            self.scheme = scheme.to_string();
        }
        accepted
    }

    /// Forces the host
    ///
    /// Anything up to a `//` is dropped, then slashes and spaces are trimmed.
    /// The host is kept only when [`validate_host_name`] accepts it.
    pub fn set_host(&mut self, host: &str) -> bool {
        let host = host.find("//").map_or(host, |pos| &host[pos + 2..]);
        let host = host.trim_matches(['/', ' ']);
        let accepted = validate_host_name(host);
        if accepted {
            self.host = host.to_string();
        }
        accepted
    }

    pub fn set_ajax(&mut self, ajax: bool) -> &mut Self {
        self.ajax = ajax;
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn document_root(&self) -> &str {
        &self.document_root
    }

    pub fn accept(&self) -> &str {
        &self.accept
    }

    pub fn is_ajax(&self) -> bool {
        self.ajax
    }

    pub fn http_accept(&self) -> HttpAccept {
        HttpAccept::from_header(&self.accept)
    }

    pub fn query_params(&self) -> Params {
        path::parse_query(&self.query)
    }

    /// Path and query as requested, with a leading slash
    pub fn uri(&self) -> String {
        if self.query.is_empty() {
            format!("/{}", self.path)
        } else {
            format!("/{}?{}", self.path, self.query)
        }
    }

    /// Builds `scheme://host`, or `//host` for a scheme-relative URL
    ///
    /// `inherit_scheme` forces `//`; a valid `custom_scheme` overrides both.
    pub fn build_base_url(&self, inherit_scheme: bool, custom_scheme: Option<&str>) -> String {
        let mut scheme = if inherit_scheme { "//" } else { self.scheme.as_str() };
        if let Some(custom) = custom_scheme {
            if custom == "//" || REQUEST_SCHEMES.contains(&custom) {
                scheme = custom;
            }
        }

        let host = self.host.trim_matches(['/', ' ']);
        if scheme == "//" {
            format!("//{}", host)
        } else {
            format!("{}://{}", scheme, host)
        }
    }
}

/// Checks a host name, with an optional `:port`
///
/// At most 253 characters; dot-separated labels of 1 to 63 letters, digits or
/// `-`, never starting or ending with `-`.
///
/// # Examples
///
/// ```
/// use rhtmx_i18n_router::request::validate_host_name;
///
/// assert!(validate_host_name("localhost:8080"));
/// assert!(validate_host_name("www.example.com"));
/// assert!(!validate_host_name("-bad-.example.com"));
/// assert!(!validate_host_name("exa mple.com"));
/// ```
pub fn validate_host_name(host: &str) -> bool {
    let (name, port) = match host.rsplit_once(':') {
        Some((name, port)) => (name, Some(port)),
        None => (host, None),
    };

    if let Some(port) = port {
        if port.is_empty() || port.len() > 5 || !port.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
    }

    !name.is_empty() && name.len() <= 253 && name.split('.').all(|label| HOST_LABEL.is_match(label))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("text/html,application/xhtml+xml", HttpAccept::Html)]
    #[case("application/json", HttpAccept::Json)]
    #[case("application/xml;q=0.9", HttpAccept::Xml)]
    #[case("image/png", HttpAccept::Html)]
    #[case("", HttpAccept::Html)]
    fn test_http_accept(#[case] header: &str, #[case] expected: HttpAccept) {
        let request = RequestContext::new().with_accept(header);
        assert_eq!(request.http_accept(), expected);
    }

    #[rstest]
    #[case("example.com", true)]
    #[case("a.b-c.d", true)]
    #[case("127.0.0.1:3000", true)]
    #[case("example.com:", false)]
    #[case("example.com:123456", false)]
    #[case("", false)]
    #[case("a..b", false)]
    #[case("under_score.com", false)]
    fn test_validate_host_name(#[case] host: &str, #[case] valid: bool) {
        assert_eq!(validate_host_name(host), valid);
    }

    #[test]
    fn test_validate_host_name_length_limits() {
        let label = "a".repeat(64);
        assert!(!validate_host_name(&label));
        let long = vec!["a".repeat(63); 4].join(".");
        assert_eq!(long.len(), 255);
        assert!(!validate_host_name(&long));
    }

    #[test]
    fn test_set_host_strips_scheme_and_rejects_invalid() {
        let mut request = RequestContext::new();
        assert!(request.set_host(" //example.org/ "));
        assert_eq!(request.host(), "example.org");
        assert!(!request.set_host("bad host"));
        assert_eq!(request.host(), "example.org");
    }

    #[test]
    fn test_set_scheme_and_base_url() {
        let mut request = RequestContext::new().with_host("example.org");
        assert!(!request.set_scheme("gopher"));
        assert_eq!(request.scheme(), "http");
        assert_eq!(request.build_base_url(false, None), "http://example.org");
        assert_eq!(request.build_base_url(true, None), "//example.org");
        assert_eq!(request.build_base_url(true, Some("ftp")), "ftp://example.org");
        assert_eq!(request.build_base_url(false, Some("nope")), "http://example.org");

        assert!(request.set_scheme("//"));
        assert_eq!(request.build_base_url(false, None), "//example.org");
    }

    #[test]
    fn test_uri_and_query_params() {
        let request = RequestContext::new().with_uri("/fr/test-arguments/bonjour/1234567890?hello=world");
        assert_eq!(request.path(), "fr/test-arguments/bonjour/1234567890");
        assert_eq!(request.query(), "hello=world");
        assert_eq!(request.uri(), "/fr/test-arguments/bonjour/1234567890?hello=world");
        assert_eq!(request.query_params().get("hello").map(String::as_str), Some("world"));
    }
}
