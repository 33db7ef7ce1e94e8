use url::Url;

/// Extracts the politeness key of a URL: the lowercase host plus any
/// explicit port
///
/// Returns None if the URL has no host.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use paper_harvest::url::extract_host;
///
/// let url = Url::parse("https://NIPS.cc/Conferences/2023/Schedule").unwrap();
/// assert_eq!(extract_host(&url), Some("nips.cc".to_string()));
///
/// let url = Url::parse("http://127.0.0.1:8080/papers").unwrap();
/// assert_eq!(extract_host(&url), Some("127.0.0.1:8080".to_string()));
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    })
}
