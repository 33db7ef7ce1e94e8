use crate::UrlError;
use url::Url;

/// List of tracking query parameters to remove during canonicalization
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_eid", "ref"];

/// Canonicalizes a URL for visited-set membership
///
/// # Canonicalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Require HTTP or HTTPS
/// 3. Lowercase the host (the `url` crate already does this)
/// 4. Collapse repeated slashes and resolve dot segments in the path
/// 5. Remove a trailing slash (except for root /)
/// 6. Remove the fragment
/// 7. Drop tracking parameters and sort the rest by key
///
/// The scheme and `www.` prefix are left alone: several venues serve
/// different content on different hosts.
///
/// # Examples
///
/// ```
/// use paper_harvest::url::canonicalize_url;
///
/// let url = canonicalize_url("https://NIPS.cc/Conferences/2023/Schedule/?showEvent=7#abstract").unwrap();
/// assert_eq!(url.as_str(), "https://nips.cc/Conferences/2023/Schedule?showEvent=7");
/// ```
pub fn canonicalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);

    url.set_fragment(None);

    if url.query().is_some() {
        let params = filter_and_sort_query_params(&url);
        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(params);
        }
    }

    Ok(url)
}

/// Normalizes a URL path by removing dot segments and trailing slashes
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    format!("/{}", segments.join("/"))
}

/// Filters out tracking parameters and sorts remaining query parameters
fn filter_and_sort_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    params.sort_by(|a, b| a.0.cmp(&b.0));
    params
}

fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}
