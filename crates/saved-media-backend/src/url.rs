use crate::error::BackendError;
use reqwest::Url;

fn is_loopback(host: &str) -> bool {
    matches!(host, "localhost" | "127.0.0.1" | "[::1]" | "::1") || host.ends_with(".localhost")
}

/// Normalize a configured backend address into `scheme://host[:port][/path]`
/// without a trailing slash.
///
/// A missing scheme means https, except for loopback hosts which get http.
/// With `force_https`, an explicit `http://` is upgraded for non-loopback
/// hosts.
pub fn normalize_base_url(raw: &str, force_https: bool) -> Result<String, BackendError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(BackendError::InvalidBaseUrl(raw.to_string()));
    }

    let has_scheme = trimmed.contains("://");
    let candidate = if has_scheme {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed.trim_start_matches("//"))
    };

    let mut url = Url::parse(&candidate).map_err(|_| BackendError::InvalidBaseUrl(raw.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(BackendError::InvalidBaseUrl(raw.to_string()));
    }
    let loopback = url.host_str().map(is_loopback).unwrap_or(false);

    let upgrade = url.scheme() == "http" && !loopback && (force_https || !has_scheme);
    if upgrade && url.set_scheme("https").is_err() {
        return Err(BackendError::InvalidBaseUrl(raw.to_string()));
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}
