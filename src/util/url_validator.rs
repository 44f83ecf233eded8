use std::net::IpAddr;
use thiserror::Error;
use url::Url;

/// Errors from validating the feed API base URL.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// Plain HTTP to a remote host would expose the API key.
    #[error("Insecure API URL: HTTPS required (except localhost)")]
    InsecureScheme,
    #[error("URL has no host")]
    MissingHost,
}

/// Validates the base URL of the feed API.
///
/// Accepts `https` URLs, and `http` only for loopback hosts (local
/// development servers and tests).
///
/// # Examples
///
/// ```
/// use newsdesk::util::validate_api_url;
///
/// assert!(validate_api_url("https://news.example/api/feed").is_ok());
/// assert!(validate_api_url("http://127.0.0.1:8080/feed").is_ok());
/// assert!(validate_api_url("http://news.example/api/feed").is_err());
/// assert!(validate_api_url("ftp://news.example").is_err());
/// ```
pub fn validate_api_url(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str.trim())?;
    let host = url.host_str().ok_or(UrlValidationError::MissingHost)?;

    match url.scheme() {
        "https" => {}
        "http" if is_loopback_host(host) => {
            tracing::warn!(url = %url, "Using non-HTTPS API URL (localhost only)");
        }
        "http" => return Err(UrlValidationError::InsecureScheme),
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }

    Ok(url)
}

fn is_loopback_host(host: &str) -> bool {
    if host == "localhost" {
        return true;
    }
    // Strip brackets from IPv6 addresses for parsing
    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    host.parse::<IpAddr>().is_ok_and(|ip| ip.is_loopback())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_https_accepted() {
        let url = validate_api_url("https://news.example/api/feed").unwrap();
        assert_eq!(url.host_str(), Some("news.example"));
        assert_eq!(url.path(), "/api/feed");
    }

    #[test]
    fn test_http_localhost_accepted() {
        assert!(validate_api_url("http://localhost:3000/feed").is_ok());
        assert!(validate_api_url("http://127.0.0.1:3000/feed").is_ok());
        assert!(validate_api_url("http://[::1]:3000/feed").is_ok());
    }

    #[test]
    fn test_http_remote_rejected() {
        assert!(matches!(
            validate_api_url("http://news.example/feed"),
            Err(UrlValidationError::InsecureScheme)
        ));
        assert!(matches!(
            validate_api_url("http://192.168.1.10/feed"),
            Err(UrlValidationError::InsecureScheme)
        ));
    }

    #[test]
    fn test_other_schemes_rejected() {
        assert!(matches!(
            validate_api_url("file:///etc/passwd"),
            Err(UrlValidationError::MissingHost) | Err(UrlValidationError::UnsupportedScheme(_))
        ));
        assert!(matches!(
            validate_api_url("ftp://news.example/feed"),
            Err(UrlValidationError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(
            validate_api_url("not a url"),
            Err(UrlValidationError::InvalidUrl(_))
        ));
    }
}
