use crate::{UrlError, UrlResult};
use url::{Host, Url};

/// Extracts the registrable domain from a URL
///
/// This is the domain an operator would register: the public suffix of the
/// host (looked up in the Public Suffix List, private registries such as
/// `github.io` included) plus one label. IP hosts, hosts that are themselves a
/// public suffix and hosts whose suffix is not a known public suffix have no
/// registrable domain.
///
/// # Examples
///
/// ```
/// use deepshot::url::registrable_domain;
///
/// assert_eq!(registrable_domain("https://docs.Example.com/a").unwrap(), "example.com");
/// assert_eq!(registrable_domain("https://shop.example.co.uk/").unwrap(), "example.co.uk");
/// assert!(registrable_domain("http://127.0.0.1/").is_err());
/// ```
pub fn registrable_domain(url_str: &str) -> UrlResult<String> {
    let url = Url::parse(url_str).map_err(|e| UrlError::Parse(format!("{}: {}", url_str, e)))?;

    let host = match url.host() {
        Some(Host::Domain(domain)) => domain.trim_end_matches('.').to_lowercase(),
        _ => return Err(UrlError::MissingDomain(url_str.to_string())),
    };

    let domain = psl::domain(host.as_bytes())
        .filter(|domain| domain.suffix().is_known())
        .ok_or_else(|| UrlError::MissingDomain(url_str.to_string()))?;

    std::str::from_utf8(domain.as_bytes())
        .map(str::to_string)
        .map_err(|_| UrlError::MissingDomain(url_str.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_domain() {
        assert_eq!(registrable_domain("https://example.com/").unwrap(), "example.com");
    }

    #[test]
    fn test_subdomain_collapses() {
        assert_eq!(
            registrable_domain("https://api.v2.example.com/endpoint").unwrap(),
            "example.com"
        );
    }

    #[test]
    fn test_port_and_case_ignored() {
        assert_eq!(
            registrable_domain("https://WWW.Example.COM:8080/x").unwrap(),
            "example.com"
        );
    }

    #[test]
    fn test_country_second_level() {
        assert_eq!(
            registrable_domain("https://blog.example.co.uk/post").unwrap(),
            "example.co.uk"
        );
        assert_eq!(
            registrable_domain("https://example.com.au").unwrap(),
            "example.com.au"
        );
    }

    #[test]
    fn test_two_letter_tld_without_second_level() {
        assert_eq!(registrable_domain("https://news.example.de/").unwrap(), "example.de");
    }

    #[test]
    fn test_ip_host_rejected() {
        assert!(matches!(
            registrable_domain("http://127.0.0.1:8080/"),
            Err(UrlError::MissingDomain(_))
        ));
    }

    #[test]
    fn test_single_label_rejected() {
        assert!(registrable_domain("http://localhost:3000/").is_err());
    }

    #[test]
    fn test_no_host_rejected() {
        assert!(registrable_domain("mailto:someone@example.com").is_err());
        assert!(registrable_domain("javascript:void(0)").is_err());
    }

    #[test]
    fn test_unparseable_rejected() {
        assert!(matches!(registrable_domain("not a url"), Err(UrlError::Parse(_))));
    }

    #[test]
    fn test_numeric_tld_rejected() {
        assert!(registrable_domain("http://example.123/").is_err());
    }

    #[test]
    fn test_unknown_suffix_rejected() {
        assert!(matches!(
            registrable_domain("https://www.example.notatld/"),
            Err(UrlError::MissingDomain(_))
        ));
    }

    #[test]
    fn test_private_registry_suffix() {
        assert_eq!(
            registrable_domain("https://alice.github.io/x").unwrap(),
            "alice.github.io"
        );
    }

    #[test]
    fn test_multi_label_public_suffix() {
        assert_eq!(
            registrable_domain("https://www.example.ltd.uk/").unwrap(),
            "example.ltd.uk"
        );
    }

    #[test]
    fn test_bare_public_suffix_rejected() {
        assert!(registrable_domain("https://co.uk/").is_err());
        assert!(registrable_domain("https://github.io/").is_err());
    }
}
