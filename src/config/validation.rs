use crate::config::types::{Config, Tuning};
use crate::url::registrable_domain;
use crate::{ConfigError, ConfigResult};
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_start_url(&config.start_url)?;
    validate_allowed_domains(&config.allowed_domains)?;
    validate_output_dir(config)?;
    validate_tuning(&config.tuning)?;
    Ok(())
}

/// The start URL must be absolute http(s)
fn validate_start_url(start_url: &str) -> ConfigResult<()> {
    let url = Url::parse(start_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid start URL '{}': {}", start_url, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl(format!(
            "Start URL '{}' must use http or https",
            start_url
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "Start URL '{}' has no host",
            start_url
        )));
    }

    Ok(())
}

fn validate_allowed_domains(domains: &[String]) -> ConfigResult<()> {
    if domains.is_empty() {
        return Err(ConfigError::Validation(
            "At least one allowed domain is required".to_string(),
        ));
    }

    for domain in domains {
        validate_domain_string(domain)?;
    }
    Ok(())
}

fn validate_output_dir(config: &Config) -> ConfigResult<()> {
    if config.output_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output_dir cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates tuning values that would stall or break the crawl
fn validate_tuning(tuning: &Tuning) -> ConfigResult<()> {
    if tuning.checkpoint.interval < 1 {
        return Err(ConfigError::Validation(format!(
            "checkpoint interval must be >= 1, got {}",
            tuning.checkpoint.interval
        )));
    }

    if tuning.retry.attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "retry attempts must be >= 1, got {}",
            tuning.retry.attempts
        )));
    }

    Url::parse(&tuning.webdriver.url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid WebDriver URL '{}': {}", tuning.webdriver.url, e)))?;

    Ok(())
}

/// Validates a registrable domain such as `example.com`
fn validate_domain_string(domain: &str) -> ConfigResult<()> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidDomain(
            "Domain cannot be empty".to_string(),
        ));
    }

    // Check for invalid characters
    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidDomain(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    // Check that it doesn't start or end with a dot or hyphen
    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::InvalidDomain(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::InvalidDomain(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::InvalidDomain(format!(
            "Domain '{}' must have a top-level domain",
            domain
        )));
    }

    // Scope checks compare registrable domains, so nothing else can ever match
    let lowered = domain.to_lowercase();
    match registrable_domain(&format!("https://{}/", lowered)) {
        Ok(registrable) if registrable == lowered => Ok(()),
        Ok(registrable) => Err(ConfigError::InvalidDomain(format!(
            "Domain '{}' is not a registrable domain, use '{}'",
            domain, registrable
        ))),
        Err(_) => Err(ConfigError::InvalidDomain(format!(
            "Domain '{}' is not under a known public suffix",
            domain
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config::new("https://example.com", vec!["example.com".to_string()], "out")
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&config()).is_ok());
    }

    #[test]
    fn test_validate_start_url() {
        assert!(validate_start_url("https://example.com/wiki").is_ok());
        assert!(validate_start_url("http://intranet.example.com").is_ok());

        assert!(validate_start_url("not a url").is_err());
        assert!(validate_start_url("ftp://example.com").is_err());
        assert!(validate_start_url("mailto:someone@example.com").is_err());
    }

    #[test]
    fn test_validate_domain_string() {
        assert!(validate_domain_string("example.com").is_ok());
        assert!(validate_domain_string("example.co.uk").is_ok());

        assert!(validate_domain_string("").is_err());
        assert!(validate_domain_string("example").is_err());
        assert!(validate_domain_string(".example.com").is_err());
        assert!(validate_domain_string("example.com.").is_err());
        assert!(validate_domain_string("exa mple.com").is_err());
        assert!(validate_domain_string("example..com").is_err());
        assert!(validate_domain_string("example.notatld").is_err());
        assert!(validate_domain_string("co.uk").is_err());
    }

    #[test]
    fn test_subdomain_names_registrable_form() {
        assert!(validate_domain_string("alice.github.io").is_ok());
        assert!(validate_domain_string("Example.COM").is_ok());

        let err = validate_domain_string("docs.example.com").unwrap_err();
        assert!(matches!(&err, ConfigError::InvalidDomain(_)));
        assert!(err.to_string().contains("'example.com'"));

        let mut config = config();
        config.allowed_domains = vec!["docs.example.com".to_string()];
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_empty_allowed_domains() {
        let mut config = config();
        config.allowed_domains.clear();
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_tuning_bounds() {
        let mut config = config();
        config.tuning.retry.attempts = 0;
        assert!(validate(&config).is_err());

        let mut config = self::config();
        config.tuning.webdriver.url = "localhost 4444".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }
}
