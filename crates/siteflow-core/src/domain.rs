//! Custom domain normalization
//!
//! A naked domain (`example.com`) is promoted to its `www` form before any
//! certificate or DNS work; both names are then served.

use crate::error::{Result, SiteError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainName {
    /// Name the distribution is primarily served under
    pub domain: String,
    /// Registrable parent domain; also the hosted zone and certificate name
    pub naked_domain: String,
    /// The input was the naked domain and got rewritten to `www.<naked>`
    pub promoted: bool,
}

impl DomainName {
    /// Every name the distribution should answer to
    pub fn aliases(&self) -> Vec<String> {
        if self.promoted {
            vec![self.domain.clone(), self.naked_domain.clone()]
        } else {
            vec![self.domain.clone()]
        }
    }

    /// Wildcard covering every subdomain of the naked domain
    pub fn wildcard(&self) -> String {
        format!("*.{}", self.naked_domain)
    }
}

pub fn normalize_domain(input: &str) -> Result<DomainName> {
    let cleaned = input
        .trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/')
        .trim_end_matches('.')
        .to_ascii_lowercase();

    let labels: Vec<&str> = cleaned.split('.').collect();
    let valid = labels.len() >= 2
        && labels.iter().all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-')
        });
    if !valid {
        return Err(SiteError::InvalidDomain(input.to_string()));
    }

    let naked_domain = labels[labels.len() - 2..].join(".");
    if labels.len() == 2 {
        return Ok(DomainName {
            domain: format!("www.{naked_domain}"),
            naked_domain,
            promoted: true,
        });
    }

    Ok(DomainName {
        domain: cleaned,
        naked_domain,
        promoted: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_naked_domain_is_promoted() {
        let name = normalize_domain("example.com").unwrap();
        assert_eq!(name.domain, "www.example.com");
        assert_eq!(name.naked_domain, "example.com");
        assert!(name.promoted);
        assert_eq!(name.aliases(), vec!["www.example.com", "example.com"]);
    }

    #[test]
    fn test_www_domain_is_kept() {
        let name = normalize_domain("www.example.com").unwrap();
        assert_eq!(name.domain, "www.example.com");
        assert_eq!(name.naked_domain, "example.com");
        assert!(!name.promoted);
        assert_eq!(name.aliases(), vec!["www.example.com"]);
    }

    #[test]
    fn test_subdomain_and_cleanup() {
        let name = normalize_domain(" https://Blog.Example.com./ ").unwrap();
        assert_eq!(name.domain, "blog.example.com");
        assert_eq!(name.naked_domain, "example.com");
        assert_eq!(name.wildcard(), "*.example.com");
    }

    #[test]
    fn test_invalid_domains() {
        assert!(normalize_domain("localhost").is_err());
        assert!(normalize_domain("exa mple.com").is_err());
        assert!(normalize_domain("-bad.com").is_err());
        assert!(normalize_domain("").is_err());
    }
}
