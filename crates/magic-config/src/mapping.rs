//! Helper mapping descriptors
//!
//! A descriptor is a small YAML document naming one credential helper and the
//! registry domains it serves:
//!
//! ```yaml
//! helper: gcr
//! domains:
//!   - gcr.io
//!   - pkg.dev
//! ```
//!
//! The descriptor's file stem (lowercased) is the helper's slug.

use crate::constants::{MAPPING_EXTENSION, MAPPING_EXTENSION_ALT};
use crate::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One parsed and validated mapping descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelperMapping {
    /// Helper slug, e.g. "ecr-login" for `docker-credential-ecr-login`
    #[serde(default)]
    pub helper: String,
    /// Registry root domains (`root.tld`) served by the helper
    #[serde(default)]
    pub domains: Vec<String>,
}

impl HelperMapping {
    /// Parse and validate a descriptor. `file` is only used for error context.
    pub fn parse(file: &str, content: &[u8]) -> Result<Self> {
        let mapping: Self =
            serde_yaml::from_slice(content).map_err(|e| ConfigError::MappingParse {
                file: file.to_string(),
                source: e,
            })?;
        mapping.validate(file)?;
        Ok(mapping)
    }

    /// Check the descriptor invariants
    pub fn validate(&self, file: &str) -> Result<()> {
        if !is_valid_helper_name(&self.helper) {
            return Err(ConfigError::InvalidHelperName {
                file: file.to_string(),
                helper: self.helper.clone(),
            });
        }
        if self.domains.is_empty() {
            return Err(ConfigError::InvalidMapping {
                file: file.to_string(),
                reason: "no domains listed".to_string(),
            });
        }
        if let Some(bad) = self.domains.iter().find(|d| !is_root_domain(d)) {
            return Err(ConfigError::InvalidMapping {
                file: file.to_string(),
                reason: format!("domain '{}' is not a lowercase root.tld domain", bad),
            });
        }
        Ok(())
    }

    /// Whether this descriptor lists `domain`
    pub fn serves(&self, domain: &str) -> bool {
        self.domains.iter().any(|d| d == domain)
    }
}

/// Validate a credential helper slug.
///
/// Slugs like "gcr", "ecr-login", "acr-env" may only contain lowercase ASCII
/// letters, digits, hyphens and underscores. They become part of an executable
/// name, so anything else is rejected.
pub fn is_valid_helper_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
}

/// `root.tld`: exactly two non-empty lowercase labels
fn is_root_domain(domain: &str) -> bool {
    let mut labels = domain.split('.');
    let (Some(root), Some(tld), None) = (labels.next(), labels.next(), labels.next()) else {
        return false;
    };
    !root.is_empty() && !tld.is_empty() && !domain.chars().any(|c| c.is_uppercase())
}

/// Whether a file name looks like a mapping descriptor (`.yml` / `.yaml`)
pub fn is_mapping_file(name: &str) -> bool {
    matches!(
        Path::new(name).extension().and_then(|e| e.to_str()),
        Some(ext) if ext.eq_ignore_ascii_case(MAPPING_EXTENSION)
            || ext.eq_ignore_ascii_case(MAPPING_EXTENSION_ALT)
    )
}

/// Slug for a descriptor file name: stem without extension, lowercased
pub fn slug_from_file_name(name: &str) -> String {
    Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name)
        .to_lowercase()
}

/// File name a descriptor gets inside the image: `<slug>.yml`
pub fn mapping_file_name(slug: &str) -> String {
    format!("{}.{}", slug, MAPPING_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mapping() {
        let yaml = "helper: gcr\ndomains:\n  - gcr.io\n  - pkg.dev\n";
        let mapping = HelperMapping::parse("gcp.yml", yaml.as_bytes()).unwrap();
        assert_eq!(mapping.helper, "gcr");
        assert_eq!(mapping.domains, vec!["gcr.io", "pkg.dev"]);
        assert!(mapping.serves("pkg.dev"));
        assert!(!mapping.serves("docker.io"));
    }

    #[test]
    fn test_parse_bad_yaml() {
        let err = HelperMapping::parse("bad.yml", b"helper: [unclosed").unwrap_err();
        assert!(matches!(err, ConfigError::MappingParse { ref file, .. } if file == "bad.yml"));
    }

    #[test]
    fn test_parse_missing_fields() {
        let err = HelperMapping::parse("empty.yml", b"domains:\n  - example.com\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidHelperName { .. }));

        let err = HelperMapping::parse("nodomains.yml", b"helper: example\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidMapping { .. }));
    }

    #[test]
    fn test_parse_invalid_helper() {
        let err = HelperMapping::parse(
            "evil.yml",
            b"helper: \"foo;rm -rf /\"\ndomains: [example.com]\n",
        )
        .unwrap_err();
        match err {
            ConfigError::InvalidHelperName { helper, .. } => assert_eq!(helper, "foo;rm -rf /"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_invalid_domain() {
        for domain in ["sub.example.com", "Example.com", "localhost", ".com"] {
            let yaml = format!("helper: example\ndomains: [\"{}\"]\n", domain);
            let err = HelperMapping::parse("x.yml", yaml.as_bytes()).unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidMapping { .. }),
                "{domain} should be rejected"
            );
        }
    }

    #[test]
    fn test_is_valid_helper_name() {
        assert!(is_valid_helper_name("gcr"));
        assert!(is_valid_helper_name("ecr-login"));
        assert!(is_valid_helper_name("acr_env2"));
        assert!(!is_valid_helper_name(""));
        assert!(!is_valid_helper_name("Gcr"));
        assert!(!is_valid_helper_name("../../evil"));
        assert!(!is_valid_helper_name("helper name"));
    }

    #[test]
    fn test_mapping_file_names() {
        assert!(is_mapping_file("aws.yml"));
        assert!(is_mapping_file("Azure.YAML"));
        assert!(!is_mapping_file("docker-credential-gcr"));
        assert!(!is_mapping_file("notes.txt"));
        assert_eq!(slug_from_file_name("Azure.yml"), "azure");
        assert_eq!(slug_from_file_name("gcp.yaml"), "gcp");
        assert_eq!(mapping_file_name("aws"), "aws.yml");
    }
}
