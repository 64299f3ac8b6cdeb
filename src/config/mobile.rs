//! Mobile app configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Mobile app configuration (URL-scheme redirects)
///
/// The kiosk app opens the OAuth flow in a browser; the callback hands
/// control back by redirecting to the app's custom URL scheme.
#[derive(Debug, Clone, Deserialize)]
pub struct MobileConfig {
    /// Custom URL scheme registered by the iOS app
    #[serde(default = "default_url_scheme")]
    pub url_scheme: String,
}

impl MobileConfig {
    /// Builds an app deep link: `<scheme>://<path>?<query>`
    pub fn deep_link(&self, path: &str, query: &str) -> String {
        if query.is_empty() {
            format!("{}://{}", self.url_scheme, path)
        } else {
            format!("{}://{}?{}", self.url_scheme, path, query)
        }
    }

    /// Validate mobile configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        let scheme = &self.url_scheme;
        let valid = !scheme.is_empty()
            && scheme.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.');
        if !valid {
            return Err(ValidationError::InvalidMobileScheme);
        }
        Ok(())
    }
}

impl Default for MobileConfig {
    fn default() -> Self {
        Self {
            url_scheme: default_url_scheme(),
        }
    }
}

fn default_url_scheme() -> String {
    "tillbridge".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deep_link_formats() {
        let config = MobileConfig::default();
        assert_eq!(
            config.deep_link("oauth/complete", "status=connected"),
            "tillbridge://oauth/complete?status=connected"
        );
        assert_eq!(config.deep_link("home", ""), "tillbridge://home");
    }

    #[test]
    fn scheme_validation() {
        assert!(MobileConfig::default().validate().is_ok());

        let bad = MobileConfig {
            url_scheme: "9bad".to_string(),
        };
        assert!(bad.validate().is_err());

        let bad = MobileConfig {
            url_scheme: "has space".to_string(),
        };
        assert!(bad.validate().is_err());
    }
}
