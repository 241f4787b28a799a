//! Workflow configuration.

use serde::Deserialize;

/// Environment variable that overrides [`ShareConfig::origin`].
pub const ORIGIN_ENV: &str = "SHAREVAULT_ORIGIN";

/// Configuration for the [`ShareService`](crate::ShareService).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShareConfig {
    /// Origin share URLs are built under, e.g. `https://app.example`.
    pub origin: String,

    /// Whether consuming a share reads grant details before verifying.
    ///
    /// The preflight is informational only; the verification call remains
    /// the authoritative check either way.
    pub preflight_details: bool,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost:3000".to_string(),
            preflight_details: true,
        }
    }
}

impl ShareConfig {
    /// Defaults, with the origin taken from `SHAREVAULT_ORIGIN` when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(origin) = std::env::var(ORIGIN_ENV) {
            if !origin.trim().is_empty() {
                config.origin = origin.trim().to_string();
            }
        }
        config
    }

    /// Set the share URL origin.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// Enable or disable the details preflight.
    pub fn with_preflight(mut self, enabled: bool) -> Self {
        self.preflight_details = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ShareConfig =
            serde_json::from_str(r#"{"origin":"https://share.example"}"#).unwrap();
        assert_eq!(config.origin, "https://share.example");
        assert!(config.preflight_details);
    }

    #[test]
    fn test_builder() {
        let config = ShareConfig::default()
            .with_origin("https://a.example")
            .with_preflight(false);
        assert_eq!(config.origin, "https://a.example");
        assert!(!config.preflight_details);
    }
}
