use serde::{Deserialize, Serialize};

use crate::services::{DashboardError, ServiceResult};

pub const DEFAULT_FILTER_STORAGE_KEY: &str = "ticketFilters";

/// Dashboard settings. Every field has a default; pages may override a subset
/// through a JSON blob.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DashboardConfig {
    /// Origin the API paths are resolved against, e.g. `https://loto.local`.
    pub base_url: String,
    pub toast_duration_ms: i64,
    pub toast_fade_ms: i64,
    pub max_toasts: usize,
    pub stats_refresh_ms: u32,
    pub filter_storage_key: String,
    pub filter_freshness_ms: i64,
    pub highlight_delay_ms: u32,
    pub highlight_duration_ms: u32,
    pub log_level: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            toast_duration_ms: 5_000,
            toast_fade_ms: 300,
            max_toasts: 8,
            stats_refresh_ms: 30_000,
            filter_storage_key: DEFAULT_FILTER_STORAGE_KEY.to_string(),
            filter_freshness_ms: 3_600_000,
            highlight_delay_ms: 500,
            highlight_duration_ms: 3_000,
            log_level: String::from("info"),
        }
    }
}

impl DashboardConfig {
    /// Applies a partial JSON override on top of the defaults.
    pub fn from_overrides(raw: &str) -> ServiceResult<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self =
            serde_json::from_str(raw).map_err(|err| DashboardError::Decode(err.to_string()))?;
        config.validate()
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn validate(self) -> ServiceResult<Self> {
        if self.filter_storage_key.trim().is_empty() {
            return Err(DashboardError::Validation(
                "filter_storage_key must not be empty".into(),
            ));
        }
        if self.toast_duration_ms <= 0 || self.filter_freshness_ms <= 0 {
            return Err(DashboardError::Validation(
                "durations must be positive".into(),
            ));
        }
        if self.stats_refresh_ms == 0 {
            return Err(DashboardError::Validation(
                "stats_refresh_ms must be positive".into(),
            ));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_dashboard_constants() {
        let config = DashboardConfig::default();
        assert_eq!(config.toast_duration_ms, 5_000);
        assert_eq!(config.stats_refresh_ms, 30_000);
        assert_eq!(config.filter_freshness_ms, 3_600_000);
        assert_eq!(config.filter_storage_key, "ticketFilters");
    }

    #[test]
    fn partial_overrides_keep_other_defaults() {
        let config = DashboardConfig::from_overrides(r#"{"max_toasts": 3}"#).unwrap();
        assert_eq!(config.max_toasts, 3);
        assert_eq!(config.toast_duration_ms, 5_000);
    }

    #[test]
    fn rejects_empty_storage_key() {
        let err = DashboardConfig::from_overrides(r#"{"filter_storage_key": " "}"#).unwrap_err();
        assert!(matches!(err, DashboardError::Validation(_)));
    }

    #[test]
    fn base_url_drops_trailing_slash() {
        let config = DashboardConfig::default().with_base_url("https://loto.local/");
        assert_eq!(config.base_url, "https://loto.local");
    }
}
