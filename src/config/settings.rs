//! User settings for potledger
//!
//! Display preferences and the monthly-reduction policy used by the
//! `process` command.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::paths::LedgerPaths;
use crate::error::LedgerError;
use crate::models::schedule::days_in_month;
use crate::storage::write_atomic;

/// User settings for potledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Default currency symbol
    #[serde(default = "default_currency")]
    pub currency_symbol: String,

    /// Day of the month from which `process` applies the monthly reduction
    #[serde(default = "default_reduction_day")]
    pub reduction_day: u32,

    /// Whether `process` applies the monthly reduction at all
    #[serde(default = "default_auto_reduce")]
    pub auto_reduce: bool,
}

fn default_currency() -> String {
    "$".to_string()
}

fn default_reduction_day() -> u32 {
    1
}

fn default_auto_reduce() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            currency_symbol: default_currency(),
            reduction_day: default_reduction_day(),
            auto_reduce: default_auto_reduce(),
        }
    }
}

/// Keys accepted by [`Settings::set`]
pub const SETTING_KEYS: [&str; 3] = ["currency_symbol", "reduction_day", "auto_reduce"];

impl Settings {
    /// Load settings from disk, or fall back to defaults if the file doesn't exist
    pub fn load_or_create(paths: &LedgerPaths) -> Result<Self, LedgerError> {
        let settings_path = paths.settings_file();

        if !settings_path.exists() {
            return Ok(Settings::default());
        }

        let contents = std::fs::read_to_string(&settings_path)
            .map_err(|e| LedgerError::Io(format!("Failed to read settings file: {}", e)))?;
        let settings: Settings = serde_json::from_str(&contents)
            .map_err(|e| LedgerError::Config(format!("Failed to parse settings file: {}", e)))?;
        settings.validate()?;

        Ok(settings)
    }

    /// Save settings to disk
    pub fn save(&self, paths: &LedgerPaths) -> Result<(), LedgerError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| LedgerError::Config(format!("Failed to serialize settings: {}", e)))?;

        write_atomic(paths.settings_file(), contents.as_bytes())
    }

    pub fn validate(&self) -> Result<(), LedgerError> {
        if !(1..=31).contains(&self.reduction_day) {
            return Err(LedgerError::Config(format!(
                "reduction_day must be between 1 and 31, got {}",
                self.reduction_day
            )));
        }
        Ok(())
    }

    /// Textual form of one setting
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "currency_symbol" => Some(self.currency_symbol.clone()),
            "reduction_day" => Some(self.reduction_day.to_string()),
            "auto_reduce" => Some(self.auto_reduce.to_string()),
            _ => None,
        }
    }

    /// Set one setting from its textual form
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), LedgerError> {
        let mut updated = self.clone();
        match key {
            "currency_symbol" => updated.currency_symbol = value.to_string(),
            "reduction_day" => {
                updated.reduction_day = value.trim().parse().map_err(|_| {
                    LedgerError::Config(format!("reduction_day must be a number, got '{}'", value))
                })?
            }
            "auto_reduce" => {
                updated.auto_reduce = value.trim().parse().map_err(|_| {
                    LedgerError::Config(format!("auto_reduce must be true or false, got '{}'", value))
                })?
            }
            other => {
                return Err(LedgerError::Config(format!(
                    "Unknown setting '{}' (expected one of: {})",
                    other,
                    SETTING_KEYS.join(", ")
                )))
            }
        }
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Whether the monthly reduction should run on `today`
    ///
    /// The reduction day is clamped to the length of the month.
    pub fn reduction_due(&self, today: NaiveDate) -> bool {
        self.auto_reduce && today.day() >= self.reduction_day.min(days_in_month(today))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.currency_symbol, "$");
        assert_eq!(settings.reduction_day, 1);
        assert!(settings.auto_reduce);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerPaths::with_base_dir(temp_dir.path().to_path_buf());

        let mut settings = Settings::default();
        settings.set("currency_symbol", "€").unwrap();
        settings.set("reduction_day", "15").unwrap();
        settings.save(&paths).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"currency_symbol": "£"}"#).unwrap();
        assert_eq!(settings.currency_symbol, "£");
        assert_eq!(settings.reduction_day, 1);
        assert!(settings.auto_reduce);
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut settings = Settings::default();
        assert!(settings.set("reduction_day", "32").is_err());
        assert!(settings.set("auto_reduce", "maybe").is_err());
        assert!(settings.set("theme", "dark").is_err());
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_set_then_get() {
        let mut settings = Settings::default();
        settings.set("currency_symbol", "€").unwrap();
        settings.set("reduction_day", " 15 ").unwrap();
        assert_eq!(settings.get("currency_symbol").as_deref(), Some("€"));
        assert_eq!(settings.get("reduction_day").as_deref(), Some("15"));
        assert_eq!(settings.get("theme"), None);
    }

    #[test]
    fn test_reduction_due() {
        let mut settings = Settings::default();
        settings.reduction_day = 31;
        let feb_28 = NaiveDate::from_ymd_opt(2026, 2, 28).unwrap();
        let mar_30 = NaiveDate::from_ymd_opt(2026, 3, 30).unwrap();
        assert!(settings.reduction_due(feb_28));
        assert!(!settings.reduction_due(mar_30));

        settings.auto_reduce = false;
        assert!(!settings.reduction_due(feb_28));
    }
}
