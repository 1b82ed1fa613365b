use crate::calendar::{parse_window_bound, AnalysisWindow, CalendarError};
use crate::organization::OrganizationRule;
use anyhow::{Context, Result};
use chrono_tz::Tz;
use directories::ProjectDirs;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// The iCal file exported from Outlook/Exchange or another source
    #[serde(default = "default_source")]
    pub source: PathBuf,
    /// CSV file with one row per attributed occurrence
    #[serde(default = "default_output")]
    pub output: PathBuf,
    /// Dump of every resolved occurrence before filtering; empty disables it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_json: Option<PathBuf>,
    /// IANA zone for floating times, date-only window bounds and the Start column
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Addresses left out of the Attendees column, usually your own
    #[serde(default)]
    pub skip_emails: Vec<String>,
    pub window: WindowConfig,
    #[serde(default)]
    pub organizations: Vec<OrganizationConfig>,
}

/// Recurrences are infinite without a range to query against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_filter: Option<String>,
}

/// Validated, compiled form of `Config`. Read-only for the whole run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub window: AnalysisWindow,
    pub organizations: Vec<OrganizationRule>,
    pub skip_emails: Vec<String>,
    pub timezone: Tz,
}

fn default_source() -> PathBuf {
    PathBuf::from("calendar.ics")
}

fn default_output() -> PathBuf {
    PathBuf::from("calendar.csv")
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: default_source(),
            output: default_output(),
            debug_json: Some(PathBuf::from("calendar.debug.json")),
            timezone: default_timezone(),
            skip_emails: vec!["me@apple.com".to_string()],
            window: WindowConfig { start: "2021-03-01".to_string(), end: "2021-07-02".to_string() },
            organizations: vec![
                OrganizationConfig::by_email("Company1", "company1.com"),
                OrganizationConfig::by_email("Customer2", "customer2.com"),
                OrganizationConfig::by_email("Microsoft", "microsoft.com"),
                OrganizationConfig::by_email("Apple Computer", "apple"),
            ],
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = get_config_path()?;

        // If config doesn't exist, create default
        if !config_path.exists() {
            let default_config = Config::default();
            default_config.save_to(&config_path)?;
            return Ok(default_config);
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Debug JSON target, treating an empty path as disabled.
    pub fn debug_json_path(&self) -> Option<&Path> {
        self.debug_json.as_deref().filter(|p| !p.as_os_str().is_empty())
    }

    /// Validates the file and compiles it into run settings.
    pub fn settings(&self) -> std::result::Result<Settings, CalendarError> {
        let timezone: Tz = self
            .timezone
            .parse()
            .map_err(|_| CalendarError::Config(format!("unknown timezone '{}'", self.timezone)))?;

        let bound = |value: &str, which: &str| {
            parse_window_bound(value, timezone)
                .map_err(|e| CalendarError::Config(format!("window {}: {}", which, e)))
        };
        let window = AnalysisWindow::new(bound(&self.window.start, "start")?, bound(&self.window.end, "end")?)?;

        let organizations = self
            .organizations
            .iter()
            .map(OrganizationConfig::compile)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Settings { window, organizations, skip_emails: self.skip_emails.clone(), timezone })
    }
}

impl OrganizationConfig {
    pub fn by_email(name: &str, email_filter: &str) -> Self {
        Self { name: name.to_string(), email_filter: Some(email_filter.to_string()), name_filter: None }
    }

    fn compile(&self) -> std::result::Result<OrganizationRule, CalendarError> {
        let pattern = |filter: &Option<String>, kind: &str| {
            filter
                .as_deref()
                .map(|p| {
                    Regex::new(p).map_err(|e| {
                        CalendarError::Config(format!("{} filter of '{}' is not a valid pattern: {}", kind, self.name, e))
                    })
                })
                .transpose()
        };
        Ok(OrganizationRule::new(
            self.name.clone(),
            pattern(&self.email_filter, "email")?,
            pattern(&self.name_filter, "name")?,
        ))
    }
}

pub fn get_config_path() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("com", "calsift", "calsift")
        .context("Failed to determine config directory")?;

    Ok(proj_dirs.config_dir().join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    const SAMPLE: &str = r#"
source = "work.ics"
output = "work.csv"
timezone = "Europe/Berlin"
skip_emails = ["me@apple.com"]

[window]
start = "2021-04-01"
end = "2021-04-30"

[[organizations]]
name = "Company1"
email_filter = "company1\\.com"

[[organizations]]
name = "Board"
name_filter = "(?i)director"
"#;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.source, PathBuf::from("calendar.ics"));
        assert_eq!(config.organizations.len(), 4);
        assert_eq!(config.organizations[0].name, "Company1");
        assert!(config.settings().is_ok());
    }

    #[test]
    fn test_parse_and_compile() -> Result<()> {
        let config: Config = toml::from_str(SAMPLE)?;
        assert_eq!(config.debug_json_path(), None);

        let settings = config.settings()?;
        assert_eq!(settings.timezone, chrono_tz::Europe::Berlin);
        // midnight Berlin summer time
        assert_eq!(settings.window.start(), Utc.with_ymd_and_hms(2021, 3, 31, 22, 0, 0).unwrap());
        assert_eq!(settings.organizations.len(), 2);
        assert!(settings.organizations[0].email_filter.is_some());
        assert!(settings.organizations[1].email_filter.is_none());
        assert!(settings.organizations[1].name_filter.is_some());
        Ok(())
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let mut config = Config::default();
        config.organizations.push(OrganizationConfig::by_email("Broken", "(unclosed"));
        let err = config.settings().unwrap_err();
        assert!(err.to_string().contains("Broken"));
    }

    #[test]
    fn test_inverted_window_is_rejected() {
        let mut config = Config::default();
        config.window = WindowConfig { start: "2021-07-02".into(), end: "2021-03-01".into() };
        assert!(matches!(config.settings(), Err(CalendarError::Config(_))));
    }

    #[test]
    fn test_unknown_timezone_is_rejected() {
        let config = Config { timezone: "Mars/Olympus".into(), ..Config::default() };
        assert!(matches!(config.settings(), Err(CalendarError::Config(_))));
    }

    #[test]
    fn test_config_save_load() -> Result<()> {
        let temp_dir = tempdir()?;
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let config = Config::default();
        config.save_to(&config_path)?;
        let loaded = Config::load_from(&config_path)?;

        assert_eq!(loaded.window.start, config.window.start);
        assert_eq!(loaded.skip_emails, config.skip_emails);
        assert_eq!(loaded.organizations.len(), config.organizations.len());
        assert_eq!(loaded.debug_json_path(), Some(Path::new("calendar.debug.json")));

        Ok(())
    }
}
