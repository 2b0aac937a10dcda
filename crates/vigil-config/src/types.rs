//! The shape of the YAML runtime configuration file.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

fn default_true() -> bool {
    true
}

fn default_folder() -> String {
    "INBOX".to_string()
}

/// IMAP connection details forwarded to the (external) OTP reader
/// (`email` sub-map).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// IMAP server hostname.
    pub host: String,
    /// IMAP server port.
    pub port: u16,
    /// IMAP account username.
    pub username: String,
    /// IMAP account password.
    pub password: String,
    /// Mailbox to read OTP messages from.
    #[serde(default = "default_folder")]
    pub folder: String,
    /// Whether to connect over implicit TLS.
    #[serde(default = "default_true")]
    pub use_ssl: bool,
}

/// The recognized keys of the runtime YAML config.
///
/// Unknown top-level keys are captured into [`Self::provider_settings`]
/// rather than rejected, so provider-specific tuning (e.g. `browserql`)
/// forwards through without needing a dedicated field here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Base URL for the external site, forwarded to providers as-is.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Default poll interval for sessions lacking their own preference
    /// override. Floored to [`MIN_POLL_INTERVAL_SECONDS`] at validation
    /// time, matching `vigil-core`'s own floor on the derived
    /// `AgentConfig`.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,

    /// Path to the persisted session store, absolute or relative to the
    /// config file's own directory.
    pub session_store_path: PathBuf,

    /// IMAP settings forwarded to the OTP reader, if configured.
    #[serde(default)]
    pub email: Option<EmailConfig>,

    /// Optional mapping file for the booking provider's form-field
    /// identification.
    #[serde(default)]
    pub form_mapping_path: Option<PathBuf>,

    /// Optional pointer-automation tuning, opaque to this runtime.
    #[serde(default)]
    pub humanlike_mouse: Option<serde_yaml::Value>,

    /// Any other top-level key, forwarded to providers unexamined.
    #[serde(flatten)]
    pub provider_settings: BTreeMap<String, serde_yaml::Value>,
}

/// Floor for `poll_interval_seconds`, matching [`vigil_core`]'s own floor.
pub const MIN_POLL_INTERVAL_SECONDS: u64 = 5;

fn default_poll_interval() -> u64 {
    30
}

impl RuntimeConfig {
    /// Validate the recognized fields, floor the default poll interval,
    /// and resolve `session_store_path`/`form_mapping_path` relative to
    /// `base_dir` (the config file's parent directory) if they are
    /// relative.
    pub fn finish(mut self, base_dir: &std::path::Path) -> ConfigResult<Self> {
        if self.poll_interval_seconds < MIN_POLL_INTERVAL_SECONDS {
            return Err(ConfigError::Invalid(format!(
                "poll_interval_seconds must be >= {MIN_POLL_INTERVAL_SECONDS}, got {}",
                self.poll_interval_seconds
            )));
        }
        if self.session_store_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "session_store_path must not be empty".to_string(),
            ));
        }

        self.session_store_path = resolve(base_dir, &self.session_store_path);
        self.form_mapping_path = self.form_mapping_path.map(|p| resolve(base_dir, &p));

        Ok(self)
    }
}

fn resolve(base_dir: &std::path::Path, path: &std::path::Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_poll_interval_below_floor() {
        let config = RuntimeConfig {
            base_url: None,
            poll_interval_seconds: 1,
            session_store_path: PathBuf::from("sessions.json"),
            email: None,
            form_mapping_path: None,
            humanlike_mouse: None,
            provider_settings: BTreeMap::new(),
        };
        assert!(config.finish(std::path::Path::new(".")).is_err());
    }

    #[test]
    fn resolves_relative_paths_against_base_dir() {
        let config = RuntimeConfig {
            base_url: None,
            poll_interval_seconds: 30,
            session_store_path: PathBuf::from("sessions.json"),
            email: None,
            form_mapping_path: None,
            humanlike_mouse: None,
            provider_settings: BTreeMap::new(),
        };
        let resolved = config.finish(std::path::Path::new("/etc/vigil")).unwrap();
        assert_eq!(
            resolved.session_store_path,
            PathBuf::from("/etc/vigil/sessions.json")
        );
    }

    #[test]
    fn unknown_keys_captured_as_provider_settings() {
        let yaml = r#"
session_store_path: sessions.json
browserql:
  endpoint: "https://example.invalid"
"#;
        let config: RuntimeConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.provider_settings.contains_key("browserql"));
    }
}
