//! Loads the single YAML config file named by `--config` and applies
//! environment variable overrides.

use std::path::{Path, PathBuf};

use tracing::{info, warn};
use vigil_crypto::SessionKey;

use crate::error::{ConfigError, ConfigResult};
use crate::types::RuntimeConfig;

/// Which [`crate::BusBackend`] the runtime should wire up, resolved from
/// `VIGIL_BUS`/`AGENTBOT_BUS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusBackend {
    /// The default in-process bus.
    Memory,
    /// The Redis-Streams-backed distributed bus.
    Redis,
}

/// The fully resolved configuration: the parsed YAML plus everything only
/// ever supplied via environment variables.
///
/// Not `Clone`/`Debug`: [`SessionKey`] deliberately isn't either, so the
/// key material can't be accidentally duplicated or logged.
pub struct EffectiveConfig {
    /// The parsed and validated YAML document.
    pub runtime: RuntimeConfig,
    /// Session-store encryption key, if `VIGIL_SESSION_KEY`/
    /// `AGENTBOT_SESSION_KEY` was set.
    pub session_key: Option<SessionKey>,
    /// Where the audit log writes to.
    pub audit_log_path: PathBuf,
    /// Which message bus backend to construct.
    pub bus_backend: BusBackend,
    /// Backing URL for the distributed bus/lock manager, if configured.
    pub redis_url: Option<String>,
}

const SESSION_KEY_VARS: &[&str] = &["VIGIL_SESSION_KEY", "AGENTBOT_SESSION_KEY"];
const AUDIT_LOG_VARS: &[&str] = &["VIGIL_AUDIT_LOG", "AGENTBOT_AUDIT_LOG"];
const BUS_VARS: &[&str] = &["VIGIL_BUS", "AGENTBOT_BUS"];
const REDIS_URL_VAR: &str = "REDIS_URL";

fn first_env(env: &impl Fn(&str) -> Option<String>, names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| env(name))
}

/// Load and validate the runtime configuration at `path`, applying
/// environment variable overrides on top.
pub fn load(path: impl AsRef<Path>) -> ConfigResult<EffectiveConfig> {
    load_with_env(path, &|name| std::env::var(name).ok())
}

/// Same as [`load`], but sourcing environment variables through `env`
/// instead of the real process environment.
///
/// Exists so tests can exercise every override path without mutating
/// real process state (env vars are process-global and would otherwise
/// make tests order-dependent).
pub fn load_with_env(
    path: impl AsRef<Path>,
    env: &impl Fn(&str) -> Option<String>,
) -> ConfigResult<EffectiveConfig> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let parsed: RuntimeConfig =
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;

    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let runtime = parsed.finish(base_dir)?;

    let session_key = match first_env(env, SESSION_KEY_VARS) {
        Some(encoded) => Some(SessionKey::from_base64(&encoded)?),
        None => None,
    };

    let audit_log_path = first_env(env, AUDIT_LOG_VARS)
        .map(PathBuf::from)
        .unwrap_or_else(|| default_audit_log_path(&runtime.session_store_path));

    let redis_url = env(REDIS_URL_VAR);

    let bus_backend = match first_env(env, BUS_VARS).as_deref() {
        Some("redis") => {
            if redis_url.is_none() {
                return Err(ConfigError::MissingRedisUrl);
            }
            BusBackend::Redis
        }
        Some(other) if !other.is_empty() => {
            warn!(value = other, "unrecognized VIGIL_BUS value; defaulting to in-process bus");
            BusBackend::Memory
        }
        _ => BusBackend::Memory,
    };

    info!(
        path = %path.display(),
        session_store_path = %runtime.session_store_path.display(),
        encrypted = session_key.is_some(),
        bus_backend = ?bus_backend,
        "configuration loaded"
    );

    Ok(EffectiveConfig {
        runtime,
        session_key,
        audit_log_path,
        bus_backend,
        redis_url,
    })
}

fn default_audit_log_path(session_store_path: &Path) -> PathBuf {
    session_store_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .join("audit.log")
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn env_map(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn loads_minimal_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "session_store_path: sessions.json\n").unwrap();

        let config = load_with_env(&path, &env_map(&[])).unwrap();
        assert_eq!(config.runtime.poll_interval_seconds, 30);
        assert_eq!(config.bus_backend, BusBackend::Memory);
        assert!(config.session_key.is_none());
        assert_eq!(
            config.runtime.session_store_path,
            dir.path().join("sessions.json")
        );
        assert_eq!(config.audit_log_path, dir.path().join("audit.log"));
    }

    #[test]
    fn session_key_env_var_is_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "session_store_path: sessions.json\n").unwrap();

        let (_key, encoded) = SessionKey::generate();
        let config =
            load_with_env(&path, &env_map(&[("VIGIL_SESSION_KEY", &encoded)])).unwrap();
        assert!(config.session_key.is_some());
    }

    #[test]
    fn legacy_env_var_name_is_still_honored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "session_store_path: sessions.json\n").unwrap();

        let (_key, encoded) = SessionKey::generate();
        let config =
            load_with_env(&path, &env_map(&[("AGENTBOT_SESSION_KEY", &encoded)])).unwrap();
        assert!(config.session_key.is_some());
    }

    #[test]
    fn redis_bus_without_url_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "session_store_path: sessions.json\n").unwrap();

        let result = load_with_env(&path, &env_map(&[("VIGIL_BUS", "redis")]));
        assert!(matches!(result, Err(ConfigError::MissingRedisUrl)));
    }

    #[test]
    fn redis_bus_with_url_resolves() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "session_store_path: sessions.json\n").unwrap();

        let config = load_with_env(
            &path,
            &env_map(&[
                ("VIGIL_BUS", "redis"),
                ("REDIS_URL", "redis://localhost:6379/0"),
            ]),
        )
        .unwrap();
        assert_eq!(config.bus_backend, BusBackend::Redis);
        assert_eq!(config.redis_url.as_deref(), Some("redis://localhost:6379/0"));
    }

    #[test]
    fn malformed_yaml_fails_with_descriptive_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "session_store_path: [not, a, string\n").unwrap();

        assert!(matches!(
            load_with_env(&path, &env_map(&[])),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn audit_log_override_is_honored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "session_store_path: sessions.json\n").unwrap();

        let config =
            load_with_env(&path, &env_map(&[("VIGIL_AUDIT_LOG", "/var/log/vigil.log")]))
                .unwrap();
        assert_eq!(config.audit_log_path, PathBuf::from("/var/log/vigil.log"));
    }
}
