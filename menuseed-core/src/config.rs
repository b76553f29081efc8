//! Seed target configuration.
//!
//! # Storage layout
//!
//! ```text
//! ~/.menuseed/
//!   config.yaml   (mode 0600: may hold the API key)
//! ```
//!
//! # API pattern
//!
//! Every path-deriving function has two forms:
//! - `fn_at(home: &Path, …)`: explicit home; used in tests with `TempDir`
//! - `fn(…)`: derives home from `dirs::home_dir()`, delegates to `_at`
//!
//! Tests must NEVER call the no-arg wrappers; always use `_at`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::{BucketId, CollectionId};

/// Largest page the backend will return for one list call.
pub const MAX_PAGE_SIZE: u32 = 100;

const ENV_ENDPOINT: &str = "MENUSEED_ENDPOINT";
const ENV_PROJECT_ID: &str = "MENUSEED_PROJECT_ID";
const ENV_DATABASE_ID: &str = "MENUSEED_DATABASE_ID";
const ENV_BUCKET_ID: &str = "MENUSEED_BUCKET_ID";
const ENV_API_KEY: &str = "MENUSEED_API_KEY";

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

/// Collection identifiers for every entity kind the pipeline touches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collections {
    pub categories: CollectionId,
    pub customizations: CollectionId,
    pub menu: CollectionId,
    pub menu_customizations: CollectionId,
}

impl Default for Collections {
    fn default() -> Self {
        Self {
            categories: CollectionId::from("categories"),
            customizations: CollectionId::from("customizations"),
            menu: CollectionId::from("menu"),
            menu_customizations: CollectionId::from("menu_customizations"),
        }
    }
}

impl Collections {
    /// All collections in create-phase dependency order.
    pub fn in_dependency_order(&self) -> [&CollectionId; 4] {
        [
            &self.categories,
            &self.customizations,
            &self.menu,
            &self.menu_customizations,
        ]
    }
}

/// Backpressure knobs for talking to a rate-limited backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pacing {
    /// Documents or files fetched per list call.
    pub page_size: u32,
    /// Pause between consecutive document deletions.
    pub delete_delay_ms: u64,
    /// Files deleted together in one unordered group.
    pub delete_batch_size: usize,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            page_size: MAX_PAGE_SIZE,
            delete_delay_ms: 100,
            delete_batch_size: 10,
        }
    }
}

/// Everything needed to reach the seed target. Opaque to the pipeline itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedConfig {
    pub endpoint: String,
    pub project_id: String,
    pub database_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default)]
    pub collections: Collections,
    pub bucket_id: BucketId,
    #[serde(default)]
    pub pacing: Pacing,
}

impl SeedConfig {
    /// A config template pointing at the hosted cloud endpoint.
    pub fn template(project_id: &str, database_id: &str, bucket_id: &str) -> Self {
        Self {
            endpoint: "https://cloud.appwrite.io/v1".to_string(),
            project_id: project_id.to_string(),
            database_id: database_id.to_string(),
            api_key: None,
            collections: Collections::default(),
            bucket_id: BucketId::from(bucket_id),
            pacing: Pacing::default(),
        }
    }

    /// Check every field the pipeline relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoint = self.endpoint.trim();
        if endpoint.is_empty() {
            return Err(invalid("endpoint", "must not be empty"));
        }
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(invalid("endpoint", "must start with http:// or https://"));
        }
        require_non_empty("project_id", &self.project_id)?;
        require_non_empty("database_id", &self.database_id)?;
        require_non_empty("bucket_id", &self.bucket_id.0)?;
        require_non_empty("collections.categories", &self.collections.categories.0)?;
        require_non_empty(
            "collections.customizations",
            &self.collections.customizations.0,
        )?;
        require_non_empty("collections.menu", &self.collections.menu.0)?;
        require_non_empty(
            "collections.menu_customizations",
            &self.collections.menu_customizations.0,
        )?;

        if self.pacing.page_size == 0 || self.pacing.page_size > MAX_PAGE_SIZE {
            return Err(invalid(
                "pacing.page_size",
                format!("must be between 1 and {MAX_PAGE_SIZE}"),
            ));
        }
        if self.pacing.delete_batch_size == 0 {
            return Err(invalid("pacing.delete_batch_size", "must be at least 1"));
        }
        Ok(())
    }

    /// Apply `MENUSEED_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup; empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(v) = get(ENV_ENDPOINT) {
            self.endpoint = v;
        }
        if let Some(v) = get(ENV_PROJECT_ID) {
            self.project_id = v;
        }
        if let Some(v) = get(ENV_DATABASE_ID) {
            self.database_id = v;
        }
        if let Some(v) = get(ENV_BUCKET_ID) {
            self.bucket_id = BucketId::from(v);
        }
        if let Some(v) = get(ENV_API_KEY) {
            self.api_key = Some(v);
        }
    }
}

fn require_non_empty(field: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(invalid(field, "must not be empty"));
    }
    Ok(())
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

// ---------------------------------------------------------------------------
// 1. Path helpers
// ---------------------------------------------------------------------------

/// `<home>/.menuseed/config.yaml`: pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    home.join(".menuseed").join("config.yaml")
}

/// `config_path_at` convenience wrapper.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    Ok(config_path_at(&home()?))
}

// ---------------------------------------------------------------------------
// 2. Load
// ---------------------------------------------------------------------------

/// Load a config from an explicit file path.
///
/// Returns `ConfigError::NotFound` if absent,
/// `ConfigError::Parse` (with path + line context) if malformed YAML.
/// Environment overrides are NOT applied here.
pub fn load_file(path: &Path) -> Result<SeedConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path)?;
    serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Load `<home>/.menuseed/config.yaml`.
pub fn load_at(home: &Path) -> Result<SeedConfig, ConfigError> {
    load_file(&config_path_at(home))
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<SeedConfig, ConfigError> {
    load_at(&home()?)
}

/// Load from `explicit` when given, otherwise from the home location, then
/// apply environment overrides and validate.
pub fn resolve(explicit: Option<&Path>) -> Result<SeedConfig, ConfigError> {
    let mut config = match explicit {
        Some(path) => load_file(path)?,
        None => load()?,
    };
    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}

// ---------------------------------------------------------------------------
// 3. Save (atomic)
// ---------------------------------------------------------------------------

/// Atomically save a config to `path`.
///
/// Write flow: serialize → `.yaml.tmp` sibling created with mode 0600 →
/// `rename`. `.tmp` is always in the same directory as the target.
pub fn save_file(path: &Path, config: &SeedConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            std::fs::create_dir_all(dir)?;
            set_dir_permissions(dir)?;
        }
    }
    let tmp_path = path.with_extension("yaml.tmp");

    let yaml = serde_yaml::to_string(config)?;
    write_owner_only(&tmp_path, yaml.as_bytes())?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Write a fresh config under `home`.
///
/// Refuses to clobber an existing file unless `force` is set.
pub fn init_at(home: &Path, config: &SeedConfig, force: bool) -> Result<PathBuf, ConfigError> {
    let path = config_path_at(home);
    if path.exists() && !force {
        return Err(ConfigError::AlreadyExists { path });
    }
    save_file(&path, config)?;
    Ok(path)
}

/// `init_at` convenience wrapper.
pub fn init(config: &SeedConfig, force: bool) -> Result<PathBuf, ConfigError> {
    init_at(&home()?, config, force)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))?;
    Ok(())
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

/// The file never exists with wider permissions than 0600, even briefly.
#[cfg(unix)]
fn write_owner_only(path: &Path, bytes: &[u8]) -> Result<(), ConfigError> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // A stale .tmp from an interrupted save keeps its old mode.
    file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    file.write_all(bytes)?;
    file.sync_all()?;
    Ok(())
}
#[cfg(not(unix))]
fn write_owner_only(path: &Path, bytes: &[u8]) -> Result<(), ConfigError> {
    std::fs::write(path, bytes)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use tempfile::TempDir;

    fn sample() -> SeedConfig {
        SeedConfig::template("proj-1", "db-1", "assets")
    }

    #[test]
    fn config_path_is_correct() {
        let home = TempDir::new().expect("tempdir");
        let path = config_path_at(home.path());
        assert!(path.ends_with(".menuseed/config.yaml"));
    }

    #[test]
    fn template_validates() {
        sample().validate().expect("template should be valid");
    }

    #[test]
    fn init_and_load_roundtrip() {
        let home = TempDir::new().expect("tempdir");
        let mut cfg = sample();
        cfg.api_key = Some("secret".to_string());
        init_at(home.path(), &cfg, false).expect("init");
        let loaded = load_at(home.path()).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn init_refuses_to_overwrite_without_force() {
        let home = TempDir::new().expect("tempdir");
        init_at(home.path(), &sample(), false).expect("init");
        let err = init_at(home.path(), &sample(), false).unwrap_err();
        assert!(matches!(err, ConfigError::AlreadyExists { .. }));
        init_at(home.path(), &sample(), true).expect("forced init");
    }

    #[test]
    fn saved_config_is_owner_only() {
        let home = TempDir::new().expect("tempdir");
        let path = init_at(home.path(), &sample(), false).expect("init");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
            assert_eq!(mode, 0o600);
        }
        let tmp = path.with_extension("yaml.tmp");
        assert!(!tmp.exists(), ".tmp must be gone after successful save");
    }

    #[cfg(unix)]
    #[test]
    fn leftover_tmp_is_narrowed_before_the_key_is_written() {
        use std::os::unix::fs::PermissionsExt;

        let home = TempDir::new().expect("tempdir");
        let path = config_path_at(home.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let tmp = path.with_extension("yaml.tmp");
        std::fs::write(&tmp, "stale").unwrap();
        std::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o644)).unwrap();

        write_owner_only(&tmp, b"api_key: secret").expect("write");
        let mode = std::fs::metadata(&tmp).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
        assert_eq!(std::fs::read_to_string(&tmp).unwrap(), "api_key: secret");

        let mut cfg = sample();
        cfg.api_key = Some("secret".to_string());
        save_file(&path, &cfg).expect("save");
        assert!(!tmp.exists());
        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[test]
    fn overrides_replace_fields_and_ignore_blank_values() {
        let mut cfg = sample();
        let env: HashMap<&str, &str> = [
            ("MENUSEED_ENDPOINT", "http://localhost/v1"),
            ("MENUSEED_API_KEY", "k-123"),
            ("MENUSEED_PROJECT_ID", "  "),
        ]
        .into_iter()
        .collect();
        cfg.apply_overrides(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(cfg.endpoint, "http://localhost/v1");
        assert_eq!(cfg.api_key.as_deref(), Some("k-123"));
        assert_eq!(cfg.project_id, "proj-1");
    }

    #[test]
    fn validate_rejects_bad_endpoint_scheme() {
        let mut cfg = sample();
        cfg.endpoint = "cloud.appwrite.io/v1".to_string();
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "endpoint", .. }));
    }

    #[test]
    fn validate_rejects_oversized_page() {
        let mut cfg = sample();
        cfg.pacing.page_size = MAX_PAGE_SIZE + 1;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("pacing.page_size"));
    }

    #[test]
    fn home_not_found_error_message() {
        assert!(ConfigError::HomeNotFound.to_string().contains("home directory"));
    }
}
