use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub farmer: FarmerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub advisories: AdvisoriesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FarmerConfig {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub region: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisoriesConfig {
    #[serde(default)]
    pub webhook_url: String,
    #[serde(default = "default_true")]
    pub enable_stdout: bool,
    #[serde(default)]
    pub rules: AdvisoryRulesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisoryRulesConfig {
    #[serde(default = "default_true")]
    pub high_severity: bool,
    #[serde(default = "default_true")]
    pub repeated_detection: bool,
    #[serde(default = "default_true")]
    pub regional_alert: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub user_id: Option<String>,
    pub region: Option<String>,
    pub store_url: Option<String>,
}

impl Config {
    pub fn default_path() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config/cropsense/config.toml")
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(Self::default_path);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(&path)
            .with_context(|| format!("failed reading config: {}", path.display()))?;
        let parsed: Self = toml::from_str(&data)
            .with_context(|| format!("failed parsing TOML config: {}", path.display()))?;
        Ok(parsed)
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(user_id) = overrides.user_id {
            self.farmer.user_id = user_id;
        }
        if let Some(region) = overrides.region {
            self.farmer.region = region;
        }
        if let Some(store_url) = overrides.store_url {
            self.store.url = store_url;
        }
    }

    pub fn write_template(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed creating config directory: {}", parent.display())
            })?;
        }
        fs::write(path, Self::default_template())
            .with_context(|| format!("failed writing config template: {}", path.display()))
    }

    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.cache.db_path)
    }

    /// Copy safe to expose over the API: the store key is masked.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if !config.store.api_key.is_empty() {
            config.store.api_key = "<redacted>".to_string();
        }
        config
    }

    pub fn default_template() -> String {
        let template = r#"[farmer]
user_id = "YourUserIdHere"
region = ""

[store]
url = ""
api_key = ""
enabled = true

[cache]
db_path = "~/.local/share/cropsense/history.db"

[advisories]
webhook_url = ""
enable_stdout = true

[advisories.rules]
high_severity = true
repeated_detection = true
regional_alert = true
"#;
        template.to_string()
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            enabled: default_true(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

impl Default for AdvisoriesConfig {
    fn default() -> Self {
        Self {
            webhook_url: String::new(),
            enable_stdout: default_true(),
            rules: AdvisoryRulesConfig::default(),
        }
    }
}

impl Default for AdvisoryRulesConfig {
    fn default() -> Self {
        Self {
            high_severity: true,
            repeated_detection: true,
            regional_alert: true,
        }
    }
}

fn default_db_path() -> String {
    "~/.local/share/cropsense/history.db".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::Config;

    #[test]
    fn template_parses_back_into_config() {
        let config: Config = toml::from_str(&Config::default_template()).expect("parse template");
        assert_eq!(config.farmer.user_id, "YourUserIdHere");
        assert!(config.advisories.enable_stdout);
        assert!(config.advisories.rules.regional_alert);
        assert!(config.store.enabled);
    }

    #[test]
    fn redacted_view_masks_store_key_only() {
        let mut config = Config::default();
        config.store.api_key = "service-role-secret".to_string();
        config.store.url = "https://example.supabase.co".to_string();
        let view = config.redacted();
        assert_eq!(view.store.api_key, "<redacted>");
        assert_eq!(view.store.url, config.store.url);
        assert_eq!(config.store.api_key, "service-role-secret");

        let empty = Config::default().redacted();
        assert_eq!(empty.store.api_key, "");
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let config: Config = toml::from_str("[farmer]\nuser_id = \"u\"\n").expect("parse");
        assert_eq!(config.cache.db_path, "~/.local/share/cropsense/history.db");
        assert!(config.store.enabled);
    }
}
