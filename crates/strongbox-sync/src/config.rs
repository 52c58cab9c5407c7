use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Remote endpoint and owner configuration, stored as JSON under the
/// platform config directory. The API token and owner id normally come from
/// the identity provider; the file carries them between sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub api_base_url: String,
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default)]
    pub owner_id: Option<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.strongbox.example".to_string(),
            api_token: None,
            owner_id: None,
        }
    }
}

pub fn load_config(path: &Path) -> anyhow::Result<SyncConfig> {
    if !path.exists() {
        return Ok(SyncConfig::default());
    }
    let data = fs::read(path)?;
    Ok(serde_json::from_slice(&data)?)
}

pub fn save_config(path: &Path, config: &SyncConfig) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_vec_pretty(config)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = load_config(&dir.path().join("config.json")).unwrap();
        assert_eq!(config.api_base_url, SyncConfig::default().api_base_url);
        assert!(config.owner_id.is_none());
    }

    #[test]
    fn save_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = SyncConfig {
            api_base_url: "https://example.test".to_string(),
            api_token: Some("tok".to_string()),
            owner_id: Some("u1".to_string()),
        };
        save_config(&path, &config).unwrap();
        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded.api_base_url, "https://example.test");
        assert_eq!(loaded.owner_id.as_deref(), Some("u1"));
    }
}
