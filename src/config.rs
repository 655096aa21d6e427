use std::path::{Path, PathBuf};

use tracing::{info, warn};

/// Where the persisted documents live and the prefix their keys share.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub key_prefix: String,
}

impl StorageConfig {
    pub fn from_env() -> Self {
        let data_dir = dotenvy::var("STEM_DATA_DIR").unwrap_or_else(|_| "data".to_string());
        let key_prefix = dotenvy::var("STEM_KEY_PREFIX").unwrap_or_else(|_| "stem".to_string());
        Self {
            data_dir: PathBuf::from(data_dir),
            key_prefix,
        }
    }
}

/// Credentials for the bootstrap admin account.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl AdminConfig {
    pub fn from_env() -> Self {
        Self {
            name: dotenvy::var("STEM_ADMIN_NAME").unwrap_or_else(|_| "Platform Admin".to_string()),
            email: dotenvy::var("STEM_ADMIN_EMAIL")
                .unwrap_or_else(|_| "admin@stem.local".to_string()),
            password: dotenvy::var("STEM_ADMIN_PASSWORD")
                .unwrap_or_else(|_| "change-me-now".to_string()),
        }
    }
}

pub fn load_environment() -> Result<(), Box<dyn std::error::Error>> {
    let is_production =
        dotenvy::var("STEM_PROFILE").unwrap_or("development".to_string()) == "production";

    let env_files = if is_production {
        vec!["config/common.env", "config/prod.env", ".secrets.env"]
    } else {
        vec!["config/common.env", "config/dev.env", ".secrets.env"]
    };

    for env_file in env_files {
        load_env_file(env_file)?;
    }

    Ok(())
}

fn load_env_file(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    if !Path::new(path).exists() {
        warn!("Warning: Environment file {} not found, skipping", path);
        return Ok(());
    }

    dotenvy::from_filename_override(path)?;
    info!("Loaded environment from: {}", path);
    Ok(())
}
