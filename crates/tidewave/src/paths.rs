use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories_next::ProjectDirs;
use siteconfig::SiteConfig;

pub const ENV_CONFIG_DIR: &str = "TIDEWAVE_CONFIG_DIR";

const QUALIFIER: &str = "org";
const ORGANISATION: &str = "Tidewave";
const APPLICATION: &str = "tidewave";
const SITE_CONFIG_FILE: &str = "site.toml";

#[derive(Debug, Clone)]
pub struct AppPaths {
    config_dir: PathBuf,
}

impl AppPaths {
    pub fn discover() -> Result<Self> {
        if let Some(config_dir) = env_override(ENV_CONFIG_DIR) {
            return Ok(Self { config_dir });
        }
        let project_dirs = ProjectDirs::from(QUALIFIER, ORGANISATION, APPLICATION)
            .ok_or_else(|| anyhow!("failed to determine user directories"))?;
        Ok(Self {
            config_dir: project_dirs.config_dir().to_path_buf(),
        })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn site_config_file(&self) -> PathBuf {
        self.config_dir.join(SITE_CONFIG_FILE)
    }
}

#[cfg(test)]
impl AppPaths {
    pub fn from_raw(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }
}

/// Reads and validates the site configuration, or returns defaults if the file is absent.
pub fn load_site_config(path: &Path) -> Result<SiteConfig> {
    match fs::read_to_string(path) {
        Ok(contents) => SiteConfig::from_toml_str(&contents)
            .with_context(|| format!("failed to load site config at {}", path.display())),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no site config found; using defaults");
            Ok(SiteConfig::default())
        }
        Err(err) => {
            Err(err).with_context(|| format!("failed to read site config at {}", path.display()))
        }
    }
}

fn env_override(name: &str) -> Option<PathBuf> {
    match env::var_os(name) {
        Some(value) if !value.is_empty() => Some(PathBuf::from(value)),
        _ => None,
    }
}
