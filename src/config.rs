use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{bin_loader, error::Result, variant::Variant};

pub const RESOURCES_DIR_ENV: &str = "KEYGEN_RESOURCES_DIR";
pub const VERIFIER_DIR_ENV: &str = "KEYGEN_VERIFIER_DIR";

/// What the driver does when a variant fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop at the first failing variant.
    #[default]
    Halt,
    /// Run every variant and report each outcome.
    Continue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub resources_dir: PathBuf,
    pub verifier_dir: PathBuf,
    pub variants: Vec<Variant>,
    pub on_failure: FailurePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            resources_dir: PathBuf::from("../resources/spartan"),
            verifier_dir: PathBuf::from("libraries/verifier/impl"),
            variants: Variant::ALL.to_vec(),
            on_failure: FailurePolicy::Halt,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = bin_loader::read_file(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Config file (if any) with the process environment applied on top.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        Ok(config.with_overrides(std::env::vars()))
    }

    pub fn with_overrides(mut self, vars: impl IntoIterator<Item = (String, String)>) -> Self {
        for (key, value) in vars {
            match key.as_str() {
                RESOURCES_DIR_ENV => self.resources_dir = PathBuf::from(value),
                VERIFIER_DIR_ENV => self.verifier_dir = PathBuf::from(value),
                _ => {}
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::KeygenError, testing::scratch_dir};

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.resources_dir, Path::new("../resources/spartan"));
        assert_eq!(config.verifier_dir, Path::new("libraries/verifier/impl"));
        assert_eq!(config.variants, Variant::ALL.to_vec());
        assert_eq!(config.on_failure, FailurePolicy::Halt);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let json = r#"{ "variants": ["aes128"], "on_failure": "continue" }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.variants, vec![Variant::Aes128]);
        assert_eq!(config.on_failure, FailurePolicy::Continue);
        assert_eq!(config.resources_dir, Config::default().resources_dir);
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let dir = scratch_dir("config");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("keygen.json");
        std::fs::write(&path, r#"{ "resource_dir": "/tmp" }"#).unwrap();
        assert!(matches!(Config::load(&path), Err(KeygenError::Configuration(_))));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_environment_overrides_directories() {
        let config = Config::default().with_overrides([
            (RESOURCES_DIR_ENV.to_string(), "/srv/keys".to_string()),
            ("HOME".to_string(), "/root".to_string()),
        ]);
        assert_eq!(config.resources_dir, Path::new("/srv/keys"));
        assert_eq!(config.verifier_dir, Config::default().verifier_dir);
    }
}
