use std::path::PathBuf;

use thiserror::Error;

use crate::variant::Variant;

/// Pipeline stage a variant failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Compile,
    Setup,
    Persist,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Compile => "compile",
            Stage::Setup => "setup",
            Stage::Persist => "persist",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum KeygenError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Compilation failed: {0}")]
    Compilation(String),

    #[error("Setup failed: {0}")]
    Setup(String),

    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Key does not match constraint system: {0}")]
    KeyMismatch(String),

    #[error("Invalid witness: {0}")]
    Witness(String),

    #[error("{variant} failed during {stage}: {source}")]
    Stage {
        variant: Variant,
        stage: Stage,
        #[source]
        source: Box<KeygenError>,
    },
}

impl KeygenError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        KeygenError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn at(self, variant: Variant, stage: Stage) -> Self {
        KeygenError::Stage {
            variant,
            stage,
            source: Box::new(self),
        }
    }

    /// Innermost error, looking through stage wrappers.
    pub fn root(&self) -> &KeygenError {
        match self {
            KeygenError::Stage { source, .. } => source.root(),
            err => err,
        }
    }
}

impl From<bincode::Error> for KeygenError {
    fn from(err: bincode::Error) -> Self {
        KeygenError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for KeygenError {
    fn from(err: serde_json::Error) -> Self {
        KeygenError::Configuration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, KeygenError>;
