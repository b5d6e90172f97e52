use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{
    bin_loader,
    config::Config,
    error::{KeygenError, Result},
    r1cs::ConstraintSystem,
    setup::{ProvingKey, VerifyingKey},
    variant::Variant,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    ConstraintSystem,
    ProvingKey,
    VerifyingKey,
}

impl ArtifactKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            ArtifactKind::ConstraintSystem => "r1cs",
            ArtifactKind::ProvingKey => "pk",
            ArtifactKind::VerifyingKey => "vk",
        }
    }
}

/// One file written by `persist`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub path: PathBuf,
    pub len: usize,
}

/// Fixed artifact locations under two roots:
///
/// ```text
/// resources_dir/r1cs.{suffix}
/// resources_dir/pk.{suffix}
/// resources_dir/vk.{suffix}
/// verifier_dir/generated/vk.{suffix}
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactStore {
    resources_dir: PathBuf,
    verifier_dir: PathBuf,
}

fn temp_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| KeygenError::io(parent, err))?;
    }
    let mut file = File::create(path).map_err(|err| KeygenError::io(path, err))?;
    file.write_all(bytes)
        .and_then(|()| file.sync_all())
        .map_err(|err| KeygenError::io(path, err))
}

fn remove_stale(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(KeygenError::io(path, err)),
    }
}

fn discard(temps: &[PathBuf]) {
    for temp in temps {
        let _ = fs::remove_file(temp);
    }
}

impl ArtifactStore {
    pub fn new(resources_dir: impl Into<PathBuf>, verifier_dir: impl Into<PathBuf>) -> Self {
        ArtifactStore {
            resources_dir: resources_dir.into(),
            verifier_dir: verifier_dir.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.resources_dir, &config.verifier_dir)
    }

    pub fn path(&self, kind: ArtifactKind, variant: Variant) -> PathBuf {
        self.resources_dir
            .join(format!("{}.{}", kind.prefix(), variant.suffix()))
    }

    pub fn published_vk_path(&self, variant: Variant) -> PathBuf {
        self.verifier_dir
            .join("generated")
            .join(format!("{}.{}", ArtifactKind::VerifyingKey.prefix(), variant.suffix()))
    }

    /// Replaces all four artifacts of `variant`.
    ///
    /// Everything is first written to `<target>.tmp`. Only when every
    /// temporary is on disk are the old targets removed and the temporaries
    /// renamed into place; a failure while staging leaves the previous set
    /// untouched.
    pub fn persist(
        &self,
        variant: Variant,
        r1cs: &ConstraintSystem,
        pk: &ProvingKey,
        vk: &VerifyingKey,
    ) -> Result<Vec<Artifact>> {
        let vk_bytes = vk.to_bytes()?;
        let writes = [
            (
                ArtifactKind::ConstraintSystem,
                self.path(ArtifactKind::ConstraintSystem, variant),
                r1cs.to_bytes()?,
            ),
            (
                ArtifactKind::ProvingKey,
                self.path(ArtifactKind::ProvingKey, variant),
                pk.to_bytes()?,
            ),
            (
                ArtifactKind::VerifyingKey,
                self.path(ArtifactKind::VerifyingKey, variant),
                vk_bytes.clone(),
            ),
            (
                ArtifactKind::VerifyingKey,
                self.published_vk_path(variant),
                vk_bytes,
            ),
        ];

        let mut staged = Vec::with_capacity(writes.len());
        for (_, target, bytes) in writes.iter() {
            let temp = temp_path(target);
            if let Err(err) = write_file(&temp, bytes) {
                let _ = fs::remove_file(&temp);
                discard(&staged);
                return Err(err);
            }
            staged.push(temp);
        }

        let mut artifacts = Vec::with_capacity(writes.len());
        for ((kind, target, bytes), temp) in writes.iter().zip(staged.iter()) {
            let swapped = remove_stale(target).and_then(|()| {
                fs::rename(temp, target).map_err(|err| KeygenError::io(target, err))
            });
            if let Err(err) = swapped {
                discard(&staged);
                return Err(err);
            }
            debug!(%variant, path = %target.display(), bytes = bytes.len(), "artifact written");
            artifacts.push(Artifact {
                kind: *kind,
                path: target.clone(),
                len: bytes.len(),
            });
        }
        Ok(artifacts)
    }

    pub fn load(&self, kind: ArtifactKind, variant: Variant) -> Result<Vec<u8>> {
        bin_loader::read_file(&self.path(kind, variant))
    }

    pub fn load_published_vk(&self, variant: Variant) -> Result<Vec<u8>> {
        bin_loader::read_file(&self.published_vk_path(variant))
    }

    pub fn load_r1cs(&self, variant: Variant) -> Result<ConstraintSystem> {
        bin_loader::load_from_file(&self.path(ArtifactKind::ConstraintSystem, variant))
    }
}
