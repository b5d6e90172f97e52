use std::time::{Duration, Instant};

use tracing::{error, info};

use crate::{
    compiler::Compiler,
    error::{KeygenError, Result, Stage},
    setup::TrustedParty,
    store::{Artifact, ArtifactStore},
    variant::{Variant, VariantSpec},
};

/// Metrics of one completed variant.
#[derive(Debug, Clone)]
pub struct VariantReport {
    pub variant: Variant,
    pub num_constraints: usize,
    pub num_vars: usize,
    pub num_inputs: usize,
    pub block_count: Option<usize>,
    pub compile_time: Duration,
    pub setup_time: Duration,
    pub persist_time: Duration,
    pub artifacts: Vec<Artifact>,
}

/// compile -> setup -> persist, one variant at a time.
pub struct Pipeline {
    store: ArtifactStore,
}

impl Pipeline {
    pub fn new(store: ArtifactStore) -> Self {
        Pipeline { store }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    fn check_descriptor(spec: &VariantSpec) -> Result<()> {
        let variant = spec.variant;
        let descriptor = &spec.descriptor;
        if descriptor.name() != variant.suffix() {
            return Err(KeygenError::Configuration(format!(
                "{variant} was given a {} descriptor",
                descriptor.name()
            )));
        }
        if descriptor.key_len() != variant.key_len() {
            return Err(KeygenError::Configuration(format!(
                "{variant} expects a {}-byte key, descriptor declares {}",
                variant.key_len(),
                descriptor.key_len()
            )));
        }
        Ok(())
    }

    pub fn run_variant(&self, spec: &VariantSpec) -> Result<VariantReport> {
        let variant = spec.variant;
        info!(%variant, "generating keys");
        Self::check_descriptor(spec).map_err(|err| err.at(variant, Stage::Compile))?;

        let start = Instant::now();
        let r1cs = Compiler::compile(spec.field, spec.descriptor.as_ref())
            .map_err(|err| err.at(variant, Stage::Compile))?;
        let compile_time = start.elapsed();
        info!(%variant, "compile took {:?}", compile_time);
        match r1cs.block_count {
            Some(blocks) => info!(
                %variant,
                "blocks = {}, constraints = {}",
                blocks,
                r1cs.num_constraints()
            ),
            None => info!(%variant, "constraints = {}", r1cs.num_constraints()),
        }

        let start = Instant::now();
        let (pk, vk) = TrustedParty::setup(spec.field, &r1cs)
            .map_err(|err| err.at(variant, Stage::Setup))?;
        let setup_time = start.elapsed();
        info!(%variant, "setup took {:?}", setup_time);

        let start = Instant::now();
        let artifacts = self
            .store
            .persist(variant, &r1cs, &pk, &vk)
            .map_err(|err| err.at(variant, Stage::Persist))?;
        let persist_time = start.elapsed();
        for artifact in &artifacts {
            info!(%variant, "wrote {} ({} bytes)", artifact.path.display(), artifact.len);
        }

        Ok(VariantReport {
            variant,
            num_constraints: r1cs.num_constraints(),
            num_vars: r1cs.num_vars,
            num_inputs: r1cs.num_inputs,
            block_count: r1cs.block_count,
            compile_time,
            setup_time,
            persist_time,
            artifacts,
        })
    }

    /// Runs the variants in order and stops at the first failure.
    pub fn run(&self, specs: &[VariantSpec]) -> Result<Vec<VariantReport>> {
        let mut reports = Vec::with_capacity(specs.len());
        for spec in specs {
            match self.run_variant(spec) {
                Ok(report) => reports.push(report),
                Err(err) => {
                    error!(variant = %spec.variant, "{err}");
                    return Err(err);
                }
            }
        }
        Ok(reports)
    }

    /// Runs every variant regardless of earlier failures.
    pub fn run_isolated(&self, specs: &[VariantSpec]) -> Vec<(Variant, Result<VariantReport>)> {
        specs
            .iter()
            .map(|spec| {
                let outcome = self.run_variant(spec);
                if let Err(err) = &outcome {
                    error!(variant = %spec.variant, "{err}");
                }
                (spec.variant, outcome)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::{
        aes::{AesCircuit, KeySize},
        chacha::ChaChaCircuit,
        setup::VerifyingKey,
        store::ArtifactKind,
        testing::scratch_dir,
    };

    fn pipeline(name: &str) -> (std::path::PathBuf, Pipeline) {
        let root = scratch_dir(name);
        let store = ArtifactStore::new(root.join("resources"), root.join("verifier"));
        (root, Pipeline::new(store))
    }

    fn reduced_aes128() -> VariantSpec {
        VariantSpec::new(
            Variant::Aes128,
            Box::new(AesCircuit::new(KeySize::Aes128).with_rounds(1)),
        )
    }

    fn reduced_chacha() -> VariantSpec {
        VariantSpec::new(
            Variant::ChaCha20,
            Box::new(ChaChaCircuit::with_blocks(1).with_rounds(2)),
        )
    }

    fn short_key_aes128() -> VariantSpec {
        VariantSpec::new(
            Variant::Aes128,
            Box::new(AesCircuit::new(KeySize::Aes128).with_key(&[0u8; 15])),
        )
    }

    #[test]
    fn test_reduced_aes128_run() {
        let (root, pipeline) = pipeline("pipeline-aes128");
        let report = pipeline.run_variant(&reduced_aes128()).unwrap();
        assert!(report.num_constraints > 0);
        assert_eq!(report.block_count, Some(1));
        assert_eq!(report.artifacts.len(), 4);

        let store = pipeline.store();
        let r1cs = store.load_r1cs(Variant::Aes128).unwrap();
        assert_eq!(r1cs.num_constraints(), report.num_constraints);
        let staged = store.load(ArtifactKind::VerifyingKey, Variant::Aes128).unwrap();
        assert_eq!(staged, store.load_published_vk(Variant::Aes128).unwrap());
        assert!(VerifyingKey::load(&staged, &r1cs).is_ok());

        let published = store.load_published_vk(Variant::Aes128).unwrap();
        let published = VerifyingKey::from_bytes(&published).unwrap();
        assert_eq!(published.header().circuit, Variant::Aes128.suffix());
        assert_eq!(published.header().params.num_inputs, report.num_inputs);

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_short_key_writes_nothing() {
        let (root, pipeline) = pipeline("pipeline-short-key");
        let err = pipeline.run_variant(&short_key_aes128()).unwrap_err();
        assert!(matches!(err.root(), KeygenError::Configuration(_)));
        assert!(matches!(
            err,
            KeygenError::Stage {
                variant: Variant::Aes128,
                stage: Stage::Compile,
                ..
            }
        ));
        assert!(!root.exists());
    }

    #[test]
    fn test_short_key_leaves_existing_artifacts_untouched() {
        let (root, pipeline) = pipeline("pipeline-short-key-existing");
        let report = pipeline.run_variant(&reduced_aes128()).unwrap();
        let snapshot = |path: &std::path::Path| {
            let modified = fs::metadata(path).unwrap().modified().unwrap();
            (fs::read(path).unwrap(), modified)
        };
        let before: Vec<_> = report
            .artifacts
            .iter()
            .map(|artifact| snapshot(&artifact.path))
            .collect();

        let err = pipeline.run_variant(&short_key_aes128()).unwrap_err();
        assert!(matches!(err.root(), KeygenError::Configuration(_)));
        for (artifact, before) in report.artifacts.iter().zip(before) {
            assert_eq!(snapshot(&artifact.path), before);
        }

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_mismatched_descriptor_is_rejected() {
        let (root, pipeline) = pipeline("pipeline-mismatch");
        let spec = VariantSpec::new(Variant::ChaCha20, Box::new(AesCircuit::new(KeySize::Aes256)));
        let err = pipeline.run_variant(&spec).unwrap_err();
        assert!(matches!(err.root(), KeygenError::Configuration(_)));
        assert!(!root.exists());
    }

    #[test]
    fn test_run_halts_on_first_failure() {
        let (root, pipeline) = pipeline("pipeline-halt");
        let result = pipeline.run(&[short_key_aes128(), reduced_chacha()]);
        assert!(result.is_err());
        assert!(!pipeline
            .store()
            .path(ArtifactKind::ConstraintSystem, Variant::ChaCha20)
            .exists());
        assert!(!root.exists());
    }

    #[test]
    fn test_isolated_run_continues_past_failure() {
        let (root, pipeline) = pipeline("pipeline-isolated");
        let outcomes = pipeline.run_isolated(&[short_key_aes128(), reduced_chacha()]);
        assert_eq!(outcomes.len(), 2);
        assert!(matches!(outcomes[0], (Variant::Aes128, Err(_))));
        let (variant, report) = &outcomes[1];
        assert_eq!(*variant, Variant::ChaCha20);
        let report = report.as_ref().unwrap();
        assert_eq!(report.block_count, Some(1));
        for artifact in &report.artifacts {
            assert!(artifact.path.exists());
        }
        assert!(!pipeline
            .store()
            .path(ArtifactKind::ProvingKey, Variant::Aes128)
            .exists());

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    #[ignore]
    fn test_default_variants() {
        let (root, pipeline) = pipeline("pipeline-default");
        let specs: Vec<_> = Variant::ALL.iter().map(Variant::spec).collect();
        let reports = pipeline.run(&specs).unwrap();
        let chacha = &reports[0];
        assert_eq!(chacha.block_count, Some(4));
        assert!(reports[1..]
            .iter()
            .all(|report| report.num_constraints < chacha.num_constraints));

        fs::remove_dir_all(&root).unwrap();
    }
}
