use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use cipher_keygen::{
    config::{Config, FailurePolicy},
    pipeline::Pipeline,
    store::ArtifactStore,
    variant::{Variant, VariantSpec},
};
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();

    let path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = Config::resolve(path.as_deref()).context("failed to load configuration")?;
    info!(
        resources_dir = %config.resources_dir.display(),
        verifier_dir = %config.verifier_dir.display(),
        "starting key generation"
    );

    let pipeline = Pipeline::new(ArtifactStore::from_config(&config));
    let specs: Vec<VariantSpec> = config.variants.iter().map(Variant::spec).collect();

    match config.on_failure {
        FailurePolicy::Halt => {
            let reports = pipeline.run(&specs)?;
            info!("generated keys for {} variants", reports.len());
            Ok(ExitCode::SUCCESS)
        }
        FailurePolicy::Continue => {
            let outcomes = pipeline.run_isolated(&specs);
            let failed: Vec<String> = outcomes
                .iter()
                .filter(|(_, outcome)| outcome.is_err())
                .map(|(variant, _)| variant.to_string())
                .collect();
            if failed.is_empty() {
                info!("generated keys for {} variants", outcomes.len());
                Ok(ExitCode::SUCCESS)
            } else {
                error!("key generation failed for {}", failed.join(", "));
                Ok(ExitCode::FAILURE)
            }
        }
    }
}
