//! Command-line configuration and input loading

use anyhow::Context;
use cropsense_core::{Error, InputPayload, InputRecord};
use cropsense_eval::EvaluationConfig;
use std::io::Read;
use std::path::Path;

/// Load evaluation settings from file and CLI overrides
pub fn load_evaluation_config(cli: &crate::Cli) -> anyhow::Result<EvaluationConfig> {
    // Missing file means defaults, like an absent optional flag
    let mut config = match &cli.config {
        Some(path) if Path::new(path).exists() => EvaluationConfig::from_file(path)
            .with_context(|| format!("Failed to load evaluation config from {}", path))?,
        _ => EvaluationConfig::default(),
    };

    apply_overrides(&mut config, cli.runs, cli.seed, cli.base_model.as_deref())?;
    config.validate()?;
    Ok(config)
}

fn apply_overrides(
    config: &mut EvaluationConfig,
    runs: Option<usize>,
    seed: Option<u64>,
    base_model: Option<&str>,
) -> anyhow::Result<()> {
    if let Some(runs) = runs {
        config.noise.runs = runs;
    }

    if let Some(seed) = seed {
        config.noise.seed = Some(seed);
    }

    if let Some(model) = base_model {
        config.base_model = model.parse()?;
    }

    Ok(())
}

/// Read one input record as JSON from a file, or stdin when `path` is `-`
pub fn read_input(path: &str) -> anyhow::Result<InputRecord> {
    let content = if path == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read input from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path).with_context(|| format!("Failed to read input {}", path))?
    };

    parse_input(&content)
}

/// Parse and validate the wire form of an input record
pub fn parse_input(content: &str) -> anyhow::Result<InputRecord> {
    let payload: InputPayload = serde_json::from_str(content)
        .map_err(|e| Error::validation("input", format!("not a valid record: {}", e)))?;
    Ok(InputRecord::try_from(payload)?)
}
