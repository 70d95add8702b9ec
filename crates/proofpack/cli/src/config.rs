//! Configuration loading.
//!
//! Sources, later ones winning: built-in defaults, an optional TOML file,
//! then `PROOFPACK__SECTION__KEY` environment variables.

use crate::error::{CliError, CliResult};
use proofpack_types::ProofConfig;
use std::path::Path;

const ENV_PREFIX: &str = "PROOFPACK";
const ENV_SEPARATOR: &str = "__";

/// Load and validate the pipeline configuration.
pub fn load(path: Option<&Path>) -> CliResult<ProofConfig> {
    let mut builder = config::Config::builder();

    if let Some(path) = path {
        if !path.is_file() {
            return Err(CliError::Config(format!(
                "config file {} does not exist",
                path.display()
            )));
        }
        builder = builder.add_source(config::File::from(path).required(true));
    }

    builder = builder.add_source(
        config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator(ENV_SEPARATOR)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    let settings = builder.build()?;
    let raw: serde_json::Value = settings.clone().try_deserialize()?;
    if let Some(key) = find_secret_key(&raw, "") {
        return Err(CliError::Config(format!(
            "{key}: passphrases are never read from configuration; use --passphrase-env or --passphrase-file"
        )));
    }

    let config: ProofConfig = settings.try_deserialize()?;
    config.validate()?;
    tracing::debug!(
        rules = config.rules.len(),
        defaults = config.use_default_rules,
        primary = %config.hashing.primary,
        "configuration loaded"
    );
    Ok(config)
}

fn find_secret_key(value: &serde_json::Value, prefix: &str) -> Option<String> {
    let serde_json::Value::Object(map) = value else {
        return None;
    };
    map.iter().find_map(|(key, child)| {
        let full = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        if key.to_ascii_lowercase().contains("passphrase") {
            Some(full)
        } else {
            find_secret_key(child, &full)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn finds_nested_passphrase() {
        let raw = json!({"seal": {"kdf": {"memory_kib": 64}, "passphrase": "hunter2"}});
        assert_eq!(find_secret_key(&raw, ""), Some("seal.passphrase".to_string()));
        assert_eq!(find_secret_key(&json!({"run": {"anchor_id": "x"}}), ""), None);
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = load(Some(Path::new("/nonexistent/proofpack.toml"))).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }
}
