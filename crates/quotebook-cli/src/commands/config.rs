//! Config command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use quotebook_core::Config;

use crate::output::{Output, OutputFormat};

const VALID_KEYS: &str = "data_dir, remote_url, auto_sync, sync_interval_secs, \
                          sync_on_start, request_timeout_secs, log_file";

/// Show current configuration
pub fn show(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "remote_url": config.remote_url,
                    "auto_sync": config.auto_sync,
                    "sync_interval_secs": config.sync_interval_secs,
                    "sync_on_start": config.sync_on_start,
                    "request_timeout_secs": config.request_timeout_secs,
                    "log_file": config.log_file
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  data_dir:             {}", config.data_dir.display());
            println!("  remote_url:           {}", config.remote_url);
            println!("  auto_sync:            {}", config.auto_sync);
            println!("  sync_interval_secs:   {}", config.sync_interval_secs);
            println!("  sync_on_start:        {}", config.sync_on_start);
            println!("  request_timeout_secs: {}", config.request_timeout_secs);
            println!(
                "  log_file:             {}",
                config
                    .log_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(not set)".to_string())
            );
            println!();
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(
    key: String,
    value: String,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    let mut config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    apply(&mut config, &key, &value)?;

    // Save to the CLI-specified path or default
    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    config
        .save_to_path(&save_path)
        .context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));

    Ok(())
}

fn apply(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "data_dir" => {
            config.data_dir = value.into();
        }
        "remote_url" => {
            if value.is_empty() {
                bail!("remote_url cannot be empty");
            }
            config.remote_url = value.to_string();
        }
        "auto_sync" => {
            config.auto_sync = value
                .parse()
                .context("Invalid value for auto_sync. Use 'true' or 'false'.")?;
        }
        "sync_interval_secs" => {
            config.sync_interval_secs = parse_positive(key, value)?;
        }
        "sync_on_start" => {
            config.sync_on_start = value
                .parse()
                .context("Invalid value for sync_on_start. Use 'true' or 'false'.")?;
        }
        "request_timeout_secs" => {
            config.request_timeout_secs = parse_positive(key, value)?;
        }
        "log_file" => {
            config.log_file = if value.is_empty() || value == "none" {
                None
            } else {
                Some(value.into())
            };
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\nValid keys: {}",
                key,
                VALID_KEYS
            );
        }
    }
    Ok(())
}

fn parse_positive(key: &str, value: &str) -> Result<u64> {
    match value.parse::<u64>() {
        Ok(0) | Err(_) => bail!("Invalid value for {}. Use a whole number of seconds above 0.", key),
        Ok(secs) => Ok(secs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_apply_known_keys() {
        let mut config = Config::default();
        apply(&mut config, "auto_sync", "true").unwrap();
        apply(&mut config, "sync_interval_secs", "45").unwrap();
        apply(&mut config, "log_file", "/tmp/quotebook.log").unwrap();
        assert!(config.auto_sync);
        assert_eq!(config.sync_interval_secs, 45);
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/quotebook.log")));

        apply(&mut config, "log_file", "none").unwrap();
        assert!(config.log_file.is_none());
    }

    #[test]
    fn test_apply_rejects_bad_values() {
        let mut config = Config::default();
        assert!(apply(&mut config, "auto_sync", "sometimes").is_err());
        assert!(apply(&mut config, "sync_interval_secs", "0").is_err());
        assert!(apply(&mut config, "remote_url", "").is_err());
        assert!(apply(&mut config, "favorite_color", "blue").is_err());
    }

    #[test]
    fn test_set_writes_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        let output = Output::new(OutputFormat::Quiet);

        set(
            "sync_on_start".to_string(),
            "true".to_string(),
            Some(&path),
            &output,
        )
        .unwrap();

        let saved = Config::load_from_path(&path).unwrap();
        assert!(saved.sync_on_start);
    }
}
