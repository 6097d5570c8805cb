// Configuration loader
// Loads ~/.nova-bridge/config.toml, then applies environment overrides.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use super::settings::BridgeConfig;

/// Load configuration from the config file and environment.
///
/// Precedence: environment variables override the file, the file overrides
/// built-in defaults. The export directory is created here so no handler has
/// to race on creating it later.
pub fn load_config() -> Result<BridgeConfig> {
    let mut config = match config_path() {
        Some(path) if path.exists() => {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?
        }
        _ => BridgeConfig::default(),
    };

    apply_env_overrides(&mut config)?;

    fs::create_dir_all(&config.export_dir).with_context(|| {
        format!(
            "Failed to create export directory {}",
            config.export_dir.display()
        )
    })?;

    Ok(config)
}

fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".nova-bridge").join("config.toml"))
}

fn apply_env_overrides(config: &mut BridgeConfig) -> Result<()> {
    if let Ok(host) = std::env::var("NOVA_BRIDGE_HOST") {
        if !host.is_empty() {
            config.nova.host = host;
        }
    }
    if let Ok(port) = std::env::var("NOVA_BRIDGE_PORT") {
        config.nova.port = port
            .parse()
            .context("NOVA_BRIDGE_PORT must be a port number")?;
    }
    if let Ok(key) = std::env::var("NOVA_BRIDGE_API_KEY") {
        if !key.is_empty() {
            config.nova.api_key = Some(key);
        }
    }
    if let Ok(bin) = std::env::var("BLENDER_BIN") {
        if !bin.is_empty() {
            config.blender_bin = PathBuf::from(bin);
        }
    }
    if let Ok(dir) = std::env::var("NOVA_BRIDGE_EXPORT_DIR") {
        if !dir.is_empty() {
            config.export_dir = PathBuf::from(dir);
        }
    }
    if let Ok(dir) = std::env::var("NOVA_BRIDGE_SCRIPTS_DIR") {
        if !dir.is_empty() {
            config.scripts_dir = PathBuf::from(dir);
        }
    }
    if let Ok(key) = std::env::var("MESHY_API_KEY") {
        if !key.is_empty() {
            config.meshy_api_key = Some(key);
        }
    }
    Ok(())
}
