// Configuration structs
//
// Built once at startup and passed into every component constructor.
// Nothing reads ambient environment state after load_config() returns.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where the Nova editor's control API listens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NovaEndpoint {
    /// Host the editor listens on (default: localhost)
    #[serde(default = "default_host")]
    pub host: String,

    /// Control API port (default: 30010)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Optional shared secret sent as X-API-Key on every request
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for NovaEndpoint {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            api_key: None,
        }
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    30010
}

/// HTTP server configuration (agent-facing tool surface)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:30012")
    #[serde(default = "default_bind")]
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:30012".to_string()
}

/// Top-level bridge configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Nova editor control endpoint
    #[serde(default)]
    pub nova: NovaEndpoint,

    /// Path to the Blender binary (default: /usr/bin/blender)
    #[serde(default = "default_blender_bin")]
    pub blender_bin: PathBuf,

    /// Scratch + artifact directory for composed scripts and exports
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,

    /// Directory scanned by blender_list_scripts for reusable .py scripts
    #[serde(default = "default_scripts_dir")]
    pub scripts_dir: PathBuf,

    /// API key for the Meshy text-to-3D provider (optional)
    #[serde(default)]
    pub meshy_api_key: Option<String>,

    /// Agent-facing HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            nova: NovaEndpoint::default(),
            blender_bin: default_blender_bin(),
            export_dir: default_export_dir(),
            scripts_dir: default_scripts_dir(),
            meshy_api_key: None,
            server: ServerConfig::default(),
        }
    }
}

fn default_blender_bin() -> PathBuf {
    PathBuf::from("/usr/bin/blender")
}

fn default_export_dir() -> PathBuf {
    std::env::temp_dir().join("nova-bridge-exports")
}

fn default_scripts_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".nova-bridge")
        .join("scripts")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoint() {
        let ep = NovaEndpoint::default();
        assert_eq!(ep.host, "localhost");
        assert_eq!(ep.port, 30010);
        assert!(ep.api_key.is_none());
    }

    #[test]
    fn test_toml_roundtrip_with_partial_fields() {
        let cfg: BridgeConfig = toml::from_str(
            r#"
            blender_bin = "/opt/blender/blender"

            [nova]
            port = 31000
            "#,
        )
        .unwrap();
        assert_eq!(cfg.blender_bin, PathBuf::from("/opt/blender/blender"));
        assert_eq!(cfg.nova.port, 31000);
        assert_eq!(cfg.nova.host, "localhost");
        assert_eq!(cfg.server.bind_address, "127.0.0.1:30012");
    }

    #[test]
    fn test_empty_toml_gives_defaults() {
        let cfg: BridgeConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.nova.port, 30010);
        assert!(cfg.meshy_api_key.is_none());
    }
}
