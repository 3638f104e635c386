use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for the gate pass service
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatePassConfig {
    /// Workflow store settings
    pub store: StoreConfig,
    /// Observability settings
    pub observability: ObservabilityConfig,
    /// Menu resolution settings
    pub menu: MenuConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Path to the JSON state file backing the CLI
    pub state_file_path: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Enable structured JSON tracing output
    pub tracing_enabled: bool,
    /// Log level
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MenuConfig {
    /// Serve the baseline member menu for unrecognized role names instead
    /// of failing. Historical behavior; the warn log fires either way.
    pub unknown_role_fallback: bool,
}

impl Default for GatePassConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig {
                state_file_path: ".gatepass/state.json".to_string(),
            },
            observability: ObservabilityConfig {
                tracing_enabled: true,
                log_level: "info".to_string(),
            },
            menu: MenuConfig {
                unknown_role_fallback: true,
            },
        }
    }
}

impl GatePassConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration file (gatepass.toml)
    /// 3. Environment variables (prefixed with GATE_PASS_)
    pub fn load() -> Result<Self> {
        let defaults = Self::default();
        let mut builder = Config::builder()
            .set_default("store.state_file_path", defaults.store.state_file_path)?
            .set_default("observability.tracing_enabled", defaults.observability.tracing_enabled)?
            .set_default("observability.log_level", defaults.observability.log_level)?
            .set_default("menu.unknown_role_fallback", defaults.menu.unknown_role_fallback)?;

        if Path::new("gatepass.toml").exists() {
            builder = builder.add_source(File::with_name("gatepass"));
        }

        builder = builder.add_source(
            Environment::with_prefix("GATE_PASS")
                .separator("_")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<GatePassConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        // Load .env file first
        let _ = GatePassConfig::load_env_file();
        GatePassConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static GatePassConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}

/// Initialize configuration (called at startup)
pub fn init_config() -> Result<()> {
    let _config = config()?;
    tracing::info!("Configuration loaded successfully");
    Ok(())
}
