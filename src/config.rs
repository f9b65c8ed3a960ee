use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::naming;
use crate::relations::{FilePivotResolver, RelationCatalog, UnlinkScope};
use crate::state_machine::{EntityMachineConfig, StateConfigProvider};

/// Default configuration file name, looked up in the working directory
pub const CONFIG_FILE: &str = "apiforge.toml";

/// Main configuration structure for apiforge
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ApiForgeConfig {
    /// Generated module layout
    #[serde(default)]
    pub module: ModuleConfig,
    /// Per-table state machine blocks, keyed by table name
    #[serde(default)]
    pub state_machine: HashMap<String, EntityMachineConfig>,
    /// Relation metadata and resolver behaviour
    #[serde(default)]
    pub relations: RelationsConfig,
    /// Logging settings
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ModuleConfig {
    /// Module name, e.g. `Blog`
    pub name: String,
    /// Project root the module lives under
    pub root: PathBuf,
    /// Overrides `<root>/Modules/<name>/Entities`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entities_dir: Option<PathBuf>,
    /// Extension of generated entity files
    pub pivot_extension: String,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            name: "Default".to_string(),
            root: PathBuf::from("."),
            entities_dir: None,
            pivot_extension: "php".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RelationsConfig {
    /// Which linked records a direct-relation delete clears
    pub unlink_scope: UnlinkScope,
    /// Declared relations; undeclared ones are probed at request time
    pub catalog: RelationCatalog,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level, used when `RUST_LOG` is unset
    pub log_level: String,
    /// Emit JSON log lines instead of plain text
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl ApiForgeConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration file (apiforge.toml)
    /// 3. Environment variables (prefixed with APIFORGE__)
    pub fn load() -> Result<Self> {
        let path = Path::new(CONFIG_FILE);
        Self::build(path.exists().then_some(path))
    }

    /// Load from an explicit file; the file must exist
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!("Configuration file not found: {}", path.display());
        }
        Self::build(Some(path))
    }

    fn build(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix("APIFORGE")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to read configuration sources")?;
        let apiforge_config: ApiForgeConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        apiforge_config.validate()?;

        tracing::debug!(
            tables = apiforge_config.state_machine.len(),
            relations = apiforge_config.relations.catalog.len(),
            "Configuration loaded"
        );
        Ok(apiforge_config)
    }

    /// Reject machines and declared relations that cannot work at request time
    pub fn validate(&self) -> Result<()> {
        for (table, machine) in &self.state_machine {
            machine
                .validate(table)
                .with_context(|| format!("Invalid state machine for table '{table}'"))?;
        }
        self.relations
            .catalog
            .validate()
            .context("Invalid relation catalog")?;
        Ok(())
    }

    /// Directory holding the generated entity files
    pub fn entities_dir(&self) -> PathBuf {
        self.module.entities_dir.clone().unwrap_or_else(|| {
            self.module
                .root
                .join("Modules")
                .join(&self.module.name)
                .join("Entities")
        })
    }

    pub fn pivot_resolver(&self) -> FilePivotResolver {
        FilePivotResolver::new(self.entities_dir(), self.module.pivot_extension.clone())
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

impl StateConfigProvider for ApiForgeConfig {
    fn state_machine_config(&self, table: &str) -> Option<EntityMachineConfig> {
        self.state_machine
            .iter()
            .find(|(key, _)| naming::table_name(key) == table)
            .map(|(_, machine)| machine.clone())
    }
}

/// Global configuration instance, set once at startup
static CONFIG: std::sync::OnceLock<ApiForgeConfig> = std::sync::OnceLock::new();

/// Get the global configuration
pub fn config() -> Result<&'static ApiForgeConfig> {
    CONFIG
        .get()
        .ok_or_else(|| anyhow::anyhow!("Configuration not initialized, call init_config first"))
}

/// Initialize configuration (called at startup). Loads `.env`, then `path`
/// or `./apiforge.toml`. Later calls keep the first configuration.
pub fn init_config(path: Option<&Path>) -> Result<&'static ApiForgeConfig> {
    if let Some(existing) = CONFIG.get() {
        return Ok(existing);
    }

    ApiForgeConfig::load_env_file()?;
    let loaded = match path {
        Some(path) => ApiForgeConfig::load_from(path)?,
        None => ApiForgeConfig::load()?,
    };
    let config = CONFIG.get_or_init(|| loaded);
    tracing::info!("Configuration loaded successfully");
    Ok(config)
}
