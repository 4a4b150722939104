//! Layered application configuration.
//!
//! Precedence, lowest first: built-in defaults, YAML file, environment
//! (`APP__SECTION__KEY`), CLI overrides.
//!
//! Module sections live under `modules.<name>` and are read with two loaders:
//! `module_config_or_default` falls back to `T::default()` when the section is
//! absent, `module_config_required` treats absence as an error. Both fail when
//! a `config` section is present but malformed.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use problemkit::ProblemSettings;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Environment prefix; nested keys are separated by `__`.
pub const ENV_PREFIX: &str = "APP__";

/// Typed module configuration error
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("module '{module}' not found")]
    ModuleNotFound { module: String },
    #[error("module '{module}' config must be an object")]
    InvalidModuleStructure { module: String },
    #[error("missing 'config' section in module '{module}'")]
    MissingConfigSection { module: String },
    #[error("invalid config for module '{module}': {source}")]
    InvalidConfig {
        module: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub problem: ProblemSettings,
    /// Raw per-module sections: `modules.<name> = { config: {...} }`.
    pub modules: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound for a single request; exceeding it yields 504.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8080,
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when neither `-v` nor `RUST_LOG` is set.
    pub filter: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_owned(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// CLI values that take precedence over every other layer.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub port: Option<u16>,
    pub verbose: u8,
}

impl AppConfig {
    /// Figment with all file and environment layers applied.
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load configuration from defaults, the optional YAML file and the
    /// environment.
    ///
    /// # Errors
    /// Returns an error if the file does not exist or any layer fails to
    /// deserialize into [`AppConfig`].
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path
            && !path.is_file()
        {
            anyhow::bail!("config file does not exist: {}", path.display());
        }

        let config: Self = Self::figment(path)
            .extract()
            .context("failed to load configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(port) = args.port {
            self.server.port = port;
        }
        // -v wins over the config filter; see `logging::resolve_filter`
        if args.verbose > 0 {
            self.logging.filter = crate::logging::verbosity_filter(args.verbose).to_owned();
        }
    }

    /// Semantic checks that deserialization cannot express.
    ///
    /// # Errors
    /// Returns an error describing the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        if self.server.host.trim().is_empty() {
            anyhow::bail!("server.host must not be empty");
        }
        if self.server.request_timeout_secs == 0 {
            anyhow::bail!("server.request_timeout_secs must be greater than zero");
        }
        tracing_subscriber::EnvFilter::try_new(&self.logging.filter)
            .with_context(|| format!("invalid logging.filter '{}'", self.logging.filter))?;
        Ok(())
    }

    /// Effective configuration as pretty JSON.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize configuration")
    }
}

/// Provider of raw module configuration sections.
pub trait ConfigProvider: Send + Sync {
    fn get_module_config(&self, module_name: &str) -> Option<&serde_json::Value>;
}

impl ConfigProvider for AppConfig {
    fn get_module_config(&self, module_name: &str) -> Option<&serde_json::Value> {
        self.modules.get(module_name)
    }
}

/// Lenient loader: missing module, non-object module or missing `config`
/// section all yield `T::default()`.
///
/// # Errors
/// Returns `ConfigError::InvalidConfig` if the config section exists but
/// cannot be deserialized.
pub fn module_config_or_default<T: DeserializeOwned + Default>(
    provider: &dyn ConfigProvider,
    module_name: &str,
) -> Result<T, ConfigError> {
    let Some(section) = provider
        .get_module_config(module_name)
        .and_then(serde_json::Value::as_object)
        .and_then(|obj| obj.get("config"))
    else {
        return Ok(T::default());
    };
    parse_section(section, module_name)
}

/// Strict loader: the module and its `config` section must be present.
///
/// # Errors
/// Returns `ConfigError` if the module is missing, is not an object, has no
/// `config` section, or the section is invalid.
pub fn module_config_required<T: DeserializeOwned>(
    provider: &dyn ConfigProvider,
    module_name: &str,
) -> Result<T, ConfigError> {
    let module = module_name.to_owned();
    let raw = provider
        .get_module_config(module_name)
        .ok_or_else(|| ConfigError::ModuleNotFound {
            module: module.clone(),
        })?;
    let obj = raw
        .as_object()
        .ok_or_else(|| ConfigError::InvalidModuleStructure {
            module: module.clone(),
        })?;
    let section = obj
        .get("config")
        .ok_or(ConfigError::MissingConfigSection { module })?;
    parse_section(section, module_name)
}

fn parse_section<T: DeserializeOwned>(
    section: &serde_json::Value,
    module_name: &str,
) -> Result<T, ConfigError> {
    T::deserialize(section).map_err(|source| ConfigError::InvalidConfig {
        module: module_name.to_owned(),
        source,
    })
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use problemkit::FieldNaming;
    use serde_json::json;
    use std::io::Write;

    #[derive(Debug, PartialEq, Deserialize, Default)]
    struct DemoConfig {
        #[serde(default)]
        style: String,
    }

    fn yaml_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    const ENV_KEYS: [&str; 2] = ["APP__SERVER__PORT", "APP__LOGGING__FORMAT"];

    fn load_clean(path: Option<&Path>) -> Result<AppConfig> {
        temp_env::with_vars_unset(ENV_KEYS, || AppConfig::load_or_default(path))
    }

    fn with_modules(modules: serde_json::Value) -> AppConfig {
        AppConfig {
            modules: serde_json::from_value(modules).unwrap(),
            ..AppConfig::default()
        }
    }

    #[test]
    fn defaults_without_file() {
        let config = load_clean(None).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.logging.filter, "info");
        assert!(config.problem.expose_internal_detail);
        assert!(config.modules.is_empty());
    }

    #[test]
    fn yaml_layer_overrides_defaults() {
        let file = yaml_file(
            "server:\n  port: 9001\nproblem:\n  expose_internal_detail: false\n  field_naming: pascal_case\nmodules:\n  errors_demo:\n    config:\n      style: minimal\n",
        );
        let config = load_clean(Some(file.path())).unwrap();

        assert_eq!(config.server.port, 9001);
        assert_eq!(config.server.host, "127.0.0.1");
        assert!(!config.problem.expose_internal_detail);
        assert_eq!(config.problem.field_naming, FieldNaming::PascalCase);
        let demo: DemoConfig = module_config_required(&config, "errors_demo").unwrap();
        assert_eq!(demo.style, "minimal");
    }

    #[test]
    fn env_layer_overrides_yaml() {
        let file = yaml_file("server:\n  port: 9001\n");
        let config = temp_env::with_vars(
            [
                (ENV_KEYS[0], Some("9100")),
                (ENV_KEYS[1], Some("json")),
            ],
            || AppConfig::load_or_default(Some(file.path())).unwrap(),
        );
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = load_clean(Some(Path::new("/definitely/not/here.yaml"))).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let file = yaml_file("server:\n  port: not-a-number\n");
        assert!(load_clean(Some(file.path())).is_err());
    }

    #[test]
    fn validate_rejects_zero_timeout_and_bad_filter() {
        let mut config = AppConfig::default();
        config.server.request_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.logging.filter = "my_crate=loud".to_owned();
        assert!(config.validate().is_err());
    }

    #[test]
    fn cli_overrides_win() {
        let mut config = AppConfig::default();
        config.apply_cli_overrides(&CliArgs {
            port: Some(7000),
            verbose: 2,
        });
        assert_eq!(config.server.port, 7000);
        assert_eq!(config.logging.filter, "debug");

        let mut untouched = AppConfig::default();
        untouched.apply_cli_overrides(&CliArgs::default());
        assert_eq!(untouched, AppConfig::default());
    }

    #[test]
    fn pretty_json_contains_sections() {
        let text = AppConfig::default().to_json_pretty().unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["server"]["port"], json!(8080));
        assert_eq!(value["problem"]["field_naming"], json!("camel_case"));
    }

    #[test]
    fn lenient_loader_falls_back_to_default() {
        let config = with_modules(json!({
            "no_config": { "other": 1 },
            "not_object": "oops",
        }));
        for name in ["absent", "no_config", "not_object"] {
            let parsed: DemoConfig = module_config_or_default(&config, name).unwrap();
            assert_eq!(parsed, DemoConfig::default());
        }
    }

    #[test]
    fn lenient_loader_rejects_invalid_section() {
        let config = with_modules(json!({ "demo": { "config": { "style": 42 } } }));
        let err = module_config_or_default::<DemoConfig>(&config, "demo").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConfig { module, .. } if module == "demo"));
    }

    #[test]
    fn strict_loader_reports_each_failure() {
        let config = with_modules(json!({
            "no_config": {},
            "not_object": [1, 2],
        }));

        assert!(matches!(
            module_config_required::<DemoConfig>(&config, "absent"),
            Err(ConfigError::ModuleNotFound { .. })
        ));
        assert!(matches!(
            module_config_required::<DemoConfig>(&config, "not_object"),
            Err(ConfigError::InvalidModuleStructure { .. })
        ));
        assert!(matches!(
            module_config_required::<DemoConfig>(&config, "no_config"),
            Err(ConfigError::MissingConfigSection { .. })
        ));
    }
}
