use crate::error::{ReportError, Result};
use crate::logic::calculations::{clamp_max_excess, DEFAULT_MAX_EXCESS_PERCENT, PROGRESS_BAND_PERCENT};
use crate::models::{Agronomist, StatusThresholds};
use dialoguer::{Input, Password};
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::OnceLock;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    pub services: ServicesConfig,
    #[serde(default)]
    pub agronomy: AgronomyConfig,
    #[serde(default)]
    pub agronomist: Agronomist,
}

#[derive(Clone, Deserialize, Serialize)]
pub struct ServicesConfig {
    pub extraction_url: String,
    pub comments_url: String,
    /// Report reference for previously generated comments.
    #[serde(default)]
    pub ai_comments_key: Option<String>,
}

impl std::fmt::Debug for ServicesConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServicesConfig")
            .field("extraction_url", &self.extraction_url)
            .field("comments_url", &self.comments_url)
            .field(
                "ai_comments_key",
                &self.ai_comments_key.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            extraction_url: "http://localhost:5000".into(),
            comments_url: "http://localhost:5000".into(),
            ai_comments_key: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AgronomyConfig {
    #[serde(default = "default_max_excess")]
    pub max_allowed_excess_percent: f64,
    #[serde(default)]
    pub status_thresholds: StatusThresholds,
    #[serde(default = "default_progress_band")]
    pub progress_band_percent: f64,
}

fn default_max_excess() -> f64 {
    DEFAULT_MAX_EXCESS_PERCENT
}

fn default_progress_band() -> f64 {
    PROGRESS_BAND_PERCENT
}

impl Default for AgronomyConfig {
    fn default() -> Self {
        Self {
            max_allowed_excess_percent: DEFAULT_MAX_EXCESS_PERCENT,
            status_thresholds: StatusThresholds::STANDARD,
            progress_band_percent: PROGRESS_BAND_PERCENT,
        }
    }
}

impl AgronomyConfig {
    /// Excess allowance clamped to 5..=100.
    pub fn max_excess_percent(&self) -> f64 {
        clamp_max_excess(self.max_allowed_excess_percent)
    }
}

fn input_error(e: dialoguer::Error) -> ReportError {
    ReportError::Config(format!("Input error: {}", e))
}

impl Config {
    pub fn load(config_override: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_override {
            Some(p) => p,
            None => Self::find_config_path()?,
        };

        if !config_path.exists() {
            return Err(ReportError::Config(format!(
                "Config file not found at {:?}. Run `soilcorrect init` to set up.",
                config_path
            )));
        }

        let config_str = std::fs::read_to_string(&config_path)
            .map_err(|e| ReportError::Config(format!("Failed to read config: {}", e)))?;

        let config = Self::parse(&config_str)?;
        tracing::info!("Loaded config from {}", config_path.display());
        Ok(config)
    }

    /// Parse YAML after `${VAR}` substitution and check the agronomy values.
    pub fn parse(content: &str) -> Result<Self> {
        let content = Self::substitute_env_vars(content);
        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| ReportError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let thresholds = self.agronomy.status_thresholds;
        if !(thresholds.low > 0.0 && thresholds.low <= 1.0 && thresholds.high >= 1.0) {
            return Err(ReportError::Config(format!(
                "status_thresholds must satisfy 0 < low <= 1 <= high (got {} / {})",
                thresholds.low, thresholds.high
            )));
        }
        let band = self.agronomy.progress_band_percent;
        if !band.is_finite() || band <= 0.0 {
            return Err(ReportError::Config(
                "progress_band_percent must be positive".into(),
            ));
        }
        let excess = self.agronomy.max_allowed_excess_percent;
        if excess != self.agronomy.max_excess_percent() {
            tracing::warn!(
                "max_allowed_excess_percent {} outside 5..=100, using {}",
                excess,
                self.agronomy.max_excess_percent()
            );
        }
        Ok(())
    }

    /// Search for config.yaml in standard locations.
    /// Returns the path of the first found config, or the XDG default path if none found.
    fn find_config_path() -> Result<PathBuf> {
        let local_config = PathBuf::from("config/config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("soilcorrect").join("config.yaml");
            if xdg_config.exists() {
                return Ok(xdg_config);
            }
        }

        Self::default_config_path()
    }

    /// Returns true if a config file can be found in any standard location.
    pub fn exists(config_override: Option<&PathBuf>) -> bool {
        match config_override {
            Some(p) => p.exists(),
            None => Self::find_config_path()
                .map(|p| p.exists())
                .unwrap_or(false),
        }
    }

    /// Default path for writing new config files (~/.config/soilcorrect/config.yaml).
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ReportError::Config("Cannot determine config directory".into()))?
            .join("soilcorrect");
        Ok(config_dir.join("config.yaml"))
    }

    /// Run interactive setup prompts and write config to disk.
    /// Returns the loaded Config and the path it was written to.
    pub fn setup_interactive(config_override: Option<PathBuf>) -> Result<(Self, PathBuf)> {
        println!();
        println!("Let's set up soilcorrect!");
        println!();

        println!("Services");
        let extraction_url: String = Input::new()
            .with_prompt("  PDF extraction service URL")
            .default("http://localhost:5000".into())
            .interact_text()
            .map_err(input_error)?;

        let comments_url: String = Input::new()
            .with_prompt("  Comments service URL")
            .default(extraction_url.clone())
            .interact_text()
            .map_err(input_error)?;

        let ai_comments_key: String = Password::new()
            .with_prompt("  Stored comments reference (blank to skip)")
            .allow_empty_password(true)
            .interact()
            .map_err(input_error)?;

        println!();

        println!("Agronomy");
        let max_allowed_excess_percent: f64 = Input::new()
            .with_prompt("  Maximum allowed excess over ideal (%)")
            .default(DEFAULT_MAX_EXCESS_PERCENT)
            .interact_text()
            .map_err(input_error)?;

        println!();

        println!("Agronomist (printed on reports, leave blank to skip)");
        let name: String = Input::new()
            .with_prompt("  Name")
            .default(String::new())
            .allow_empty(true)
            .interact_text()
            .map_err(input_error)?;

        let email: String = Input::new()
            .with_prompt("  Email")
            .default(String::new())
            .allow_empty(true)
            .interact_text()
            .map_err(input_error)?;

        let phone: String = Input::new()
            .with_prompt("  Phone")
            .default(String::new())
            .allow_empty(true)
            .interact_text()
            .map_err(input_error)?;

        println!();

        let config = Config {
            services: ServicesConfig {
                extraction_url,
                comments_url,
                ai_comments_key: Some(ai_comments_key).filter(|k| !k.is_empty()),
            },
            agronomy: AgronomyConfig {
                max_allowed_excess_percent: clamp_max_excess(max_allowed_excess_percent),
                ..AgronomyConfig::default()
            },
            agronomist: Agronomist { name, email, phone },
        };

        let config_path = match config_override {
            Some(p) => p,
            None => Self::default_config_path()?,
        };
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml::to_string(&config)
            .map_err(|e| ReportError::Config(format!("Failed to serialize config: {}", e)))?;

        let content = format!(
            "# soilcorrect configuration\n# Generated by `soilcorrect init`\n# Environment variable substitution (${{VAR}}) is supported.\n\n{}",
            yaml
        );
        std::fs::write(&config_path, content)?;

        println!("Configuration saved to {}", config_path.display());
        println!();

        Ok((config, config_path))
    }

    fn substitute_env_vars(content: &str) -> String {
        static ENV_VAR: OnceLock<Regex> = OnceLock::new();
        let re = ENV_VAR.get_or_init(|| {
            Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("env var pattern is valid")
        });

        let mut result = content.to_string();
        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let placeholder = &cap[0];
            if let Ok(value) = std::env::var(var_name) {
                result = result.replace(placeholder, &value);
            }
        }

        result
    }
}
