use crate::adapters::geonames::DEFAULT_GEONAMES_URL;
use crate::adapters::osrm::DEFAULT_OSRM_ENDPOINT;
use crate::core::postal::{CountrySet, DEFAULT_COUNTRIES};
use crate::core::route::RouteMode;
use crate::utils::error::{Result, ZiplinerError};
use crate::utils::retry::RetryPolicy;
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Run configuration. Every key has a default, so an empty file is valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub input: InputConfig,
    pub postal: PostalConfig,
    pub routing: RoutingConfig,
    pub map: MapConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub path: String,
    pub delimiter: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: "routes.csv".to_string(),
            delimiter: ";".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PostalConfig {
    pub countries: Vec<String>,
    /// Directory holding GeoNames dumps named `<CC>.txt`.
    pub data_dir: String,
    /// Base URL serving `<CC>.zip`, used when a dump is missing locally.
    /// An empty string turns downloading off.
    pub download_url: Option<String>,
}

impl Default for PostalConfig {
    fn default() -> Self {
        Self {
            countries: DEFAULT_COUNTRIES.iter().map(|c| c.to_string()).collect(),
            data_dir: "./geonames".to_string(),
            download_url: Some(DEFAULT_GEONAMES_URL.to_string()),
        }
    }
}

impl PostalConfig {
    pub fn download_base(&self) -> Option<&str> {
        self.download_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub mode: RouteMode,
    pub endpoint: String,
    pub profile: String,
    pub max_attempts: u32,
    pub timeout_seconds: u64,
    pub retry_delay_ms: u64,
    /// Retry HTTP 4xx and malformed responses too, not only transient failures.
    pub retry_client_errors: bool,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            mode: RouteMode::Straight,
            endpoint: DEFAULT_OSRM_ENDPOINT.to_string(),
            profile: "driving".to_string(),
            max_attempts: 3,
            timeout_seconds: 20,
            retry_delay_ms: 0,
            retry_client_errors: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub title: String,
    pub center: [f64; 2],
    pub zoom: u8,
    pub tiles: String,
    pub attribution: String,
    pub line_weight: u32,
    pub fit_padding: [u32; 2],
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            title: "Zipliner routes".to_string(),
            center: [47.3, 9.1],
            zoom: 7,
            tiles: "https://tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            attribution: "&copy; OpenStreetMap contributors".to_string(),
            line_weight: 4,
            fit_padding: [30, 30],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: String,
    pub map_file: String,
    pub failures_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: ".".to_string(),
            map_file: "map.html".to_string(),
            failures_file: "failed_rows.csv".to_string(),
        }
    }
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ZiplinerError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ZiplinerError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${OSRM_ENDPOINT})，未設定的保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ZiplinerError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn delimiter_byte(&self) -> Result<u8> {
        validation::validate_delimiter("input.delimiter", &self.input.delimiter)
    }

    pub fn country_set(&self) -> CountrySet {
        CountrySet::new(&self.postal.countries)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.routing.max_attempts,
            timeout: Duration::from_secs(self.routing.timeout_seconds),
            delay: Duration::from_millis(self.routing.retry_delay_ms),
            retry_all: self.routing.retry_client_errors,
        }
    }

    pub fn routing_enabled(&self) -> bool {
        self.routing.mode == RouteMode::Routed
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("input.path", &self.input.path)?;
        self.delimiter_byte()?;

        validation::validate_country_codes("postal.countries", &self.postal.countries)?;
        validation::validate_path("postal.data_dir", &self.postal.data_dir)?;
        if let Some(url) = self.postal.download_base() {
            validation::validate_url("postal.download_url", url)?;
        }

        if self.routing_enabled() {
            validation::validate_url("routing.endpoint", &self.routing.endpoint)?;
            validation::validate_non_empty_string("routing.profile", &self.routing.profile)?;
        }
        validation::validate_positive_number(
            "routing.max_attempts",
            u64::from(self.routing.max_attempts),
            1,
        )?;
        validation::validate_positive_number("routing.timeout_seconds", self.routing.timeout_seconds, 1)?;

        validation::validate_range("map.zoom", self.map.zoom, 0, 19)?;
        validation::validate_range("map.center[0]", self.map.center[0], -90.0, 90.0)?;
        validation::validate_range("map.center[1]", self.map.center[1], -180.0, 180.0)?;
        validation::validate_positive_number("map.line_weight", u64::from(self.map.line_weight), 1)?;

        validation::validate_path("output.path", &self.output.path)?;
        validation::validate_path("output.map_file", &self.output.map_file)?;
        validation::validate_path("output.failures_file", &self.output.failures_file)?;

        Ok(())
    }
}
