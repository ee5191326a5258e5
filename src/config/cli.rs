use crate::config::toml_config::AppConfig;
use crate::core::route::RouteMode;
use crate::utils::error::Result;
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "zipliner")]
#[command(about = "Plot postal-code shipping routes on an interactive map")]
pub struct CliConfig {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Input route table
    #[arg(short, long)]
    pub input: Option<String>,

    /// Field delimiter of the input table
    #[arg(short, long)]
    pub delimiter: Option<String>,

    /// Follow road geometry from the routing service instead of straight lines
    #[arg(long)]
    pub routing: bool,

    /// Allowed country codes
    #[arg(long, value_delimiter = ',')]
    pub countries: Vec<String>,

    /// Directory containing GeoNames postal dumps (<CC>.txt)
    #[arg(long)]
    pub postal_data_dir: Option<String>,

    /// Directory receiving the map and failure files
    #[arg(short, long)]
    pub output_path: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}

impl CliConfig {
    /// Loads the config file (or defaults) and applies command-line overrides.
    pub fn into_app_config(self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_file(path)?,
            None => AppConfig::default(),
        };

        // 命令列參數優先於設定檔
        if let Some(input) = self.input {
            config.input.path = input;
        }
        if let Some(delimiter) = self.delimiter {
            config.input.delimiter = delimiter;
        }
        if self.routing {
            config.routing.mode = RouteMode::Routed;
        }
        if !self.countries.is_empty() {
            config.postal.countries = self.countries;
        }
        if let Some(dir) = self.postal_data_dir {
            config.postal.data_dir = dir;
        }
        if let Some(output_path) = self.output_path {
            config.output.path = output_path;
        }

        Ok(config)
    }
}
