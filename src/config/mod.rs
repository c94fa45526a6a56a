pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::CliConfig;

#[cfg(feature = "cli")]
mod cli {
    use super::toml_config::TomlConfig;
    use crate::adapters::output::OutputFormat;
    use crate::core::query_loop::FailurePolicy;
    use crate::domain::model::ServiceDescriptor;
    use crate::utils::error::{ConeError, Result};
    use crate::utils::validation::{validate_positive_number, validate_url, Validate};
    use clap::Parser;

    #[derive(Debug, Clone, Parser)]
    #[command(name = "vo-cone")]
    #[command(about = "Cone searches against Virtual Observatory services")]
    pub struct CliConfig {
        /// Service access URL; repeat to query several services
        #[arg(long = "service")]
        pub services: Vec<String>,

        /// TOML file with [query] settings and [[services]]
        #[arg(short, long)]
        pub config: Option<String>,

        /// Position as "RA Dec" (degrees or sexagesimal) or an object name; repeat for a batch
        #[arg(long = "coords", required = true, allow_hyphen_values = true)]
        pub coords: Vec<String>,

        /// Search radius in degrees; give one, or one per --coords
        #[arg(long = "radius", required = true)]
        pub radius: Vec<f64>,

        /// Per-request timeout in seconds
        #[arg(long)]
        pub timeout: Option<u64>,

        /// Total attempts per request
        #[arg(long)]
        pub retries: Option<u32>,

        /// Look up object names such as "M31" with the configured resolver
        #[arg(long)]
        pub resolve_names: bool,

        /// Skip failing positions/services instead of aborting
        #[arg(long)]
        pub continue_on_error: bool,

        #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
        pub format: OutputFormat,

        /// Output file; stdout when omitted
        #[arg(short, long)]
        pub output: Option<String>,

        #[arg(short, long, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, help = "Log as JSON lines")]
        pub log_json: bool,
    }

    impl CliConfig {
        /// 載入配置檔（若有），再套用命令列覆蓋設定
        pub fn resolve(&self) -> Result<TomlConfig> {
            let mut config = match &self.config {
                Some(path) => TomlConfig::from_file(path)?,
                None => TomlConfig::default(),
            };

            if let Some(timeout) = self.timeout {
                config.query.timeout_seconds = Some(timeout);
            }
            if let Some(retries) = self.retries {
                config.query.retries = Some(retries);
            }
            if self.continue_on_error {
                config.query.failure_policy = Some(FailurePolicy::Continue);
            }
            if self.resolve_names {
                config.resolver.enabled = true;
            }

            config
                .services
                .extend(self.services.iter().map(ServiceDescriptor::new));

            Ok(config)
        }
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            if self.services.is_empty() && self.config.is_none() {
                return Err(ConeError::MissingConfigError {
                    field: "--service or --config".to_string(),
                });
            }
            for service in &self.services {
                validate_url("--service", service)?;
            }
            if let Some(timeout) = self.timeout {
                validate_positive_number("--timeout", timeout as usize, 1)?;
            }
            if let Some(retries) = self.retries {
                validate_positive_number("--retries", retries as usize, 1)?;
            }
            Ok(())
        }
    }

}
