use crate::adapters::sesame::{SesameResolver, DEFAULT_SESAME_URL};
use crate::core::cone::{ConeSearch, DEFAULT_MAX_SERVICES};
use crate::core::http::{QuerySettings, DEFAULT_RETRIES, DEFAULT_TIMEOUT_SECONDS};
use crate::core::query_loop::FailurePolicy;
use crate::domain::model::ServiceDescriptor;
use crate::utils::error::{ConeError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_positive_number, validate_url, Validate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

static ENV_VAR_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"));

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub services: Vec<ServiceDescriptor>,
    #[serde(default)]
    pub resolver: ResolverConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryConfig {
    pub timeout_seconds: Option<u64>,
    pub retries: Option<u32>,
    pub retry_delay_ms: Option<u64>,
    pub failure_policy: Option<FailurePolicy>,
    pub max_services: Option<usize>,
}

/// Object-name lookup; off unless `enabled = true`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolverConfig {
    #[serde(default)]
    pub enabled: bool,
    pub url: Option<String>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);
        Ok(toml::from_str(&processed_content)?)
    }

    /// 替換環境變數 (例如 ${SCS_TOKEN})，未設定的保持原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR_REGEX
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn validate_config(&self) -> Result<()> {
        for (i, service) in self.services.iter().enumerate() {
            validate_url(&format!("services[{}].access_url", i), &service.access_url)?;
            if let Some(name) = &service.short_name {
                validate_non_empty_string(&format!("services[{}].short_name", i), name)?;
            }
        }

        if let Some(timeout) = self.query.timeout_seconds {
            validate_positive_number("query.timeout_seconds", timeout as usize, 1)?;
        }
        if let Some(retries) = self.query.retries {
            validate_positive_number("query.retries", retries as usize, 1)?;
        }
        if let Some(max_services) = self.query.max_services {
            validate_positive_number("query.max_services", max_services, 1)?;
        }

        if let Some(url) = &self.resolver.url {
            validate_url("resolver.url", url)?;
        }

        if self.services.len() > self.max_services() {
            return Err(ConeError::InvalidConfigValueError {
                field: "services".to_string(),
                value: self.services.len().to_string(),
                reason: format!("More services than query.max_services ({})", self.max_services()),
            });
        }

        Ok(())
    }

    pub fn query_settings(&self) -> QuerySettings {
        QuerySettings {
            timeout: Duration::from_secs(self.query.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS)),
            retries: self.query.retries.unwrap_or(DEFAULT_RETRIES),
            retry_delay: Duration::from_millis(self.query.retry_delay_ms.unwrap_or(0)),
        }
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.query.failure_policy.unwrap_or_default()
    }

    pub fn max_services(&self) -> usize {
        self.query.max_services.unwrap_or(DEFAULT_MAX_SERVICES)
    }

    /// Builds a client carrying this configuration's budget and policy.
    pub fn cone_search(&self) -> Result<ConeSearch> {
        let settings = self.query_settings();
        settings.validate()?;

        let cone = ConeSearch::new(settings.clone())
            .with_failure_policy(self.failure_policy())
            .with_max_services(self.max_services());

        Ok(match self.resolver_url() {
            Some(url) => cone.with_name_resolver(SesameResolver::new(url, settings)),
            None => cone,
        })
    }

    /// Resolver endpoint when name lookup is enabled.
    pub fn resolver_url(&self) -> Option<&str> {
        self.resolver
            .enabled
            .then(|| self.resolver.url.as_deref().unwrap_or(DEFAULT_SESAME_URL))
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_basic_toml_config() {
        let toml_content = r#"
[query]
timeout_seconds = 10
retries = 5
failure_policy = "continue"

[[services]]
access_url = "https://heasarc.gsfc.nasa.gov/cgi-bin/vo/cone/coneGet.pl?table=chanmaster&"
short_name = "Chandra"
title = "Chandra Observations"

[[services]]
access_url = "http://vizier.cds.unistra.fr/viz-bin/conesearch/I/239/hip_main?"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.services.len(), 2);
        assert_eq!(config.services[0].short_name.as_deref(), Some("Chandra"));
        assert!(config.services[1].title.is_none());
        assert_eq!(config.failure_policy(), FailurePolicy::Continue);

        let settings = config.query_settings();
        assert_eq!(settings.timeout, Duration::from_secs(10));
        assert_eq!(settings.retries, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults_when_sections_missing() {
        let config = TomlConfig::from_toml_str("").unwrap();

        assert!(config.services.is_empty());
        assert_eq!(config.query_settings(), QuerySettings::default());
        assert_eq!(config.failure_policy(), FailurePolicy::Stop);
        assert_eq!(config.max_services(), DEFAULT_MAX_SERVICES);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("VO_CONE_TEST_ENDPOINT", "https://scs.example.org/cone");

        let toml_content = r#"
[[services]]
access_url = "${VO_CONE_TEST_ENDPOINT}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.services[0].access_url, "https://scs.example.org/cone");

        std::env::remove_var("VO_CONE_TEST_ENDPOINT");
    }

    #[test]
    fn test_config_validation() {
        let bad_url = TomlConfig::from_toml_str(
            r#"
[[services]]
access_url = "invalid-url"
"#,
        )
        .unwrap();
        assert!(bad_url.validate().is_err());

        let no_retries = TomlConfig::from_toml_str(
            r#"
[query]
retries = 0
"#,
        )
        .unwrap();
        assert!(no_retries.validate().is_err());

        let over_limit = TomlConfig::from_toml_str(
            r#"
[query]
max_services = 1

[[services]]
access_url = "http://a.example.org/scs"

[[services]]
access_url = "http://b.example.org/scs"
"#,
        )
        .unwrap();
        assert!(over_limit.validate().is_err());
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        let result = TomlConfig::from_toml_str(
            r#"
[query]
failure_policy = "retry"
"#,
        );
        assert!(matches!(result, Err(ConeError::TomlError(_))));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[query]
timeout_seconds = 7

[[services]]
access_url = "https://scs.example.org/cone"
"#;

        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.query_settings().timeout, Duration::from_secs(7));

        let cone = config.cone_search().unwrap();
        assert_eq!(cone.settings().timeout, Duration::from_secs(7));
    }

    #[test]
    fn test_resolver_section() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert!(config.resolver_url().is_none());

        let config = TomlConfig::from_toml_str(
            r#"
[resolver]
enabled = true
"#,
        )
        .unwrap();
        assert_eq!(config.resolver_url(), Some(DEFAULT_SESAME_URL));

        let config = TomlConfig::from_toml_str(
            r#"
[resolver]
enabled = true
url = "http://localhost:8080/sesame"
"#,
        )
        .unwrap();
        assert_eq!(config.resolver_url(), Some("http://localhost:8080/sesame"));
        assert!(config.validate().is_ok());

        let bad = TomlConfig::from_toml_str(
            r#"
[resolver]
url = "not-a-url"
"#,
        )
        .unwrap();
        assert!(bad.validate().is_err());
    }
}
