use crate::utils::error::{ProxyError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_LISTEN: &str = "127.0.0.1:8080";
const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;
const LOG_FORMATS: [&str; 2] = ["compact", "json"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub di: DiConfig,
    #[serde(default)]
    pub to2: To2Config,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
    pub backend: String,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiConfig {
    #[serde(default)]
    pub enable_product_passport: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct To2Config {
    #[serde(default)]
    pub owner_id: String,
    #[serde(default)]
    pub deployed_location: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default)]
    pub product: EndpointConfig,
    #[serde(default)]
    pub commissioning: EndpointConfig,
    pub timeout_seconds: Option<u64>,
}

/// One ledger endpoint. Leaving `url` unset disables it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub url: Option<String>,
    pub ca_cert: Option<PathBuf>,
    pub client_cert: Option<PathBuf>,
    pub client_key: Option<PathBuf>,
}

impl EndpointConfig {
    pub fn is_configured(&self) -> bool {
        self.url.as_deref().is_some_and(|url| !url.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: default_log_format(),
        }
    }
}

fn default_listen() -> String {
    DEFAULT_LISTEN.to_string()
}

fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

fn default_log_format() -> String {
    "compact".to_string()
}

impl ProxyConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ProxyError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ProxyError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${LEDGER_URL})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ProxyError::ConfigError {
            message: format!("env substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_socket_addr("server.listen", &self.server.listen)?;
        validation::validate_url("server.backend", &self.server.backend)?;
        validation::validate_positive_number("server.max_body_bytes", self.server.max_body_bytes, 1)?;

        if let Some(url) = self.ledger.product.url.as_deref().filter(|u| !u.trim().is_empty()) {
            validation::validate_url("ledger.product.url", url)?;
        }

        if self.ledger.commissioning.is_configured() {
            let url = validation::validate_required_field(
                "ledger.commissioning.url",
                &self.ledger.commissioning.url,
            )?;
            validation::validate_url("ledger.commissioning.url", url)?;
            validation::validate_non_empty_string("to2.owner_id", &self.to2.owner_id)?;
        }

        if let Some(timeout) = self.ledger.timeout_seconds {
            validation::validate_positive_number("ledger.timeout_seconds", timeout as usize, 1)?;
        }

        validation::validate_one_of("logging.format", &self.logging.format, &LOG_FORMATS)?;

        Ok(())
    }

    pub fn product_passport_enabled(&self) -> bool {
        self.di.enable_product_passport && self.ledger.product.is_configured()
    }
}

impl Validate for ProxyConfig {
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
    fn test_parse_full_config() {
        let toml_content = r#"
[server]
listen = "0.0.0.0:8080"
backend = "http://127.0.0.1:8081"
max_body_bytes = 4096

[di]
enable_product_passport = true

[to2]
owner_id = "owner-uuid"
deployed_location = "site-a"

[ledger]
timeout_seconds = 10

[ledger.product]
url = "https://ledger.example:8443"
ca_cert = "certs/ca.pem"
client_cert = "certs/client.crt"
client_key = "certs/client.key"

[ledger.commissioning]
url = "http://ledger.example:8000/create-commissioning-passport"

[logging]
format = "json"
"#;

        let config = ProxyConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.server.listen, "0.0.0.0:8080");
        assert_eq!(config.server.max_body_bytes, 4096);
        assert!(config.product_passport_enabled());
        assert_eq!(config.to2.owner_id, "owner-uuid");
        assert_eq!(config.ledger.timeout_seconds, Some(10));
        assert_eq!(
            config.ledger.product.client_key.as_deref(),
            Some(Path::new("certs/client.key"))
        );
        assert!(config.ledger.commissioning.is_configured());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_minimal_config_defaults() {
        let config = ProxyConfig::from_toml_str(
            r#"
[server]
backend = "http://127.0.0.1:8081"
"#,
        )
        .unwrap();

        assert_eq!(config.server.listen, DEFAULT_LISTEN);
        assert_eq!(config.server.max_body_bytes, DEFAULT_MAX_BODY_BYTES);
        assert!(!config.di.enable_product_passport);
        assert!(!config.ledger.product.is_configured());
        assert!(!config.ledger.commissioning.is_configured());
        assert_eq!(config.logging.format, "compact");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("FDO_PROXY_TEST_BACKEND", "http://fdo-backend:8081");

        let config = ProxyConfig::from_toml_str(
            r#"
[server]
backend = "${FDO_PROXY_TEST_BACKEND}"
"#,
        )
        .unwrap();
        assert_eq!(config.server.backend, "http://fdo-backend:8081");

        std::env::remove_var("FDO_PROXY_TEST_BACKEND");
    }

    #[test]
    fn test_commissioning_requires_owner_id() {
        let config = ProxyConfig::from_toml_str(
            r#"
[server]
backend = "http://127.0.0.1:8081"

[ledger.commissioning]
url = "http://ledger.example:8000/create-commissioning-passport"
"#,
        )
        .unwrap();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("to2.owner_id"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let bad_backend = ProxyConfig::from_toml_str(
            r#"
[server]
backend = "invalid-url"
"#,
        )
        .unwrap();
        assert!(bad_backend.validate().is_err());

        let bad_format = ProxyConfig::from_toml_str(
            r#"
[server]
backend = "http://127.0.0.1:8081"

[logging]
format = "pretty"
"#,
        )
        .unwrap();
        assert!(bad_format.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[server]\nbackend = \"http://127.0.0.1:8081\"\n")
            .unwrap();

        let config = ProxyConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.server.backend, "http://127.0.0.1:8081");
    }

    #[test]
    fn test_shipped_example_config_parses() {
        let config =
            ProxyConfig::from_toml_str(include_str!("../../fdo-proxy.example.toml")).unwrap();
        assert!(config.validate().is_ok());
        assert!(config.product_passport_enabled());
    }

    #[test]
    fn test_missing_server_section_is_parse_error() {
        let err = ProxyConfig::from_toml_str("[di]\nenable_product_passport = true\n").unwrap_err();
        assert!(matches!(err, ProxyError::ConfigValidationError { .. }));
    }
}
