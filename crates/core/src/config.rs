use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_APPROVAL_TIMEOUT_HOURS: u64 = 24;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub smtp: SmtpConfig,
    pub sms: SmsConfig,
    pub workflow: WorkflowConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

/// SMTP relay settings. Every field is optional: an unconfigured channel is
/// a runtime soft-skip, never a startup failure.
#[derive(Clone, Debug)]
pub struct SmtpConfig {
    pub host: Option<String>,
    pub port: u16,
    pub secure: bool,
    pub user: Option<String>,
    pub password: Option<SecretString>,
    pub from_address: Option<String>,
}

impl SmtpConfig {
    pub fn is_configured(&self) -> bool {
        present(&self.host)
            && present(&self.user)
            && self
                .password
                .as_ref()
                .is_some_and(|password| !password.expose_secret().trim().is_empty())
    }
}

/// SMS gateway settings, same optionality policy as [`SmtpConfig`].
#[derive(Clone, Debug)]
pub struct SmsConfig {
    pub gateway_url: Option<String>,
    pub api_key: Option<SecretString>,
    pub partner_id: Option<String>,
    pub shortcode: Option<String>,
}

impl SmsConfig {
    pub fn is_configured(&self) -> bool {
        present(&self.gateway_url)
            && present(&self.partner_id)
            && present(&self.shortcode)
            && self.api_key.as_ref().is_some_and(|key| !key.expose_secret().trim().is_empty())
    }
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().map(str::trim).is_some_and(|value| !value.is_empty())
}

#[derive(Clone, Debug)]
pub struct WorkflowConfig {
    /// How long a requisition may sit in `approved` without HR
    /// authorization before the sweeper rejects it.
    pub approval_timeout_hours: u64,
    /// Addresses to notify when no HR role-holder resolves for a programme.
    pub hr_fallback_emails: Vec<String>,
    pub lifecycle: Lifecycle,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Which notification lifecycle is active: the HR-gated multi-step flow
/// (approve, authorize, complete) or the simpler approve/reject-only flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    HrGated,
    Direct,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub approval_timeout_hours: Option<i64>,
    pub lifecycle: Option<Lifecycle>,
    pub smtp_host: Option<String>,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    pub sms_gateway_url: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://mifugo.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            smtp: SmtpConfig {
                host: None,
                port: 587,
                secure: false,
                user: None,
                password: None,
                from_address: None,
            },
            sms: SmsConfig { gateway_url: None, api_key: None, partner_id: None, shortcode: None },
            workflow: WorkflowConfig {
                approval_timeout_hours: DEFAULT_APPROVAL_TIMEOUT_HOURS,
                hr_fallback_emails: Vec::new(),
                lifecycle: Lifecycle::HrGated,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for Lifecycle {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "hr_gated" | "hr-gated" | "hrgated" => Ok(Self::HrGated),
            "direct" => Ok(Self::Direct),
            other => Err(ConfigError::Validation(format!(
                "unsupported lifecycle `{other}` (expected hr_gated|direct)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("mifugo.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(smtp) = patch.smtp {
            if let Some(host) = smtp.host {
                self.smtp.host = Some(host);
            }
            if let Some(port) = smtp.port {
                self.smtp.port = port;
            }
            if let Some(secure) = smtp.secure {
                self.smtp.secure = secure;
            }
            if let Some(user) = smtp.user {
                self.smtp.user = Some(user);
            }
            if let Some(password) = smtp.password {
                self.smtp.password = Some(password.into());
            }
            if let Some(from_address) = smtp.from_address {
                self.smtp.from_address = Some(from_address);
            }
        }

        if let Some(sms) = patch.sms {
            if let Some(gateway_url) = sms.gateway_url {
                self.sms.gateway_url = Some(gateway_url);
            }
            if let Some(api_key) = sms.api_key {
                self.sms.api_key = Some(api_key.into());
            }
            if let Some(partner_id) = sms.partner_id {
                self.sms.partner_id = Some(partner_id);
            }
            if let Some(shortcode) = sms.shortcode {
                self.sms.shortcode = Some(shortcode);
            }
        }

        if let Some(workflow) = patch.workflow {
            if let Some(hours) = workflow.approval_timeout_hours {
                self.workflow.approval_timeout_hours = lenient_timeout_hours(hours);
            }
            if let Some(emails) = workflow.hr_fallback_emails {
                self.workflow.hr_fallback_emails = emails;
            }
            if let Some(lifecycle) = workflow.lifecycle {
                self.workflow.lifecycle = lifecycle;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("MIFUGO_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("MIFUGO_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_env("MIFUGO_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("MIFUGO_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_env("MIFUGO_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("MIFUGO_SMTP_HOST") {
            self.smtp.host = Some(value);
        }
        if let Some(value) = read_env("MIFUGO_SMTP_PORT") {
            self.smtp.port = parse_env("MIFUGO_SMTP_PORT", &value)?;
        }
        if let Some(value) = read_env("MIFUGO_SMTP_SECURE") {
            self.smtp.secure = parse_env("MIFUGO_SMTP_SECURE", &value)?;
        }
        if let Some(value) = read_env("MIFUGO_SMTP_USER") {
            self.smtp.user = Some(value);
        }
        if let Some(value) = read_env("MIFUGO_SMTP_PASSWORD") {
            self.smtp.password = Some(value.into());
        }
        if let Some(value) = read_env("MIFUGO_SMTP_FROM") {
            self.smtp.from_address = Some(value);
        }

        if let Some(value) = read_env("MIFUGO_SMS_GATEWAY_URL") {
            self.sms.gateway_url = Some(value);
        }
        if let Some(value) = read_env("MIFUGO_SMS_API_KEY") {
            self.sms.api_key = Some(value.into());
        }
        if let Some(value) = read_env("MIFUGO_SMS_PARTNER_ID") {
            self.sms.partner_id = Some(value);
        }
        if let Some(value) = read_env("MIFUGO_SMS_SHORTCODE") {
            self.sms.shortcode = Some(value);
        }

        // Timeout contract: non-numeric or non-positive values fall back to
        // the default instead of failing startup.
        if let Some(value) = read_env("MIFUGO_WORKFLOW_APPROVAL_TIMEOUT_HOURS") {
            self.workflow.approval_timeout_hours = value
                .trim()
                .parse::<i64>()
                .map(lenient_timeout_hours)
                .unwrap_or(DEFAULT_APPROVAL_TIMEOUT_HOURS);
        }
        if let Some(value) = read_env("MIFUGO_WORKFLOW_HR_FALLBACK_EMAILS") {
            self.workflow.hr_fallback_emails = value
                .split(',')
                .map(str::trim)
                .filter(|email| !email.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(value) = read_env("MIFUGO_WORKFLOW_LIFECYCLE") {
            self.workflow.lifecycle = value.parse()?;
        }

        if let Some(value) = read_env("MIFUGO_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("MIFUGO_SERVER_PORT") {
            self.server.port = parse_env("MIFUGO_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("MIFUGO_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_env("MIFUGO_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level = read_env("MIFUGO_LOGGING_LEVEL").or_else(|| read_env("MIFUGO_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("MIFUGO_LOGGING_FORMAT").or_else(|| read_env("MIFUGO_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(hours) = overrides.approval_timeout_hours {
            self.workflow.approval_timeout_hours = lenient_timeout_hours(hours);
        }
        if let Some(lifecycle) = overrides.lifecycle {
            self.workflow.lifecycle = lifecycle;
        }
        if let Some(host) = overrides.smtp_host {
            self.smtp.host = Some(host);
        }
        if let Some(user) = overrides.smtp_user {
            self.smtp.user = Some(user);
        }
        if let Some(password) = overrides.smtp_password {
            self.smtp.password = Some(password.into());
        }
        if let Some(gateway_url) = overrides.sms_gateway_url {
            self.sms.gateway_url = Some(gateway_url);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.database.validate()?;
        self.server.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

fn lenient_timeout_hours(hours: i64) -> u64 {
    if hours > 0 {
        hours as u64
    } else {
        DEFAULT_APPROVAL_TIMEOUT_HOURS
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("mifugo.toml"), PathBuf::from("config/mifugo.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        output.push_str(&rest[..start]);
        let expression = &rest[start + 2..];
        let Some(end) = expression.find('}') else {
            return Err(ConfigError::UnterminatedInterpolation);
        };

        let var = &expression[..end];
        let value =
            env::var(var).map_err(|_| ConfigError::MissingEnvInterpolation { var: var.to_string() })?;
        output.push_str(&value);
        rest = &expression[end + 1..];
    }

    output.push_str(rest);
    Ok(output)
}

impl DatabaseConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let url = self.url.trim();
        let sqlite_url =
            url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
        if !sqlite_url {
            return Err(ConfigError::Validation(
                "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                    .to_string(),
            ));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::Validation(
                "database.max_connections must be greater than zero".to_string(),
            ));
        }
        if self.timeout_secs == 0 || self.timeout_secs > 300 {
            return Err(ConfigError::Validation(
                "database.timeout_secs must be in range 1..=300".to_string(),
            ));
        }
        Ok(())
    }
}

impl ServerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Validation(
                "server.port must be greater than zero".to_string(),
            ));
        }
        if self.graceful_shutdown_secs == 0 {
            return Err(ConfigError::Validation(
                "server.graceful_shutdown_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        match self.level.trim().to_ascii_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            _ => Err(ConfigError::Validation(
                "logging.level must be one of trace|debug|info|warn|error".to_string(),
            )),
        }
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    smtp: Option<SmtpPatch>,
    sms: Option<SmsPatch>,
    workflow: Option<WorkflowPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct SmtpPatch {
    host: Option<String>,
    port: Option<u16>,
    secure: Option<bool>,
    user: Option<String>,
    password: Option<String>,
    from_address: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SmsPatch {
    gateway_url: Option<String>,
    api_key: Option<String>,
    partner_id: Option<String>,
    shortcode: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct WorkflowPatch {
    approval_timeout_hours: Option<i64>,
    hr_fallback_emails: Option<Vec<String>>,
    lifecycle: Option<Lifecycle>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, Lifecycle, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    #[test]
    fn defaults_have_no_channels_configured() {
        let config = AppConfig::default();
        assert!(!config.smtp.is_configured());
        assert!(!config.sms.is_configured());
        assert_eq!(config.workflow.approval_timeout_hours, 24);
        assert_eq!(config.workflow.lifecycle, Lifecycle::HrGated);
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_SMS_API_KEY", "key-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("mifugo.toml");
            fs::write(
                &path,
                r#"
[sms]
gateway_url = "https://sms.example.com/api/v1/sendsms"
api_key = "${TEST_SMS_API_KEY}"
partner_id = "1234"
shortcode = "MIFUGO"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            let api_key = config.sms.api_key.as_ref().map(|key| key.expose_secret().to_string());
            if api_key.as_deref() != Some("key-from-env") {
                return Err("api key should be interpolated from environment".to_string());
            }
            if !config.sms.is_configured() {
                return Err("sms channel should be fully configured".to_string());
            }
            Ok(())
        })();

        clear_vars(&["TEST_SMS_API_KEY"]);
        result
    }

    #[test]
    fn timeout_hours_fall_back_on_garbage_and_non_positive_values() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let result = (|| -> Result<(), String> {
            for bad in ["not-a-number", "-4", "0"] {
                env::set_var("MIFUGO_WORKFLOW_APPROVAL_TIMEOUT_HOURS", bad);
                let config = AppConfig::load(LoadOptions::default())
                    .map_err(|err| format!("config load failed: {err}"))?;
                if config.workflow.approval_timeout_hours != 24 {
                    return Err(format!("`{bad}` should fall back to the 24h default"));
                }
            }

            env::set_var("MIFUGO_WORKFLOW_APPROVAL_TIMEOUT_HOURS", "48");
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            if config.workflow.approval_timeout_hours != 48 {
                return Err("a valid value should be honored".to_string());
            }
            Ok(())
        })();

        clear_vars(&["MIFUGO_WORKFLOW_APPROVAL_TIMEOUT_HOURS"]);
        result
    }

    #[test]
    fn hr_fallback_emails_split_on_commas() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("MIFUGO_WORKFLOW_HR_FALLBACK_EMAILS", "hr@example.org, ops@example.org ,,");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            if config.workflow.hr_fallback_emails
                != vec!["hr@example.org".to_string(), "ops@example.org".to_string()]
            {
                return Err("fallback list should be trimmed and empty entries dropped".to_string());
            }
            Ok(())
        })();

        clear_vars(&["MIFUGO_WORKFLOW_HR_FALLBACK_EMAILS"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("MIFUGO_DATABASE_URL", "sqlite://from-env.db");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("mifugo.toml");
            fs::write(
                &path,
                r#"
[database]
url = "sqlite://from-file.db"

[workflow]
approval_timeout_hours = 12
lifecycle = "direct"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    database_url: Some("sqlite://from-override.db".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            if config.database.url != "sqlite://from-override.db" {
                return Err("programmatic override should win over env and file".to_string());
            }
            if config.workflow.approval_timeout_hours != 12 {
                return Err("file-layer workflow settings should survive".to_string());
            }
            if config.workflow.lifecycle != Lifecycle::Direct {
                return Err("file-layer lifecycle should survive".to_string());
            }
            Ok(())
        })();

        clear_vars(&["MIFUGO_DATABASE_URL"]);
        result
    }

    #[test]
    fn missing_smtp_credentials_do_not_fail_validation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("MIFUGO_SMTP_HOST", "smtp.example.org");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            if config.smtp.is_configured() {
                return Err("host alone should not configure the email channel".to_string());
            }
            Ok(())
        })();

        clear_vars(&["MIFUGO_SMTP_HOST"]);
        result
    }

    #[test]
    fn validation_rejects_non_sqlite_database_url() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("MIFUGO_DATABASE_URL", "postgres://nope");

        let result = (|| -> Result<(), String> {
            match AppConfig::load(LoadOptions::default()) {
                Ok(_) => Err("expected validation failure".to_string()),
                Err(ConfigError::Validation(message)) if message.contains("database.url") => Ok(()),
                Err(other) => Err(format!("unexpected error: {other}")),
            }
        })();

        clear_vars(&["MIFUGO_DATABASE_URL"]);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("MIFUGO_LOG_LEVEL", "warn");
        env::set_var("MIFUGO_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            if config.logging.level != "warn" {
                return Err("warn log level should be set from env alias".to_string());
            }
            if !matches!(config.logging.format, LogFormat::Pretty) {
                return Err("pretty log format should be set from env alias".to_string());
            }
            Ok(())
        })();

        clear_vars(&["MIFUGO_LOG_LEVEL", "MIFUGO_LOG_FORMAT"]);
        result
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("MIFUGO_SMTP_PASSWORD", "relay-secret-value");
        env::set_var("MIFUGO_SMS_API_KEY", "gateway-secret-value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            if debug.contains("relay-secret-value") {
                return Err("debug output should not contain the smtp password".to_string());
            }
            if debug.contains("gateway-secret-value") {
                return Err("debug output should not contain the sms api key".to_string());
            }
            Ok(())
        })();

        clear_vars(&["MIFUGO_SMTP_PASSWORD", "MIFUGO_SMS_API_KEY"]);
        result
    }
}
