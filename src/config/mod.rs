//! Configuration loading for the onboarding run.
//!
//! Loads layered `.env` files and environment variables prefixed with
//! `ONBOARD_`, producing a typed [`AppConfig`] with one block per provider.
//! Credentials are only ever read from the environment; everything else has
//! a built-in default.

use std::{collections::BTreeMap, env, path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::secret::Secret;

const ENV_PREFIX: &str = "ONBOARD_";

/// Application configuration derived from `ONBOARD_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub profile: String,
    pub log_level: String,
    pub log_format: String,
    pub http_timeout_seconds: u64,
    pub directory: DirectoryConfig,
    pub conferencing: ConferencingConfig,
    pub file_share: FileShareConfig,
    pub chat: ChatConfig,
}

/// Directory (Google Workspace Admin SDK) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Primary domain of the directory
    ///
    /// Environment variable: `ONBOARD_DIRECTORY_DOMAIN`
    pub domain: String,

    /// Path to the service-account JSON key file
    ///
    /// Environment variable: `ONBOARD_DIRECTORY_SERVICE_ACCOUNT_FILE`
    pub service_account_file: PathBuf,

    /// Admin user impersonated through domain-wide delegation
    ///
    /// Environment variable: `ONBOARD_DIRECTORY_ADMIN_SUBJECT`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_subject: Option<String>,

    /// OAuth scopes requested for the service credential
    ///
    /// Environment variable: `ONBOARD_DIRECTORY_ADMIN_SCOPES` (comma or space separated)
    pub admin_scopes: Vec<String>,

    /// Org unit used when the employee record has none
    ///
    /// Environment variable: `ONBOARD_DIRECTORY_DEFAULT_ORG_UNIT`
    pub default_org_unit: String,

    /// Group every new account is added to
    ///
    /// Environment variable: `ONBOARD_DIRECTORY_ONBOARDING_GROUP`
    pub onboarding_group: String,

    /// Initial password used when the employee record has none; a random one is
    /// generated per run when this is unset
    ///
    /// Environment variable: `ONBOARD_DIRECTORY_DEFAULT_PASSWORD`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_password: Option<Secret>,

    /// Overrides the `token_uri` from the key file
    ///
    /// Environment variable: `ONBOARD_DIRECTORY_TOKEN_URI`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_uri: Option<String>,

    /// Environment variable: `ONBOARD_DIRECTORY_API_BASE`
    pub api_base: String,
}

/// Video conferencing (Zoom-style) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConferencingConfig {
    /// Environment variable: `ONBOARD_CONFERENCING_API_KEY`
    pub api_key: Secret,

    /// Environment variable: `ONBOARD_CONFERENCING_API_SECRET`
    pub api_secret: Secret,

    /// Group the employee is added to when their account exists
    ///
    /// Environment variable: `ONBOARD_CONFERENCING_DEFAULT_GROUP_ID`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_group_id: Option<String>,

    /// Lifetime of the signed API token (default: 30)
    ///
    /// Environment variable: `ONBOARD_CONFERENCING_TOKEN_TTL_SECONDS`
    pub token_ttl_seconds: u64,

    /// Environment variable: `ONBOARD_CONFERENCING_API_BASE`
    pub api_base: String,
}

/// File sharing (Dropbox-style) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileShareConfig {
    /// Environment variable: `ONBOARD_FILE_SHARE_ACCESS_TOKEN`
    pub access_token: Secret,

    /// Shared folder the employee is invited to
    ///
    /// Environment variable: `ONBOARD_FILE_SHARE_FOLDER`
    pub folder_path: String,

    /// One of `viewer`, `editor`, `viewer_no_comment` (default: viewer)
    ///
    /// Environment variable: `ONBOARD_FILE_SHARE_ACCESS_LEVEL`
    pub access_level: String,

    /// Environment variable: `ONBOARD_FILE_SHARE_API_BASE`
    pub api_base: String,
}

/// Team chat (Slack-style) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Environment variable: `ONBOARD_CHAT_BOT_TOKEN`
    pub bot_token: Secret,

    /// Channel receiving the welcome message
    ///
    /// Environment variable: `ONBOARD_CHAT_CHANNEL`
    pub channel: String,

    /// Environment variable: `ONBOARD_CHAT_API_BASE`
    pub api_base: String,
}

const FILE_SHARE_ACCESS_LEVELS: &[&str] = &["viewer", "editor", "viewer_no_comment"];

impl DirectoryConfig {
    /// Directory settings with defaults for everything but the required values
    pub fn new(
        domain: impl Into<String>,
        service_account_file: impl Into<PathBuf>,
        onboarding_group: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            service_account_file: service_account_file.into(),
            admin_subject: None,
            admin_scopes: default_directory_scopes(),
            default_org_unit: default_directory_org_unit(),
            onboarding_group: onboarding_group.into(),
            default_password: None,
            token_uri: None,
            api_base: default_directory_api_base(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_domain(&self.domain) {
            return Err(ConfigError::InvalidDomain {
                value: self.domain.clone(),
            });
        }
        if self.service_account_file.as_os_str().is_empty() {
            return Err(ConfigError::MissingVar {
                var: var_name("DIRECTORY_SERVICE_ACCOUNT_FILE"),
            });
        }
        if self.admin_scopes.is_empty() {
            return Err(ConfigError::EmptyScopes);
        }
        if !self.default_org_unit.starts_with('/') {
            return Err(ConfigError::InvalidOrgUnit {
                value: self.default_org_unit.clone(),
            });
        }
        if !is_valid_email(&self.onboarding_group) {
            return Err(ConfigError::InvalidGroupEmail {
                value: self.onboarding_group.clone(),
            });
        }
        if let Some(subject) = &self.admin_subject
            && !is_valid_email(subject)
        {
            return Err(ConfigError::InvalidAdminSubject {
                value: subject.clone(),
            });
        }
        if let Some(token_uri) = &self.token_uri {
            validate_url("DIRECTORY_TOKEN_URI", token_uri)?;
        }
        validate_url("DIRECTORY_API_BASE", &self.api_base)
    }
}

impl ConferencingConfig {
    pub fn new(api_key: Secret, api_secret: Secret) -> Self {
        Self {
            api_key,
            api_secret,
            default_group_id: None,
            token_ttl_seconds: default_conferencing_token_ttl_seconds(),
            api_base: default_conferencing_api_base(),
        }
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_seconds)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        require_secret("CONFERENCING_API_KEY", &self.api_key)?;
        require_secret("CONFERENCING_API_SECRET", &self.api_secret)?;
        if self.token_ttl_seconds == 0 || self.token_ttl_seconds > 3600 {
            return Err(ConfigError::InvalidTokenTtl {
                value: self.token_ttl_seconds,
            });
        }
        validate_url("CONFERENCING_API_BASE", &self.api_base)
    }
}

impl FileShareConfig {
    pub fn new(access_token: Secret) -> Self {
        Self {
            access_token,
            folder_path: default_file_share_folder(),
            access_level: default_file_share_access_level(),
            api_base: default_file_share_api_base(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        require_secret("FILE_SHARE_ACCESS_TOKEN", &self.access_token)?;
        if self.folder_path.trim().is_empty() {
            return Err(ConfigError::MissingVar {
                var: var_name("FILE_SHARE_FOLDER"),
            });
        }
        if !FILE_SHARE_ACCESS_LEVELS.contains(&self.access_level.as_str()) {
            return Err(ConfigError::InvalidAccessLevel {
                value: self.access_level.clone(),
            });
        }
        validate_url("FILE_SHARE_API_BASE", &self.api_base)
    }
}

impl ChatConfig {
    pub fn new(bot_token: Secret) -> Self {
        Self {
            bot_token,
            channel: default_chat_channel(),
            api_base: default_chat_api_base(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        require_secret("CHAT_BOT_TOKEN", &self.bot_token)?;
        if self.channel.trim().is_empty() {
            return Err(ConfigError::MissingVar {
                var: var_name("CHAT_CHANNEL"),
            });
        }
        validate_url("CHAT_API_BASE", &self.api_base)
    }
}

impl AppConfig {
    /// Timeout applied to every outbound HTTP request
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_seconds)
    }

    /// Returns a JSON representation with every credential redacted.
    pub fn redacted_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Validates the configuration, returning the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.log_format.as_str(), "pretty" | "json") {
            return Err(ConfigError::InvalidLogFormat {
                value: self.log_format.clone(),
            });
        }
        if self.http_timeout_seconds == 0 {
            return Err(ConfigError::InvalidHttpTimeout {
                value: self.http_timeout_seconds,
            });
        }

        self.directory.validate()?;
        self.conferencing.validate()?;
        self.file_share.validate()?;
        self.chat.validate()?;

        Ok(())
    }
}

fn default_profile() -> String {
    "local".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_http_timeout_seconds() -> u64 {
    30
}

fn default_directory_scopes() -> Vec<String> {
    vec![
        "https://www.googleapis.com/auth/admin.directory.user".to_string(),
        "https://www.googleapis.com/auth/admin.directory.group".to_string(),
    ]
}

fn default_directory_org_unit() -> String {
    "/Users".to_string()
}

fn default_directory_api_base() -> String {
    "https://admin.googleapis.com".to_string()
}

fn default_conferencing_token_ttl_seconds() -> u64 {
    30
}

fn default_conferencing_api_base() -> String {
    "https://api.zoom.us/v2".to_string()
}

fn default_file_share_folder() -> String {
    "/Company Shared/New Starters".to_string()
}

fn default_file_share_access_level() -> String {
    "viewer".to_string()
}

fn default_file_share_api_base() -> String {
    "https://api.dropboxapi.com/2".to_string()
}

fn default_chat_channel() -> String {
    "#general-announcements".to_string()
}

fn default_chat_api_base() -> String {
    "https://slack.com/api".to_string()
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load environment file {path}: {source}")]
    EnvFile {
        path: PathBuf,
        source: dotenvy::Error,
    },
    #[error("required setting {var} is missing")]
    MissingVar { var: String },
    #[error("{var} must be a non-negative integer, got '{value}'")]
    InvalidNumber { var: String, value: String },
    #[error("{var} must be an absolute http(s) URL, got '{value}'")]
    InvalidUrl { var: String, value: String },
    #[error("invalid directory domain '{value}'")]
    InvalidDomain { value: String },
    #[error("invalid onboarding group email '{value}'")]
    InvalidGroupEmail { value: String },
    #[error("invalid directory admin subject '{value}'")]
    InvalidAdminSubject { value: String },
    #[error("org unit must be an absolute path starting with '/', got '{value}'")]
    InvalidOrgUnit { value: String },
    #[error("at least one directory admin scope is required")]
    EmptyScopes,
    #[error("conferencing token lifetime must be between 1 and 3600 seconds, got {value}")]
    InvalidTokenTtl { value: u64 },
    #[error("file share access level must be one of viewer, editor, viewer_no_comment; got '{value}'")]
    InvalidAccessLevel { value: String },
    #[error("log format must be 'pretty' or 'json', got '{value}'")]
    InvalidLogFormat { value: String },
    #[error("HTTP timeout must be positive, got {value}")]
    InvalidHttpTimeout { value: u64 },
    #[error("failed to build HTTP client: {source}")]
    HttpClient { source: reqwest::Error },
}

fn var_name(key: &str) -> String {
    format!("{ENV_PREFIX}{key}")
}

fn require_secret(key: &str, secret: &Secret) -> Result<(), ConfigError> {
    if secret.is_empty() {
        return Err(ConfigError::MissingVar { var: var_name(key) });
    }
    Ok(())
}

fn validate_url(key: &str, value: &str) -> Result<(), ConfigError> {
    let valid = Url::parse(value)
        .map(|url| matches!(url.scheme(), "http" | "https") && !url.cannot_be_a_base())
        .unwrap_or(false);
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidUrl {
            var: var_name(key),
            value: value.to_string(),
        })
    }
}

fn is_valid_domain(domain: &str) -> bool {
    domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && domain
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
}

fn is_valid_email(entry: &str) -> bool {
    let parts: Vec<&str> = entry.split('@').collect();
    parts.len() == 2 && !parts[0].is_empty() && is_valid_domain(parts[1])
}

/// Loads configuration using layered `.env` files and `ONBOARD_*` env vars.
pub struct ConfigLoader {
    base_dir: PathBuf,
}

impl ConfigLoader {
    /// Creates a new loader rooted at the current working directory.
    pub fn new() -> Self {
        Self {
            base_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Creates a loader rooted at the provided directory (useful for tests).
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Loads and validates configuration.
    ///
    /// Precedence, lowest first: `.env`, `.env.local`, `.env.{profile}`,
    /// `.env.{profile}.local`, process environment.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let (mut layered, profile_hint) = self.collect_layered_env()?;

        // Overlay process environment last so it wins.
        for (key, value) in env::vars() {
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                layered.insert(stripped.to_string(), value);
            }
        }

        let mut values = Layered(layered);

        let profile = values.optional("PROFILE").unwrap_or(profile_hint);
        let log_level = values.optional("LOG_LEVEL").unwrap_or_else(default_log_level);
        let log_format = values
            .optional("LOG_FORMAT")
            .unwrap_or_else(default_log_format);
        let http_timeout_seconds =
            values.number("HTTP_TIMEOUT_SECONDS", default_http_timeout_seconds)?;

        let directory = DirectoryConfig {
            domain: values.required("DIRECTORY_DOMAIN")?,
            service_account_file: PathBuf::from(
                values.required("DIRECTORY_SERVICE_ACCOUNT_FILE")?,
            ),
            admin_subject: values.optional("DIRECTORY_ADMIN_SUBJECT"),
            admin_scopes: values
                .optional("DIRECTORY_ADMIN_SCOPES")
                .map(|scopes| {
                    scopes
                        .split(|c: char| c == ',' || c.is_whitespace())
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_else(default_directory_scopes),
            default_org_unit: values
                .optional("DIRECTORY_DEFAULT_ORG_UNIT")
                .unwrap_or_else(default_directory_org_unit),
            onboarding_group: values.required("DIRECTORY_ONBOARDING_GROUP")?,
            default_password: values.optional("DIRECTORY_DEFAULT_PASSWORD").map(Secret::from),
            token_uri: values.optional("DIRECTORY_TOKEN_URI"),
            api_base: values
                .optional("DIRECTORY_API_BASE")
                .unwrap_or_else(default_directory_api_base),
        };

        let conferencing = ConferencingConfig {
            api_key: values.required("CONFERENCING_API_KEY")?.into(),
            api_secret: values.required("CONFERENCING_API_SECRET")?.into(),
            default_group_id: values.optional("CONFERENCING_DEFAULT_GROUP_ID"),
            token_ttl_seconds: values.number(
                "CONFERENCING_TOKEN_TTL_SECONDS",
                default_conferencing_token_ttl_seconds,
            )?,
            api_base: values
                .optional("CONFERENCING_API_BASE")
                .unwrap_or_else(default_conferencing_api_base),
        };

        let file_share = FileShareConfig {
            access_token: values.required("FILE_SHARE_ACCESS_TOKEN")?.into(),
            folder_path: values
                .optional("FILE_SHARE_FOLDER")
                .unwrap_or_else(default_file_share_folder),
            access_level: values
                .optional("FILE_SHARE_ACCESS_LEVEL")
                .unwrap_or_else(default_file_share_access_level),
            api_base: values
                .optional("FILE_SHARE_API_BASE")
                .unwrap_or_else(default_file_share_api_base),
        };

        let chat = ChatConfig {
            bot_token: values.required("CHAT_BOT_TOKEN")?.into(),
            channel: values
                .optional("CHAT_CHANNEL")
                .unwrap_or_else(default_chat_channel),
            api_base: values
                .optional("CHAT_API_BASE")
                .unwrap_or_else(default_chat_api_base),
        };

        let config = AppConfig {
            profile,
            log_level,
            log_format,
            http_timeout_seconds,
            directory,
            conferencing,
            file_share,
            chat,
        };

        config.validate()?;
        Ok(config)
    }

    fn collect_layered_env(&self) -> Result<(BTreeMap<String, String>, String), ConfigError> {
        let mut values = BTreeMap::new();

        self.merge_dotenv(self.base_dir.join(".env"), &mut values)?;
        self.merge_dotenv(self.base_dir.join(".env.local"), &mut values)?;

        let profile = env::var(var_name("PROFILE"))
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| values.get("PROFILE").cloned())
            .unwrap_or_else(default_profile);

        self.merge_dotenv(
            self.base_dir.join(format!(".env.{}", &profile)),
            &mut values,
        )?;
        self.merge_dotenv(
            self.base_dir.join(format!(".env.{}.local", &profile)),
            &mut values,
        )?;

        Ok((values, profile))
    }

    fn merge_dotenv(
        &self,
        path: PathBuf,
        values: &mut BTreeMap<String, String>,
    ) -> Result<(), ConfigError> {
        match dotenvy::from_path_iter(&path) {
            Ok(iter) => {
                for item in iter {
                    let (key, value) = item.map_err(|source| ConfigError::EnvFile {
                        path: path.clone(),
                        source,
                    })?;
                    if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                        values.insert(stripped.to_string(), value);
                    }
                }
                Ok(())
            }
            Err(dotenvy::Error::Io(ref io_err)) if io_err.kind() == std::io::ErrorKind::NotFound => {
                Ok(())
            }
            Err(err) => Err(ConfigError::EnvFile { path, source: err }),
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Merged key/value pairs with the `ONBOARD_` prefix stripped
struct Layered(BTreeMap<String, String>);

impl Layered {
    fn optional(&mut self, key: &str) -> Option<String> {
        self.0
            .remove(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&mut self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingVar { var: var_name(key) })
    }

    fn number(&mut self, key: &str, default: fn() -> u64) -> Result<u64, ConfigError> {
        match self.optional(key) {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidNumber {
                var: var_name(key),
                value: raw,
            }),
            None => Ok(default()),
        }
    }
}
