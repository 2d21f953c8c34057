use crate::error::ConfigError;
use config::{Environment, File, FileFormat};
use reqwest::header::HeaderValue;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "orgrank.toml";
pub const TOKEN_ENV_VAR: &str = "GITHUB_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub organizations: Vec<String>,
    pub api_base_url: String,
    pub per_page: u32,
    pub top_n: usize,
    pub dataset_path: String,
    pub results_path: String,
    pub request_timeout_secs: u64,
    pub repository_failure_policy: RepositoryFailurePolicy,
}

/// What happens to an organization when one of its repositories fails a
/// detail, pull request or release request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RepositoryFailurePolicy {
    SkipRepository,
    AbortOrganization,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            organizations: vec![
                "facebook".to_string(),
                "microsoft".to_string(),
                "google".to_string(),
            ],
            api_base_url: "https://api.github.com".to_string(),
            per_page: 100,
            top_n: 10,
            dataset_path: "repositorios_top10.csv".to_string(),
            results_path: "resultados_anova.csv".to_string(),
            request_timeout_secs: 30,
            repository_failure_policy: RepositoryFailurePolicy::SkipRepository,
        }
    }
}

impl Config {
    /// Layers defaults, an optional TOML file and `ORGRANK_*` variables.
    ///
    /// An explicitly named file must exist; the default `orgrank.toml` is
    /// only read when present.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (file, required) = match path {
            Some(p) => (p.display().to_string(), true),
            None => (DEFAULT_CONFIG_FILE.to_string(), false),
        };

        let config: Config = config::Config::builder()
            .add_source(config::Config::try_from(&Config::default())?)
            .add_source(File::new(&file, FileFormat::Toml).required(required))
            .add_source(
                Environment::with_prefix("ORGRANK")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("organizations"),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.organizations.is_empty() {
            return Err(invalid("organizations must not be empty"));
        }

        let mut seen = HashSet::new();
        for org in &self.organizations {
            if org.trim().is_empty() {
                return Err(invalid("organization names must not be blank"));
            }
            if !seen.insert(org.as_str()) {
                return Err(invalid(&format!("organization {:?} is listed twice", org)));
            }
        }

        if self.top_n == 0 {
            return Err(invalid("top_n must be at least 1"));
        }
        if !(1..=100).contains(&self.per_page) {
            return Err(invalid("per_page must be between 1 and 100"));
        }

        Ok(())
    }
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::Invalid {
        message: message.to_string(),
    }
}

/// GitHub credential, only ever sourced from the environment.
#[derive(Clone)]
pub struct Credentials {
    token: String,
    authorization: HeaderValue,
}

impl Credentials {
    /// Fails when the token cannot be sent as an `Authorization` header.
    pub fn new(token: impl Into<String>) -> Result<Self, ConfigError> {
        let token = token.into();
        let mut authorization = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| {
                invalid(&format!(
                    "{} contains characters not allowed in a header",
                    TOKEN_ENV_VAR
                ))
            })?;
        authorization.set_sensitive(true);

        Ok(Self {
            token,
            authorization,
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(TOKEN_ENV_VAR) {
            Ok(token) if !token.trim().is_empty() => Self::new(token.trim()),
            _ => Err(ConfigError::MissingCredential {
                variable: TOKEN_ENV_VAR,
            }),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Ready-made `Bearer` header value, marked sensitive.
    pub fn authorization(&self) -> HeaderValue {
        self.authorization.clone()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .finish()
    }
}
