use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use camino::Utf8PathBuf;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::domain::{LengthRange, SearchQuery, TaxId};
use crate::error::KiraError;

pub const CONFIG_FILE_NAME: &str = "kira-taxscan.json";
pub const DEFAULT_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub output_dir: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Credentials sent with every E-utilities request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub api_key: Option<String>,
}

impl Credentials {
    pub fn new(email: &str, api_key: &str) -> Self {
        let api_key = api_key.trim();
        Self {
            email: email.trim().to_string(),
            api_key: (!api_key.is_empty()).then(|| api_key.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EnvVars {
    pub email: Option<String>,
    pub api_key: Option<String>,
}

impl EnvVars {
    pub fn from_process() -> Self {
        Self {
            email: non_empty_var("NCBI_EMAIL"),
            api_key: non_empty_var("NCBI_API_KEY"),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub email: Option<String>,
    pub api_key: Option<String>,
    pub output_dir: Utf8PathBuf,
    pub client: ClientSettings,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads the explicit config file, or the first of `./kira-taxscan.json`
    /// and the per-user config file that exists. Missing implicit files yield
    /// an empty config.
    pub fn load(path: Option<&Path>) -> Result<Config, KiraError> {
        if let Some(path) = path {
            return Self::read(path);
        }
        let candidates = [Some(PathBuf::from(CONFIG_FILE_NAME)), user_config_path()];
        for candidate in candidates.into_iter().flatten() {
            if candidate.exists() {
                tracing::debug!(path = %candidate.display(), "loading config");
                return Self::read(&candidate);
            }
        }
        Ok(Config::default())
    }

    pub fn read(path: &Path) -> Result<Config, KiraError> {
        let content =
            fs::read_to_string(path).map_err(|_| KiraError::ConfigRead(path.to_path_buf()))?;
        serde_json::from_str(&content).map_err(|err| KiraError::ConfigParse(err.to_string()))
    }

    /// Environment values win over the file.
    pub fn resolve_config(config: Config, env: &EnvVars) -> ResolvedConfig {
        let defaults = ClientSettings::default();
        ResolvedConfig {
            email: env.email.clone().or(config.email),
            api_key: env.api_key.clone().or(config.api_key),
            output_dir: config
                .output_dir
                .map(Utf8PathBuf::from)
                .unwrap_or_default(),
            client: ClientSettings {
                base_url: config
                    .base_url
                    .map(|url| url.trim_end_matches('/').to_string())
                    .unwrap_or(defaults.base_url),
                timeout: config
                    .timeout_secs
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.timeout),
            },
        }
    }
}

pub fn user_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "kira-taxscan").map(|dirs| dirs.config_dir().join("config.json"))
}

/// Run parameters as gathered from flags and config, before prompting.
#[derive(Debug, Clone, Default)]
pub struct PartialParameters {
    pub email: Option<String>,
    pub api_key: Option<String>,
    pub tax_id: Option<String>,
    pub min_len: Option<String>,
    pub max_len: Option<String>,
}

impl PartialParameters {
    /// Fills credentials the flags left unset from the resolved config.
    pub fn with_config(self, resolved: &ResolvedConfig) -> Self {
        Self {
            email: self.email.or_else(|| resolved.email.clone()),
            api_key: self.api_key.or_else(|| resolved.api_key.clone()),
            ..self
        }
    }

    /// Non-interactive completion: every value except the API key is required.
    pub fn require(self) -> Result<Parameters, KiraError> {
        Ok(Parameters {
            email: self.email.ok_or(KiraError::MissingParameter("email"))?,
            api_key: self.api_key.unwrap_or_default(),
            tax_id: self.tax_id.ok_or(KiraError::MissingParameter("taxid"))?,
            min_len: self.min_len.ok_or(KiraError::MissingParameter("min-len"))?,
            max_len: self.max_len.ok_or(KiraError::MissingParameter("max-len"))?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameters {
    pub email: String,
    pub api_key: String,
    pub tax_id: String,
    pub min_len: String,
    pub max_len: String,
}

impl Parameters {
    pub fn into_request(self) -> Result<(Credentials, SearchQuery), KiraError> {
        let tax_id: TaxId = self.tax_id.parse()?;
        let range = LengthRange::parse(&self.min_len, &self.max_len)?;
        Ok((
            Credentials::new(&self.email, &self.api_key),
            SearchQuery::new(tax_id, range),
        ))
    }
}
