use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};

use clap::Parser;
use config::{builder::DefaultState, ConfigBuilder, ConfigError, File};
use serde::{Deserialize, Serialize};

const DEFAULT_ADDR: &str = "127.0.0.1:8000";
const DEFAULT_DATABASE_PATH: &str = "./data";
const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

#[derive(Parser, Debug)]
#[command(version)]
pub(crate) struct Args {
    /// Path to the local configuration TOML file.
    #[arg(short, value_name = "CONFIG_PATH")]
    pub(crate) config: PathBuf,

    /// Path to the certificate file. TLS is enabled when given with `--key`.
    #[arg(long, value_name = "CERT_PATH", requires = "key")]
    pub(crate) cert: Option<PathBuf>,

    /// Path to the key file.
    #[arg(long, value_name = "KEY_PATH", requires = "cert")]
    pub(crate) key: Option<PathBuf>,

    /// Catalog JSON file to load into the database before serving.
    #[arg(long, value_name = "CATALOG_PATH")]
    pub(crate) import: Option<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Web {
    #[serde(deserialize_with = "deserialize_socket_addr")]
    pub(crate) address: SocketAddr,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct DatabaseSettings {
    pub(crate) path: PathBuf,
}

/// Where the zero-count placeholder options of an axis come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum VocabularyScope {
    /// Values assigned to products of the browsed category.
    #[default]
    Category,
    /// Every value ever assigned to the characteristic type, in any category.
    Global,
}

/// How a selected characteristic value is compared with stored values when
/// narrowing the candidate products.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ValueMatching {
    /// A selected value matches any token of a composite value.
    #[default]
    Token,
    /// A selected value matches only an identical raw value.
    Exact,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct FilterSettings {
    pub(crate) cache_ttl_secs: u64,
    #[serde(default)]
    pub(crate) vocabulary_scope: VocabularyScope,
    #[serde(default)]
    pub(crate) value_matching: ValueMatching,
}

impl FilterSettings {
    pub(crate) fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            vocabulary_scope: VocabularyScope::default(),
            value_matching: ValueMatching::default(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Settings {
    pub(crate) web: Web,
    pub(crate) database: DatabaseSettings,
    pub(crate) filter: FilterSettings,
}

impl Settings {
    /// Load settings from the given TOML file, with sane defaults.
    pub(crate) fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let builder = ConfigBuilder::<DefaultState>::default()
            .set_default("web.address", DEFAULT_ADDR)?
            .set_default("database.path", DEFAULT_DATABASE_PATH)?
            .set_default("filter.cache_ttl_secs", DEFAULT_CACHE_TTL_SECS)?
            .set_default("filter.vocabulary_scope", "category")?
            .set_default("filter.value_matching", "token")?;

        let cfg = builder.add_source(File::from(path)).build()?;

        cfg.try_deserialize()
    }
}

fn deserialize_socket_addr<'de, D>(deserializer: D) -> Result<SocketAddr, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(serde::de::Error::custom)
}
