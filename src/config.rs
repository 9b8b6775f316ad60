use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::sync::OnceLock;

static CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Node connection configuration
#[derive(Debug, Deserialize, Clone)]
pub struct NodeConfig {
    /// REST base URL including the API version segment, e.g.
    /// `https://fullnode.testnet.aptoslabs.com/v1`
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Resends after connection failures (never after a response arrived)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    2
}

/// Endpoint paths used by the signing protocol.
///
/// Different node API revisions moved these around, so they are pinned in
/// configuration next to the node URL rather than hard-coded. Placeholders in
/// braces are substituted per request.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ApiPaths {
    pub encode_submission: String,
    pub submit: String,
    pub simulate: String,
    pub batch: String,
    /// Template with `{hash}`
    pub transaction_by_hash: String,
    /// Template with `{version}`
    pub transaction_by_version: String,
    /// Template with `{address}` and `{resource}`
    pub account_resource: String,
}

impl Default for ApiPaths {
    fn default() -> Self {
        Self {
            encode_submission: "/transactions/encode_submission".to_string(),
            submit: "/transactions".to_string(),
            simulate: "/transactions/simulate".to_string(),
            batch: "/transactions/batch".to_string(),
            transaction_by_hash: "/transactions/by_hash/{hash}".to_string(),
            transaction_by_version: "/transactions/by_version/{version}".to_string(),
            account_resource: "/accounts/{address}/resource/{resource}".to_string(),
        }
    }
}

impl ApiPaths {
    pub fn transaction_by_hash(&self, hash: &str) -> String {
        self.transaction_by_hash.replace("{hash}", hash)
    }

    pub fn transaction_by_version(&self, version: u64) -> String {
        self.transaction_by_version
            .replace("{version}", &version.to_string())
    }

    pub fn account_resource(&self, address: &str, resource: &str) -> String {
        self.account_resource
            .replace("{address}", address)
            .replace("{resource}", resource)
    }
}

/// Defaults applied when building transactions
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct TransactionConfig {
    pub max_gas_amount: u64,
    pub gas_unit_price: u64,
    /// Seconds from build time until the transaction expires
    pub expiration_secs: u64,
    /// Attempt ceiling used when waiting for finality
    pub poll_attempts: u32,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            max_gas_amount: 2000,
            gas_unit_price: 100,
            expiration_secs: 600,
            poll_attempts: 10,
        }
    }
}

/// Root application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub node: NodeConfig,
    #[serde(default)]
    pub api: ApiPaths,
    #[serde(default)]
    pub transaction: TransactionConfig,
}

impl AppConfig {
    /// Configuration for `url` with every other setting at its default.
    pub fn for_node(url: impl Into<String>) -> Self {
        Self {
            node: NodeConfig {
                url: url.into(),
                timeout_secs: default_timeout_secs(),
                max_retries: default_max_retries(),
            },
            api: ApiPaths::default(),
            transaction: TransactionConfig::default(),
        }
    }

    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., APTKIT_NODE__URL, APTKIT_TRANSACTION__GAS_UNIT_PRICE
            .add_source(
                Environment::with_prefix("APTKIT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Initialize the global config singleton
    pub fn init() -> Result<&'static Self, ConfigError> {
        let config = Self::load()?;
        Ok(CONFIG.get_or_init(|| config))
    }

    /// Get reference to the global config, if [`AppConfig::init`] ran
    pub fn get() -> Option<&'static Self> {
        CONFIG.get()
    }
}

impl NodeConfig {
    /// Join the base URL and an endpoint path with exactly one slash
    pub fn endpoint(&self, path: &str) -> String {
        let base = self.url.trim().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }
}
