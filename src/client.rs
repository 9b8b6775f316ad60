//! REST client for an Aptos node.
//!
//! Read-only queries live here; the signing and submission protocol is
//! implemented on the same type in [`crate::transaction`].

use aptkit_types::{
    AccountData, AccountResource, Block, ErrorEnvelope, Event, GasEstimation, LedgerInfo,
    MoveModuleBytecode, NodeHealth, StringOrNumber, TransactionRecord,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::address::AccountAddress;
use crate::config::{ApiPaths, AppConfig, TransactionConfig};
use crate::error::{AptError, AptResult};
use crate::transport::{HttpTransport, Transport};

/// Resource holding an account's sequence number.
pub const ACCOUNT_RESOURCE: &str = "0x1::account::Account";
/// Resource holding an account's native coin balance.
pub const APT_COIN_STORE: &str = "0x1::coin::CoinStore<0x1::aptos_coin::AptosCoin>";

const DEFAULT_PAGE_LIMIT: u16 = 25;

/// Decode a response body, probing for the error envelope first.
///
/// Decoding an envelope straight into a record type could succeed with
/// defaulted fields, so the probe has to come first.
pub fn decode<R: DeserializeOwned>(body: &str) -> AptResult<R> {
    if let Some(envelope) = ErrorEnvelope::probe(body) {
        debug!(
            error_code = ?envelope.error_code,
            ledger_version = ?envelope.ledger_version,
            "Node returned error envelope"
        );
        return Err(AptError::rpc(envelope.description()));
    }
    Ok(serde_json::from_str(body)?)
}

fn check_address(address: &str) -> AptResult<AccountAddress> {
    if address.is_empty() {
        return Err(AptError::InvalidArgument("address is empty"));
    }
    address.parse()
}

fn with_version(path: String, version: Option<u64>) -> String {
    match version {
        Some(v) => format!("{path}?version={v}"),
        None => path,
    }
}

fn page_query(limit: Option<u16>, start: Option<u64>) -> String {
    let limit = limit.filter(|l| *l > 0).unwrap_or(DEFAULT_PAGE_LIMIT);
    match start {
        Some(start) => format!("limit={limit}&start={start}"),
        None => format!("limit={limit}"),
    }
}

/// Client for one node, generic over the transport it talks through.
pub struct AptClient<T = HttpTransport> {
    pub(crate) transport: T,
    pub(crate) paths: ApiPaths,
    pub(crate) defaults: TransactionConfig,
}

impl<T> std::fmt::Debug for AptClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AptClient")
            .field("paths", &self.paths)
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

impl AptClient<HttpTransport> {
    /// Create an HTTP client from config
    pub fn from_config(config: &AppConfig) -> AptResult<Self> {
        Ok(Self::with_transport(HttpTransport::new(&config.node)?, config))
    }

    /// HTTP client for `url` with default settings
    pub fn connect(url: &str) -> AptResult<Self> {
        Self::from_config(&AppConfig::for_node(url))
    }
}

impl<T: Transport> AptClient<T> {
    pub fn with_transport(transport: T, config: &AppConfig) -> Self {
        Self {
            transport,
            paths: config.api.clone(),
            defaults: config.transaction,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn paths(&self) -> &ApiPaths {
        &self.paths
    }

    pub fn transaction_defaults(&self) -> &TransactionConfig {
        &self.defaults
    }

    pub(crate) async fn get_json<R: DeserializeOwned>(&self, path: &str) -> AptResult<R> {
        let body = self.transport.get(path).await?;
        decode(&body)
    }

    pub(crate) async fn post_json<R: DeserializeOwned>(
        &self,
        path: &str,
        body: &Value,
    ) -> AptResult<R> {
        let response = self.transport.post(path, body).await?;
        decode(&response)
    }

    /// Node liveness; `duration_secs` asks the node to also check that the
    /// ledger advanced within that window.
    pub async fn node_health(&self, duration_secs: Option<u32>) -> AptResult<NodeHealth> {
        let path = match duration_secs {
            Some(secs) => format!("/-/healthy?duration_secs={secs}"),
            None => "/-/healthy".to_string(),
        };
        let body = self.transport.get(&path).await?;
        // a healthy reply also carries `message`, so only a code marks failure
        match ErrorEnvelope::probe(&body) {
            Some(envelope) if envelope.error_code.as_ref().is_some_and(StringOrNumber::is_set) => {
                Err(AptError::rpc(envelope.description()))
            }
            _ => Ok(serde_json::from_str(&body)?),
        }
    }

    pub async fn ledger_info(&self) -> AptResult<LedgerInfo> {
        self.get_json("/").await
    }

    pub async fn block_by_height(&self, height: u64, with_transactions: bool) -> AptResult<Block> {
        self.get_json(&format!(
            "/blocks/by_height/{height}?with_transactions={with_transactions}"
        ))
        .await
    }

    pub async fn block_by_version(&self, version: u64, with_transactions: bool) -> AptResult<Block> {
        self.get_json(&format!(
            "/blocks/by_version/{version}?with_transactions={with_transactions}"
        ))
        .await
    }

    pub async fn account(&self, address: &str) -> AptResult<AccountData> {
        let address = check_address(address)?;
        self.get_json(&format!("/accounts/{address}")).await
    }

    /// Current sequence number, read from the `0x1::account::Account` resource.
    pub async fn sequence_number(&self, address: &str) -> AptResult<u64> {
        let address = check_address(address)?;
        let path = self
            .paths
            .account_resource(&address.to_string(), ACCOUNT_RESOURCE);
        let resource: AccountResource = self.get_json(&path).await?;
        resource
            .data
            .get("sequence_number")
            .and_then(Value::as_str)
            .ok_or_else(|| AptError::MalformedResponse("resource has no sequence_number".into()))?
            .parse()
            .map_err(|_| AptError::MalformedResponse("sequence_number is not a u64".into()))
    }

    /// Native coin balance in octas.
    pub async fn balance(&self, address: &str) -> AptResult<u64> {
        let resource = self.account_resource(address, APT_COIN_STORE, None).await?;
        resource
            .data
            .get("coin")
            .and_then(|coin| coin.get("value"))
            .and_then(Value::as_str)
            .ok_or_else(|| AptError::MalformedResponse("coin store has no coin.value".into()))?
            .parse()
            .map_err(|_| AptError::MalformedResponse("coin.value is not a u64".into()))
    }

    pub async fn account_resources(
        &self,
        address: &str,
        version: Option<u64>,
    ) -> AptResult<Vec<AccountResource>> {
        let address = check_address(address)?;
        self.get_json(&with_version(format!("/accounts/{address}/resources"), version))
            .await
    }

    pub async fn account_resource(
        &self,
        address: &str,
        resource_type: &str,
        version: Option<u64>,
    ) -> AptResult<AccountResource> {
        let address = check_address(address)?;
        if resource_type.is_empty() {
            return Err(AptError::InvalidArgument("resource type is empty"));
        }
        let path = self
            .paths
            .account_resource(&address.to_string(), resource_type);
        self.get_json(&with_version(path, version)).await
    }

    pub async fn account_modules(
        &self,
        address: &str,
        version: Option<u64>,
    ) -> AptResult<Vec<MoveModuleBytecode>> {
        let address = check_address(address)?;
        self.get_json(&with_version(format!("/accounts/{address}/modules"), version))
            .await
    }

    pub async fn account_module(
        &self,
        address: &str,
        module_name: &str,
        version: Option<u64>,
    ) -> AptResult<MoveModuleBytecode> {
        let address = check_address(address)?;
        if module_name.is_empty() {
            return Err(AptError::InvalidArgument("module name is empty"));
        }
        self.get_json(&with_version(
            format!("/accounts/{address}/module/{module_name}"),
            version,
        ))
        .await
    }

    pub async fn transactions(
        &self,
        limit: Option<u16>,
        start: Option<u64>,
    ) -> AptResult<Vec<TransactionRecord>> {
        self.get_json(&format!("/transactions?{}", page_query(limit, start)))
            .await
    }

    pub async fn transactions_by_account(
        &self,
        address: &str,
        limit: Option<u16>,
        start: Option<u64>,
    ) -> AptResult<Vec<TransactionRecord>> {
        let address = check_address(address)?;
        self.get_json(&format!(
            "/accounts/{address}/transactions?{}",
            page_query(limit, start)
        ))
        .await
    }

    pub async fn transaction_by_hash(&self, hash: &str) -> AptResult<TransactionRecord> {
        if hash.is_empty() {
            return Err(AptError::InvalidArgument("transaction hash is empty"));
        }
        self.get_json(&self.paths.transaction_by_hash(hash)).await
    }

    pub async fn transaction_by_version(&self, version: u64) -> AptResult<TransactionRecord> {
        self.get_json(&self.paths.transaction_by_version(version))
            .await
    }

    pub async fn estimate_gas_price(&self) -> AptResult<GasEstimation> {
        self.get_json("/estimate_gas_price").await
    }

    pub async fn events_by_creation_number(
        &self,
        address: &str,
        creation_number: u64,
        limit: Option<u16>,
        start: Option<u64>,
    ) -> AptResult<Vec<Event>> {
        let address = check_address(address)?;
        self.get_json(&format!(
            "/accounts/{address}/events/{creation_number}?{}",
            page_query(limit, start)
        ))
        .await
    }

    pub async fn events_by_handle(
        &self,
        address: &str,
        handle: &str,
        field_name: &str,
        limit: Option<u16>,
        start: Option<u64>,
    ) -> AptResult<Vec<Event>> {
        let address = check_address(address)?;
        if handle.is_empty() || field_name.is_empty() {
            return Err(AptError::InvalidArgument("event handle or field name is empty"));
        }
        self.get_json(&format!(
            "/accounts/{address}/events/{handle}/{field_name}?{}",
            page_query(limit, start)
        ))
        .await
    }
}
