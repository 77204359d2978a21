//! Network preparation of contract invocations
//!
//! A transaction that invokes a contract must declare the ledger entries it
//! touches, the resources it consumes and the authorization it needs. None of
//! that can be computed locally: the envelope is sent to the RPC server's
//! `simulateTransaction` method and the returned metadata is merged back in
//! verbatim. Simulation has no side effects on ledger state.

use crate::config::{Network, RpcConfig};
use crate::error::{Result, XdrAsmError};
use crate::fee_calculator::FeeCalculator;
use crate::operation::OperationBody;
use crate::serialization::ByteDeserialize;
use crate::soroban::{AuthorizationEntry, SorobanTransactionData};
use crate::transaction::{PreparedEnvelope, Transaction, TransactionExt, UnsignedEnvelope};
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

/// Anything that can simulate a base64 transaction envelope
#[async_trait]
pub trait SimulationClient: Send + Sync {
    async fn simulate_transaction(&self, envelope_xdr: &str) -> Result<SimulationResponse>;
}

/// `simulateTransaction` result
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResponse {
    /// Base64 `SorobanTransactionData`
    #[serde(default)]
    pub transaction_data: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub min_resource_fee: Option<i64>,
    /// One entry per host function invocation
    #[serde(default)]
    pub results: Vec<SimulationResult>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub latest_ledger: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SimulationResult {
    /// Base64 `SorobanAuthorizationEntry` values
    #[serde(default)]
    pub auth: Vec<String>,
    /// Base64 `ScVal` return value
    #[serde(default)]
    pub xdr: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    Text(String),
    Number(i64),
}

/// RPC servers send stroop amounts as decimal strings; older ones as numbers
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<StringOrNumber>::deserialize(deserializer)? {
        None => Ok(None),
        Some(StringOrNumber::Number(n)) => Ok(Some(n)),
        Some(StringOrNumber::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'static str,
    params: SimulateParams<'a>,
}

#[derive(Serialize)]
struct SimulateParams<'a> {
    transaction: &'a str,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<SimulationResponse>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// JSON-RPC client for a ledger RPC server
#[derive(Debug, Clone)]
pub struct RpcClient {
    http: reqwest::Client,
    config: RpcConfig,
}

impl RpcClient {
    pub fn new(config: RpcConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| XdrAsmError::SimulationFailed(format!("http client: {}", e)))?;
        Ok(Self { http, config })
    }

    /// Client for the network's configured RPC endpoint
    pub fn for_network(network: &Network) -> Result<Self> {
        let url = network.rpc_url.as_deref().ok_or_else(|| {
            XdrAsmError::SimulationFailed(format!(
                "no RPC endpoint configured for {:?}",
                network.passphrase
            ))
        })?;
        Self::new(RpcConfig::new(url))
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }
}

#[async_trait]
impl SimulationClient for RpcClient {
    async fn simulate_transaction(&self, envelope_xdr: &str) -> Result<SimulationResponse> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method: "simulateTransaction",
            params: SimulateParams {
                transaction: envelope_xdr,
            },
        };

        let response = self
            .http
            .post(&self.config.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| XdrAsmError::SimulationFailed(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(XdrAsmError::SimulationFailed(format!(
                "RPC returned status {}: {}",
                status, body
            )));
        }

        let body: RpcResponse = response
            .json()
            .await
            .map_err(|e| XdrAsmError::SimulationFailed(format!("invalid RPC response: {}", e)))?;

        match (body.result, body.error) {
            (_, Some(err)) => Err(XdrAsmError::SimulationFailed(format!(
                "RPC error {}: {}",
                err.code, err.message
            ))),
            (Some(result), None) => Ok(result),
            (None, None) => Err(XdrAsmError::SimulationFailed(
                "RPC response has neither result nor error".to_string(),
            )),
        }
    }
}

/// Simulate and merge network metadata into a contract-invoking envelope.
///
/// Envelopes without contract invocations are returned as prepared without
/// touching the network. Every failure is reported as `SimulationFailed`;
/// there are no retries.
pub async fn prepare<C>(envelope: UnsignedEnvelope, client: &C) -> Result<PreparedEnvelope>
where
    C: SimulationClient + ?Sized,
{
    if !envelope.requires_simulation() {
        tracing::debug!("no contract invocation, skipping simulation");
        return envelope.into_prepared();
    }

    let request = envelope.to_xdr_base64()?;
    let UnsignedEnvelope {
        transaction,
        warnings,
    } = envelope;

    let merged = match client.simulate_transaction(&request).await {
        Ok(response) => merge(transaction, response),
        Err(e) => Err(e),
    };

    match merged {
        Ok(transaction) => {
            tracing::debug!(
                fee = transaction.fee,
                resource_fee = transaction.soroban_data().map(|d| d.resource_fee),
                "merged simulation results"
            );
            Ok(PreparedEnvelope {
                transaction,
                warnings,
            })
        }
        Err(e) => {
            tracing::warn!(error = %e, "transaction simulation failed");
            Err(match e {
                e @ XdrAsmError::SimulationFailed(_) => e,
                other => XdrAsmError::SimulationFailed(other.to_string()),
            })
        }
    }
}

fn merge(mut transaction: Transaction, response: SimulationResponse) -> Result<Transaction> {
    if let Some(error) = response.error {
        return Err(XdrAsmError::SimulationFailed(error));
    }

    let encoded = response.transaction_data.ok_or_else(|| {
        XdrAsmError::SimulationFailed("response has no transactionData".to_string())
    })?;
    let data = SorobanTransactionData::from_xdr_base64(&encoded)?;

    let invocations = transaction
        .operations
        .iter()
        .filter(|op| op.is_invoke_contract())
        .count();
    if response.results.len() != invocations {
        return Err(XdrAsmError::SimulationFailed(format!(
            "{} results for {} contract invocations",
            response.results.len(),
            invocations
        )));
    }

    let invokes = transaction.operations.iter_mut().filter_map(|op| match &mut op.body {
        OperationBody::InvokeContract(invoke) => Some(invoke),
        OperationBody::Payment(_) => None,
    });
    for (invoke, result) in invokes.zip(&response.results) {
        if invoke.auth.is_empty() {
            invoke.auth = result
                .auth
                .iter()
                .map(|entry| AuthorizationEntry::from_base64(entry))
                .collect::<Result<Vec<_>>>()?;
        }
    }

    let resource_fee = response.min_resource_fee.unwrap_or(data.resource_fee);
    transaction.fee = FeeCalculator::new().with_resource_fee(transaction.fee, resource_fee)?;
    transaction.ext = TransactionExt::V1(data);

    Ok(transaction)
}
