// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JSON-RPC client for the verifier contract.

use std::time::Duration;

use alloy::{
    network::EthereumWallet,
    primitives::Address,
    providers::{DynProvider, Provider, ProviderBuilder},
};
use async_trait::async_trait;

use super::contract::IGitHubVerifier;
use super::types::{LedgerError, LedgerReceipt, VerificationRecord, WalletVerification};
use super::VerificationLedger;
use crate::config::LedgerConfig;
use crate::models::GitHubHandle;

/// Verifier contract reached over HTTP JSON-RPC.
///
/// Reads go through an unsigned provider. Writes need the signing provider,
/// which only exists when a private key was configured.
pub struct ChainLedger {
    contract_address: Address,
    reader: DynProvider,
    writer: Option<DynProvider>,
    confirmation_timeout: Duration,
}

impl ChainLedger {
    pub fn new(config: &LedgerConfig) -> Result<Self, LedgerError> {
        let url: url::Url = config
            .rpc_url
            .parse()
            .map_err(|e: url::ParseError| LedgerError::InvalidRpcUrl(e.to_string()))?;

        let reader = ProviderBuilder::new().connect_http(url.clone()).erased();
        let writer = config.signer.clone().map(|signer| {
            ProviderBuilder::new()
                .wallet(EthereumWallet::from(signer))
                .connect_http(url)
                .erased()
        });

        Ok(Self {
            contract_address: config.contract_address,
            reader,
            writer,
            confirmation_timeout: config.confirmation_timeout,
        })
    }
}

#[async_trait]
impl VerificationLedger for ChainLedger {
    fn can_write(&self) -> bool {
        self.writer.is_some()
    }

    async fn record_verification(
        &self,
        record: &VerificationRecord,
    ) -> Result<LedgerReceipt, LedgerError> {
        let writer = self.writer.as_ref().ok_or(LedgerError::ReadOnly)?;
        let contract = IGitHubVerifier::new(self.contract_address, writer.clone());

        let pending = contract
            .verifyUserWallet(
                record.wallet,
                record.handle.to_string(),
                record.verification_hash,
            )
            .send()
            .await
            .map_err(|e| LedgerError::TransactionFailed(format!("Failed to send: {e}")))?;

        let tx_hash = *pending.tx_hash();
        tracing::info!(
            tx_hash = %tx_hash,
            wallet = %record.wallet,
            handle = %record.handle,
            "Verification transaction submitted"
        );

        let receipt = tokio::time::timeout(self.confirmation_timeout, pending.get_receipt())
            .await
            .map_err(|_| LedgerError::ConfirmationTimeout(self.confirmation_timeout.as_secs()))?
            .map_err(|e| LedgerError::RpcError(format!("Failed to get receipt: {e}")))?;

        if !receipt.status() {
            return Err(LedgerError::Reverted(tx_hash));
        }

        Ok(LedgerReceipt {
            tx_hash,
            block_number: receipt.block_number,
        })
    }

    async fn wallet_info(&self, wallet: Address) -> Result<WalletVerification, LedgerError> {
        let contract = IGitHubVerifier::new(self.contract_address, self.reader.clone());
        let info = contract
            .getWalletGitHubInfo(wallet)
            .call()
            .await
            .map_err(|e| LedgerError::ContractError(e.to_string()))?;

        let handle = (!info.username.is_empty()).then(|| info.username.to_ascii_lowercase());
        Ok(WalletVerification {
            handle,
            verified: info.verified,
            verification_timestamp: u64::try_from(info.timestamp).unwrap_or(u64::MAX),
        })
    }

    async fn wallet_for_handle(
        &self,
        handle: &GitHubHandle,
    ) -> Result<Option<Address>, LedgerError> {
        let contract = IGitHubVerifier::new(self.contract_address, self.reader.clone());
        let wallet = contract
            .getWalletByGitHub(handle.to_string())
            .call()
            .await
            .map_err(|e| LedgerError::ContractError(e.to_string()))?;

        Ok((!wallet.is_zero()).then_some(wallet))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use alloy::primitives::{keccak256, B256, U256};
    use alloy::signers::local::PrivateKeySigner;
    use alloy::sol_types::{SolCall, SolValue};
    use axum::{extract::State, routing::post, Json, Router};
    use serde_json::{json, Value};
    use tokio::net::TcpListener;

    use super::*;

    const ANVIL_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    /// How the fake node answers `eth_getTransactionReceipt`.
    #[derive(Debug, Clone, Copy)]
    enum Mining {
        Succeeds,
        Reverts,
        Never,
    }

    #[derive(Clone)]
    struct FakeNode {
        mining: Mining,
        submitted: Arc<Mutex<Vec<B256>>>,
    }

    fn config(rpc_url: &str, signer: Option<PrivateKeySigner>) -> LedgerConfig {
        LedgerConfig {
            rpc_url: rpc_url.to_string(),
            contract_address: Address::repeat_byte(0x11),
            signer,
            confirmation_timeout: Duration::from_secs(5),
        }
    }

    fn signer() -> PrivateKeySigner {
        ANVIL_KEY.parse().unwrap()
    }

    fn record() -> VerificationRecord {
        VerificationRecord::new(
            Address::repeat_byte(0xab),
            GitHubHandle::new("octocat").unwrap(),
            1_700_000_000,
        )
    }

    fn call_input(params: &Value) -> String {
        let call = &params[0];
        call["input"]
            .as_str()
            .or_else(|| call["data"].as_str())
            .unwrap_or_default()
            .to_string()
    }

    fn starts_with_selector(input: &str, selector: [u8; 4]) -> bool {
        input
            .trim_start_matches("0x")
            .starts_with(&alloy::hex::encode(selector))
    }

    fn view_call_result(params: &Value) -> Value {
        let input = call_input(params);
        let encoded = if starts_with_selector(&input, IGitHubVerifier::getWalletGitHubInfoCall::SELECTOR)
        {
            ("Octocat".to_string(), true, U256::from(1_700_000_000u64)).abi_encode_params()
        } else if input.contains(&alloy::hex::encode("octocat")) {
            (Address::repeat_byte(0xab),).abi_encode_params()
        } else {
            (Address::ZERO,).abi_encode_params()
        };
        json!(format!("0x{}", alloy::hex::encode(encoded)))
    }

    fn submit(node: &FakeNode, params: &Value) -> Value {
        let raw = alloy::hex::decode(params[0].as_str().unwrap_or_default()).unwrap_or_default();
        let tx_hash = keccak256(raw);
        node.submitted.lock().unwrap().push(tx_hash);
        json!(alloy::hex::encode_prefixed(tx_hash))
    }

    fn receipt(params: &Value, mining: Mining) -> Value {
        let status = match mining {
            Mining::Succeeds => "0x1",
            Mining::Reverts => "0x0",
            Mining::Never => return Value::Null,
        };
        json!({
            "type": "0x2",
            "status": status,
            "cumulativeGasUsed": "0x5208",
            "logs": [],
            "logsBloom": format!("0x{}", "0".repeat(512)),
            "transactionHash": params[0],
            "transactionIndex": "0x0",
            "blockHash": alloy::hex::encode_prefixed(B256::repeat_byte(0xbb)),
            "blockNumber": "0x2",
            "gasUsed": "0x5208",
            "effectiveGasPrice": "0x3b9aca00",
            "from": signer().address().to_string(),
            "to": Address::repeat_byte(0x11).to_string(),
            "contractAddress": null
        })
    }

    /// Minimal JSON-RPC node: the verifier's view calls plus what a signed
    /// send and its receipt poll need.
    async fn rpc(State(node): State<FakeNode>, Json(request): Json<Value>) -> Json<Value> {
        let id = request["id"].clone();
        let params = &request["params"];
        let result = match request["method"].as_str() {
            Some("eth_chainId") => json!("0x7a69"),
            Some("eth_blockNumber") => json!("0x1"),
            Some("eth_call") => view_call_result(params),
            Some("eth_getTransactionCount") => json!("0x0"),
            Some("eth_estimateGas") => json!("0x30d40"),
            Some("eth_gasPrice") => json!("0x3b9aca00"),
            Some("eth_maxPriorityFeePerGas") => json!("0x3b9aca00"),
            Some("eth_feeHistory") => json!({
                "oldestBlock": "0x1",
                "baseFeePerGas": ["0x3b9aca00", "0x3b9aca00"],
                "gasUsedRatio": [0.5],
                "reward": [["0x3b9aca00"]]
            }),
            Some("eth_getBlockByNumber") => Value::Null,
            Some("eth_sendRawTransaction") => submit(&node, params),
            Some("eth_getTransactionReceipt") => receipt(params, node.mining),
            _ => {
                return Json(json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "error": { "code": -32601, "message": "method not found" }
                }))
            }
        };
        Json(json!({ "jsonrpc": "2.0", "id": id, "result": result }))
    }

    /// Serve the fake node. Returns its URL and the hashes of the raw
    /// transactions it accepted.
    async fn fake_node_with(mining: Mining) -> (String, Arc<Mutex<Vec<B256>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let submitted = Arc::new(Mutex::new(Vec::new()));
        let node = FakeNode {
            mining,
            submitted: submitted.clone(),
        };
        let app = Router::new().route("/", post(rpc)).with_state(node);
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}/"), submitted)
    }

    async fn fake_node() -> String {
        fake_node_with(Mining::Succeeds).await.0
    }

    #[test]
    fn invalid_rpc_url_is_rejected() {
        let err = ChainLedger::new(&config("not a url", None)).err().unwrap();
        assert!(matches!(err, LedgerError::InvalidRpcUrl(_)));
    }

    #[tokio::test]
    async fn write_capability_follows_signer() {
        let read_only = ChainLedger::new(&config("http://127.0.0.1:8545", None)).unwrap();
        assert!(!read_only.can_write());

        let writable = ChainLedger::new(&config("http://127.0.0.1:8545", Some(signer()))).unwrap();
        assert!(writable.can_write());
    }

    #[tokio::test]
    async fn read_only_ledger_refuses_writes() {
        let ledger = ChainLedger::new(&config("http://127.0.0.1:8545", None)).unwrap();
        let record = record();
        let err = ledger.record_verification(&record).await.unwrap_err();
        assert!(matches!(err, LedgerError::ReadOnly));
        assert_ne!(record.verification_hash, B256::ZERO);
    }

    #[tokio::test]
    async fn wallet_info_lowercases_handle() {
        let url = fake_node().await;
        let ledger = ChainLedger::new(&config(&url, None)).unwrap();

        let info = ledger.wallet_info(Address::repeat_byte(0xab)).await.unwrap();
        assert_eq!(info.handle.as_deref(), Some("octocat"));
        assert!(info.verified);
        assert_eq!(info.verification_timestamp, 1_700_000_000);
    }

    #[tokio::test]
    async fn zero_address_means_unbound_handle() {
        let url = fake_node().await;
        let ledger = ChainLedger::new(&config(&url, None)).unwrap();

        let bound = ledger
            .wallet_for_handle(&GitHubHandle::new("Octocat").unwrap())
            .await
            .unwrap();
        assert_eq!(bound, Some(Address::repeat_byte(0xab)));

        let unbound = ledger
            .wallet_for_handle(&GitHubHandle::new("nobody").unwrap())
            .await
            .unwrap();
        assert!(unbound.is_none());
    }

    #[tokio::test]
    async fn unreachable_node_is_an_error() {
        let ledger = ChainLedger::new(&config("http://127.0.0.1:1", None)).unwrap();
        assert!(ledger.wallet_info(Address::ZERO).await.is_err());
    }

    #[tokio::test]
    async fn mined_verification_returns_receipt() {
        let (url, submitted) = fake_node_with(Mining::Succeeds).await;
        let ledger = ChainLedger::new(&config(&url, Some(signer()))).unwrap();

        let receipt = ledger.record_verification(&record()).await.unwrap();
        assert_eq!(submitted.lock().unwrap().as_slice(), &[receipt.tx_hash]);
        assert_eq!(receipt.block_number, Some(2));
    }

    #[tokio::test]
    async fn reverted_verification_is_an_error() {
        let (url, submitted) = fake_node_with(Mining::Reverts).await;
        let ledger = ChainLedger::new(&config(&url, Some(signer()))).unwrap();

        let err = ledger.record_verification(&record()).await.unwrap_err();
        match err {
            LedgerError::Reverted(tx_hash) => {
                assert_eq!(submitted.lock().unwrap().as_slice(), &[tx_hash]);
            }
            other => panic!("expected revert, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unconfirmed_verification_times_out() {
        let (url, submitted) = fake_node_with(Mining::Never).await;
        let mut config = config(&url, Some(signer()));
        config.confirmation_timeout = Duration::from_secs(1);
        let ledger = ChainLedger::new(&config).unwrap();

        let started = std::time::Instant::now();
        let err = ledger.record_verification(&record()).await.unwrap_err();
        assert!(matches!(err, LedgerError::ConfirmationTimeout(1)));
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(submitted.lock().unwrap().len(), 1);
    }
}
