/*
[INPUT]:  Wallet addresses and signed transaction bytes
[OUTPUT]: Lamport balances and transaction signatures
[POS]:    HTTP layer - Solana JSON-RPC methods used by the playground
[UPDATE]: When adding RPC methods or changing commitment defaults
*/

use std::sync::atomic::{AtomicU64, Ordering};

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::http::{PlaygroundClient, PlaygroundError, Result};
use crate::types::{Lamports, WalletAddress};

static REQUEST_ID: AtomicU64 = AtomicU64::new(1);

const COMMITMENT: &str = "confirmed";

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// Result wrapper for methods that return `{ context, value }`
#[derive(Deserialize)]
struct RpcContextValue<T> {
    value: T,
}

impl PlaygroundClient {
    /// Issue a JSON-RPC call against the configured endpoint
    pub async fn rpc_call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: REQUEST_ID.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };
        debug!(method, id = request.id, "rpc call");

        let builder = self.rpc_request().json(&request);
        let response: RpcResponse<T> = self.send_json(builder).await?;

        if let Some(error) = response.error {
            return Err(PlaygroundError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        response
            .result
            .ok_or_else(|| PlaygroundError::InvalidResponse(format!("{method} returned no result")))
    }

    /// Balance of an account in lamports
    ///
    /// RPC getBalance
    pub async fn get_balance(&self, address: &WalletAddress) -> Result<Lamports> {
        let result: RpcContextValue<u64> = self
            .rpc_call(
                "getBalance",
                json!([address.as_str(), { "commitment": COMMITMENT }]),
            )
            .await?;
        info!(address = %address, lamports = result.value, "balance fetched");
        Ok(Lamports(result.value))
    }

    /// Submit a fully signed, serialized transaction and return its signature
    ///
    /// RPC sendTransaction (base64 encoding)
    pub async fn send_transaction(&self, signed_transaction: &[u8]) -> Result<String> {
        let encoded = BASE64.encode(signed_transaction);
        let signature: String = self
            .rpc_call(
                "sendTransaction",
                json!([encoded, { "encoding": "base64", "preflightCommitment": COMMITMENT }]),
            )
            .await?;
        info!(signature = %signature, "transaction submitted");
        Ok(signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::ClientConfig;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ADDRESS: &str = "SEekKY1iUoWYJqZ3d9QBsfJytNx5RLBjBmgznkGrqbH";

    async fn client_for(server: &MockServer) -> PlaygroundClient {
        PlaygroundClient::with_config_and_urls(ClientConfig::default(), &server.uri(), &server.uri())
            .expect("client init")
    }

    #[tokio::test]
    async fn test_get_balance() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "jsonrpc": "2.0",
                "method": "getBalance",
                "params": [ADDRESS, { "commitment": "confirmed" }],
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": { "context": { "slot": 1 }, "value": 1_000_000_000u64 },
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let address = WalletAddress::parse(ADDRESS).unwrap();
        let balance = client.get_balance(&address).await.unwrap();

        assert_eq!(balance, Lamports(1_000_000_000));
        assert_eq!(balance.to_string(), "1.000000000 SOL");
    }

    #[tokio::test]
    async fn test_rpc_error_object() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": { "code": -32602, "message": "Invalid param" },
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let address = WalletAddress::parse(ADDRESS).unwrap();
        let err = client.get_balance(&address).await.unwrap_err();

        match err {
            PlaygroundError::Rpc { code, message } => {
                assert_eq!(code, -32602);
                assert_eq!(message, "Invalid param");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_send_transaction_encodes_base64() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "method": "sendTransaction",
                "params": ["AQID", { "encoding": "base64" }],
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "jsonrpc": "2.0",
                "id": 2,
                "result": "5sig",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let signature = client.send_transaction(&[1, 2, 3]).await.unwrap();
        assert_eq!(signature, "5sig");
    }
}
