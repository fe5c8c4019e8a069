//! Miner RPC client: `store`, `retrieve`, `remove`, `validation` over
//! HTTP multipart to `miner.connection`. Any network/HTTP/parse error
//! collapses to `None` at the caller — a failed miner RPC never
//! aborts the surrounding placement/audit operation by itself, it just
//! counts as one failed slot.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use smartdrive_crypto::Signer;
use smartdrive_types::{Address, ConnectionInfo};

const METHOD_PATH: &str = "/method";

pub struct MinerClient {
    client: reqwest::Client,
}

impl Default for MinerClient {
    fn default() -> Self {
        Self::new(Duration::from_secs(smartdrive_types::constants::DEFAULT_RPC_TIMEOUT_SECONDS))
    }
}

impl MinerClient {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .expect("reqwest client builds with static config"),
        }
    }

    fn signed_envelope_headers(signer: &impl Signer, body_bytes: &[u8]) -> Result<(String, String), smartdrive_crypto::CryptoError> {
        let signature_hex = signer.sign_bytes(body_bytes)?;
        Ok((signature_hex, signer.address().to_string()))
    }

    /// Uploads `chunk` to `connection` under `folder`, returning the
    /// assigned `chunk_uuid` on success, `None` on any failure.
    pub async fn store(&self, connection: &ConnectionInfo, signer: &impl Signer, folder: &Address, chunk: Vec<u8>) -> Option<String> {
        let body = serde_json::json!({ "folder": folder.to_string() });
        let body_bytes = smartdrive_types::canonical_json::canonical_bytes_from_value(&body).ok()?;
        let (signature_hex, address) = Self::signed_envelope_headers(signer, &body_bytes).ok()?;

        let form = Form::new()
            .text("folder", folder.to_string())
            .part("chunk", Part::bytes(chunk));

        let resp = self
            .client
            .post(format!("{}{METHOD_PATH}/store", connection.url("http")))
            .header("X-Signature", signature_hex)
            .header("X-Address", address)
            .multipart(form)
            .send()
            .await
            .ok()?
            .error_for_status()
            .ok()?;

        #[derive(serde::Deserialize)]
        struct StoreResponse {
            id: String,
        }
        resp.json::<StoreResponse>().await.ok().map(|r| r.id)
    }

    /// Fetches the full raw bytes of `chunk_uuid` from `folder`.
    pub async fn retrieve(&self, connection: &ConnectionInfo, signer: &impl Signer, folder: &Address, chunk_uuid: &str) -> Option<Vec<u8>> {
        let body = serde_json::json!({ "folder": folder.to_string(), "chunk_uuid": chunk_uuid });
        let body_bytes = smartdrive_types::canonical_json::canonical_bytes_from_value(&body).ok()?;
        let (signature_hex, address) = Self::signed_envelope_headers(signer, &body_bytes).ok()?;

        let form = Form::new().text("folder", folder.to_string()).text("chunk_uuid", chunk_uuid.to_string());

        let resp = self
            .client
            .post(format!("{}{METHOD_PATH}/retrieve", connection.url("http")))
            .header("X-Signature", signature_hex)
            .header("X-Address", address)
            .multipart(form)
            .send()
            .await
            .ok()?
            .error_for_status()
            .ok()?;
        resp.bytes().await.ok().map(|b| b.to_vec())
    }

    /// Requests deletion of `chunk_uuid` at `folder`. `true` iff the miner acked.
    pub async fn remove(&self, connection: &ConnectionInfo, signer: &impl Signer, folder: &Address, chunk_uuid: &str) -> bool {
        let body = serde_json::json!({ "folder": folder.to_string(), "chunk_uuid": chunk_uuid });
        let Ok(body_bytes) = smartdrive_types::canonical_json::canonical_bytes_from_value(&body) else {
            return false;
        };
        let Ok((signature_hex, address)) = Self::signed_envelope_headers(signer, &body_bytes) else {
            return false;
        };

        let form = Form::new().text("folder", folder.to_string()).text("chunk_uuid", chunk_uuid.to_string());

        self.client
            .post(format!("{}{METHOD_PATH}/remove", connection.url("http")))
            .header("X-Signature", signature_hex)
            .header("X-Address", address)
            .multipart(form)
            .send()
            .await
            .ok()
            .and_then(|r| r.error_for_status().ok())
            .is_some()
    }

    /// Requests proof-of-possession bytes over `[start, end)` of `chunk_uuid`.
    pub async fn validation(&self, connection: &ConnectionInfo, signer: &impl Signer, folder: &Address, chunk_uuid: &str, start: u64, end: u64) -> Option<Vec<u8>> {
        let body = serde_json::json!({ "folder": folder.to_string(), "chunk_uuid": chunk_uuid, "start": start, "end": end });
        let body_bytes = smartdrive_types::canonical_json::canonical_bytes_from_value(&body).ok()?;
        let (signature_hex, address) = Self::signed_envelope_headers(signer, &body_bytes).ok()?;

        let form = Form::new()
            .text("folder", folder.to_string())
            .text("chunk_uuid", chunk_uuid.to_string())
            .text("start", start.to_string())
            .text("end", end.to_string());

        let resp = self
            .client
            .post(format!("{}{METHOD_PATH}/validation", connection.url("http")))
            .header("X-Signature", signature_hex)
            .header("X-Address", address)
            .multipart(form)
            .send()
            .await
            .ok()?
            .error_for_status()
            .ok()?;
        resp.bytes().await.ok().map(|b| b.to_vec())
    }
}
