//! Handlers for the four public endpoints: `POST /store`, `GET /retrieve`,
//! `DELETE /remove`, `GET /ping`.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Multipart, Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use smartdrive_types::{Address, Event, Module, ModuleType, PeerMessage, RemoveInputParams, RetrieveInputParams, StoreInputParams};

use super::auth;
use super::error::ApiError;
use crate::node::Node;

#[derive(Deserialize)]
pub struct FileQuery {
    pub file_uuid: String,
}

pub async fn ping_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn store_handler(
    State(node): State<Arc<Node>>,
    headers: axum::http::HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut file_bytes: Option<Vec<u8>> = None;
    while let Some(field) = multipart.next_field().await.map_err(|e| ApiError::BadRequest(e.to_string()))? {
        if field.name() == Some("file") {
            file_bytes = Some(field.bytes().await.map_err(|e| ApiError::BadRequest(e.to_string()))?.to_vec());
        }
    }
    let file_bytes = file_bytes.ok_or_else(|| ApiError::BadRequest("missing multipart field 'file'".into()))?;

    let file_hash = {
        use blake2::{Blake2b512, Digest};
        hex::encode(Blake2b512::digest(&file_bytes))
    };
    let input_params = StoreInputParams { file_hash };
    let signed_bytes = smartdrive_types::canonical_json::canonical_bytes(&input_params).map_err(|e| ApiError::Internal(e.into()))?;
    let (user_address, input_signed_params) = auth::authenticate(&node, &headers, &signed_bytes).await?;

    let miners = node.oracle.get_modules(node.config.netuid, ModuleType::Miner).await?;
    if miners.is_empty() {
        return Err(ApiError::NotFound("no miners available".into()));
    }

    let now_ms = chrono::Utc::now().timestamp_millis();
    let store_event = node
        .placement
        .store_new_file(file_bytes, &miners, &node.validator_key, &user_address, &user_address, input_params, input_signed_params, false, now_ms)
        .await?;

    let file_uuid = store_event.event_params.file_uuid.clone();
    broadcast(&node, Event::Store(store_event))?;

    Ok(Json(serde_json::json!({ "uuid": file_uuid })))
}

pub async fn retrieve_handler(
    State(node): State<Arc<Node>>,
    headers: axum::http::HeaderMap,
    Query(params): Query<FileQuery>,
) -> Result<Response, ApiError> {
    let input_params = RetrieveInputParams { file_uuid: params.file_uuid.clone() };
    let signed_bytes = smartdrive_types::canonical_json::canonical_bytes(&input_params).map_err(|e| ApiError::Internal(e.into()))?;
    let (user_address, _signature) = auth::authenticate(&node, &headers, &signed_bytes).await?;

    let miners_by_address = miner_map(&node).await?;
    let bytes = node
        .placement
        .retrieve(node.persistence.as_ref(), &params.file_uuid, &user_address, &node.validator_key, &miners_by_address)
        .await?;

    Ok(bytes.into_response())
}

pub async fn remove_handler(
    State(node): State<Arc<Node>>,
    headers: axum::http::HeaderMap,
    Query(params): Query<FileQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let input_params = RemoveInputParams { file_uuid: params.file_uuid.clone() };
    let signed_bytes = smartdrive_types::canonical_json::canonical_bytes(&input_params).map_err(|e| ApiError::Internal(e.into()))?;
    let (user_address, input_signed_params) = auth::authenticate(&node, &headers, &signed_bytes).await?;

    let miners_by_address = miner_map(&node).await?;
    let now_unix_secs = chrono::Utc::now().timestamp();
    let remove_event = node
        .placement
        .remove(
            node.persistence.as_ref(),
            &params.file_uuid,
            &user_address,
            &node.validator_key,
            &user_address,
            input_signed_params,
            &miners_by_address,
            now_unix_secs,
        )
        .await?;

    broadcast(&node, Event::Remove(remove_event))?;

    Ok(Json(serde_json::json!({ "ack": true })))
}

async fn miner_map(node: &Node) -> Result<HashMap<Address, Module>, ApiError> {
    let miners = node.oracle.get_modules(node.config.netuid, ModuleType::Miner).await?;
    Ok(miners.into_iter().map(|m| (m.address.clone(), m)).collect())
}

/// Inserts `event` into the mempool and gossips it to every connected peer.
/// `/remove` relies on this to return before block inclusion.
fn broadcast(node: &Node, event: Event) -> Result<(), ApiError> {
    node.mempool.add(event.clone());
    let frame = smartdrive_net::encode_frame(&node.validator_key, PeerMessage::Event { event_action: event.action(), event })
        .map_err(|e| ApiError::Internal(e.into()))?;
    node.pool.broadcast(&frame);
    Ok(())
}
