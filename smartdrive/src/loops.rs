//! The two wall-clock loops, driven purely by cadence: block production
//! every `BLOCK_INTERVAL_SECONDS`, validation every
//! `VALIDATION_VOTE_INTERVAL_SECONDS`. Each tick is one call into the
//! corresponding engine; this module owns only the timer and the plumbing
//! around it (fetching the current validator/miner sets, broadcasting the
//! resulting events).

use std::collections::HashMap;
use std::sync::Arc;

use smartdrive_node::Candidate;
use smartdrive_types::constants::{BLOCK_INTERVAL_SECONDS, VALIDATION_VOTE_INTERVAL_SECONDS};
use smartdrive_types::{Address, Event, Module, ModuleType, PeerMessage, RemoveInputParams};

use crate::node::Node;

pub async fn block_loop(node: Arc<Node>) {
    let mut ticker = tokio::time::interval(std::time::Duration::from_secs(BLOCK_INTERVAL_SECONDS));
    loop {
        ticker.tick().await;
        if let Err(err) = run_block_round(&node).await {
            tracing::warn!(error = %err, "block round failed");
        }
    }
}

async fn run_block_round(node: &Node) -> anyhow::Result<()> {
    let self_address = node.validator_key.address().clone();
    let validators = node.oracle.get_modules(node.config.netuid, ModuleType::Validator).await?;

    let self_stake = validators.iter().find(|m| m.address == self_address).map(|m| m.stake).unwrap_or(0);
    let candidates: Vec<Candidate> = validators
        .into_iter()
        .filter(|m| m.address != self_address)
        .map(|m| Candidate { address: m.address, stake: m.stake })
        .collect();

    if let Some(block) = node.producer.try_produce_round(self_stake, &candidates, &node.validator_key).await? {
        tracing::info!(block_number = block.block_number, events = block.events.len(), "produced block");
    }
    Ok(())
}

pub async fn validation_loop(node: Arc<Node>) {
    let mut ticker = tokio::time::interval(std::time::Duration::from_secs(VALIDATION_VOTE_INTERVAL_SECONDS));
    loop {
        ticker.tick().await;
        if let Err(err) = run_validation_round(&node).await {
            tracing::warn!(error = %err, "validation round failed");
        }
    }
}

async fn run_validation_round(node: &Node) -> anyhow::Result<()> {
    let now_ms = chrono::Utc::now().timestamp_millis();
    let outcome = node
        .validation
        .run_once(node.validator_key.address(), &node.validator_key, node.config.netuid, now_ms)
        .await?;

    tracing::info!(scored_miners = outcome.scores.len(), expired = outcome.expired_file_uuids.len(), "validation round complete");

    if !outcome.expired_file_uuids.is_empty() {
        let miners = node.oracle.get_modules(node.config.netuid, ModuleType::Miner).await?;
        let miners_by_address: HashMap<Address, Module> = miners.into_iter().map(|m| (m.address.clone(), m)).collect();
        for file_uuid in &outcome.expired_file_uuids {
            if let Err(err) = emit_expiration_remove(node, file_uuid, &miners_by_address, now_ms / 1000).await {
                tracing::warn!(file_uuid = %file_uuid, error = %err, "failed to emit expiration remove");
            }
        }
    }

    if node.persistence.last_block_number() > 0 {
        node.oracle.set_weights(outcome.scores, node.config.netuid).await?;
    }

    Ok(())
}

/// A file past `expiration_ms` is removed the same way a user-requested
/// removal is: a `RemoveEvent` routed through the mempool/block pipeline.
/// Since no user initiated this one, the validator self-signs both the
/// `validator_address` and `user_address` roles; no other actor is a
/// candidate for the `user_address` side of an expiration sweep.
async fn emit_expiration_remove(
    node: &Node,
    file_uuid: &str,
    miners_by_address: &HashMap<Address, Module>,
    now_unix_secs: i64,
) -> anyhow::Result<()> {
    let self_address = node.validator_key.address();
    let input_params = RemoveInputParams { file_uuid: file_uuid.to_string() };
    let input_signed_params = smartdrive_crypto::sign_value(&node.validator_key, &input_params)?;

    let remove_event = node
        .placement
        .remove(
            node.persistence.as_ref(),
            file_uuid,
            self_address,
            &node.validator_key,
            self_address,
            input_signed_params,
            miners_by_address,
            now_unix_secs,
        )
        .await?;

    let event = Event::Remove(remove_event);
    node.mempool.add(event.clone());

    let frame = smartdrive_net::encode_frame(&node.validator_key, PeerMessage::Event { event_action: event.action(), event })?;
    node.pool.broadcast(&frame);

    Ok(())
}
