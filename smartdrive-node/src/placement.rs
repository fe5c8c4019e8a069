//! Placement / redundancy engine: shards a file, replicates it across
//! miners, rolls back on partial failure, and produces the events that
//! record the outcome. Also hosts the sibling retrieve/remove operations,
//! which share the same miner fan-out machinery.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use rand::seq::SliceRandom;
use rand::Rng;

use smartdrive_chain::MinerClient;
use smartdrive_crypto::Keypair;
use smartdrive_store::Persistence;
use smartdrive_types::constants::{
    DEFAULT_FILE_VALIDITY_SECONDS, MAX_ENCODED_RANGE, MAX_MINERS_FOR_FILE, MIN_MINERS_FOR_FILE,
    MIN_REPLICATION_FOR_FILE,
};
use smartdrive_types::{
    Address, ChunkEvent, Module, RemoveEvent, RemoveInputParams, RemoveParams, StoreEvent,
    StoreInputParams, StoreParams,
};

use crate::error::NodeError;

pub struct PlacementEngine {
    miner_client: Arc<MinerClient>,
}

impl PlacementEngine {
    pub fn new(miner_client: Arc<MinerClient>) -> Self {
        Self { miner_client }
    }

    /// `folder` is the value every miner RPC
    /// receives as its storage namespace — the user's address in normal
    /// mode, same as the calling validator's address when a probe seeds
    /// itself (`validating=true`).
    #[allow(clippy::too_many_arguments)]
    pub async fn store_new_file(
        &self,
        file_bytes: Vec<u8>,
        miners: &[Module],
        validator_key: &Keypair,
        folder: &Address,
        user_address: &Address,
        input_params: StoreInputParams,
        input_signed_params: String,
        validating: bool,
        now_ms: i64,
    ) -> Result<StoreEvent, NodeError> {
        if !validating && miners.len() < MIN_MINERS_FOR_FILE {
            return Err(NodeError::TooFewMiners { min: MIN_MINERS_FOR_FILE, got: miners.len() });
        }

        let miners_by_address: HashMap<Address, Module> =
            miners.iter().map(|m| (m.address.clone(), m.clone())).collect();

        let shards: Vec<Vec<u8>> = if validating {
            vec![file_bytes]
        } else {
            let num_chunks = miners.len().min(MAX_MINERS_FOR_FILE);
            split_into_shards(&file_bytes, num_chunks)
        };

        let mut all_processes = Vec::new();
        let mut all_chunks = Vec::new();
        let mut placed: Vec<(Address, String)> = Vec::new();
        let mut unmet: Option<(u32, usize, usize)> = None;

        for (index, shard) in shards.iter().enumerate() {
            let (processes, chunks, met) = if validating {
                self.fan_out_all(shard, miners, folder, validator_key).await
            } else {
                self.replicate_shard(shard, index as u32, miners, MIN_REPLICATION_FOR_FILE, folder, validator_key).await
            };

            for p in &processes {
                if p.succeed {
                    placed.push((p.miner_address.clone(), p.chunk_uuid.clone().expect("succeed implies chunk_uuid")));
                }
            }
            let got = processes.iter().filter(|p| p.succeed).count();
            all_processes.extend(processes);
            all_chunks.extend(chunks);

            if !met {
                let need = if validating { 1 } else { MIN_REPLICATION_FOR_FILE };
                unmet = Some((index as u32, got, need));
                break;
            }
        }

        if let Some((chunk_index, got, need)) = unmet {
            self.rollback(&placed, folder, validator_key, &miners_by_address).await;
            return Err(NodeError::ReplicationQuotaUnmet { chunk_index, got, need });
        }

        let file_uuid = smartdrive_types::ids::make_ref(now_ms / 1000);
        let params = StoreParams {
            file_uuid,
            miners_processes: all_processes,
            created_at: validating.then_some(now_ms),
            expiration_ms: validating.then_some(now_ms + DEFAULT_FILE_VALIDITY_SECONDS * 1000),
            chunks: all_chunks,
        };
        let event_signed_params = smartdrive_crypto::sign_value(validator_key, &params)?;

        Ok(StoreEvent {
            uuid: smartdrive_types::ids::make_ref(now_ms / 1000),
            validator_address: validator_key.address().clone(),
            event_params: params,
            event_signed_params,
            user_address: user_address.clone(),
            input_params,
            input_signed_params,
        })
    }

    /// Reassembles a stored file from its chunk index, trying every replica
    /// of a given index until one responds.
    pub async fn retrieve(
        &self,
        persistence: &dyn Persistence,
        file_uuid: &str,
        folder: &Address,
        signer: &Keypair,
        miners_by_address: &HashMap<Address, Module>,
    ) -> Result<Vec<u8>, NodeError> {
        let chunks = persistence.get_chunks_for_file(file_uuid)?;
        if chunks.is_empty() {
            return Err(NodeError::UnknownFile(file_uuid.to_string()));
        }

        let mut by_index: HashMap<u32, Vec<_>> = HashMap::new();
        for chunk in &chunks {
            by_index.entry(chunk.chunk_index).or_default().push(chunk);
        }
        let mut indices: Vec<u32> = by_index.keys().copied().collect();
        indices.sort_unstable();

        let mut assembled = Vec::new();
        for index in indices {
            let replicas = &by_index[&index];
            let mut recovered = None;
            for replica in replicas {
                let Some(module) = miners_by_address.get(&replica.miner_address) else { continue };
                if let Some(bytes) = self.miner_client.retrieve(&module.connection, signer, folder, &replica.chunk_uuid).await {
                    recovered = Some(bytes);
                    break;
                }
            }
            match recovered {
                Some(bytes) => assembled.extend(bytes),
                None => return Err(NodeError::NoSurvivingReplica(index)),
            }
        }
        Ok(assembled)
    }

    /// Fires `remove` at every replica of `file_uuid` in parallel and
    /// returns the resulting event. Deleting the persisted records
    /// themselves happens later, at block-apply time, regardless of these
    /// RPC outcomes: the chain of custody is the ledger, not the miners'
    /// acks.
    #[allow(clippy::too_many_arguments)]
    pub async fn remove(
        &self,
        persistence: &dyn Persistence,
        file_uuid: &str,
        folder: &Address,
        validator_key: &Keypair,
        user_address: &Address,
        input_signed_params: String,
        miners_by_address: &HashMap<Address, Module>,
        now_unix_secs: i64,
    ) -> Result<RemoveEvent, NodeError> {
        let chunks = persistence.get_chunks_for_file(file_uuid)?;

        let futs = chunks.iter().map(|chunk| async move {
            let start = Instant::now();
            let ok = match miners_by_address.get(&chunk.miner_address) {
                Some(module) => self.miner_client.remove(&module.connection, validator_key, folder, &chunk.chunk_uuid).await,
                None => false,
            };
            smartdrive_types::MinerProcess {
                chunk_uuid: Some(chunk.chunk_uuid.clone()),
                miner_address: chunk.miner_address.clone(),
                succeed: ok,
                processing_time: start.elapsed().as_secs_f64(),
            }
        });
        let miners_processes = futures::future::join_all(futs).await;

        let params = RemoveParams { file_uuid: file_uuid.to_string(), miners_processes };
        let event_signed_params = smartdrive_crypto::sign_value(validator_key, &params)?;
        Ok(RemoveEvent {
            uuid: smartdrive_types::ids::make_ref(now_unix_secs),
            validator_address: validator_key.address().clone(),
            event_params: params,
            event_signed_params,
            user_address: user_address.clone(),
            input_params: RemoveInputParams { file_uuid: file_uuid.to_string() },
            input_signed_params,
        })
    }

    async fn replicate_shard(
        &self,
        shard: &[u8],
        chunk_index: u32,
        candidates: &[Module],
        quota: usize,
        folder: &Address,
        signer: &Keypair,
    ) -> (Vec<smartdrive_types::MinerProcess>, Vec<ChunkEvent>, bool) {
        let mut shuffled: Vec<Module> = candidates.to_vec();
        shuffled.shuffle(&mut rand::thread_rng());

        let mut cursor = 0;
        let mut processes = Vec::new();
        let mut chunks = Vec::new();
        let mut success_count = 0;

        while success_count < quota && cursor < shuffled.len() {
            let need = quota - success_count;
            let batch: Vec<&Module> = shuffled[cursor..].iter().take(need).collect();
            cursor += batch.len();

            let results = futures::future::join_all(
                batch.iter().map(|miner| self.try_store(miner, folder, signer, shard.to_vec())),
            )
            .await;

            for (miner, (chunk_uuid, elapsed)) in batch.iter().zip(results) {
                match chunk_uuid {
                    Some(id) => {
                        success_count += 1;
                        let (start, end, encoded) = sample_audit_window(shard);
                        chunks.push(ChunkEvent { uuid: id.clone(), chunk_index, sub_chunk_start: start, sub_chunk_end: end, sub_chunk_encoded: encoded });
                        processes.push(smartdrive_types::MinerProcess { chunk_uuid: Some(id), miner_address: miner.address.clone(), succeed: true, processing_time: elapsed });
                    }
                    None => {
                        processes.push(smartdrive_types::MinerProcess { chunk_uuid: None, miner_address: miner.address.clone(), succeed: false, processing_time: elapsed });
                    }
                }
            }
        }

        (processes, chunks, success_count >= quota)
    }

    async fn fan_out_all(
        &self,
        shard: &[u8],
        candidates: &[Module],
        folder: &Address,
        signer: &Keypair,
    ) -> (Vec<smartdrive_types::MinerProcess>, Vec<ChunkEvent>, bool) {
        let results = futures::future::join_all(
            candidates.iter().map(|miner| self.try_store(miner, folder, signer, shard.to_vec())),
        )
        .await;

        let mut processes = Vec::new();
        let mut chunks = Vec::new();
        let mut success_count = 0;
        for (miner, (chunk_uuid, elapsed)) in candidates.iter().zip(results) {
            match chunk_uuid {
                Some(id) => {
                    success_count += 1;
                    let (start, end, encoded) = sample_audit_window(shard);
                    chunks.push(ChunkEvent { uuid: id.clone(), chunk_index: 0, sub_chunk_start: start, sub_chunk_end: end, sub_chunk_encoded: encoded });
                    processes.push(smartdrive_types::MinerProcess { chunk_uuid: Some(id), miner_address: miner.address.clone(), succeed: true, processing_time: elapsed });
                }
                None => {
                    processes.push(smartdrive_types::MinerProcess { chunk_uuid: None, miner_address: miner.address.clone(), succeed: false, processing_time: elapsed });
                }
            }
        }
        (processes, chunks, success_count >= 1)
    }

    async fn try_store(&self, miner: &Module, folder: &Address, signer: &Keypair, bytes: Vec<u8>) -> (Option<String>, f64) {
        let start = Instant::now();
        let result = self.miner_client.store(&miner.connection, signer, folder, bytes).await;
        (result, start.elapsed().as_secs_f64())
    }

    async fn rollback(&self, placed: &[(Address, String)], folder: &Address, signer: &Keypair, miners_by_address: &HashMap<Address, Module>) {
        let futs = placed.iter().filter_map(|(address, chunk_uuid)| {
            miners_by_address.get(address).map(|module| async move {
                self.miner_client.remove(&module.connection, signer, folder, chunk_uuid).await;
            })
        });
        futures::future::join_all(futs).await;
    }
}

fn split_into_shards(bytes: &[u8], num_chunks: usize) -> Vec<Vec<u8>> {
    let shard_len = bytes.len() / num_chunks;
    let mut shards = Vec::with_capacity(num_chunks);
    let mut offset = 0;
    for i in 0..num_chunks {
        let end = if i == num_chunks - 1 { bytes.len() } else { offset + shard_len };
        shards.push(bytes[offset..end].to_vec());
        offset = end;
    }
    shards
}

fn sample_audit_window(shard: &[u8]) -> (u64, u64, String) {
    let len = shard.len();
    let max_start = len.saturating_sub(MAX_ENCODED_RANGE);
    let start = if max_start == 0 { 0 } else { rand::thread_rng().gen_range(0..=max_start) };
    let end = (start + MAX_ENCODED_RANGE).min(len);
    (start as u64, end as u64, hex::encode(&shard[start..end]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_with_remainder_on_last_shard() {
        let shards = split_into_shards(&[0u8; 100], 4);
        assert_eq!(shards.iter().map(|s| s.len()).collect::<Vec<_>>(), vec![25, 25, 25, 25]);

        let shards = split_into_shards(&[0u8; 101], 4);
        assert_eq!(shards.iter().map(|s| s.len()).collect::<Vec<_>>(), vec![25, 25, 25, 26]);
    }

    #[test]
    fn audit_window_never_exceeds_max_range() {
        let shard = vec![0u8; 200];
        let (start, end, encoded) = sample_audit_window(&shard);
        assert!(end - start <= MAX_ENCODED_RANGE as u64);
        assert_eq!(encoded.len(), ((end - start) * 2) as usize);
    }

    #[test]
    fn audit_window_on_short_shard_never_exceeds_len() {
        let shard = vec![0u8; 10];
        let (start, end, _) = sample_audit_window(&shard);
        assert_eq!(start, 0);
        assert_eq!(end, 10);
    }
}
