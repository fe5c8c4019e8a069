//! Validation engine: probes due audits, synthesizes fresh ones against
//! miners with remaining capacity, scores every miner over the window, and
//! surfaces expired files for cleanup. Runs once per call; the binary is
//! responsible for the `VALIDATION_VOTE_INTERVAL_SECONDS` cadence.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use rand::RngCore;

use smartdrive_chain::{ChainOracle, MinerClient};
use smartdrive_crypto::Keypair;
use smartdrive_store::Persistence;
use smartdrive_types::constants::calculate_storage_capacity;
use smartdrive_types::{Address, ChunkRecord, Module, ModuleType, StoreInputParams, StoreEvent, ValidateEvent, ValidateParams};

use crate::error::NodeError;
use crate::placement::PlacementEngine;

const PROBE_BATCH_LIMIT: usize = 50;
const SYNTHETIC_PROBE_BLOB_BYTES: usize = 256;

#[derive(Default, Clone)]
struct ScoreAccumulator {
    attempts: u32,
    successes: u32,
    total_latency_secs: f64,
}

pub struct ValidationOutcome {
    /// Non-negative integer score per miner, ready for `set_weights`.
    pub scores: HashMap<Address, u64>,
    pub expired_file_uuids: Vec<String>,
}

pub struct ValidationEngine {
    persistence: Arc<dyn Persistence>,
    oracle: Arc<dyn ChainOracle>,
    miner_client: Arc<MinerClient>,
    placement: Arc<PlacementEngine>,
}

impl ValidationEngine {
    pub fn new(
        persistence: Arc<dyn Persistence>,
        oracle: Arc<dyn ChainOracle>,
        miner_client: Arc<MinerClient>,
        placement: Arc<PlacementEngine>,
    ) -> Self {
        Self { persistence, oracle, miner_client, placement }
    }

    pub async fn run_once(&self, self_address: &Address, validator_key: &Keypair, netuid: u16, now_ms: i64) -> Result<ValidationOutcome, NodeError> {
        let miners: Vec<Module> = self
            .oracle
            .get_modules(netuid, ModuleType::Miner)
            .await?
            .into_iter()
            .filter(|m| &m.address != self_address)
            .collect();
        let miners_by_address: HashMap<Address, Module> = miners.iter().map(|m| (m.address.clone(), m.clone())).collect();

        let mut scores: HashMap<Address, ScoreAccumulator> =
            miners.iter().map(|m| (m.address.clone(), ScoreAccumulator::default())).collect();

        self.probe_due_validations(validator_key.address(), validator_key, &miners_by_address, now_ms, &mut scores).await?;
        self.synthesize_fresh_audits(&miners, validator_key, now_ms).await;

        let expired_file_uuids = self.persistence.expired_files(now_ms)?;

        let score_map = scores
            .into_iter()
            .map(|(address, acc)| {
                let miner = miners_by_address.get(&address);
                let stored_bytes = self.stored_bytes_for(&address)?;
                let score = score_miner(&acc, miner, stored_bytes);
                Ok((address, score))
            })
            .collect::<Result<_, NodeError>>()?;

        Ok(ValidationOutcome { scores: score_map, expired_file_uuids })
    }

    /// Sums the audit-window extent of every `ChunkRecord` a miner
    /// currently holds, the stored-bytes numerator `score_miner`'s
    /// utilization term divides by capacity.
    fn stored_bytes_for(&self, miner_address: &Address) -> Result<u64, NodeError> {
        Ok(self
            .persistence
            .get_chunks_for_miner(miner_address)?
            .iter()
            .map(|c| c.sub_chunk_end - c.sub_chunk_start)
            .sum())
    }

    async fn probe_due_validations(
        &self,
        _folder: &Address,
        validator_key: &Keypair,
        miners_by_address: &HashMap<Address, Module>,
        now_ms: i64,
        scores: &mut HashMap<Address, ScoreAccumulator>,
    ) -> Result<(), NodeError> {
        let due = self.persistence.pop_due_validations(now_ms, PROBE_BATCH_LIMIT)?;
        for probe in due {
            let Some(module) = miners_by_address.get(&probe.miner_address) else { continue };
            let start = Instant::now();
            let returned = self
                .miner_client
                .validation(&module.connection, validator_key, validator_key.address(), &probe.chunk_uuid, probe.sub_chunk_start, probe.sub_chunk_end)
                .await;
            let elapsed = start.elapsed().as_secs_f64();

            let expected = hex::decode(&probe.sub_chunk_encoded).unwrap_or_default();
            let ok = returned.as_deref() == Some(expected.as_slice());

            let acc = scores.entry(probe.miner_address.clone()).or_default();
            acc.attempts += 1;
            acc.total_latency_secs += elapsed;
            if ok {
                acc.successes += 1;
            }
        }
        Ok(())
    }

    /// Uploads a small random blob to every miner with remaining storage
    /// capacity, converting each successful placement into a fresh pending
    /// audit. These synthetic probes are validator-local bookkeeping, never
    /// user data, so they bypass the event mempool/block pipeline entirely:
    /// their `ChunkRecord`s are registered directly so a probe can be
    /// scheduled against them on the next validation round.
    async fn synthesize_fresh_audits(&self, miners: &[Module], validator_key: &Keypair, now_ms: i64) {
        for miner in miners {
            if calculate_storage_capacity(miner.stake_comai()) == 0 {
                continue;
            }

            let mut blob = vec![0u8; SYNTHETIC_PROBE_BLOB_BYTES];
            rand::thread_rng().fill_bytes(&mut blob);
            let file_hash = {
                use blake2::{Blake2b512, Digest};
                hex::encode(Blake2b512::digest(&blob))
            };

            let result = self
                .placement
                .store_new_file(
                    blob,
                    std::slice::from_ref(miner),
                    validator_key,
                    validator_key.address(),
                    validator_key.address(),
                    StoreInputParams { file_hash },
                    String::new(),
                    true,
                    now_ms,
                )
                .await;

            let Ok(store_event) = result else { continue };
            if let Err(err) = self.register_synthetic_audit(&store_event, validator_key) {
                tracing::warn!(miner = %miner.address, error = %err, "failed to register synthetic audit");
            }
        }
    }

    fn register_synthetic_audit(&self, store_event: &StoreEvent, validator_key: &Keypair) -> Result<(), NodeError> {
        let records: Vec<ChunkRecord> = store_event
            .event_params
            .miners_processes
            .iter()
            .filter(|p| p.succeed)
            .filter_map(|p| {
                let chunk_uuid = p.chunk_uuid.clone()?;
                let chunk_event = store_event.event_params.chunks.iter().find(|c| c.uuid == chunk_uuid)?;
                Some(ChunkRecord {
                    chunk_uuid,
                    file_uuid: store_event.event_params.file_uuid.clone(),
                    chunk_index: chunk_event.chunk_index,
                    miner_address: p.miner_address.clone(),
                    sub_chunk_start: chunk_event.sub_chunk_start,
                    sub_chunk_end: chunk_event.sub_chunk_end,
                    sub_chunk_encoded: chunk_event.sub_chunk_encoded.clone(),
                })
            })
            .collect();
        if records.is_empty() {
            return Ok(());
        }
        self.persistence.insert_chunk_records(records)?;

        let params = ValidateParams {
            file_uuid: store_event.event_params.file_uuid.clone(),
            miners_processes: store_event.event_params.miners_processes.clone(),
        };
        let event_signed_params = smartdrive_crypto::sign_value(validator_key, &params)?;
        let validate_event = ValidateEvent {
            uuid: smartdrive_types::ids::make_ref(chrono_now_secs()),
            validator_address: validator_key.address().clone(),
            event_params: params,
            event_signed_params,
        };
        self.persistence.insert_validation_events(std::slice::from_ref(&validate_event))?;
        Ok(())
    }
}

fn chrono_now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Folds success rate, mean latency, and utilization into a single
/// non-negative integer score. The relative weighting is a tunable policy;
/// only the inputs are fixed. `stored_bytes` is the miner's actual holdings
/// (summed audit-window extent across its persisted `ChunkRecord`s, the
/// only per-byte signal this engine keeps), never derived from stake.
fn score_miner(acc: &ScoreAccumulator, miner: Option<&Module>, stored_bytes: u64) -> u64 {
    if acc.successes == 0 {
        return 0;
    }
    let success_rate = acc.successes as f64 / acc.attempts.max(1) as f64;
    let mean_latency = acc.total_latency_secs / acc.successes as f64;
    let latency_factor = 1.0 / (1.0 + mean_latency);
    let utilization = miner
        .map(|m| {
            let capacity = calculate_storage_capacity(m.stake_comai());
            if capacity == 0 {
                0.0
            } else {
                (stored_bytes as f64 / capacity as f64).min(1.0)
            }
        })
        .unwrap_or(0.0);

    let weighted = success_rate * 700.0 + latency_factor * 200.0 + utilization * 100.0;
    weighted.round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_successes_scores_zero() {
        let acc = ScoreAccumulator { attempts: 3, successes: 0, total_latency_secs: 1.0 };
        assert_eq!(score_miner(&acc, None, 0), 0);
    }

    #[test]
    fn perfect_run_scores_near_max() {
        let acc = ScoreAccumulator { attempts: 1, successes: 1, total_latency_secs: 0.0 };
        let score = score_miner(&acc, None, 0);
        assert!(score >= 700);
    }

    #[test]
    fn utilization_reflects_stored_bytes_not_stake_alone() {
        let acc = ScoreAccumulator { attempts: 1, successes: 1, total_latency_secs: 0.0 };
        let miner = Module {
            address: Address::new("m"),
            connection: smartdrive_types::ConnectionInfo { ip: "127.0.0.1".into(), port: 9000 },
            stake: 10_000 * smartdrive_types::constants::NANO_PER_COMAI,
            module_type: ModuleType::Miner,
        };
        let idle = score_miner(&acc, Some(&miner), 0);
        let full = score_miner(&acc, Some(&miner), calculate_storage_capacity(miner.stake_comai()));
        assert!(full > idle);
    }
}
