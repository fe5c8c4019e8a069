//! Protocol-wide tunables shared by every crate in the workspace.

/// Minimum number of miners a store request needs to even attempt sharding.
pub const MIN_MINERS_FOR_FILE: usize = 2;

/// Number of distinct miners that must successfully hold each shard.
pub const MIN_REPLICATION_FOR_FILE: usize = 2;

/// A file is never split into more shards than this, regardless of how many
/// miners are available.
pub const MAX_MINERS_FOR_FILE: usize = 100;

/// Maximum width, in bytes, of an audit window captured over a shard.
pub const MAX_ENCODED_RANGE: usize = 50;

/// Hard ceiling on events sealed into a single block.
pub const MAX_EVENTS_PER_BLOCK: usize = 25;

/// Block production cadence.
pub const BLOCK_INTERVAL_SECONDS: u64 = 30;

/// Audit loop cadence.
pub const VALIDATION_VOTE_INTERVAL_SECONDS: u64 = 120;

/// Peer liveness ping cadence.
pub const PING_INTERVAL_SECONDS: u64 = 5;

/// A peer that hasn't ponged in this long is evicted from the active set.
pub const INACTIVITY_TIMEOUT_SECONDS: u64 = 30;

/// Minimum aggregate stake-to-validators required to use the authenticated API.
/// Expressed in COMAI (after de-nanofication).
pub const MINIMUM_STAKE_COMAI: u64 = 1;

/// 1 COMAI in base units.
pub const NANO_PER_COMAI: u64 = 1_000_000_000;

/// Stake, in base units, above which a validator is eligible to propose.
/// Not pinned by any external source; see DESIGN.md for the rationale
/// behind this value.
pub const TRUTHFUL_STAKE_AMOUNT: u64 = 1_000 * NANO_PER_COMAI;

/// Storage capacity model: the bytes a miner is granted as a function of its stake.
pub const INITIAL_STORAGE_BYTES: u64 = 50 * 1024 * 1024;
pub const MAXIMUM_STORAGE_BYTES: u64 = 2 * 1024 * 1024 * 1024;
pub const ADDITIONAL_STORAGE_PER_COMAI_BYTES: f64 = 0.1 * 1024.0 * 1024.0;

/// Default file expiration window, applied when a store's `validating` flag
/// requests one.
pub const DEFAULT_FILE_VALIDITY_SECONDS: i64 = 60 * 60 * 24 * 30;

/// Default per-RPC timeout, miners and peers alike unless overridden.
pub const DEFAULT_RPC_TIMEOUT_SECONDS: u64 = 60;

/// Default HTTP port for the public API.
pub const DEFAULT_PORT: u16 = 8001;

/// Computes the storage capacity granted to a miner for a given stake
/// (in COMAI, after de-nanofication).
pub fn calculate_storage_capacity(stake_comai: f64) -> u64 {
    if stake_comai < MINIMUM_STAKE_COMAI as f64 {
        return 0;
    }
    let mut total = INITIAL_STORAGE_BYTES as f64;
    let additional = stake_comai - MINIMUM_STAKE_COMAI as f64;
    if additional > 0.0 {
        total += additional * ADDITIONAL_STORAGE_PER_COMAI_BYTES;
    }
    total.min(MAXIMUM_STORAGE_BYTES as f64) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_floors_at_zero_below_minimum_stake() {
        assert_eq!(calculate_storage_capacity(0.5), 0);
    }

    #[test]
    fn capacity_at_minimum_stake_is_initial_allotment() {
        assert_eq!(calculate_storage_capacity(1.0), INITIAL_STORAGE_BYTES);
    }

    #[test]
    fn capacity_grows_linearly_with_stake() {
        let got = calculate_storage_capacity(101.0);
        let want = INITIAL_STORAGE_BYTES + (100.0 * ADDITIONAL_STORAGE_PER_COMAI_BYTES) as u64;
        assert_eq!(got, want);
    }

    #[test]
    fn capacity_is_capped() {
        let got = calculate_storage_capacity(1_000_000_000.0);
        assert_eq!(got, MAXIMUM_STORAGE_BYTES);
    }
}
