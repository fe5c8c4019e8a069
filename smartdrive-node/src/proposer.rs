//! Proposer election: deterministic and local — every validator computes
//! the same proposer from the same oracle snapshot.

use smartdrive_types::constants::TRUTHFUL_STAKE_AMOUNT;
use smartdrive_types::Address;

/// One validator's address and stake, as seen by the electorate.
pub struct Candidate {
    pub address: Address,
    pub stake: u64,
}

/// `argmax(stake)` over truthful validators (falling back to the full set if
/// none qualify), ties broken by lexicographically smallest address.
pub fn elect_proposer(candidates: &[Candidate]) -> Address {
    let truthful: Vec<&Candidate> = candidates.iter().filter(|c| c.stake >= TRUTHFUL_STAKE_AMOUNT).collect();
    let pool: Vec<&Candidate> = if truthful.is_empty() { candidates.iter().collect() } else { truthful };

    pool.into_iter()
        .max_by(|a, b| a.stake.cmp(&b.stake).then_with(|| b.address.cmp(&a.address)))
        .map(|c| c.address.clone())
        .expect("candidates is never empty: self is always included")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_highest_stake() {
        let candidates = vec![
            Candidate { address: Address::new("a"), stake: 10 * TRUTHFUL_STAKE_AMOUNT },
            Candidate { address: Address::new("b"), stake: 20 * TRUTHFUL_STAKE_AMOUNT },
        ];
        assert_eq!(elect_proposer(&candidates), Address::new("b"));
    }

    #[test]
    fn breaks_ties_with_lexicographically_smallest_address() {
        let candidates = vec![
            Candidate { address: Address::new("zeta"), stake: 100 * TRUTHFUL_STAKE_AMOUNT },
            Candidate { address: Address::new("alpha"), stake: 100 * TRUTHFUL_STAKE_AMOUNT },
        ];
        assert_eq!(elect_proposer(&candidates), Address::new("alpha"));
    }

    #[test]
    fn falls_back_to_full_set_when_no_one_is_truthful() {
        let candidates = vec![
            Candidate { address: Address::new("low-b"), stake: 5 },
            Candidate { address: Address::new("low-a"), stake: 9 },
        ];
        assert_eq!(elect_proposer(&candidates), Address::new("low-a"));
    }
}
