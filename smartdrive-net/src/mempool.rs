//! The mempool: a deduplicated, insertion-ordered bag of pending
//! events shared across the block producer and peer-ingest workers. A
//! single lock, short critical sections.

use std::collections::HashSet;

use parking_lot::Mutex;
use smartdrive_types::Event;

#[derive(Default)]
struct State {
    order: Vec<Event>,
    seen: HashSet<String>,
}

pub struct Mempool {
    state: Mutex<State>,
}

impl Default for Mempool {
    fn default() -> Self {
        Self::new()
    }
}

impl Mempool {
    pub fn new() -> Self {
        Self { state: Mutex::new(State::default()) }
    }

    /// Inserts `event`, idempotent by uuid: inserting the same event twice
    /// yields one entry.
    pub fn add(&self, event: Event) {
        let mut state = self.state.lock();
        if state.seen.insert(event.uuid().to_string()) {
            state.order.push(event);
        }
    }

    /// Removes and returns up to `n` events, oldest-first. A drain is atomic
    /// with respect to concurrent inserts.
    pub fn drain(&self, n: usize) -> Vec<Event> {
        let mut state = self.state.lock();
        let take = n.min(state.order.len());
        let drained: Vec<Event> = state.order.drain(0..take).collect();
        for event in &drained {
            state.seen.remove(event.uuid());
        }
        drained
    }

    /// Puts previously-drained `events` back at the front, oldest-first,
    /// so a block that failed to persist after draining doesn't lose them.
    pub fn requeue(&self, events: Vec<Event>) {
        let mut state = self.state.lock();
        for event in events.into_iter().rev() {
            if state.seen.insert(event.uuid().to_string()) {
                state.order.insert(0, event);
            }
        }
    }

    pub fn remove_by_uuids(&self, uuids: &HashSet<String>) {
        let mut state = self.state.lock();
        state.order.retain(|e| !uuids.contains(e.uuid()));
        state.seen.retain(|u| !uuids.contains(u));
    }

    pub fn len(&self) -> usize {
        self.state.lock().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartdrive_types::{Address, RemoveEvent, RemoveInputParams, RemoveParams};

    fn event(uuid: &str) -> Event {
        Event::Remove(RemoveEvent {
            uuid: uuid.to_string(),
            validator_address: Address::new("v"),
            event_params: RemoveParams { file_uuid: "f".into(), miners_processes: vec![] },
            event_signed_params: "s".into(),
            user_address: Address::new("u"),
            input_params: RemoveInputParams { file_uuid: "f".into() },
            input_signed_params: "s2".into(),
        })
    }

    #[test]
    fn add_is_idempotent_by_uuid() {
        let pool = Mempool::new();
        pool.add(event("1"));
        pool.add(event("1"));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn drain_removes_oldest_first_up_to_n() {
        let pool = Mempool::new();
        pool.add(event("1"));
        pool.add(event("2"));
        pool.add(event("3"));
        let drained = pool.drain(2);
        assert_eq!(drained.iter().map(|e| e.uuid()).collect::<Vec<_>>(), vec!["1", "2"]);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn requeue_restores_drained_events_to_the_front() {
        let pool = Mempool::new();
        pool.add(event("1"));
        pool.add(event("2"));
        let drained = pool.drain(2);
        pool.add(event("3"));
        pool.requeue(drained);
        assert_eq!(pool.drain(10).iter().map(|e| e.uuid()).collect::<Vec<_>>(), vec!["1", "2", "3"]);
    }

    #[test]
    fn remove_by_uuids_prunes_matching_entries() {
        let pool = Mempool::new();
        pool.add(event("1"));
        pool.add(event("2"));
        pool.remove_by_uuids(&HashSet::from(["1".to_string()]));
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.drain(10)[0].uuid(), "2");
    }
}
