//! Identifier allocation for folders and services.

use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

/// Source of opaque identifiers.
///
/// Uniqueness is only "practical": callers that need a hard guarantee within a
/// collection should check candidates against it (see [`allocate_unique`]).
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// Random v4 UUIDs in simple (hyphen-free) form.
#[derive(Debug, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn next_id(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}

/// Monotonic counter ids, unique for the lifetime of the generator.
#[derive(Debug)]
pub struct SequentialIdGenerator {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self::starting_at(prefix, 1)
    }

    pub fn starting_at(prefix: impl Into<String>, first: u64) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(first),
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self) -> String {
        let value = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}{value}", self.prefix)
    }
}

/// Draws ids from `ids` until one is not already taken.
pub fn allocate_unique(ids: &dyn IdGenerator, taken: impl Fn(&str) -> bool) -> String {
    loop {
        let candidate = ids.next_id();
        if !taken(&candidate) {
            return candidate;
        }
        tracing::debug!(candidate = %candidate, "generated id collided; drawing another");
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn uuid_ids_are_distinct() {
        let ids = UuidIdGenerator;
        let drawn: HashSet<String> = (0..256).map(|_| ids.next_id()).collect();
        assert_eq!(drawn.len(), 256);
        assert!(drawn.iter().all(|id| id.len() == 32));
    }

    #[test]
    fn sequential_ids_count_up_from_start() {
        let ids = SequentialIdGenerator::starting_at("svc-", 7);
        assert_eq!(ids.next_id(), "svc-7");
        assert_eq!(ids.next_id(), "svc-8");
    }

    #[test]
    fn allocate_unique_skips_taken_candidates() {
        let ids = SequentialIdGenerator::new("");
        let taken = ["1", "2", "3"];
        let id = allocate_unique(&ids, |candidate| taken.contains(&candidate));
        assert_eq!(id, "4");
    }
}
