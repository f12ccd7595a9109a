//! Memoised thickness differences.

use std::collections::HashMap;

/// Full argument tuple of one difference evaluation.
///
/// Floats are keyed by bit pattern so that only bit-identical arguments hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DifferenceKey {
    pulse_duration: u64,
    rate: u64,
    power: u64,
    reference_duration: u64,
    pulse_count: usize,
}

impl DifferenceKey {
    pub fn new(
        pulse_duration: f64,
        rate: f64,
        power: f64,
        reference_duration: f64,
        pulse_count: usize,
    ) -> Self {
        Self {
            pulse_duration: pulse_duration.to_bits(),
            rate: rate.to_bits(),
            power: power.to_bits(),
            reference_duration: reference_duration.to_bits(),
            pulse_count,
        }
    }
}

/// Cache owned by a single matcher; never shared between matchers.
#[derive(Clone, Debug, Default)]
pub struct DifferenceCache {
    entries: HashMap<DifferenceKey, f64>,
    hits: usize,
    misses: usize,
}

impl DifferenceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value for `key`, or compute and store it.
    ///
    /// Failed computations are not stored.
    pub fn get_or_try_insert_with<E>(
        &mut self,
        key: DifferenceKey,
        compute: impl FnOnce() -> Result<f64, E>,
    ) -> Result<f64, E> {
        if let Some(value) = self.entries.get(&key) {
            self.hits += 1;
            return Ok(*value);
        }
        self.misses += 1;
        let value = compute()?;
        self.entries.insert(key, value);
        Ok(value)
    }

    pub fn get(&self, key: &DifferenceKey) -> Option<f64> {
        self.entries.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
    }
}
