//! Determinism harness.
//!
//! A pipeline is executed N times with the same seed and logical clock. Each
//! output is serialized to JSON, stripped of volatile fields, key-sorted and
//! hashed with BLAKE3. Identical hashes certify the output; any divergence
//! rejects it with a structural diff of the first divergent pair.

pub mod diff;
mod error;
pub mod harness;
pub mod stable;

#[cfg(test)]
mod tests;

pub use diff::{DiffEntry, structural_diff};
pub use error::{BoxError, DeterminismError, DeterminismResult};
pub use harness::{DeterminismHarness, DeterminismReport, HarnessState};
pub use stable::{stable_hash_value, strip_volatile, volatile_fields};
