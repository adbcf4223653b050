//! Structural checks on scorer evidence.
//!
//! Both checks return values; a failed gate or broken parity marks the
//! document [`DocumentStatus::NeedsRevision`] rather than raising an error.

pub mod gate;
pub mod parity;
pub mod types;


pub use gate::EvidenceGate;
pub use types::{
    DocumentStatus, EvidenceAudit, EvidenceRecord, GateReason, GateResult, ParityReport,
    ThemeAudit,
};
