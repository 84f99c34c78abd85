//! Shared data model for the scanner

pub mod errors;
pub mod types;

pub use errors::{ErrorCode, ScanError, ScanResult};
pub use types::{
    Candidate, CandidateSets, Category, EffectTag, LiquiditySource, SimulationReport, TokenInfo,
    TraceRecord,
};
