//! Tokenscan Library
//!
//! Honeypot token scanner working from a deployment transaction hash:
//! - Static bytecode stage: function-table recovery, effect tracing, and
//!   keyword classification into trading-control / blacklist-control sets
//! - Dynamic stage: a forked-chain session that seeds liquidity, fires the
//!   trading-enable call, and probes buys to measure dead blocks and fees

pub mod analysis;
pub mod bytecode;
pub mod config;
pub mod fourbyte;
pub mod models;
pub mod node;
pub mod orchestrator;
pub mod report;
pub mod rpc;
pub mod scanner;
pub mod token;

pub use analysis::{EffectWalker, FunctionClassifier};
pub use bytecode::{disassemble, FunctionTable};
pub use config::ScannerConfig;
pub use fourbyte::SignatureResolver;
pub use models::{
    Candidate, CandidateSets, ErrorCode, ScanError, ScanResult, SimulationReport, TokenInfo,
};
pub use node::ForkedNode;
pub use orchestrator::SimulationOrchestrator;
pub use rpc::{ChainRpc, RpcClient};
pub use scanner::{is_transaction_hash, Scanner};
