//! Static bytecode analysis
//!
//! The detection pipeline: an effect walker traces function bodies, three
//! small analyzers turn traces into facts (storage use, payability,
//! liquidity calls), and the classifier partitions the function table into
//! trading-control and blacklist-control candidate sets.

pub mod classifier;
pub mod liquidity;
pub mod payable;
pub mod storage;
pub mod trace;

pub use classifier::{ClassificationRule, FunctionClassifier, CLASSIFICATION_RULES};
pub use liquidity::LiquidityCallDetector;
pub use payable::PayabilityAnalyzer;
pub use storage::StorageUsageAnalyzer;
pub use trace::EffectWalker;
