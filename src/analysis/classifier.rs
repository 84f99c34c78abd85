//! Function classification
//!
//! Partitions the public function table into trading-control and
//! blacklist-control candidate sets. The rules are data: a keyword set per
//! category, matched case-insensitively against the resolved name, gated on
//! the function actually touching storage. Both rules run independently,
//! so a function may land in both sets; that is not an error.

use tracing::debug;

use crate::analysis::{
    EffectWalker, LiquidityCallDetector, PayabilityAnalyzer, StorageUsageAnalyzer,
};
use crate::bytecode::FunctionTable;
use crate::models::{Candidate, CandidateSets, Category, ScanResult};

/// One classification rule: keyword set -> category
#[derive(Debug, Clone, Copy)]
pub struct ClassificationRule {
    pub category: Category,
    pub keywords: &'static [&'static str],
}

/// The rule table. Trading keywords catch openTrading/launch/startTrading/
/// enableTrading shapes; blacklist keywords catch setBots/blacklist/
/// banAddress/removeFromList shapes.
pub const CLASSIFICATION_RULES: &[ClassificationRule] = &[
    ClassificationRule {
        category: Category::TradingControl,
        keywords: &["open", "launch", "start", "enable"],
    },
    ClassificationRule {
        category: Category::BlacklistControl,
        keywords: &["bot", "black", "ban", "list"],
    },
];

/// Classifies a resolved function table into candidate sets
pub struct FunctionClassifier<'a> {
    table: &'a FunctionTable,
    storage: StorageUsageAnalyzer<'a>,
    payable: PayabilityAnalyzer<'a>,
    liquidity: LiquidityCallDetector<'a>,
}

impl<'a> FunctionClassifier<'a> {
    pub fn new(table: &'a FunctionTable, walker: &'a EffectWalker<'a>) -> Self {
        Self {
            table,
            storage: StorageUsageAnalyzer::new(table, walker),
            payable: PayabilityAnalyzer::new(table, walker),
            liquidity: LiquidityCallDetector::new(table, walker),
        }
    }

    /// Run every rule over every named function, in table order.
    ///
    /// Names must already be resolved (unresolved selectors cannot match a
    /// keyword and are skipped). The reserved fallback entry lives outside
    /// `table.functions` and is never considered. Idempotent: the same
    /// table yields the same sets.
    pub fn classify(&self) -> ScanResult<CandidateSets> {
        let mut sets = CandidateSets::default();

        for function in &self.table.functions {
            let Some(name) = function.name.as_deref() else {
                continue;
            };
            let lowered = name.to_lowercase();

            for rule in CLASSIFICATION_RULES {
                if !rule.keywords.iter().any(|kw| lowered.contains(kw)) {
                    continue;
                }
                // Keyword matches are cheap; the storage gate is what makes
                // the candidate real.
                if !self.storage.analyze(function.selector)? {
                    debug!(
                        "{} matched {} keywords but never writes storage, skipped",
                        name,
                        rule.category.as_str()
                    );
                    continue;
                }

                let candidate = Candidate {
                    selector: function.selector,
                    name: name.to_string(),
                    is_payable: self.payable.is_payable(function.selector)?,
                    uses_storage: true,
                    calls_liquidity_router: self
                        .liquidity
                        .uses_liquidity_router(function.selector)?,
                };

                match rule.category {
                    Category::TradingControl => sets.trading_control.push(candidate),
                    Category::BlacklistControl => sets.blacklist_control.push(candidate),
                }
            }
        }

        Ok(sets)
    }
}
