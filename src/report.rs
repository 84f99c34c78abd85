//! Report output
//!
//! The ordered text sections an operator reads: token info, public
//! functions, blacklist candidates, trading candidates, dynamic-testing
//! results. Section shapes stay stable so the output is diffable between
//! runs against the same deployment.

use crate::bytecode::FunctionTable;
use crate::models::{Candidate, SimulationReport, TokenInfo};

pub fn print_token_info(info: &TokenInfo) {
    println!("┳ TOKEN INFO");
    println!("┣ Name        : {}", info.name);
    println!("┣ Symbol      : {}", info.symbol);
    println!("┣ Decimals    : {}", info.decimals);
    println!(
        "┣ Total Supply: {} {}",
        format_units(info.to_units(info.total_supply)),
        info.symbol
    );
    println!(
        "┣ Total Burnt : {} {}",
        format_units(info.to_units(info.total_burnt)),
        info.symbol
    );
}

pub fn print_functions(table: &FunctionTable) {
    println!();
    println!("┳ PUBLIC FUNCTIONS");
    for function in &table.functions {
        println!("┣ {} : {}", function.selector_hex(), function.display_name());
    }
    if let Some(offset) = table.fallback_offset {
        println!("┣ fallback @ 0x{:x}", offset);
    }
}

pub fn print_candidates(heading: &str, candidates: &[Candidate]) {
    println!();
    println!("┳ {}", heading);
    if candidates.is_empty() {
        println!("┣ No function detected!");
        return;
    }
    for candidate in candidates {
        let mut traits = Vec::new();
        if candidate.is_payable {
            traits.push("payable");
        }
        if candidate.calls_liquidity_router {
            traits.push("adds liquidity");
        }
        let suffix = if traits.is_empty() {
            String::new()
        } else {
            format!(" [{}]", traits.join(", "))
        };
        println!("┣ {}: {}{}", candidate.selector_hex(), candidate.name, suffix);
    }
}

pub fn print_dynamic_header() {
    println!();
    println!("┳ DYNAMIC TESTING");
}

pub fn print_simulation(report: &SimulationReport) {
    match report {
        SimulationReport::Succeeded {
            liquidity,
            dead_blocks,
            fee_percent,
        } => {
            println!("┣ Liquidity added via {}", liquidity.as_str());
            println!("┣ Buy Dead Blocks: {}", dead_blocks);
            println!("┣ Buy Fee Percent: %{}", fee_percent);
        }
        SimulationReport::Exhausted {
            liquidity,
            dead_blocks,
        } => {
            println!("┣ Liquidity added via {}", liquidity.as_str());
            println!(
                "┣ No probe succeeded after {} attempts - trading never opened",
                dead_blocks
            );
        }
    }
}

/// Early-exit line for a fatal simulation abort
pub fn print_abort(reason: &str) {
    println!("┣ {}", reason);
}

/// Thousands-separated units with two decimals
fn format_units(value: f64) -> String {
    let magnitude = value.abs();
    let mut whole = magnitude.trunc() as i128;
    let mut frac = ((magnitude - magnitude.trunc()) * 100.0).round() as i64;
    // A fraction that rounds to a full unit carries into the whole part
    if frac >= 100 {
        whole += 1;
        frac = 0;
    }
    let mut digits = whole.to_string();
    let mut grouped = String::new();
    while digits.len() > 3 {
        let split = digits.len() - 3;
        grouped = format!(",{}{}", &digits[split..], grouped);
        digits.truncate(split);
    }
    format!(
        "{}{}{}.{:02}",
        if value < 0.0 { "-" } else { "" },
        digits,
        grouped,
        frac
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_units_grouping() {
        assert_eq!(format_units(1_000_000.0), "1,000,000.00");
        assert_eq!(format_units(999.5), "999.50");
        assert_eq!(format_units(0.0), "0.00");
    }

    #[test]
    fn test_format_units_fraction_carry() {
        assert_eq!(format_units(999.999), "1,000.00");
        assert_eq!(format_units(0.999), "1.00");
        assert_eq!(format_units(999_999.999), "1,000,000.00");
    }
}
