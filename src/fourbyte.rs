//! Selector-to-name resolution
//!
//! Looks selectors up in the ethereum-lists/4bytes corpus. Lookups are
//! independent, side-effect-free reads, so they run through a fixed-size
//! worker pool; the buffered stream preserves function-table order.
//! Resolution is best effort: a selector nobody has published stays
//! unresolved, which is a valid state, not an error.

use futures_util::{stream, StreamExt};
use std::time::Duration;
use tracing::debug;

use crate::bytecode::FunctionTable;
use crate::models::{ScanError, ScanResult};

const SIGNATURE_BASE_URL: &str =
    "https://raw.githubusercontent.com/ethereum-lists/4bytes/master/signatures";

/// Concurrent in-flight lookups
const LOOKUP_CONCURRENCY: usize = 8;

/// Resolves human-readable names for discovered selectors
pub struct SignatureResolver {
    client: reqwest::Client,
}

impl SignatureResolver {
    pub fn new() -> ScanResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(ScanError::from)?;
        Ok(Self { client })
    }

    /// Populate `name` for every function in the table
    pub async fn resolve_all(&self, table: &mut FunctionTable) -> ScanResult<()> {
        let selectors: Vec<[u8; 4]> = table.functions.iter().map(|f| f.selector).collect();

        let names: Vec<Option<String>> = stream::iter(selectors)
            .map(|selector| self.lookup(selector))
            .buffered(LOOKUP_CONCURRENCY)
            .collect()
            .await;

        for (function, name) in table.functions.iter_mut().zip(names) {
            function.name = name;
        }
        Ok(())
    }

    /// One lookup; network trouble or an unknown selector both resolve to
    /// None
    async fn lookup(&self, selector: [u8; 4]) -> Option<String> {
        let url = format!("{}/{}", SIGNATURE_BASE_URL, hex::encode(selector));
        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                debug!("signature lookup failed for 0x{}: {}", hex::encode(selector), e);
                return None;
            }
        };
        if !response.status().is_success() {
            return None;
        }
        let body = response.text().await.ok()?;
        // Multiple published signatures are semicolon-separated; the first
        // one is the commonly used form.
        let name = body.split(';').next()?.trim();
        if name.is_empty() {
            None
        } else {
            Some(name.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_url_shape() {
        let url = format!("{}/{}", SIGNATURE_BASE_URL, hex::encode([0x8a, 0x8c, 0x52, 0x3c]));
        assert!(url.ends_with("/signatures/8a8c523c"));
    }
}
