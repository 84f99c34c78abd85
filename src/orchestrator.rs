//! Simulation orchestrator
//!
//! Drives the forked chain session through liquidity seeding, trading
//! activation, and iterated buy probes:
//!
//! `Init -> Forked -> LiquiditySeeded -> TradingEnabled -> Probing ->
//! {Succeeded, Aborted}`
//!
//! Every step mutates chain state the next step depends on, so the machine
//! runs strictly sequentially on one task; no other writer touches the
//! session. A probe revert is evidence (a dead block), never an error:
//! the chain is force-advanced one block and the next account tries,
//! which turns "trading opens N blocks after activation" honeypots into a
//! deterministic fast-forwarded measurement instead of a wait.

use alloy_primitives::{Address, U256};
use alloy_sol_types::{sol, SolCall};
use tracing::{debug, info};

use crate::config::ScannerConfig;
use crate::models::{
    Candidate, CandidateSets, LiquiditySource, ScanError, ScanResult, SimulationReport,
};
use crate::rpc::ChainRpc;
use crate::token;

sol! {
    function approve(address spender, uint256 amount) external returns (bool);
    function transfer(address to, uint256 amount) external returns (bool);

    function addLiquidityETH(
        address token,
        uint256 amountTokenDesired,
        uint256 amountTokenMin,
        uint256 amountETHMin,
        address to,
        uint256 deadline
    ) external payable returns (uint256 amountToken, uint256 amountETH, uint256 liquidity);

    function getAmountsOut(
        uint256 amountIn,
        address[] calldata path
    ) external view returns (uint256[] memory amounts);

    function swapExactETHForTokensSupportingFeeOnTransferTokens(
        uint256 amountOutMin,
        address[] calldata path,
        address to,
        uint256 deadline
    ) external payable;
}

/// Native balance credited to the deployer (and to the contract when the
/// activation call cannot receive value): 100 ETH
const FUNDING_WEI: u128 = 100_000_000_000_000_000_000;

/// Fixed minimum native-currency side of the liquidity seed: 10 ETH
const LIQUIDITY_WEI: u128 = 10_000_000_000_000_000_000;

/// Native input of every buy probe: 0.01 ETH
const PROBE_WEI: u128 = 10_000_000_000_000_000;

/// State machine phases, logged at every transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Init,
    Forked,
    LiquiditySeeded,
    TradingEnabled,
    Probing,
}

/// Mutable session state owned exclusively by the orchestrator.
/// Created at fork time, dropped when the node is stopped.
struct SimulationSession {
    accounts: Vec<Address>,
    deployer: Address,
    open_trading_block: Option<u64>,
    /// Monotonically non-decreasing during a probing phase
    dead_blocks: u64,
}

/// The dynamic-testing state machine, generic over the fork's RPC surface
pub struct SimulationOrchestrator<'a, R: ChainRpc> {
    fork: &'a R,
    config: &'a ScannerConfig,
    token: Address,
    phase: Phase,
}

impl<'a, R: ChainRpc> SimulationOrchestrator<'a, R> {
    pub fn new(fork: &'a R, config: &'a ScannerConfig, token: Address) -> Self {
        Self {
            fork,
            config,
            token,
            phase: Phase::Init,
        }
    }

    fn transition(&mut self, next: Phase) {
        debug!("simulation {:?} -> {:?}", self.phase, next);
        self.phase = next;
    }

    /// Run the full machine. Aborting errors carry their own codes
    /// (ForkUnavailable, NoInitialSupply, UnsupportedPattern, ZeroQuote);
    /// exhausting the account pool is a soft outcome, not an error.
    pub async fn run(
        &mut self,
        accounts: &[Address],
        candidates: &CandidateSets,
        token_code: &[u8],
        deployer: Address,
    ) -> ScanResult<SimulationReport> {
        let mut session = SimulationSession {
            accounts: accounts.to_vec(),
            deployer,
            open_trading_block: None,
            dead_blocks: 0,
        };
        let candidate = candidates.canonical_trading();

        self.fork_in(&mut session, token_code).await?;
        let liquidity = self.seed_liquidity(&session, candidate).await?;
        self.enable_trading(&mut session, candidate, liquidity).await?;
        self.probe(&mut session, liquidity).await
    }

    /// Init -> Forked: reach the forked endpoint, fund and impersonate the
    /// deployer, re-plant the token code into the session
    async fn fork_in(&mut self, session: &mut SimulationSession, token_code: &[u8]) -> ScanResult<()> {
        self.fork
            .block_number()
            .await
            .map_err(|e| ScanError::fork_unavailable(e.to_string()))?;

        self.fork
            .set_balance(session.deployer, U256::from(FUNDING_WEI))
            .await?;
        self.fork.impersonate(session.deployer).await?;
        self.fork.set_code(self.token, token_code).await?;

        self.transition(Phase::Forked);
        Ok(())
    }

    /// Forked -> LiquiditySeeded: approvals for the whole pool, supply
    /// check, then direct router seeding unless the trading-enable call
    /// wires up the pool itself
    async fn seed_liquidity(
        &mut self,
        session: &SimulationSession,
        candidate: Option<&Candidate>,
    ) -> ScanResult<LiquiditySource> {
        // Router gets unlimited spend from every prober and the deployer.
        for account in session.accounts.iter().chain([&session.deployer]) {
            let calldata = approveCall {
                spender: self.config.router,
                amount: U256::MAX,
            }
            .abi_encode();
            let tx = self
                .fork
                .send_transaction(*account, self.token, &calldata, U256::ZERO)
                .await?;
            self.fork.wait_for_receipt(&tx).await?;
        }

        let deployer_balance =
            token::balance_of(self.fork, self.token, session.deployer).await?;
        if deployer_balance.is_zero() {
            return Err(ScanError::no_initial_supply());
        }

        // An unresolvable multi-signature name means the dead-block schedule
        // may be dynamic; abort before touching the pool rather than guess.
        if let Some(candidate) = candidate {
            if candidate.name.contains(',') {
                return Err(ScanError::unsupported_pattern(&candidate.name));
            }
        }

        let auto_liquidity = candidate.map(|c| c.calls_liquidity_router).unwrap_or(false);
        let source = if auto_liquidity {
            info!("liquidity deferred to the trading-enable call");
            LiquiditySource::TradingFunction
        } else {
            info!("seeding liquidity via router addLiquidityETH");
            let calldata = addLiquidityETHCall {
                token: self.token,
                amountTokenDesired: deployer_balance / U256::from(2),
                amountTokenMin: U256::ZERO,
                amountETHMin: U256::ZERO,
                to: session.deployer,
                deadline: U256::MAX,
            }
            .abi_encode();
            let tx = self
                .fork
                .send_transaction(
                    session.deployer,
                    self.config.router,
                    &calldata,
                    U256::from(LIQUIDITY_WEI),
                )
                .await?;
            self.fork.wait_for_receipt(&tx).await?;
            LiquiditySource::Router
        };

        self.transition(Phase::LiquiditySeeded);
        Ok(source)
    }

    /// LiquiditySeeded -> TradingEnabled: submit the activation call with
    /// block production paused. No candidate means trading is assumed
    /// already open and the step is skipped.
    async fn enable_trading(
        &mut self,
        session: &mut SimulationSession,
        candidate: Option<&Candidate>,
        liquidity: LiquiditySource,
    ) -> ScanResult<()> {
        if let Some(candidate) = candidate {
            let mut activation_value = U256::ZERO;

            if liquidity == LiquiditySource::TradingFunction {
                // The call adds liquidity itself, so the contract needs the
                // token side up front.
                let deployer_balance =
                    token::balance_of(self.fork, self.token, session.deployer).await?;
                let calldata = transferCall {
                    to: self.token,
                    amount: deployer_balance / U256::from(2),
                }
                .abi_encode();
                let tx = self
                    .fork
                    .send_transaction(session.deployer, self.token, &calldata, U256::ZERO)
                    .await?;
                self.fork.wait_for_receipt(&tx).await?;

                if candidate.is_payable {
                    activation_value = U256::from(LIQUIDITY_WEI);
                } else {
                    // Cannot receive the ETH side via value; credit the
                    // contract balance directly instead.
                    self.fork
                        .set_balance(self.token, U256::from(FUNDING_WEI))
                        .await?;
                }
            }

            // Pause block production so the activation lands in the same
            // block the probes measure against.
            self.fork.set_automine(false).await?;
            self.fork
                .send_transaction(
                    session.deployer,
                    self.token,
                    &candidate.selector,
                    activation_value,
                )
                .await?;
            info!("submitted trading activation {}", candidate.name);
        } else {
            info!("no trading-control candidate, assuming trading already open");
        }

        self.transition(Phase::TradingEnabled);

        // TradingEnabled -> Probing: reference block, resume mining, drop
        // the impersonation.
        let activation_block = self.fork.block_number().await?;
        session.open_trading_block = Some(activation_block);
        info!("activation reference block {}", activation_block);
        self.fork.set_automine(true).await?;
        self.fork.stop_impersonating(session.deployer).await?;
        self.transition(Phase::Probing);
        Ok(())
    }

    /// Probing: one buy attempt per account in pool order. A revert is a
    /// dead block; the first success measures the fee and ends the phase.
    async fn probe(
        &mut self,
        session: &mut SimulationSession,
        liquidity: LiquiditySource,
    ) -> ScanResult<SimulationReport> {
        let path = vec![self.config.weth, self.token];
        let accounts = session.accounts.clone();

        for account in accounts {
            let quote_call = getAmountsOutCall {
                amountIn: U256::from(PROBE_WEI),
                path: path.clone(),
            }
            .abi_encode();
            let out = self.fork.eth_call(self.config.router, &quote_call).await?;
            let quoted = decode_quote(&out)?;

            let swap_call = swapExactETHForTokensSupportingFeeOnTransferTokensCall {
                amountOutMin: U256::ZERO,
                path: path.clone(),
                to: account,
                deadline: U256::MAX,
            }
            .abi_encode();

            match self
                .fork
                .send_transaction(account, self.config.router, &swap_call, U256::from(PROBE_WEI))
                .await
            {
                Ok(tx) => {
                    self.fork.wait_for_receipt(&tx).await?;
                }
                Err(e) => {
                    // Dead block: trading still gated for this block.
                    debug!("probe from {} reverted: {}", account, e);
                    session.dead_blocks += 1;
                    self.fork.mine_blocks(1).await?;
                    continue;
                }
            }

            let received = token::balance_of(self.fork, self.token, account).await?;
            let fee_percent = compute_fee_percent(quoted, received)?;

            info!(
                "probe succeeded {} blocks after activation block {:?}, fee {}%",
                session.dead_blocks, session.open_trading_block, fee_percent
            );
            return Ok(SimulationReport::Succeeded {
                liquidity,
                dead_blocks: session.dead_blocks,
                fee_percent,
            });
        }

        // Soft failure: every account reverted. Reported, not fatal.
        Ok(SimulationReport::Exhausted {
            liquidity,
            dead_blocks: session.dead_blocks,
        })
    }
}

/// Applied fee as a rounded percentage of the quoted output.
/// A non-positive quote is a defined error, never a division by zero.
fn compute_fee_percent(quoted: U256, received: U256) -> ScanResult<u64> {
    if quoted.is_zero() {
        return Err(ScanError::zero_quote());
    }
    if received >= quoted {
        return Ok(0);
    }
    let withheld = quoted - received;
    // round(withheld / quoted * 100)
    let fee = (withheld * U256::from(100) + quoted / U256::from(2)) / quoted;
    Ok(fee.try_into().unwrap_or(100).min(100))
}

/// Token output of a [weth, token] quote: the second amounts element
fn decode_quote(data: &[u8]) -> ScanResult<U256> {
    let decoded = getAmountsOutCall::abi_decode_returns(data, false).map_err(|e| {
        ScanError::with_source(
            crate::models::ErrorCode::RpcInvalidResponse,
            "malformed getAmountsOut return",
            e,
        )
    })?;
    decoded.amounts.last().copied().ok_or_else(ScanError::zero_quote)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ScannerConfig, DEFAULT_ROUTER, DEFAULT_WETH};
    use crate::models::ErrorCode;
    use alloy_sol_types::SolCall;
    use std::sync::Mutex;

    const TOKEN: Address = Address::repeat_byte(0x70);
    const TRADING_SELECTOR: [u8; 4] = [0x8a, 0x8c, 0x52, 0x3c];

    /// Scripted fork: fixed quote, configurable deployer balance, and a
    /// number of initial swap reverts. Records transactions and balance
    /// credits so tests can assert on ordering.
    struct ScriptedRpc {
        deployer: Address,
        deployer_balance: U256,
        quote: U256,
        received: U256,
        failing_swaps: usize,
        swaps: Mutex<usize>,
        mined: Mutex<u64>,
        sends: Mutex<Vec<(Address, [u8; 4], U256)>>,
        funded: Mutex<Vec<Address>>,
    }

    impl ScriptedRpc {
        fn new(deployer_balance: U256, failing_swaps: usize) -> Self {
            Self {
                deployer: Address::repeat_byte(0xd1),
                deployer_balance,
                quote: U256::from(1000),
                received: U256::from(950),
                failing_swaps,
                swaps: Mutex::new(0),
                mined: Mutex::new(0),
                sends: Mutex::new(Vec::new()),
                funded: Mutex::new(Vec::new()),
            }
        }

        fn sent_selectors(&self) -> Vec<[u8; 4]> {
            self.sends
                .lock()
                .unwrap()
                .iter()
                .map(|(_, selector, _)| *selector)
                .collect()
        }

        fn mined(&self) -> u64 {
            *self.mined.lock().unwrap()
        }
    }

    impl ChainRpc for ScriptedRpc {
        async fn block_number(&self) -> ScanResult<u64> {
            Ok(1_000)
        }

        async fn eth_call(&self, _to: Address, data: &[u8]) -> ScanResult<Vec<u8>> {
            if data.len() >= 4 && data[..4] == getAmountsOutCall::SELECTOR {
                let amounts = vec![U256::from(PROBE_WEI), self.quote];
                return Ok(getAmountsOutCall::abi_encode_returns(&(amounts,)));
            }
            // balanceOf(address): the holder sits in the padded word
            let holder = Address::from_slice(&data[16..36]);
            let balance = if holder == self.deployer {
                self.deployer_balance
            } else {
                self.received
            };
            Ok(balance.to_be_bytes::<32>().to_vec())
        }

        async fn send_transaction(
            &self,
            _from: Address,
            to: Address,
            data: &[u8],
            value: U256,
        ) -> ScanResult<String> {
            let selector: [u8; 4] = data
                .get(..4)
                .and_then(|s| s.try_into().ok())
                .unwrap_or_default();
            if selector == swapExactETHForTokensSupportingFeeOnTransferTokensCall::SELECTOR {
                let mut swaps = self.swaps.lock().unwrap();
                *swaps += 1;
                if *swaps <= self.failing_swaps {
                    return Err(ScanError::new(ErrorCode::RpcError, "execution reverted"));
                }
            }
            let mut sends = self.sends.lock().unwrap();
            sends.push((to, selector, value));
            Ok(format!("0x{:064x}", sends.len()))
        }

        async fn wait_for_receipt(&self, _tx_hash: &str) -> ScanResult<()> {
            Ok(())
        }

        async fn set_balance(&self, address: Address, _wei: U256) -> ScanResult<()> {
            self.funded.lock().unwrap().push(address);
            Ok(())
        }

        async fn impersonate(&self, _address: Address) -> ScanResult<()> {
            Ok(())
        }

        async fn stop_impersonating(&self, _address: Address) -> ScanResult<()> {
            Ok(())
        }

        async fn set_code(&self, _address: Address, _code: &[u8]) -> ScanResult<()> {
            Ok(())
        }

        async fn set_automine(&self, _enabled: bool) -> ScanResult<()> {
            Ok(())
        }

        async fn mine_blocks(&self, blocks: u64) -> ScanResult<()> {
            *self.mined.lock().unwrap() += blocks;
            Ok(())
        }
    }

    fn test_config() -> ScannerConfig {
        ScannerConfig {
            rpc_endpoint: "http://localhost:1".into(),
            router: DEFAULT_ROUTER.parse().unwrap(),
            weth: DEFAULT_WETH.parse().unwrap(),
            fork_port: 8545,
            verbose_node_logs: false,
        }
    }

    fn trading_candidate(name: &str, is_payable: bool, calls_router: bool) -> CandidateSets {
        CandidateSets {
            trading_control: vec![Candidate {
                selector: TRADING_SELECTOR,
                name: name.to_string(),
                is_payable,
                uses_storage: true,
                calls_liquidity_router: calls_router,
            }],
            blacklist_control: vec![],
        }
    }

    fn probers(n: usize) -> Vec<Address> {
        (0..n).map(|i| Address::repeat_byte(0xa0 + i as u8)).collect()
    }

    #[tokio::test]
    async fn test_probe_counts_reverts_as_dead_blocks() {
        let rpc = ScriptedRpc::new(U256::from(1_000_000u64), 3);
        let config = test_config();
        let sets = trading_candidate("openTrading()", false, false);
        let mut orchestrator = SimulationOrchestrator::new(&rpc, &config, TOKEN);

        let report = orchestrator
            .run(&probers(5), &sets, &[0x60, 0x00], rpc.deployer)
            .await
            .unwrap();

        match report {
            SimulationReport::Succeeded {
                liquidity,
                dead_blocks,
                fee_percent,
            } => {
                assert_eq!(liquidity, LiquiditySource::Router);
                assert_eq!(dead_blocks, 3);
                // quoted 1000, received 950
                assert_eq!(fee_percent, 5);
            }
            other => panic!("expected success, got {:?}", other),
        }
        // One forced block per revert, none after the success
        assert_eq!(rpc.mined(), 3);
    }

    #[tokio::test]
    async fn test_exhausted_pool_is_soft_outcome() {
        let rpc = ScriptedRpc::new(U256::from(1_000_000u64), usize::MAX);
        let config = test_config();
        // No candidate: activation skipped, trading assumed open
        let sets = CandidateSets::default();
        let mut orchestrator = SimulationOrchestrator::new(&rpc, &config, TOKEN);

        let report = orchestrator
            .run(&probers(4), &sets, &[], rpc.deployer)
            .await
            .unwrap();

        match report {
            SimulationReport::Exhausted { dead_blocks, .. } => {
                // Bounded by the account pool, one dead block per account
                assert_eq!(dead_blocks, 4);
            }
            other => panic!("expected exhaustion, got {:?}", other),
        }
        assert_eq!(rpc.mined(), 4);
    }

    #[tokio::test]
    async fn test_zero_supply_aborts_before_seeding() {
        let rpc = ScriptedRpc::new(U256::ZERO, 0);
        let config = test_config();
        let sets = trading_candidate("openTrading()", false, false);
        let mut orchestrator = SimulationOrchestrator::new(&rpc, &config, TOKEN);

        let err = orchestrator
            .run(&probers(2), &sets, &[], rpc.deployer)
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::NoInitialSupply);
        // No liquidity was seeded and no probe was attempted
        assert!(!rpc.sent_selectors().contains(&addLiquidityETHCall::SELECTOR));
        assert_eq!(*rpc.swaps.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_comma_name_aborts_before_seeding() {
        let rpc = ScriptedRpc::new(U256::from(1_000_000u64), 0);
        let config = test_config();
        let sets = trading_candidate("openTrading(uint256,uint256)", false, false);
        let mut orchestrator = SimulationOrchestrator::new(&rpc, &config, TOKEN);

        let err = orchestrator
            .run(&probers(2), &sets, &[], rpc.deployer)
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::UnsupportedPattern);
        assert!(!rpc.sent_selectors().contains(&addLiquidityETHCall::SELECTOR));
    }

    #[tokio::test]
    async fn test_auto_liquidity_payable_activation_carries_value() {
        let rpc = ScriptedRpc::new(U256::from(1_000_000u64), 0);
        let config = test_config();
        let sets = trading_candidate("launchPool()", true, true);
        let mut orchestrator = SimulationOrchestrator::new(&rpc, &config, TOKEN);

        let report = orchestrator
            .run(&probers(2), &sets, &[], rpc.deployer)
            .await
            .unwrap();
        assert!(matches!(
            report,
            SimulationReport::Succeeded {
                liquidity: LiquiditySource::TradingFunction,
                ..
            }
        ));

        let sends = rpc.sends.lock().unwrap();
        // Token side transferred to the contract before activation
        assert!(sends
            .iter()
            .any(|(to, sel, _)| *to == TOKEN && *sel == transferCall::SELECTOR));
        // Activation carries the native side as call value
        let (_, _, value) = sends
            .iter()
            .find(|(to, sel, _)| *to == TOKEN && *sel == TRADING_SELECTOR)
            .unwrap();
        assert_eq!(*value, U256::from(LIQUIDITY_WEI));
        // The router was never asked to seed the pool
        assert!(!sends
            .iter()
            .any(|(_, sel, _)| *sel == addLiquidityETHCall::SELECTOR));
        assert!(!rpc.funded.lock().unwrap().contains(&TOKEN));
    }

    #[tokio::test]
    async fn test_auto_liquidity_nonpayable_credits_contract_balance() {
        let rpc = ScriptedRpc::new(U256::from(1_000_000u64), 0);
        let config = test_config();
        let sets = trading_candidate("launchPool()", false, true);
        let mut orchestrator = SimulationOrchestrator::new(&rpc, &config, TOKEN);

        orchestrator
            .run(&probers(2), &sets, &[], rpc.deployer)
            .await
            .unwrap();

        // Value cannot be attached, so the contract balance is credited
        assert!(rpc.funded.lock().unwrap().contains(&TOKEN));
        let sends = rpc.sends.lock().unwrap();
        let (_, _, value) = sends
            .iter()
            .find(|(to, sel, _)| *to == TOKEN && *sel == TRADING_SELECTOR)
            .unwrap();
        assert_eq!(*value, U256::ZERO);
    }

    #[test]
    fn test_fee_percent_scenario() {
        // Quoted 1000, received 950 -> 5%
        assert_eq!(
            compute_fee_percent(U256::from(1000), U256::from(950)).unwrap(),
            5
        );
    }

    #[test]
    fn test_fee_percent_rounds() {
        // 4.6% rounds to 5, 4.4% rounds to 4
        assert_eq!(
            compute_fee_percent(U256::from(1000), U256::from(954)).unwrap(),
            5
        );
        assert_eq!(
            compute_fee_percent(U256::from(1000), U256::from(956)).unwrap(),
            4
        );
    }

    #[test]
    fn test_fee_percent_bounds() {
        assert_eq!(
            compute_fee_percent(U256::from(1000), U256::ZERO).unwrap(),
            100
        );
        // Received more than quoted clamps to 0, never underflows
        assert_eq!(
            compute_fee_percent(U256::from(1000), U256::from(2000)).unwrap(),
            0
        );
    }

    #[test]
    fn test_zero_quote_is_defined_error() {
        let err = compute_fee_percent(U256::ZERO, U256::ZERO).unwrap_err();
        assert_eq!(err.code, ErrorCode::ZeroQuote);
    }

    #[test]
    fn test_decode_quote_takes_final_hop() {
        let encoded = getAmountsOutCall::abi_encode_returns(&(vec![
            U256::from(10_000_000_000_000_000u128),
            U256::from(123_456u64),
        ],));
        assert_eq!(decode_quote(&encoded).unwrap(), U256::from(123_456u64));
    }
}
