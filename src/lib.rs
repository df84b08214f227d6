//! # Basin DEX
//!
//! Constant-product decentralized exchange core: a pool registry with
//! deterministic addressing, a reserve-invariant pool engine, and a
//! stateless routing layer, all over a pluggable token ledger.
//!
//! The crate is host-agnostic: it never reads a clock or touches real
//! token accounts. Callers supply a [`ledger::TokenLedger`] implementation
//! and a [`domain::BlockEnv`] per operation; the in-memory
//! [`ledger::MemoryLedger`] backs tests and self-contained embeddings.
//!
//! - **Registry** — creates pools under an administrator-controlled
//!   policy, derives each pool's address deterministically from its pair,
//!   and binds the optional per-caller fee valuator.
//! - **Pool** — holds the reserves and the share ledger; enforces the
//!   fee-adjusted constant-product invariant on every swap, locks a
//!   minimum of liquidity forever, accumulates time-weighted prices, and
//!   supports flash swaps through a callback.
//! - **Router** — stateless convenience layer: quoting, multi-hop swaps,
//!   liquidity provision with slippage bounds, native-currency wrapping,
//!   and fee-on-transfer-tolerant variants. Every router operation is
//!   atomic: on error, pools and ledger are restored.
//!
//! # Quick Start
//!
//! ```rust
//! use basin_dex::domain::{Address, Amount, BlockEnv};
//! use basin_dex::ledger::{MemoryLedger, TokenLedger};
//! use basin_dex::registry::Registry;
//! use basin_dex::router::{AddLiquidity, Router, SwapExactIn};
//!
//! let admin = Address::from_bytes([0xAD; 32]);
//! let alice = Address::from_bytes([0x10; 32]);
//! let token_a = Address::from_bytes([1; 32]);
//! let token_b = Address::from_bytes([2; 32]);
//!
//! let mut registry =
//!     Registry::new(Address::from_bytes([0xFA; 32]), admin).expect("valid administrator");
//! let mut ledger = MemoryLedger::new(Address::from_bytes([0xEE; 32]));
//! let router = Router::new(Address::from_bytes([0xF0; 32]));
//! let block = BlockEnv::new(1, 1_000);
//!
//! // 1. Fund the provider and authorize the router.
//! ledger.mint(token_a, alice, Amount::new(2_000_000)).expect("mint");
//! ledger.mint(token_b, alice, Amount::new(4_000_000)).expect("mint");
//! ledger.approve(token_a, alice, router.address(), Amount::MAX).expect("approve");
//! ledger.approve(token_b, alice, router.address(), Amount::MAX).expect("approve");
//!
//! // 2. Create the pool and seed it in one call.
//! let (_, _, shares) = router
//!     .add_liquidity(&mut registry, &mut ledger, block, alice, AddLiquidity {
//!         token_a,
//!         token_b,
//!         amount_a_desired: Amount::new(1_000_000),
//!         amount_b_desired: Amount::new(4_000_000),
//!         amount_a_min: Amount::ZERO,
//!         amount_b_min: Amount::ZERO,
//!         recipient: alice,
//!         deadline: 2_000,
//!     })
//!     .expect("liquidity added");
//! assert_eq!(shares, Amount::new(1_999_000));
//!
//! // 3. Swap along the pair.
//! let amounts = router
//!     .swap_exact_tokens_for_tokens(&mut registry, &mut ledger, block, alice, SwapExactIn {
//!         path: vec![token_a, token_b],
//!         amount_in: Amount::new(100_000),
//!         amount_out_min: Amount::ZERO,
//!         recipient: alice,
//!         deadline: 2_000,
//!     })
//!     .expect("swap succeeded");
//! assert!(amounts[1] > Amount::ZERO);
//! assert_eq!(ledger.balance_of(token_b, alice), amounts[1]);
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │   Consumer   │  holds Registry + a TokenLedger, calls the Router
//! └──────┬──────┘
//!        │ quote / addLiquidity / swap…
//!        ▼
//! ┌─────────────┐
//! │   Router     │  stateless: path math, slippage bounds, wrapping
//! └──────┬──────┘
//!        │ mint / burn / swap
//!        ▼
//! ┌─────────────┐
//! │  Registry    │  creation policy, deterministic pool addresses
//! └──────┬──────┘
//!        │ owns
//!        ▼
//! ┌─────────────┐
//! │    Pool      │  reserves, shares, K invariant, price oracle
//! └──────┬──────┘
//!        │ balance_of / transfer
//!        ▼
//! ┌─────────────┐
//! │   Ledger     │  caller-supplied token accounting (trait)
//! └─────────────┘
//! ```
//!
//! # Module Guide
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`domain`] | Newtype value types: [`Amount`](domain::Amount), [`Address`](domain::Address), [`TokenPair`](domain::TokenPair), [`SwapRate`](domain::SwapRate), [`BlockEnv`](domain::BlockEnv) |
//! | [`ledger`] | The [`TokenLedger`](ledger::TokenLedger) / [`NativeLedger`](ledger::NativeLedger) seams, flash-swap [`SwapCallee`](ledger::SwapCallee), and the in-memory reference ledger |
//! | [`registry`] | [`Registry`](registry::Registry): pool creation, policy, administration, valuator binding |
//! | [`pool`] | [`Pool`](pool::Pool): mint/burn/swap/sync/skim over the constant-product invariant |
//! | [`router`] | [`Router`](router::Router) plus the pure quoting functions in [`router::library`] |
//! | [`valuator`] | The [`SwapValuator`](valuator::SwapValuator) fee-policy seam |
//! | [`error`] | [`DexError`](error::DexError) unified error enum |
//! | [`prelude`] | Convenience re-exports for common types and traits |

pub mod domain;
pub mod error;
pub mod ledger;
pub mod pool;
pub mod prelude;
pub mod registry;
pub mod router;
pub mod valuator;
