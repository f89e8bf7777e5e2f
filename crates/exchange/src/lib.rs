// Copyright 2025 itscheems
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Cardex Exchange Engine
//!
//! In-memory exchange for trading card inventory: users hold cash and
//! per-SKU inventory, submit limit orders, and the engine matches
//! crossing orders by price-time priority, settling trades by moving
//! held funds and inventory between accounts.
//!
//! Architecture:
//! - Single-threaded command loop owning all state for linearizability
//! - Bounded MPSC command queue with backpressure
//! - Per-command oneshot reply slots for concurrent callers
//! - Hold/release/settle ledger discipline; funds move only through it

pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod handle;
pub mod ledger;
pub mod logging;
mod matching;
pub mod orderbook;
pub mod queue;
pub mod state;
pub mod types;

pub use commands::ExchangeCommand;
pub use config::ExchangeConfig;
pub use engine::ExchangeEngine;
pub use error::ExchangeError;
pub use handle::ExchangeHandle;
pub use ledger::{Account, LedgerError};
pub use orderbook::{BookRef, OrderBook};
pub use queue::{CommandQueue, CommandReceiver, CommandSender, QueueError};
pub use state::ExchangeState;
pub use types::{Order, OrderTable, Trade};
