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

use std::{
	panic::{AssertUnwindSafe, catch_unwind},
	sync::{
		Arc,
		atomic::{AtomicBool, Ordering},
	},
	thread::{self, JoinHandle},
	time::Duration,
};

use tracing::{debug, error, info, warn};

use crate::commands::ExchangeCommand;
use crate::config::ExchangeConfig;
use crate::handle::ExchangeHandle;
use crate::queue::{CommandQueue, CommandReceiver, QueueError};
use crate::state::ExchangeState;

/// The exchange engine: a single-writer loop over the command queue
///
/// All state (accounts, orders, books, trades) is owned by one dedicated
/// thread that drains commands in submission order and resolves each
/// command's reply slot exactly once. Callers never touch the state
/// directly, which makes every operation linearizable without any
/// per-entity locking.
///
/// A failing command resolves its reply with the error and the loop
/// moves on; even a panic inside one command is caught so that
/// subsequent commands keep being served.
pub struct ExchangeEngine {
	thread_handle: Option<JoinHandle<()>>,
	shutdown: Arc<AtomicBool>,
}

impl ExchangeEngine {
	/// Start the engine and return it together with a submission handle
	pub fn start(config: ExchangeConfig) -> (Self, ExchangeHandle) {
		let queue = CommandQueue::new(config.command_queue_size);
		let (sender, receiver) = queue.split();

		let shutdown = Arc::new(AtomicBool::new(false));
		let shutdown_clone = shutdown.clone();

		let thread_handle = thread::Builder::new()
			.name("exchange-loop".to_string())
			.spawn(move || {
				info!(target: "engine", "Exchange engine started");
				let mut state = ExchangeState::new();
				Self::run_command_loop(&mut state, &config, &receiver, &shutdown_clone);
				info!(target: "engine", "Exchange engine stopped");
			})
			.expect("Failed to spawn exchange engine thread");

		(
			Self {
				thread_handle: Some(thread_handle),
				shutdown,
			},
			ExchangeHandle::new(sender),
		)
	}

	/// Main command loop - the heart of the engine
	///
	/// Dequeues one command at a time, executes it against the state and
	/// resolves its reply. Commands are executed strictly in submission
	/// order; there is no reordering and no priority.
	fn run_command_loop(
		state: &mut ExchangeState,
		config: &ExchangeConfig,
		receiver: &CommandReceiver,
		shutdown: &Arc<AtomicBool>,
	) {
		loop {
			if shutdown.load(Ordering::Relaxed) {
				break;
			}

			let cmd = match receiver.try_recv() {
				Ok(cmd) => cmd,
				Err(QueueError::Empty) => {
					thread::sleep(Duration::from_millis(1));
					continue;
				}
				Err(QueueError::Disconnected) => {
					info!(target: "engine", "All command senders dropped");
					break;
				}
				Err(QueueError::Full) => {
					error!(target: "engine", "Unexpected Full error on try_recv");
					continue;
				}
			};

			if config.verbose_logging {
				debug!(target: "engine", "Processing command: {}", cmd.name());
			}

			let name = cmd.name();
			// One bad command must not take the loop down. The reply slot
			// was consumed by the panicking arm, so its receiver closes
			// and the caller observes an engine failure for this command
			// only.
			if catch_unwind(AssertUnwindSafe(|| Self::execute(state, config, cmd))).is_err() {
				error!(
					target: "engine",
					"Command {} panicked; continuing with next command", name
				);
			}
		}
	}

	/// Execute a single command and resolve its reply
	fn execute(state: &mut ExchangeState, config: &ExchangeConfig, cmd: ExchangeCommand) {
		match cmd {
			ExchangeCommand::DepositCash {
				user_id,
				cents,
				reply,
			} => {
				Self::respond(reply, state.deposit_cash(user_id, cents));
			}
			ExchangeCommand::DepositInventory {
				user_id,
				sku,
				qty,
				reply,
			} => {
				Self::respond(reply, state.deposit_inventory(user_id, sku, qty));
			}
			ExchangeCommand::GetBalance { user_id, reply } => {
				Self::respond(reply, Ok(state.balance(user_id)));
			}
			ExchangeCommand::PlaceLimitOrder {
				user_id,
				sku,
				side,
				limit_price_cents,
				qty,
				reply,
			} => {
				Self::respond(
					reply,
					state.place_limit_order(user_id, sku, side, limit_price_cents, qty),
				);
			}
			ExchangeCommand::CancelOrder {
				user_id,
				order_id,
				reply,
			} => {
				Self::respond(reply, state.cancel_order(user_id, order_id));
			}
			ExchangeCommand::ListOpenOrders { user_id, reply } => {
				Self::respond(reply, Ok(state.open_orders(user_id)));
			}
			ExchangeCommand::GetBookTop { sku, reply } => {
				Self::respond(reply, Ok(state.book_top(sku)));
			}
			ExchangeCommand::GetTrades { sku, limit, reply } => {
				let limit = limit.min(config.trade_query_limit);
				Self::respond(reply, Ok(state.recent_trades(&sku, limit)));
			}
			ExchangeCommand::GetBookSnapshot { sku, depth, reply } => {
				let depth = if depth == 0 {
					config.snapshot_depth
				} else {
					depth
				};
				Self::respond(reply, Ok(state.book_snapshot(sku, depth)));
			}
		}
	}

	fn respond<T>(reply: crate::commands::Reply<T>, result: Result<T, crate::error::ExchangeError>) {
		if let Err(ref err) = result {
			debug!(target: "engine", "Command refused: {}", err);
		}
		// The caller may have stopped waiting (e.g. a transport timeout);
		// the command still completed, the result just goes unobserved.
		if reply.send(result).is_err() {
			debug!(target: "engine", "Reply abandoned by caller");
		}
	}

	/// Shutdown the engine gracefully
	pub fn shutdown(mut self) {
		info!(target: "engine", "Shutting down exchange engine");
		self.shutdown.store(true, Ordering::Relaxed);

		if let Some(handle) = self.thread_handle.take()
			&& let Err(e) = handle.join()
		{
			warn!(target: "engine", "Exchange engine thread panicked: {:?}", e);
		}
	}
}

impl Drop for ExchangeEngine {
	fn drop(&mut self) {
		self.shutdown.store(true, Ordering::Relaxed);
		if let Some(handle) = self.thread_handle.take()
			&& let Err(e) = handle.join()
		{
			let _ = Err::<(), _>(e);
		}
	}
}
