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

use tokio::sync::oneshot;

use cardex_sdk::{
	BalanceView, BookSnapshot, BookTop, CashBalances, InventoryDeposit, OrderId, OrderView, Side,
	SkuId, TradeView, UserId,
};

use crate::commands::{ExchangeCommand, Reply};
use crate::error::ExchangeError;
use crate::queue::CommandSender;

/// Cloneable submission handle for the exchange engine
///
/// Each method enqueues one command carrying a fresh oneshot reply slot
/// and suspends until the command loop resolves it. Submission is the
/// only concurrent operation; any number of handles may be used from any
/// number of tasks. A full queue surfaces as `Overloaded`, a stopped
/// engine as `EngineUnavailable`.
#[derive(Clone)]
pub struct ExchangeHandle {
	sender: CommandSender,
}

impl ExchangeHandle {
	pub(crate) fn new(sender: CommandSender) -> Self {
		Self { sender }
	}

	async fn submit<T>(
		&self,
		build: impl FnOnce(Reply<T>) -> ExchangeCommand,
	) -> Result<T, ExchangeError> {
		let (reply, rx) = oneshot::channel();
		self.sender.try_enqueue(build(reply))?;
		// A closed reply slot means the engine dropped the command
		// (shutdown or a panic in the handling arm).
		rx.await.map_err(|_| ExchangeError::EngineUnavailable)?
	}

	pub async fn deposit_cash(
		&self,
		user_id: UserId,
		cents: u64,
	) -> Result<CashBalances, ExchangeError> {
		self.submit(|reply| ExchangeCommand::DepositCash {
			user_id,
			cents,
			reply,
		})
		.await
	}

	pub async fn deposit_inventory(
		&self,
		user_id: UserId,
		sku: SkuId,
		qty: u64,
	) -> Result<InventoryDeposit, ExchangeError> {
		self.submit(|reply| ExchangeCommand::DepositInventory {
			user_id,
			sku,
			qty,
			reply,
		})
		.await
	}

	pub async fn balance(&self, user_id: UserId) -> Result<BalanceView, ExchangeError> {
		self.submit(|reply| ExchangeCommand::GetBalance { user_id, reply })
			.await
	}

	pub async fn place_limit_order(
		&self,
		user_id: UserId,
		sku: SkuId,
		side: Side,
		limit_price_cents: u64,
		qty: u64,
	) -> Result<OrderView, ExchangeError> {
		self.submit(|reply| ExchangeCommand::PlaceLimitOrder {
			user_id,
			sku,
			side,
			limit_price_cents,
			qty,
			reply,
		})
		.await
	}

	pub async fn cancel_order(
		&self,
		user_id: UserId,
		order_id: OrderId,
	) -> Result<OrderId, ExchangeError> {
		self.submit(|reply| ExchangeCommand::CancelOrder {
			user_id,
			order_id,
			reply,
		})
		.await
	}

	pub async fn open_orders(&self, user_id: UserId) -> Result<Vec<OrderView>, ExchangeError> {
		self.submit(|reply| ExchangeCommand::ListOpenOrders { user_id, reply })
			.await
	}

	pub async fn book_top(&self, sku: SkuId) -> Result<BookTop, ExchangeError> {
		self.submit(|reply| ExchangeCommand::GetBookTop { sku, reply })
			.await
	}

	pub async fn trades(&self, sku: SkuId, limit: usize) -> Result<Vec<TradeView>, ExchangeError> {
		self.submit(|reply| ExchangeCommand::GetTrades { sku, limit, reply })
			.await
	}

	pub async fn book_snapshot(
		&self,
		sku: SkuId,
		depth: usize,
	) -> Result<BookSnapshot, ExchangeError> {
		self.submit(|reply| ExchangeCommand::GetBookSnapshot { sku, depth, reply })
			.await
	}
}
