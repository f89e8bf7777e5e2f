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

use crate::error::ExchangeError;

/// Single-assignment reply slot carried by every command
///
/// The command loop resolves it exactly once; a caller that has
/// abandoned the receiving end simply never observes the result, which
/// does not affect engine state.
pub type Reply<T> = oneshot::Sender<Result<T, ExchangeError>>;

/// The closed set of commands the exchange executes
///
/// Every mutating and querying operation flows through this type and is
/// exhaustively matched in the command loop, so a missing handler for a
/// new command is a compile error rather than a runtime surprise.
#[derive(Debug)]
pub enum ExchangeCommand {
	DepositCash {
		user_id: UserId,
		cents: u64,
		reply: Reply<CashBalances>,
	},
	DepositInventory {
		user_id: UserId,
		sku: SkuId,
		qty: u64,
		reply: Reply<InventoryDeposit>,
	},
	GetBalance {
		user_id: UserId,
		reply: Reply<BalanceView>,
	},
	PlaceLimitOrder {
		user_id: UserId,
		sku: SkuId,
		side: Side,
		limit_price_cents: u64,
		qty: u64,
		reply: Reply<OrderView>,
	},
	CancelOrder {
		user_id: UserId,
		order_id: OrderId,
		reply: Reply<OrderId>,
	},
	ListOpenOrders {
		user_id: UserId,
		reply: Reply<Vec<OrderView>>,
	},
	GetBookTop {
		sku: SkuId,
		reply: Reply<BookTop>,
	},
	GetTrades {
		sku: SkuId,
		limit: usize,
		reply: Reply<Vec<TradeView>>,
	},
	GetBookSnapshot {
		sku: SkuId,
		depth: usize,
		reply: Reply<BookSnapshot>,
	},
}

impl ExchangeCommand {
	/// Command name for log lines
	pub fn name(&self) -> &'static str {
		match self {
			ExchangeCommand::DepositCash { .. } => "deposit_cash",
			ExchangeCommand::DepositInventory { .. } => "deposit_inventory",
			ExchangeCommand::GetBalance { .. } => "get_balance",
			ExchangeCommand::PlaceLimitOrder { .. } => "place_limit_order",
			ExchangeCommand::CancelOrder { .. } => "cancel_order",
			ExchangeCommand::ListOpenOrders { .. } => "list_open_orders",
			ExchangeCommand::GetBookTop { .. } => "get_book_top",
			ExchangeCommand::GetTrades { .. } => "get_trades",
			ExchangeCommand::GetBookSnapshot { .. } => "get_book_snapshot",
		}
	}
}
