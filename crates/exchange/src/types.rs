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

use std::collections::HashMap;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cardex_sdk::{OrderId, OrderStatus, OrderView, Side, SkuId, TradeId, TradeView, UserId};

use crate::orderbook::BookRef;

/// The exchange state's order table: every order ever created, keyed by id
pub type OrderTable = HashMap<OrderId, Order>;

/// Internal order representation for the matching engine
///
/// Owned by the exchange state's order table; while resting, the order
/// book holds its id and the order carries a back-reference to its book
/// position. Identity fields never change after creation; only
/// `qty_remaining`, `status` and `book_ref` are mutated, and only inside
/// the single-writer command loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
	pub id: OrderId,
	pub user_id: UserId,
	pub sku: SkuId,
	pub side: Side,
	pub limit_price_cents: u64,
	pub qty_total: u64,
	/// Decreases monotonically toward zero as fills execute
	pub qty_remaining: u64,
	pub status: OrderStatus,
	/// Time-priority tie-breaker, assigned from the exchange sequence counter
	pub created_seq: u64,
	/// Present exactly while the order rests in a book
	pub book_ref: Option<BookRef>,
}

impl Order {
	pub fn new(
		user_id: UserId,
		sku: SkuId,
		side: Side,
		limit_price_cents: u64,
		qty: u64,
		created_seq: u64,
	) -> Self {
		Self {
			id: Uuid::new_v4(),
			user_id,
			sku,
			side,
			limit_price_cents,
			qty_total: qty,
			qty_remaining: qty,
			status: OrderStatus::Open,
			created_seq,
			book_ref: None,
		}
	}

	pub fn is_open(&self) -> bool {
		self.status == OrderStatus::Open
	}

	pub fn to_view(&self) -> OrderView {
		OrderView {
			order_id: self.id,
			user_id: self.user_id,
			sku: self.sku.clone(),
			side: self.side,
			limit_price_cents: self.limit_price_cents,
			qty_total: self.qty_total,
			qty_remaining: self.qty_remaining,
			status: self.status,
			created_seq: self.created_seq,
		}
	}
}

/// Immutable record of one match
///
/// Appended to the exchange trade log in execution order and never
/// mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
	pub id: TradeId,
	pub sku: SkuId,
	/// Execution price: the resting (maker) order's limit price
	pub price_cents: u64,
	pub qty: u64,
	pub buy_order_id: OrderId,
	pub sell_order_id: OrderId,
	/// Epoch milliseconds
	pub timestamp: u64,
}

impl Trade {
	pub fn new(
		sku: SkuId,
		price_cents: u64,
		qty: u64,
		buy_order_id: OrderId,
		sell_order_id: OrderId,
	) -> Self {
		Self {
			id: Uuid::new_v4(),
			sku,
			price_cents,
			qty,
			buy_order_id,
			sell_order_id,
			timestamp: timestamp_ms(),
		}
	}

	pub fn to_view(&self) -> TradeView {
		TradeView {
			trade_id: self.id,
			sku: self.sku.clone(),
			price_cents: self.price_cents,
			qty: self.qty,
			buy_order_id: self.buy_order_id,
			sell_order_id: self.sell_order_id,
			timestamp: self.timestamp,
		}
	}
}

/// Current time as epoch milliseconds
pub fn timestamp_ms() -> u64 {
	SystemTime::now()
		.duration_since(SystemTime::UNIX_EPOCH)
		.map(|d| d.as_millis() as u64)
		.unwrap_or(0)
}
