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

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User identifier
pub type UserId = Uuid;

/// Order identifier
pub type OrderId = Uuid;

/// Trade identifier
pub type TradeId = Uuid;

/// Identifier for a tradeable instrument (a card SKU)
///
/// String-backed and opaque: the exchange never interprets the contents,
/// it only compares and orders them. Catalog metadata for a SKU lives
/// outside the core.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkuId(String);

impl SkuId {
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for SkuId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for SkuId {
	fn from(value: &str) -> Self {
		Self(value.to_string())
	}
}

/// Order side (buy or sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
	Buy,
	Sell,
}

impl Side {
	/// The side a resting counterparty order sits on
	pub fn opposite(self) -> Side {
		match self {
			Side::Buy => Side::Sell,
			Side::Sell => Side::Buy,
		}
	}
}

/// Order status
///
/// `Filled` and `Cancelled` are both terminal; a partially filled order
/// stays `Open` until its remaining quantity reaches zero or it is
/// cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
	Open,
	Filled,
	Cancelled,
}

/// Cash balances after a deposit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashBalances {
	pub user_id: UserId,
	pub cash_available_cents: u64,
	pub cash_held_cents: u64,
}

/// Balances reported after an inventory deposit: cash plus the touched SKU
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryDeposit {
	pub user_id: UserId,
	pub sku: SkuId,
	pub cash_available_cents: u64,
	pub qty_available: u64,
	pub qty_held: u64,
}

/// One SKU line of an account's inventory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryLine {
	pub sku: SkuId,
	pub qty_available: u64,
	pub qty_held: u64,
}

/// Full balance view for a user
///
/// `exists` is false for users the exchange has never seen; the balance
/// fields are zeroed in that case rather than the query failing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceView {
	pub user_id: UserId,
	pub exists: bool,
	pub cash_available_cents: u64,
	pub cash_held_cents: u64,
	pub inventory: Vec<InventoryLine>,
}

/// Order state as reported to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderView {
	pub order_id: OrderId,
	pub user_id: UserId,
	pub sku: SkuId,
	pub side: Side,
	pub limit_price_cents: u64,
	pub qty_total: u64,
	pub qty_remaining: u64,
	pub status: OrderStatus,
	pub created_seq: u64,
}

/// One executed trade
///
/// The price is the resting (maker) order's limit price. Timestamps are
/// epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeView {
	pub trade_id: TradeId,
	pub sku: SkuId,
	pub price_cents: u64,
	pub qty: u64,
	pub buy_order_id: OrderId,
	pub sell_order_id: OrderId,
	pub timestamp: u64,
}

/// Best bid/ask for a SKU; either side may be absent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookTop {
	pub sku: SkuId,
	pub best_bid_cents: Option<u64>,
	pub best_ask_cents: Option<u64>,
}

/// One aggregated price level of a book snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookLevel {
	pub price_cents: u64,
	pub qty: u64,
	pub orders: usize,
}

/// Depth-limited view of both book sides
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSnapshot {
	pub sku: SkuId,
	pub bids: Vec<BookLevel>,
	pub asks: Vec<BookLevel>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_sku_id_is_transparent_in_json() {
		let sku = SkuId::new("PKM-SV151-BB-EN");
		let json = serde_json::to_string(&sku).unwrap();
		assert_eq!(json, "\"PKM-SV151-BB-EN\"");

		let back: SkuId = serde_json::from_str(&json).unwrap();
		assert_eq!(back, sku);
	}

	#[test]
	fn test_side_opposite() {
		assert_eq!(Side::Buy.opposite(), Side::Sell);
		assert_eq!(Side::Sell.opposite(), Side::Buy);
	}

	#[test]
	fn test_side_serializes_lowercase() {
		assert_eq!(serde_json::to_string(&Side::Buy).unwrap(), "\"buy\"");
		assert_eq!(
			serde_json::to_string(&OrderStatus::Cancelled).unwrap(),
			"\"cancelled\""
		);
	}
}
