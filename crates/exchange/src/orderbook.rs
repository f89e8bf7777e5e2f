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

use std::cmp::Reverse;
use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};

use cardex_sdk::{BookLevel, BookSnapshot, BookTop, OrderId, OrderStatus, Side, SkuId};

use crate::types::{Order, OrderTable};

/// Back-reference from a resting order to its book position
///
/// The price pins down the level directly, so targeted removal never
/// scans the other levels. The book clears this reference on every path
/// that takes the order out; an order with `book_ref == None` is not
/// resting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRef {
	pub price_cents: u64,
}

/// Price level in the order book
///
/// Holds the ids of all resting orders at one price in strict arrival
/// order (first-in-first-out). The orders themselves live in the
/// exchange order table.
#[derive(Debug, Clone)]
struct PriceLevel {
	price_cents: u64,
	orders: VecDeque<OrderId>,
}

impl PriceLevel {
	fn new(price_cents: u64) -> Self {
		Self {
			price_cents,
			orders: VecDeque::new(),
		}
	}

	fn push_back(&mut self, order_id: OrderId) {
		self.orders.push_back(order_id);
	}

	fn remove(&mut self, order_id: OrderId) -> bool {
		if let Some(pos) = self.orders.iter().position(|id| *id == order_id) {
			self.orders.remove(pos);
			true
		} else {
			false
		}
	}

	fn front(&self) -> Option<OrderId> {
		self.orders.front().copied()
	}

	fn pop_front(&mut self) -> Option<OrderId> {
		self.orders.pop_front()
	}

	fn is_empty(&self) -> bool {
		self.orders.is_empty()
	}

	fn order_count(&self) -> usize {
		self.orders.len()
	}
}

/// Limit order book for one SKU (single-threaded)
///
/// Deterministic, single-threaded book using BTreeMap for price-sorted
/// levels; all operations are called from the command loop.
///
/// Design characteristics:
/// - No concurrent access (no locks, no Arc)
/// - Price-time priority enforced
/// - Buy side: highest price first (descending order via Reverse wrapper)
/// - Sell side: lowest price first (ascending order, natural BTreeMap order)
/// - Empty price levels are removed immediately
#[derive(Debug, Clone)]
pub struct OrderBook {
	sku: SkuId,
	/// Buy side: price (high to low) -> PriceLevel
	bids: BTreeMap<Reverse<u64>, PriceLevel>,
	/// Sell side: price (low to high) -> PriceLevel
	asks: BTreeMap<u64, PriceLevel>,
}

impl OrderBook {
	pub fn new(sku: SkuId) -> Self {
		Self {
			sku,
			bids: BTreeMap::new(),
			asks: BTreeMap::new(),
		}
	}

	pub fn sku(&self) -> &SkuId {
		&self.sku
	}

	/// Insert an order at the tail of its price level's queue
	///
	/// Callers only add open orders with positive remaining quantity;
	/// the order's back-reference is recorded here.
	pub fn add(&mut self, order: &mut Order) {
		debug_assert!(order.is_open() && order.qty_remaining > 0);
		let price = order.limit_price_cents;
		let level = match order.side {
			Side::Buy => self
				.bids
				.entry(Reverse(price))
				.or_insert_with(|| PriceLevel::new(price)),
			Side::Sell => self
				.asks
				.entry(price)
				.or_insert_with(|| PriceLevel::new(price)),
		};
		level.push_back(order.id);
		order.book_ref = Some(BookRef { price_cents: price });
	}

	/// Remove a resting order via its back-reference
	///
	/// Returns false if the order carries no back-reference (it is not
	/// resting). The level is dropped when it becomes empty and the
	/// order's back-reference is cleared on success.
	pub fn remove(&mut self, order: &mut Order) -> bool {
		let Some(book_ref) = &order.book_ref else {
			return false;
		};
		let price = book_ref.price_cents;

		let removed = match order.side {
			Side::Buy => {
				if let Some(level) = self.bids.get_mut(&Reverse(price)) {
					let removed = level.remove(order.id);
					if level.is_empty() {
						self.bids.remove(&Reverse(price));
					}
					removed
				} else {
					false
				}
			}
			Side::Sell => {
				if let Some(level) = self.asks.get_mut(&price) {
					let removed = level.remove(order.id);
					if level.is_empty() {
						self.asks.remove(&price);
					}
					removed
				} else {
					false
				}
			}
		};

		if removed {
			order.book_ref = None;
		}
		removed
	}

	/// Front order of the best price level opposite to `incoming_side`
	pub fn peek_best_opposite(&self, incoming_side: Side) -> Option<OrderId> {
		match incoming_side {
			Side::Buy => self.asks.first_key_value().and_then(|(_, l)| l.front()),
			Side::Sell => self.bids.first_key_value().and_then(|(_, l)| l.front()),
		}
	}

	/// Price of the best level opposite to `incoming_side`
	pub fn best_opposite_price(&self, incoming_side: Side) -> Option<u64> {
		match incoming_side {
			Side::Buy => self.asks.first_key_value().map(|(price, _)| *price),
			Side::Sell => self.bids.first_key_value().map(|(price, _)| price.0),
		}
	}

	/// Dequeue the front order of the best opposite level
	///
	/// The emptied level is dropped and the dequeued order's
	/// back-reference is cleared through the order table.
	pub fn pop_best_opposite_front(
		&mut self,
		incoming_side: Side,
		orders: &mut OrderTable,
	) -> Option<OrderId> {
		let popped = match incoming_side {
			Side::Buy => {
				let mut entry = self.asks.first_entry()?;
				let id = entry.get_mut().pop_front();
				if entry.get().is_empty() {
					entry.remove();
				}
				id
			}
			Side::Sell => {
				let mut entry = self.bids.first_entry()?;
				let id = entry.get_mut().pop_front();
				if entry.get().is_empty() {
					entry.remove();
				}
				id
			}
		};

		if let Some(id) = popped
			&& let Some(order) = orders.get_mut(&id)
		{
			order.book_ref = None;
		}
		popped
	}

	/// Best bid and best ask prices; either may be absent
	pub fn best_bid_ask(&self) -> (Option<u64>, Option<u64>) {
		let bid = self.bids.first_key_value().map(|(price, _)| price.0);
		let ask = self.asks.first_key_value().map(|(price, _)| *price);
		(bid, ask)
	}

	pub fn book_top(&self) -> BookTop {
		let (best_bid_cents, best_ask_cents) = self.best_bid_ask();
		BookTop {
			sku: self.sku.clone(),
			best_bid_cents,
			best_ask_cents,
		}
	}

	/// Depth-limited aggregate view of both sides
	///
	/// Reports the first `depth` levels per side with their aggregate
	/// open remaining quantity and resting-order count; levels whose
	/// aggregate quantity is zero are excluded. Read-only.
	pub fn snapshot(&self, depth: usize, orders: &OrderTable) -> BookSnapshot {
		let bids = Self::side_levels(self.bids.values(), depth, orders);
		let asks = Self::side_levels(self.asks.values(), depth, orders);
		BookSnapshot {
			sku: self.sku.clone(),
			bids,
			asks,
		}
	}

	fn side_levels<'a>(
		levels: impl Iterator<Item = &'a PriceLevel>,
		depth: usize,
		orders: &OrderTable,
	) -> Vec<BookLevel> {
		levels
			.take(depth)
			.filter_map(|level| {
				let qty: u64 = level
					.orders
					.iter()
					.filter_map(|id| orders.get(id))
					.filter(|o| o.status == OrderStatus::Open)
					.map(|o| o.qty_remaining)
					.sum();
				(qty > 0).then(|| BookLevel {
					price_cents: level.price_cents,
					qty,
					orders: level.order_count(),
				})
			})
			.collect()
	}

	/// Total number of resting orders in the book
	pub fn order_count(&self) -> usize {
		let bid_count: usize = self.bids.values().map(|l| l.order_count()).sum();
		let ask_count: usize = self.asks.values().map(|l| l.order_count()).sum();
		bid_count + ask_count
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use uuid::Uuid;

	fn create_test_order(side: Side, price: u64, qty: u64, seq: u64) -> Order {
		Order::new(
			Uuid::new_v4(),
			SkuId::from("PKM-SV151-BB-EN"),
			side,
			price,
			qty,
			seq,
		)
	}

	fn book() -> OrderBook {
		OrderBook::new(SkuId::from("PKM-SV151-BB-EN"))
	}

	#[test]
	fn test_add_and_remove_order() {
		let mut book = book();
		let mut orders = OrderTable::new();

		let mut order = create_test_order(Side::Buy, 500, 1, 1);
		book.add(&mut order);
		assert_eq!(order.book_ref, Some(BookRef { price_cents: 500 }));
		let id = order.id;
		orders.insert(id, order);

		assert_eq!(book.best_bid_ask().0, Some(500));
		assert_eq!(book.order_count(), 1);

		let order = orders.get_mut(&id).unwrap();
		assert!(book.remove(order));
		assert!(order.book_ref.is_none());
		assert_eq!(book.order_count(), 0);
		assert_eq!(book.best_bid_ask().0, None);
	}

	#[test]
	fn test_remove_without_book_ref_fails() {
		let mut book = book();
		let mut order = create_test_order(Side::Sell, 500, 1, 1);
		assert!(!book.remove(&mut order));
	}

	#[test]
	fn test_price_priority() {
		let mut book = book();
		let mut orders = OrderTable::new();

		for price in [500, 510, 490] {
			let mut order = create_test_order(Side::Buy, price, 1, price);
			book.add(&mut order);
			orders.insert(order.id, order);
		}

		// Best bid is the highest price, best opposite for a seller too
		assert_eq!(book.best_bid_ask().0, Some(510));
		assert_eq!(book.best_opposite_price(Side::Sell), Some(510));

		let mut ask = create_test_order(Side::Sell, 495, 1, 600);
		book.add(&mut ask);
		orders.insert(ask.id, ask);
		assert_eq!(book.best_opposite_price(Side::Buy), Some(495));
	}

	#[test]
	fn test_time_priority_at_same_price() {
		let mut book = book();
		let mut orders = OrderTable::new();
		let mut ids = Vec::new();

		for seq in 1..=3 {
			let mut order = create_test_order(Side::Sell, 500, 1, seq);
			book.add(&mut order);
			ids.push(order.id);
			orders.insert(order.id, order);
		}

		assert_eq!(book.peek_best_opposite(Side::Buy), Some(ids[0]));

		let popped = book.pop_best_opposite_front(Side::Buy, &mut orders);
		assert_eq!(popped, Some(ids[0]));
		assert!(orders[&ids[0]].book_ref.is_none());

		assert_eq!(book.peek_best_opposite(Side::Buy), Some(ids[1]));
	}

	#[test]
	fn test_pop_drops_empty_level() {
		let mut book = book();
		let mut orders = OrderTable::new();

		let mut order = create_test_order(Side::Sell, 500, 1, 1);
		book.add(&mut order);
		orders.insert(order.id, order);

		book.pop_best_opposite_front(Side::Buy, &mut orders);
		assert_eq!(book.best_bid_ask().1, None);
		assert_eq!(book.order_count(), 0);
	}

	#[test]
	fn test_snapshot_aggregates_levels() {
		let mut book = book();
		let mut orders = OrderTable::new();

		for (price, qty, seq) in [(500, 1, 1), (500, 2, 2), (490, 3, 3)] {
			let mut order = create_test_order(Side::Buy, price, qty, seq);
			book.add(&mut order);
			orders.insert(order.id, order);
		}

		let snapshot = book.snapshot(20, &orders);
		assert_eq!(
			snapshot.bids,
			vec![
				BookLevel {
					price_cents: 500,
					qty: 3,
					orders: 2
				},
				BookLevel {
					price_cents: 490,
					qty: 3,
					orders: 1
				},
			]
		);
		assert!(snapshot.asks.is_empty());
	}

	#[test]
	fn test_snapshot_respects_depth() {
		let mut book = book();
		let mut orders = OrderTable::new();

		for price in [500, 490, 480] {
			let mut order = create_test_order(Side::Buy, price, 1, price);
			book.add(&mut order);
			orders.insert(order.id, order);
		}

		let snapshot = book.snapshot(2, &orders);
		assert_eq!(snapshot.bids.len(), 2);
		assert_eq!(snapshot.bids[0].price_cents, 500);
		assert_eq!(snapshot.bids[1].price_cents, 490);
	}
}
