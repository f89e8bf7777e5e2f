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

use tracing::info;

use cardex_sdk::{
	BalanceView, BookSnapshot, BookTop, CashBalances, InventoryDeposit, OrderId, OrderStatus,
	OrderView, Side, SkuId, TradeView, UserId,
};

use crate::error::ExchangeError;
use crate::ledger::Account;
use crate::matching;
use crate::orderbook::OrderBook;
use crate::types::{Order, OrderTable, Trade};

/// Complete state of the exchange
///
/// Owns the account table, the order table, one order book per SKU, the
/// append-only trade log and the creation sequence counter. The state is
/// owned by the command loop thread and mutated by nothing else; every
/// public operation here corresponds to one command and runs to
/// completion before the next one starts.
pub struct ExchangeState {
	accounts: HashMap<UserId, Account>,
	orders: OrderTable,
	books: HashMap<SkuId, OrderBook>,
	trades: Vec<Trade>,
	/// Next creation sequence number; strictly increasing, one per placed order
	next_seq: u64,
}

impl ExchangeState {
	pub fn new() -> Self {
		Self {
			accounts: HashMap::new(),
			orders: OrderTable::new(),
			books: HashMap::new(),
			trades: Vec::new(),
			next_seq: 1,
		}
	}

	fn get_or_create_account(&mut self, user_id: UserId) -> &mut Account {
		self.accounts
			.entry(user_id)
			.or_insert_with(|| Account::new(user_id))
	}

	/// Credit a user's available cash
	pub fn deposit_cash(
		&mut self,
		user_id: UserId,
		cents: u64,
	) -> Result<CashBalances, ExchangeError> {
		let account = self.get_or_create_account(user_id);
		account.deposit_cash(cents)?;
		Ok(CashBalances {
			user_id,
			cash_available_cents: account.cash_available_cents(),
			cash_held_cents: account.cash_held_cents(),
		})
	}

	/// Credit a user's available inventory of a SKU
	pub fn deposit_inventory(
		&mut self,
		user_id: UserId,
		sku: SkuId,
		qty: u64,
	) -> Result<InventoryDeposit, ExchangeError> {
		let account = self.get_or_create_account(user_id);
		account.deposit_inventory(&sku, qty)?;
		Ok(InventoryDeposit {
			user_id,
			cash_available_cents: account.cash_available_cents(),
			qty_available: account.qty_available(&sku),
			qty_held: account.qty_held(&sku),
			sku,
		})
	}

	/// Balance view for a user; unknown users report `exists = false`
	pub fn balance(&self, user_id: UserId) -> BalanceView {
		match self.accounts.get(&user_id) {
			Some(account) => BalanceView {
				user_id,
				exists: true,
				cash_available_cents: account.cash_available_cents(),
				cash_held_cents: account.cash_held_cents(),
				inventory: account.inventory_snapshot().collect(),
			},
			None => BalanceView {
				user_id,
				exists: false,
				cash_available_cents: 0,
				cash_held_cents: 0,
				inventory: Vec::new(),
			},
		}
	}

	/// Place a limit order: hold, create, match, rest the remainder
	///
	/// The hold is attempted first; if it fails the order is rejected
	/// before any order object exists. Creation, matching, settlement
	/// and book insertion then all happen inside this one call, so no
	/// partially placed order is ever observable.
	pub fn place_limit_order(
		&mut self,
		user_id: UserId,
		sku: SkuId,
		side: Side,
		limit_price_cents: u64,
		qty: u64,
	) -> Result<OrderView, ExchangeError> {
		if limit_price_cents == 0 {
			return Err(ExchangeError::InvalidPrice);
		}
		if qty == 0 {
			return Err(ExchangeError::InvalidQuantity);
		}

		match side {
			Side::Buy => {
				let cost = matching::required_cash_hold(limit_price_cents, qty)?;
				self.get_or_create_account(user_id).try_hold_cash(cost)?;
			}
			Side::Sell => {
				self.get_or_create_account(user_id)
					.try_hold_inventory(&sku, qty)?;
			}
		}

		let seq = self.next_seq;
		self.next_seq += 1;
		let mut order = Order::new(user_id, sku.clone(), side, limit_price_cents, qty, seq);
		info!(
			target: "engine",
			"order {} placed: {:?} {} {} @ {} (seq {})",
			order.id, side, qty, sku, limit_price_cents, seq
		);

		let Self {
			accounts,
			orders,
			books,
			trades,
			..
		} = self;
		let book = books
			.entry(sku.clone())
			.or_insert_with(|| OrderBook::new(sku));

		let result = matching::run_matching(book, orders, accounts, trades, &mut order);
		if result.is_ok() && order.qty_remaining > 0 && order.is_open() {
			book.add(&mut order);
		}

		// Register the order whether matching succeeded or faulted: its
		// hold is live, so it must stay addressable (and cancellable).
		let view = order.to_view();
		orders.insert(order.id, order);
		result?;
		Ok(view)
	}

	/// Cancel an open order owned by `user_id`
	///
	/// Releases the outstanding hold, removes the order from its book if
	/// resting, and marks it cancelled. Unknown, foreign and non-open
	/// orders are refusals.
	pub fn cancel_order(
		&mut self,
		user_id: UserId,
		order_id: OrderId,
	) -> Result<OrderId, ExchangeError> {
		let Self {
			accounts,
			orders,
			books,
			..
		} = self;

		let order = orders.get_mut(&order_id).ok_or(ExchangeError::OrderNotFound)?;
		if order.user_id != user_id {
			return Err(ExchangeError::NotOrderOwner);
		}
		if !order.is_open() {
			return Err(ExchangeError::OrderNotOpen);
		}

		let account = accounts
			.get_mut(&user_id)
			.ok_or(ExchangeError::InvariantViolated("account missing for open order"))?;
		match order.side {
			Side::Buy => {
				let outstanding =
					matching::required_cash_hold(order.limit_price_cents, order.qty_remaining)?;
				account.release_cash(outstanding)?;
			}
			Side::Sell => {
				account.release_inventory(&order.sku, order.qty_remaining)?;
			}
		}

		if order.book_ref.is_some()
			&& let Some(book) = books.get_mut(&order.sku)
		{
			book.remove(order);
		}
		order.status = OrderStatus::Cancelled;
		info!(target: "engine", "order {} cancelled", order_id);
		Ok(order_id)
	}

	/// All of a user's open orders, in creation order
	pub fn open_orders(&self, user_id: UserId) -> Vec<OrderView> {
		let mut open: Vec<OrderView> = self
			.orders
			.values()
			.filter(|o| o.user_id == user_id && o.is_open())
			.map(Order::to_view)
			.collect();
		open.sort_by_key(|o| o.created_seq);
		open
	}

	/// Best bid/ask for a SKU; an unseen SKU has an empty book
	pub fn book_top(&self, sku: SkuId) -> BookTop {
		match self.books.get(&sku) {
			Some(book) => book.book_top(),
			None => BookTop {
				sku,
				best_bid_cents: None,
				best_ask_cents: None,
			},
		}
	}

	/// The most recent `limit` trades for a SKU, oldest-first
	pub fn recent_trades(&self, sku: &SkuId, limit: usize) -> Vec<TradeView> {
		let for_sku: Vec<&Trade> = self.trades.iter().filter(|t| t.sku == *sku).collect();
		let start = for_sku.len().saturating_sub(limit);
		for_sku[start..].iter().map(|t| t.to_view()).collect()
	}

	/// Depth-limited book snapshot; an unseen SKU reports empty sides
	pub fn book_snapshot(&self, sku: SkuId, depth: usize) -> BookSnapshot {
		match self.books.get(&sku) {
			Some(book) => book.snapshot(depth, &self.orders),
			None => BookSnapshot {
				sku,
				bids: Vec::new(),
				asks: Vec::new(),
			},
		}
	}
}

impl Default for ExchangeState {
	fn default() -> Self {
		Self::new()
	}
}
