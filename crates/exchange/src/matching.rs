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

//! Crossing and settlement
//!
//! The matching loop crosses an incoming limit order against the best
//! resting opposite orders under price-time priority, settling each fill
//! by moving held cash and inventory between the two accounts. Execution
//! price is always the maker's limit price, so price improvement accrues
//! to the resting order's counterparty and is refunded to the buyer per
//! fill.

use std::collections::HashMap;

use tracing::{debug, warn};

use cardex_sdk::{OrderStatus, Side, SkuId, UserId};

use crate::error::ExchangeError;
use crate::ledger::Account;
use crate::orderbook::OrderBook;
use crate::types::{Order, OrderTable, Trade};

/// Cash required to hold for a buy order slice
pub(crate) fn required_cash_hold(limit_price_cents: u64, qty: u64) -> Result<u64, ExchangeError> {
	limit_price_cents
		.checked_mul(qty)
		.ok_or(ExchangeError::AmountOverflow)
}

/// Cross `taker` against the book until its price gate fails or a side
/// runs dry
///
/// Mutates the taker in place, fills resting makers through the order
/// table, settles every fill and appends the resulting trades. The
/// caller rests the taker afterwards if quantity remains.
pub(crate) fn run_matching(
	book: &mut OrderBook,
	orders: &mut OrderTable,
	accounts: &mut HashMap<UserId, Account>,
	trades: &mut Vec<Trade>,
	taker: &mut Order,
) -> Result<(), ExchangeError> {
	while taker.qty_remaining > 0 {
		let Some(maker_id) = book.peek_best_opposite(taker.side) else {
			break;
		};

		// A resting entry must be an open order with quantity left; drop
		// strays and retry (cancelled or filled orders never stay in the
		// book, so this only fires if that invariant broke elsewhere).
		let (maker_price, maker_remaining, maker_user) = match orders.get(&maker_id) {
			Some(order) if order.is_open() && order.qty_remaining > 0 => {
				(order.limit_price_cents, order.qty_remaining, order.user_id)
			}
			_ => {
				warn!(
					target: "engine",
					"dropping stale book entry {} from {} book",
					maker_id,
					book.sku()
				);
				book.pop_best_opposite_front(taker.side, orders);
				continue;
			}
		};

		let crosses = match taker.side {
			Side::Buy => maker_price <= taker.limit_price_cents,
			Side::Sell => maker_price >= taker.limit_price_cents,
		};
		if !crosses {
			break;
		}

		let qty = taker.qty_remaining.min(maker_remaining);

		// Buyer/seller roles depend on which side the taker is on; the
		// buyer's own limit determines what was held for this slice.
		let (buy_order_id, buy_limit, buyer, sell_order_id, seller) = match taker.side {
			Side::Buy => (
				taker.id,
				taker.limit_price_cents,
				taker.user_id,
				maker_id,
				maker_user,
			),
			Side::Sell => (
				maker_id,
				maker_price,
				maker_user,
				taker.id,
				taker.user_id,
			),
		};

		settle_fill(accounts, &taker.sku, buyer, seller, buy_limit, maker_price, qty)?;

		let maker_exhausted = {
			let maker = orders
				.get_mut(&maker_id)
				.ok_or(ExchangeError::InvariantViolated("maker vanished mid-fill"))?;
			maker.qty_remaining -= qty;
			if maker.qty_remaining == 0 {
				maker.status = OrderStatus::Filled;
				true
			} else {
				false
			}
		};
		if maker_exhausted {
			book.pop_best_opposite_front(taker.side, orders);
		}

		taker.qty_remaining -= qty;
		if taker.qty_remaining == 0 {
			taker.status = OrderStatus::Filled;
		}

		let trade = Trade::new(taker.sku.clone(), maker_price, qty, buy_order_id, sell_order_id);
		debug!(
			target: "engine",
			"trade {} on {}: {} @ {} (buy {}, sell {})",
			trade.id, trade.sku, trade.qty, trade.price_cents, buy_order_id, sell_order_id
		);
		trades.push(trade);
	}

	Ok(())
}

/// Settle one fill between buyer and seller
///
/// The buyer reserved `buy_limit x qty` for this slice at placement
/// time; the fill costs `exec_price x qty`, and the difference (price
/// improvement) is released back to the buyer's available cash
/// immediately, per fill. Inventory moves from the seller's held pool to
/// the buyer's available pool, cash from the buyer's held pool to the
/// seller's available pool.
///
/// Buyer and seller may be the same account; operations then apply to it
/// sequentially.
fn settle_fill(
	accounts: &mut HashMap<UserId, Account>,
	sku: &SkuId,
	buyer: UserId,
	seller: UserId,
	buy_limit: u64,
	exec_price: u64,
	qty: u64,
) -> Result<(), ExchangeError> {
	let notional = exec_price
		.checked_mul(qty)
		.ok_or(ExchangeError::AmountOverflow)?;
	let held_at_limit = buy_limit
		.checked_mul(qty)
		.ok_or(ExchangeError::AmountOverflow)?;
	let refund = held_at_limit
		.checked_sub(notional)
		.ok_or(ExchangeError::InvariantViolated(
			"execution price above buyer limit",
		))?;

	{
		let buyer = accounts
			.get_mut(&buyer)
			.ok_or(ExchangeError::InvariantViolated("buyer account missing"))?;
		buyer.pay_from_held(notional)?;
		if refund > 0 {
			buyer.release_cash(refund)?;
		}
		buyer.credit_inventory(sku, qty)?;
	}

	{
		let seller = accounts
			.get_mut(&seller)
			.ok_or(ExchangeError::InvariantViolated("seller account missing"))?;
		seller.consume_held_inventory(sku, qty)?;
		seller.receive_cash(notional)?;
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use uuid::Uuid;

	fn funded_accounts(
		buyer: UserId,
		seller: UserId,
		sku: &SkuId,
		cash_held: u64,
		inv_held: u64,
	) -> HashMap<UserId, Account> {
		let mut accounts = HashMap::new();

		let mut buyer_acct = Account::new(buyer);
		buyer_acct.deposit_cash(cash_held).unwrap();
		buyer_acct.try_hold_cash(cash_held).unwrap();
		accounts.insert(buyer, buyer_acct);

		let mut seller_acct = Account::new(seller);
		seller_acct.deposit_inventory(sku, inv_held).unwrap();
		seller_acct.try_hold_inventory(sku, inv_held).unwrap();
		accounts.insert(seller, seller_acct);

		accounts
	}

	#[test]
	fn test_required_cash_hold_overflow_is_loud() {
		assert_eq!(
			required_cash_hold(u64::MAX, 2),
			Err(ExchangeError::AmountOverflow)
		);
		assert_eq!(required_cash_hold(1_000, 3), Ok(3_000));
	}

	#[test]
	fn test_settle_fill_moves_cash_and_inventory() {
		let sku = SkuId::from("X");
		let buyer = Uuid::new_v4();
		let seller = Uuid::new_v4();
		// Buyer held 3 x 1000 for the slice, fill executes at 900
		let mut accounts = funded_accounts(buyer, seller, &sku, 3_000, 3);

		settle_fill(&mut accounts, &sku, buyer, seller, 1_000, 900, 3).unwrap();

		let buyer_acct = &accounts[&buyer];
		assert_eq!(buyer_acct.cash_held_cents(), 0);
		assert_eq!(buyer_acct.cash_available_cents(), 300); // price improvement
		assert_eq!(buyer_acct.qty_available(&sku), 3);

		let seller_acct = &accounts[&seller];
		assert_eq!(seller_acct.qty_held(&sku), 0);
		assert_eq!(seller_acct.cash_available_cents(), 2_700);
	}

	#[test]
	fn test_settle_fill_without_improvement_refunds_nothing() {
		let sku = SkuId::from("X");
		let buyer = Uuid::new_v4();
		let seller = Uuid::new_v4();
		let mut accounts = funded_accounts(buyer, seller, &sku, 2_000, 2);

		settle_fill(&mut accounts, &sku, buyer, seller, 1_000, 1_000, 2).unwrap();

		let buyer_acct = &accounts[&buyer];
		assert_eq!(buyer_acct.cash_available_cents(), 0);
		assert_eq!(buyer_acct.cash_held_cents(), 0);
	}

	#[test]
	fn test_settle_fill_self_trade() {
		let sku = SkuId::from("X");
		let user = Uuid::new_v4();
		let mut accounts = HashMap::new();

		let mut acct = Account::new(user);
		acct.deposit_cash(1_000).unwrap();
		acct.try_hold_cash(1_000).unwrap();
		acct.deposit_inventory(&sku, 1).unwrap();
		acct.try_hold_inventory(&sku, 1).unwrap();
		accounts.insert(user, acct);

		settle_fill(&mut accounts, &sku, user, user, 1_000, 1_000, 1).unwrap();

		let acct = &accounts[&user];
		// Paid itself: cash and inventory land back in the available pools
		assert_eq!(acct.cash_available_cents(), 1_000);
		assert_eq!(acct.cash_held_cents(), 0);
		assert_eq!(acct.qty_available(&sku), 1);
		assert_eq!(acct.qty_held(&sku), 0);
	}
}
