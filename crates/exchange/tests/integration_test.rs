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

//! Integration tests for the exchange engine
//!
//! These tests drive the full stack: commands enter through the handle,
//! cross the bounded queue, execute on the single-writer loop and come
//! back through their reply slots.

use cardex_exchange::{ExchangeConfig, ExchangeEngine, ExchangeError, ExchangeHandle};
use cardex_sdk::{OrderStatus, Side, SkuId};
use uuid::Uuid;

fn sku() -> SkuId {
	SkuId::from("PKM-SV151-BB-EN")
}

fn start_engine() -> (ExchangeEngine, ExchangeHandle) {
	ExchangeEngine::start(ExchangeConfig::default())
}

#[tokio::test]
async fn test_deposit_and_balance_roundtrip() {
	let (_engine, handle) = start_engine();
	let user = Uuid::new_v4();

	let cash = handle.deposit_cash(user, 10_000).await.unwrap();
	assert_eq!(cash.cash_available_cents, 10_000);
	assert_eq!(cash.cash_held_cents, 0);

	let inv = handle.deposit_inventory(user, sku(), 5).await.unwrap();
	assert_eq!(inv.qty_available, 5);
	assert_eq!(inv.cash_available_cents, 10_000);

	let balance = handle.balance(user).await.unwrap();
	assert!(balance.exists);
	assert_eq!(balance.cash_available_cents, 10_000);
	assert_eq!(balance.inventory.len(), 1);

	let nobody = handle.balance(Uuid::new_v4()).await.unwrap();
	assert!(!nobody.exists);
}

#[tokio::test]
async fn test_match_and_settle_end_to_end() {
	let (_engine, handle) = start_engine();
	let buyer = Uuid::new_v4();
	let seller = Uuid::new_v4();

	handle.deposit_cash(buyer, 10_000).await.unwrap();
	handle.deposit_inventory(seller, sku(), 5).await.unwrap();

	// Resting ask at 900, incoming buy at 1000: maker price applies
	let ask = handle
		.place_limit_order(seller, sku(), Side::Sell, 900, 3)
		.await
		.unwrap();
	assert_eq!(ask.status, OrderStatus::Open);

	let bid = handle
		.place_limit_order(buyer, sku(), Side::Buy, 1_000, 3)
		.await
		.unwrap();
	assert_eq!(bid.status, OrderStatus::Filled);
	assert_eq!(bid.qty_remaining, 0);

	let trades = handle.trades(sku(), 10).await.unwrap();
	assert_eq!(trades.len(), 1);
	assert_eq!(trades[0].price_cents, 900);
	assert_eq!(trades[0].qty, 3);
	assert_eq!(trades[0].buy_order_id, bid.order_id);
	assert_eq!(trades[0].sell_order_id, ask.order_id);

	let buyer_balance = handle.balance(buyer).await.unwrap();
	assert_eq!(buyer_balance.cash_available_cents, 7_300);
	assert_eq!(buyer_balance.cash_held_cents, 0);
	assert_eq!(buyer_balance.inventory[0].qty_available, 3);

	let seller_balance = handle.balance(seller).await.unwrap();
	assert_eq!(seller_balance.cash_available_cents, 2_700);
	assert_eq!(seller_balance.inventory[0].qty_available, 2);
	assert_eq!(seller_balance.inventory[0].qty_held, 0);
}

#[tokio::test]
async fn test_insufficient_inventory_is_a_refusal() {
	let (_engine, handle) = start_engine();
	let seller = Uuid::new_v4();

	handle.deposit_inventory(seller, sku(), 5).await.unwrap();

	let result = handle
		.place_limit_order(seller, sku(), Side::Sell, 900, 10)
		.await;
	assert_eq!(result.unwrap_err(), ExchangeError::InsufficientInventory);

	// No order was created and the engine keeps serving commands
	assert!(handle.open_orders(seller).await.unwrap().is_empty());
	let balance = handle.balance(seller).await.unwrap();
	assert_eq!(balance.inventory[0].qty_available, 5);
}

#[tokio::test]
async fn test_resting_order_visible_in_snapshot() {
	let (_engine, handle) = start_engine();
	let buyer = Uuid::new_v4();

	handle.deposit_cash(buyer, 1_000).await.unwrap();
	let order = handle
		.place_limit_order(buyer, sku(), Side::Buy, 500, 2)
		.await
		.unwrap();
	assert_eq!(order.status, OrderStatus::Open);

	// Depth 0 falls back to the configured default depth
	let snapshot = handle.book_snapshot(sku(), 0).await.unwrap();
	assert_eq!(snapshot.bids.len(), 1);
	assert_eq!(snapshot.bids[0].price_cents, 500);
	assert_eq!(snapshot.bids[0].qty, 2);
	assert!(snapshot.asks.is_empty());

	let top = handle.book_top(sku()).await.unwrap();
	assert_eq!(top.best_bid_cents, Some(500));
	assert_eq!(top.best_ask_cents, None);
}

#[tokio::test]
async fn test_cancel_through_the_engine() {
	let (_engine, handle) = start_engine();
	let buyer = Uuid::new_v4();

	handle.deposit_cash(buyer, 1_000).await.unwrap();
	let order = handle
		.place_limit_order(buyer, sku(), Side::Buy, 500, 2)
		.await
		.unwrap();

	let cancelled = handle.cancel_order(buyer, order.order_id).await.unwrap();
	assert_eq!(cancelled, order.order_id);

	// Cancel again: refused, no double release
	let again = handle.cancel_order(buyer, order.order_id).await;
	assert_eq!(again.unwrap_err(), ExchangeError::OrderNotOpen);

	let balance = handle.balance(buyer).await.unwrap();
	assert_eq!(balance.cash_available_cents, 1_000);
	assert_eq!(balance.cash_held_cents, 0);
}

#[tokio::test]
async fn test_concurrent_submissions_all_complete() {
	let (_engine, handle) = start_engine();
	let seller = Uuid::new_v4();

	handle.deposit_inventory(seller, sku(), 100).await.unwrap();

	// Many tasks race deposits and order placements; the single-writer
	// loop serializes them, so every hold and every fill stays coherent.
	let mut tasks = Vec::new();
	for i in 0..20u64 {
		let handle = handle.clone();
		tasks.push(tokio::spawn(async move {
			let buyer = Uuid::new_v4();
			handle.deposit_cash(buyer, 10_000).await.unwrap();
			handle
				.place_limit_order(buyer, sku(), Side::Buy, 100 + i, 1)
				.await
				.unwrap()
		}));
	}
	for task in tasks {
		task.await.unwrap();
	}

	// All 20 bids rest (nothing crossed); total held cash matches
	let snapshot = handle.book_snapshot(sku(), 50).await.unwrap();
	let total_qty: u64 = snapshot.bids.iter().map(|l| l.qty).sum();
	assert_eq!(total_qty, 20);
}

#[tokio::test]
async fn test_queries_on_unknown_sku_are_empty() {
	let (_engine, handle) = start_engine();
	let unknown = SkuId::from("MTG-NEO-CB-JP");

	let top = handle.book_top(unknown.clone()).await.unwrap();
	assert_eq!(top.best_bid_cents, None);
	assert_eq!(top.best_ask_cents, None);

	let snapshot = handle.book_snapshot(unknown.clone(), 5).await.unwrap();
	assert!(snapshot.bids.is_empty());
	assert!(snapshot.asks.is_empty());

	assert!(handle.trades(unknown, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_views_serialize_for_transport() {
	let (_engine, handle) = start_engine();
	let buyer = Uuid::new_v4();

	handle.deposit_cash(buyer, 1_000).await.unwrap();
	let order = handle
		.place_limit_order(buyer, sku(), Side::Buy, 500, 2)
		.await
		.unwrap();

	// A transport layer would serialize the reply payloads as-is
	let json = serde_json::to_value(&order).unwrap();
	assert_eq!(json["status"], "open");
	assert_eq!(json["limit_price_cents"], 500);
	assert_eq!(json["sku"], "PKM-SV151-BB-EN");
}

#[tokio::test]
async fn test_engine_shutdown_fails_pending_submissions() {
	let (engine, handle) = start_engine();
	let user = Uuid::new_v4();

	handle.deposit_cash(user, 100).await.unwrap();
	engine.shutdown();

	// The loop is gone; submission may still enqueue, but the reply
	// slot is never resolved, which surfaces as EngineUnavailable.
	let result = handle.deposit_cash(user, 100).await;
	assert!(matches!(
		result,
		Err(ExchangeError::EngineUnavailable) | Err(ExchangeError::Overloaded)
	));
}
