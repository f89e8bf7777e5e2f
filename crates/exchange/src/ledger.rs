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

use std::collections::BTreeMap;

use thiserror::Error;

use cardex_sdk::{InventoryLine, SkuId, UserId};

/// Error types for ledger operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
	#[error("Amount must be positive")]
	InvalidAmount,
	#[error("Quantity must be positive")]
	InvalidQuantity,
	#[error("Insufficient cash: requested {requested}, available {available}")]
	InsufficientCash { requested: u64, available: u64 },
	#[error("Insufficient inventory of {sku}: requested {requested}, available {available}")]
	InsufficientInventory {
		sku: SkuId,
		requested: u64,
		available: u64,
	},
	#[error("Balance overflow")]
	Overflow,
	#[error("Balance underflow")]
	Underflow,
}

/// Per-user ledger: cash and per-SKU inventory, each split into an
/// available pool and a held pool
///
/// Funds and inventory move only through the operations below; there is
/// no direct setter. Holds are all-or-nothing: a failed hold leaves the
/// account untouched. Balances are unsigned and every subtraction is
/// checked, so no sequence of operations can drive a pool negative —
/// an over-release or over-spend surfaces as `Underflow` instead of
/// wrapping.
///
/// Accounts are created lazily by the exchange state on first reference
/// and live for the process lifetime. The single-writer command loop is
/// the only mutator, so none of these operations need interior locking.
#[derive(Debug, Clone)]
pub struct Account {
	user_id: UserId,
	cash_available_cents: u64,
	cash_held_cents: u64,
	/// Per-SKU available quantities; absent means zero
	qty_available: BTreeMap<SkuId, u64>,
	/// Per-SKU held quantities; absent means zero
	qty_held: BTreeMap<SkuId, u64>,
}

impl Account {
	pub fn new(user_id: UserId) -> Self {
		Self {
			user_id,
			cash_available_cents: 0,
			cash_held_cents: 0,
			qty_available: BTreeMap::new(),
			qty_held: BTreeMap::new(),
		}
	}

	pub fn user_id(&self) -> UserId {
		self.user_id
	}

	pub fn cash_available_cents(&self) -> u64 {
		self.cash_available_cents
	}

	pub fn cash_held_cents(&self) -> u64 {
		self.cash_held_cents
	}

	pub fn qty_available(&self, sku: &SkuId) -> u64 {
		self.qty_available.get(sku).copied().unwrap_or(0)
	}

	pub fn qty_held(&self, sku: &SkuId) -> u64 {
		self.qty_held.get(sku).copied().unwrap_or(0)
	}

	/// Credit available cash
	pub fn deposit_cash(&mut self, cents: u64) -> Result<(), LedgerError> {
		if cents == 0 {
			return Err(LedgerError::InvalidAmount);
		}
		self.cash_available_cents = self
			.cash_available_cents
			.checked_add(cents)
			.ok_or(LedgerError::Overflow)?;
		Ok(())
	}

	/// Credit available inventory of a SKU
	pub fn deposit_inventory(&mut self, sku: &SkuId, qty: u64) -> Result<(), LedgerError> {
		if qty == 0 {
			return Err(LedgerError::InvalidQuantity);
		}
		let slot = self.qty_available.entry(sku.clone()).or_insert(0);
		*slot = slot.checked_add(qty).ok_or(LedgerError::Overflow)?;
		Ok(())
	}

	/// Move cash from available to held, all or nothing
	pub fn try_hold_cash(&mut self, cents: u64) -> Result<(), LedgerError> {
		if cents == 0 {
			return Err(LedgerError::InvalidAmount);
		}
		if self.cash_available_cents < cents {
			return Err(LedgerError::InsufficientCash {
				requested: cents,
				available: self.cash_available_cents,
			});
		}
		self.cash_available_cents -= cents;
		self.cash_held_cents = self
			.cash_held_cents
			.checked_add(cents)
			.ok_or(LedgerError::Overflow)?;
		Ok(())
	}

	/// Move held cash back to available
	pub fn release_cash(&mut self, cents: u64) -> Result<(), LedgerError> {
		if cents == 0 {
			return Err(LedgerError::InvalidAmount);
		}
		self.cash_held_cents = self
			.cash_held_cents
			.checked_sub(cents)
			.ok_or(LedgerError::Underflow)?;
		self.cash_available_cents = self
			.cash_available_cents
			.checked_add(cents)
			.ok_or(LedgerError::Overflow)?;
		Ok(())
	}

	/// Spend held cash: it leaves the account entirely
	pub fn pay_from_held(&mut self, cents: u64) -> Result<(), LedgerError> {
		if cents == 0 {
			return Err(LedgerError::InvalidAmount);
		}
		self.cash_held_cents = self
			.cash_held_cents
			.checked_sub(cents)
			.ok_or(LedgerError::Underflow)?;
		Ok(())
	}

	/// Credit available cash (sale proceeds)
	pub fn receive_cash(&mut self, cents: u64) -> Result<(), LedgerError> {
		if cents == 0 {
			return Err(LedgerError::InvalidAmount);
		}
		self.cash_available_cents = self
			.cash_available_cents
			.checked_add(cents)
			.ok_or(LedgerError::Overflow)?;
		Ok(())
	}

	/// Move inventory from available to held, all or nothing
	pub fn try_hold_inventory(&mut self, sku: &SkuId, qty: u64) -> Result<(), LedgerError> {
		if qty == 0 {
			return Err(LedgerError::InvalidQuantity);
		}
		let available = self.qty_available(sku);
		if available < qty {
			return Err(LedgerError::InsufficientInventory {
				sku: sku.clone(),
				requested: qty,
				available,
			});
		}
		self.qty_available.insert(sku.clone(), available - qty);
		let held = self.qty_held.entry(sku.clone()).or_insert(0);
		*held = held.checked_add(qty).ok_or(LedgerError::Overflow)?;
		Ok(())
	}

	/// Move held inventory back to available
	pub fn release_inventory(&mut self, sku: &SkuId, qty: u64) -> Result<(), LedgerError> {
		if qty == 0 {
			return Err(LedgerError::InvalidQuantity);
		}
		let held = self
			.qty_held
			.get_mut(sku)
			.ok_or(LedgerError::Underflow)?;
		*held = held.checked_sub(qty).ok_or(LedgerError::Underflow)?;
		let slot = self.qty_available.entry(sku.clone()).or_insert(0);
		*slot = slot.checked_add(qty).ok_or(LedgerError::Overflow)?;
		Ok(())
	}

	/// Remove sold inventory from the held pool; it leaves the account
	pub fn consume_held_inventory(&mut self, sku: &SkuId, qty: u64) -> Result<(), LedgerError> {
		if qty == 0 {
			return Err(LedgerError::InvalidQuantity);
		}
		let held = self
			.qty_held
			.get_mut(sku)
			.ok_or(LedgerError::Underflow)?;
		*held = held.checked_sub(qty).ok_or(LedgerError::Underflow)?;
		Ok(())
	}

	/// Credit available inventory (purchase proceeds)
	pub fn credit_inventory(&mut self, sku: &SkuId, qty: u64) -> Result<(), LedgerError> {
		if qty == 0 {
			return Err(LedgerError::InvalidQuantity);
		}
		let slot = self.qty_available.entry(sku.clone()).or_insert(0);
		*slot = slot.checked_add(qty).ok_or(LedgerError::Overflow)?;
		Ok(())
	}

	/// Lazy snapshot of every SKU this account has ever referenced,
	/// including lines whose balances are now zero
	///
	/// Restartable: each call yields a fresh iterator over current state.
	pub fn inventory_snapshot(&self) -> impl Iterator<Item = InventoryLine> + '_ {
		self.qty_available
			.keys()
			.chain(
				self.qty_held
					.keys()
					.filter(|sku| !self.qty_available.contains_key(*sku)),
			)
			.map(|sku| InventoryLine {
				sku: sku.clone(),
				qty_available: self.qty_available(sku),
				qty_held: self.qty_held(sku),
			})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use uuid::Uuid;

	fn account() -> Account {
		Account::new(Uuid::new_v4())
	}

	fn sku(name: &str) -> SkuId {
		SkuId::from(name)
	}

	#[test]
	fn test_deposit_and_hold_cash() {
		let mut acct = account();
		acct.deposit_cash(10_000).unwrap();
		assert_eq!(acct.cash_available_cents(), 10_000);

		acct.try_hold_cash(3_000).unwrap();
		assert_eq!(acct.cash_available_cents(), 7_000);
		assert_eq!(acct.cash_held_cents(), 3_000);
	}

	#[test]
	fn test_zero_deposit_rejected() {
		let mut acct = account();
		assert_eq!(acct.deposit_cash(0), Err(LedgerError::InvalidAmount));
		assert_eq!(
			acct.deposit_inventory(&sku("X"), 0),
			Err(LedgerError::InvalidQuantity)
		);
	}

	#[test]
	fn test_failed_hold_leaves_state_unchanged() {
		let mut acct = account();
		acct.deposit_cash(100).unwrap();

		let result = acct.try_hold_cash(101);
		assert_eq!(
			result,
			Err(LedgerError::InsufficientCash {
				requested: 101,
				available: 100
			})
		);
		assert_eq!(acct.cash_available_cents(), 100);
		assert_eq!(acct.cash_held_cents(), 0);
	}

	#[test]
	fn test_hold_conservation() {
		let mut acct = account();
		acct.deposit_cash(5_000).unwrap();

		acct.try_hold_cash(2_000).unwrap();
		assert_eq!(acct.cash_available_cents() + acct.cash_held_cents(), 5_000);

		acct.release_cash(500).unwrap();
		assert_eq!(acct.cash_available_cents() + acct.cash_held_cents(), 5_000);

		let _ = acct.try_hold_cash(1_000_000);
		assert_eq!(acct.cash_available_cents() + acct.cash_held_cents(), 5_000);
	}

	#[test]
	fn test_pay_from_held_removes_cash_from_account() {
		let mut acct = account();
		acct.deposit_cash(1_000).unwrap();
		acct.try_hold_cash(600).unwrap();
		acct.pay_from_held(600).unwrap();

		assert_eq!(acct.cash_available_cents(), 400);
		assert_eq!(acct.cash_held_cents(), 0);
	}

	#[test]
	fn test_over_release_is_underflow_not_wrap() {
		let mut acct = account();
		acct.deposit_cash(1_000).unwrap();
		acct.try_hold_cash(100).unwrap();

		assert_eq!(acct.release_cash(101), Err(LedgerError::Underflow));
		assert_eq!(acct.pay_from_held(101), Err(LedgerError::Underflow));
	}

	#[test]
	fn test_inventory_hold_and_consume() {
		let mut acct = account();
		let x = sku("X");
		acct.deposit_inventory(&x, 5).unwrap();

		acct.try_hold_inventory(&x, 3).unwrap();
		assert_eq!(acct.qty_available(&x), 2);
		assert_eq!(acct.qty_held(&x), 3);

		acct.consume_held_inventory(&x, 3).unwrap();
		assert_eq!(acct.qty_available(&x), 2);
		assert_eq!(acct.qty_held(&x), 0);
	}

	#[test]
	fn test_insufficient_inventory_hold() {
		let mut acct = account();
		let x = sku("X");
		acct.deposit_inventory(&x, 5).unwrap();

		let result = acct.try_hold_inventory(&x, 10);
		assert!(matches!(
			result,
			Err(LedgerError::InsufficientInventory { requested: 10, available: 5, .. })
		));
		assert_eq!(acct.qty_available(&x), 5);
		assert_eq!(acct.qty_held(&x), 0);
	}

	#[test]
	fn test_inventory_snapshot_covers_zeroed_skus() {
		let mut acct = account();
		let x = sku("X");
		let y = sku("Y");
		acct.deposit_inventory(&x, 3).unwrap();
		acct.deposit_inventory(&y, 1).unwrap();

		// Sell out all of Y: available 0, held 0, but Y stays visible
		acct.try_hold_inventory(&y, 1).unwrap();
		acct.consume_held_inventory(&y, 1).unwrap();

		let lines: Vec<InventoryLine> = acct.inventory_snapshot().collect();
		assert_eq!(lines.len(), 2);
		assert!(lines.contains(&InventoryLine {
			sku: x,
			qty_available: 3,
			qty_held: 0
		}));
		assert!(lines.contains(&InventoryLine {
			sku: y,
			qty_available: 0,
			qty_held: 0
		}));
	}

	#[test]
	fn test_inventory_snapshot_is_restartable() {
		let mut acct = account();
		acct.deposit_inventory(&sku("X"), 2).unwrap();

		let first: Vec<_> = acct.inventory_snapshot().collect();
		let second: Vec<_> = acct.inventory_snapshot().collect();
		assert_eq!(first, second);
	}
}
