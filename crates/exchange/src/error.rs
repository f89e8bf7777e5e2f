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

use thiserror::Error;

use crate::ledger::LedgerError;
use crate::queue::QueueError;

/// Error type for all exchange commands
///
/// Three families share this enum:
/// - validation errors and business-rule refusals, which are expected
///   outcomes and reject the command before (or without) mutating state
/// - integrity faults (overflow, ledger underflow, broken invariants),
///   which indicate a bug and are logged loudly while the command loop
///   keeps running
/// - executor boundary errors, raised on the submission path when the
///   command queue is saturated or the engine is gone
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExchangeError {
	#[error("Amount must be positive")]
	InvalidAmount,
	#[error("Quantity must be positive")]
	InvalidQuantity,
	#[error("Limit price must be positive")]
	InvalidPrice,

	#[error("Insufficient cash")]
	InsufficientCash,
	#[error("Insufficient inventory")]
	InsufficientInventory,
	#[error("Order not found")]
	OrderNotFound,
	#[error("Order belongs to a different user")]
	NotOrderOwner,
	#[error("Order is not open")]
	OrderNotOpen,

	#[error("Arithmetic overflow computing a monetary amount")]
	AmountOverflow,
	#[error("Ledger underflow: released or spent more than was held")]
	LedgerUnderflow,
	#[error("Invariant violated: {0}")]
	InvariantViolated(&'static str),

	#[error("Exchange is overloaded, try again later")]
	Overloaded,
	#[error("Exchange engine is unavailable")]
	EngineUnavailable,
}

impl ExchangeError {
	/// True for expected business outcomes (as opposed to faults)
	///
	/// Transports map refusals to client errors and everything else to
	/// server errors.
	pub fn is_refusal(&self) -> bool {
		matches!(
			self,
			ExchangeError::InvalidAmount
				| ExchangeError::InvalidQuantity
				| ExchangeError::InvalidPrice
				| ExchangeError::InsufficientCash
				| ExchangeError::InsufficientInventory
				| ExchangeError::OrderNotFound
				| ExchangeError::NotOrderOwner
				| ExchangeError::OrderNotOpen
		)
	}
}

impl From<LedgerError> for ExchangeError {
	fn from(err: LedgerError) -> Self {
		match err {
			LedgerError::InvalidAmount => ExchangeError::InvalidAmount,
			LedgerError::InvalidQuantity => ExchangeError::InvalidQuantity,
			LedgerError::InsufficientCash { .. } => ExchangeError::InsufficientCash,
			LedgerError::InsufficientInventory { .. } => ExchangeError::InsufficientInventory,
			LedgerError::Overflow => ExchangeError::AmountOverflow,
			LedgerError::Underflow => ExchangeError::LedgerUnderflow,
		}
	}
}

impl From<QueueError> for ExchangeError {
	fn from(err: QueueError) -> Self {
		match err {
			QueueError::Full => ExchangeError::Overloaded,
			QueueError::Empty | QueueError::Disconnected => ExchangeError::EngineUnavailable,
		}
	}
}
