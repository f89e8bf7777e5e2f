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

use crossbeam::channel::{Receiver, Sender, TryRecvError, TrySendError, bounded};

use crate::commands::ExchangeCommand;

/// Command queue between concurrent callers and the single command loop
///
/// The queue is the boundary between the multi-threaded submission side
/// and the single-threaded exchange loop. It preserves submission order
/// and provides a deterministic sequence of commands entering the
/// engine.
///
/// Properties:
/// - Multiple producers (any number of concurrent callers)
/// - Single consumer (the command loop)
/// - Bounded capacity for backpressure
/// - Explicit failure semantics when full
///
/// When the queue is full, submission fails with `QueueError::Full` and
/// the caller sees an overload error; the queue never accepts-and-stalls.
pub struct CommandQueue {
	sender: Sender<ExchangeCommand>,
	receiver: Receiver<ExchangeCommand>,
}

impl CommandQueue {
	/// Create a new command queue with the specified capacity
	pub fn new(capacity: usize) -> Self {
		let (sender, receiver) = bounded(capacity);
		Self { sender, receiver }
	}

	/// Split the queue into sender and receiver ends
	///
	/// The sender can be cloned for multiple submitting threads. The
	/// receiver must remain unique for the single command loop.
	pub fn split(self) -> (CommandSender, CommandReceiver) {
		(
			CommandSender {
				sender: self.sender,
			},
			CommandReceiver {
				receiver: self.receiver,
			},
		)
	}
}

/// Sender end of the command queue
///
/// This can be cloned and shared across threads.
#[derive(Clone)]
pub struct CommandSender {
	sender: Sender<ExchangeCommand>,
}

impl CommandSender {
	/// Try to enqueue a command (non-blocking)
	///
	/// Returns `Full` if the queue is saturated, signalling that the
	/// engine cannot keep up and the caller should shed load.
	pub fn try_enqueue(&self, cmd: ExchangeCommand) -> Result<(), QueueError> {
		self.sender.try_send(cmd).map_err(|e| match e {
			TrySendError::Full(_) => QueueError::Full,
			TrySendError::Disconnected(_) => QueueError::Disconnected,
		})
	}

	/// Check if the queue is full
	pub fn is_full(&self) -> bool {
		self.sender.is_full()
	}
}

/// Receiver end of the command queue (used by the command loop)
///
/// This should NOT be cloned - only one loop should consume.
pub struct CommandReceiver {
	receiver: Receiver<ExchangeCommand>,
}

impl CommandReceiver {
	/// Receive a command (blocking)
	pub fn recv(&self) -> Result<ExchangeCommand, QueueError> {
		self.receiver.recv().map_err(|_| QueueError::Disconnected)
	}

	/// Try to receive a command (non-blocking)
	///
	/// Used by the command loop so it can interleave shutdown checks.
	pub fn try_recv(&self) -> Result<ExchangeCommand, QueueError> {
		self.receiver.try_recv().map_err(|e| match e {
			TryRecvError::Empty => QueueError::Empty,
			TryRecvError::Disconnected => QueueError::Disconnected,
		})
	}
}

/// Errors that can occur when interacting with the command queue
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
	#[error("Queue is full")]
	Full,
	#[error("Queue is empty")]
	Empty,
	#[error("Queue disconnected")]
	Disconnected,
}
