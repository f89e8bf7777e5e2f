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

use serde::{Deserialize, Serialize};

/// Component name used for log files
pub const LOG_COMPONENT_NAME: &str = "exchange";
/// Default log level when RUST_LOG is not set
pub const DEFAULT_LOG_LEVEL: &str = "info";
/// Default for console log output
pub const DEFAULT_LOG_TO_CONSOLE: bool = false;

/// Exchange engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
	/// Command queue capacity; submissions beyond it are rejected with
	/// an overload error
	pub command_queue_size: usize,
	/// Book snapshot depth used when a request passes depth 0
	pub snapshot_depth: usize,
	/// Upper bound on the number of trades one query may return
	pub trade_query_limit: usize,
	/// Log every processed command at debug level
	pub verbose_logging: bool,
}

impl Default for ExchangeConfig {
	fn default() -> Self {
		Self {
			command_queue_size: 1024,
			snapshot_depth: 20,
			trade_query_limit: 100,
			verbose_logging: false,
		}
	}
}

impl ExchangeConfig {
	/// Load configuration from environment variables
	pub fn from_env() -> Result<Self, config::ConfigError> {
		let cfg = config::Config::builder()
			.add_source(config::Environment::with_prefix("EXCHANGE"))
			.build()?;

		cfg.try_deserialize()
	}

	/// Load configuration from file, with environment overrides
	pub fn from_file(path: &str) -> Result<Self, config::ConfigError> {
		let cfg = config::Config::builder()
			.add_source(config::File::with_name(path))
			.add_source(config::Environment::with_prefix("EXCHANGE"))
			.build()?;

		cfg.try_deserialize()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_config() {
		let config = ExchangeConfig::default();
		assert_eq!(config.command_queue_size, 1024);
		assert_eq!(config.snapshot_depth, 20);
		assert_eq!(config.trade_query_limit, 100);
		assert!(!config.verbose_logging);
	}
}
