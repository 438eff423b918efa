// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Severity levels shared by message events and breadcrumbs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Severity of a message event or breadcrumb.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
	Debug,
	#[default]
	Info,
	Warning,
	Error,
	Critical,
}

impl Level {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Debug => "debug",
			Self::Info => "info",
			Self::Warning => "warning",
			Self::Error => "error",
			Self::Critical => "critical",
		}
	}
}

impl fmt::Display for Level {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Level {
	type Err = CoreError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"debug" => Ok(Self::Debug),
			"info" => Ok(Self::Info),
			"warning" | "warn" => Ok(Self::Warning),
			"error" => Ok(Self::Error),
			"critical" | "fatal" => Ok(Self::Critical),
			_ => Err(CoreError::InvalidLevel(s.to_string())),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn aliases_parse() {
		assert_eq!("warn".parse::<Level>().unwrap(), Level::Warning);
		assert_eq!("fatal".parse::<Level>().unwrap(), Level::Critical);
	}

	#[test]
	fn unknown_level_is_rejected() {
		assert!(matches!(
			"verbose".parse::<Level>(),
			Err(CoreError::InvalidLevel(s)) if s == "verbose"
		));
	}

	#[test]
	fn serializes_snake_case() {
		assert_eq!(serde_json::to_string(&Level::Critical).unwrap(), "\"critical\"");
	}

	proptest! {
		#[test]
		fn level_display_parses_back(level in prop_oneof![
			Just(Level::Debug),
			Just(Level::Info),
			Just(Level::Warning),
			Just(Level::Error),
			Just(Level::Critical),
		]) {
			let parsed: Level = level.to_string().parse().unwrap();
			prop_assert_eq!(level, parsed);
		}
	}
}
