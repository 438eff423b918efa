// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Optional process-wide collector for code that cannot thread a handle
//! through, such as framework hooks.

use std::sync::{PoisonError, RwLock};

use crate::client::{Collector, CollectorBuilder};
use crate::config::Config;
use crate::error::{Result, SdkError};

static GLOBAL: RwLock<Option<Collector>> = RwLock::new(None);

/// Builds a collector with the HTTP transport and installs it globally.
pub fn init(config: Config) -> Result<Collector> {
	init_with(CollectorBuilder::new(config))
}

/// Installs a collector built from `builder`. Fails if one is already
/// installed; call [`shutdown`] first to replace it.
pub fn init_with(builder: CollectorBuilder) -> Result<Collector> {
	let mut slot = GLOBAL.write().unwrap_or_else(PoisonError::into_inner);
	if slot.is_some() {
		return Err(SdkError::AlreadyInitialized);
	}
	let collector = builder.build()?;
	*slot = Some(collector.clone());
	Ok(collector)
}

pub fn get_client() -> Option<Collector> {
	GLOBAL
		.read()
		.unwrap_or_else(PoisonError::into_inner)
		.clone()
}

/// Removes the global collector and stops it.
pub async fn shutdown() {
	let collector = GLOBAL
		.write()
		.unwrap_or_else(PoisonError::into_inner)
		.take();
	if let Some(collector) = collector {
		collector.stop().await;
	}
}
