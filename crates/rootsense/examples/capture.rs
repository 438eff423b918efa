// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Example: capture an error, then report the endpoint as healthy again.
//!
//! Run with:
//!   ROOTSENSE_API_KEY=... ROOTSENSE_PROJECT_ID=... \
//!     cargo run --example capture -p rootsense

use std::time::Duration;

use rootsense::{Breadcrumb, CaptureContext, Config, Level, UserContext};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rootsense=debug")),
		)
		.init();

	let config = Config::builder()
		.env_defaults()
		.environment("development")
		.service_name("example-service")
		.service_version("0.1.0-example")
		.debug(true)
		.build()?;

	println!("Initializing RootSense collector...");
	println!("  Base URL: {}", config.base_url);
	println!("  Project ID: {}", config.project_id);

	let collector = rootsense::init(config)?;
	collector.install_panic_hook();

	let scope = collector.scope();
	scope.set_user(UserContext::with_id("user_example_123"));
	scope.set_tag("example", "true");
	scope.push_breadcrumb(Breadcrumb::new("Application started").category("startup"));
	scope.push_breadcrumb(
		Breadcrumb::new("GET /api/data failed")
			.category("http")
			.level(Level::Warning),
	);

	{
		let _op = scope.track("load_dashboard");
		tokio::time::sleep(Duration::from_millis(50)).await;
	}

	let ctx = CaptureContext::new()
		.service("example-service")
		.endpoint("/api/data")
		.method("GET")
		.scope(&scope);
	if let Some(id) = collector.capture_exception("ValueError", "Example error from RootSense SDK", ctx)
	{
		println!("\nQueued error event {id}");
	}

	collector.flush(Duration::from_secs(5)).await;

	println!("Reporting /api/data as healthy...");
	collector.capture_success(
		"/api/data",
		"GET",
		CaptureContext::new().service("example-service"),
	);

	rootsense::shutdown().await;
	println!("\nStats: {:?}", collector.stats());
	println!("Collector shutdown complete.");

	Ok(())
}
