// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Backtrace capture and parsing for error events.

use std::backtrace::Backtrace;

use rootsense_core::Frame;
use rustc_demangle::demangle;

/// Frames from these crates are runtime or SDK plumbing, never application code.
const SYSTEM_PREFIXES: &[&str] = &[
	"std::",
	"core::",
	"alloc::",
	"tokio::",
	"futures::",
	"futures_util::",
	"async_trait::",
	"tracing::",
	"backtrace::",
	"panic_unwind::",
	"rootsense::",
	"rootsense_core::",
	"rust_begin_unwind",
	"rust_panic",
	"__rust_",
	"_rust_",
];

const SYSTEM_CONTAINS: &[&str] = &[
	"::panic::",
	"::panicking::",
	"::thread::",
	"::rt::",
	"::runtime::",
	"::sys_common::",
];

/// Captures the current backtrace as text plus parsed frames.
pub fn capture() -> (String, Vec<Frame>) {
	let backtrace = Backtrace::force_capture();
	let text = backtrace.to_string();
	let frames = parse_backtrace(&text);
	(text, frames)
}

/// Parses the textual form of a `std::backtrace::Backtrace`.
///
/// Frame lines look like `  12: my_app::handlers::create`; the `at file:line`
/// lines that follow them are skipped.
pub fn parse_backtrace(text: &str) -> Vec<Frame> {
	text.lines().filter_map(parse_frame_line).collect()
}

fn parse_frame_line(line: &str) -> Option<Frame> {
	let line = line.trim();
	if line.is_empty() || line.starts_with("at ") {
		return None;
	}

	let function = match line.split_once(':') {
		Some((index, rest)) if index.trim().parse::<u32>().is_ok() => rest.trim(),
		_ => line,
	};
	if function.is_empty() {
		return None;
	}

	let demangled = demangle(function).to_string();
	let module = demangled
		.rfind("::")
		.map(|idx| demangled[..idx].to_string());
	let in_app = is_in_app_frame(&demangled);

	Some(Frame {
		function: Some(demangled),
		module,
		in_app,
	})
}

fn is_in_app_frame(function: &str) -> bool {
	let path = function.trim_start_matches('<');

	if SYSTEM_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) {
		return false;
	}
	!SYSTEM_CONTAINS.iter().any(|needle| function.contains(needle))
}
