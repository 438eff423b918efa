// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Metric events: single Prometheus-style samples or OTel-style data points.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One OTel-style data point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
	#[serde(default)]
	pub attributes: serde_json::Map<String, serde_json::Value>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub value: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub sum: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub count: Option<u64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub min: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub max: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub start_time_unix_nano: Option<u64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub time_unix_nano: Option<u64>,
}

/// The measurement carried by a metric event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricData {
	Sample {
		value: f64,
		#[serde(default)]
		labels: BTreeMap<String, String>,
		#[serde(skip_serializing_if = "Option::is_none")]
		time_unix_nano: Option<u64>,
	},
	DataPoints {
		data_points: Vec<DataPoint>,
		#[serde(skip_serializing_if = "Option::is_none")]
		resource: Option<serde_json::Map<String, serde_json::Value>>,
	},
}

/// Metric-specific event fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricEvent {
	pub metric_name: String,
	/// "counter", "gauge", "histogram", "summary"
	#[serde(skip_serializing_if = "Option::is_none")]
	pub metric_type: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub unit: Option<String>,
	#[serde(flatten)]
	pub data: MetricData,
}

impl MetricEvent {
	/// A single sample with labels, e.g. a scraped counter value.
	pub fn sample(name: impl Into<String>, value: f64, labels: BTreeMap<String, String>) -> Self {
		Self {
			metric_name: name.into(),
			metric_type: None,
			description: None,
			unit: None,
			data: MetricData::Sample {
				value,
				labels,
				time_unix_nano: None,
			},
		}
	}

	/// A set of OTel-style data points.
	pub fn data_points(name: impl Into<String>, data_points: Vec<DataPoint>) -> Self {
		Self {
			metric_name: name.into(),
			metric_type: None,
			description: None,
			unit: None,
			data: MetricData::DataPoints {
				data_points,
				resource: None,
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn sample_flattens_into_metric() {
		let mut labels = BTreeMap::new();
		labels.insert("endpoint".to_string(), "/users".to_string());
		let metric = MetricEvent::sample("requests_total", 3.0, labels);

		let json = serde_json::to_value(&metric).unwrap();
		assert_eq!(json["metric_name"], "requests_total");
		assert_eq!(json["value"], 3.0);
		assert_eq!(json["labels"]["endpoint"], "/users");
		assert!(json.get("data_points").is_none());
	}

	#[test]
	fn data_points_flatten_into_metric() {
		let metric = MetricEvent::data_points(
			"latency",
			vec![DataPoint {
				sum: Some(1.5),
				count: Some(3),
				..Default::default()
			}],
		);

		let json = serde_json::to_value(&metric).unwrap();
		assert_eq!(json["data_points"][0]["count"], 3);
		assert_eq!(json["data_points"][0], json!({"attributes": {}, "sum": 1.5, "count": 3}));
	}
}
