use super::group_machine_key;
use super::Family;
use super::MetricFamily;
use crate::cloud::CloudDetails;
use crate::csv::format_unix_timestamp;
use crate::csv::rate;
use crate::discovery::RunHandle;
use crate::error::ParseError;
use crate::error::ParseResult;
use crate::parse::read_artifact;
use ahash::HashMap;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use std::path::Path;

pub const FIO_RESULTS_FILE: &str = "fio-results.json";

/// Completion latency percentiles reported in the CSV, by fio's label.
pub const CLAT_PERCENTILES: [&str; 5] = ["90.000000", "95.000000", "99.000000", "99.900000", "99.990000"];

// Values in nanoseconds.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Latency {
  pub min: f64,
  pub max: f64,
  pub mean: f64,
  pub stddev: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CompletionLatency {
  #[serde(rename = "percentile")]
  pub percentiles: HashMap<String, i64>,
}

impl CompletionLatency {
  /// Unknown labels are reported as zero.
  pub fn percentile(&self, label: &str) -> i64 {
    self.percentiles.get(label).copied().unwrap_or(0)
  }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct IoStats {
  pub total_ios: i64,
  pub io_bytes: i64,
  #[serde(rename = "runtime")]
  pub runtime_ms: i64,
  #[serde(rename = "lat_ns")]
  pub lat: Latency,
  #[serde(rename = "clat_ns")]
  pub clat: CompletionLatency,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FioJob {
  #[serde(rename = "jobname")]
  pub name: String,
  #[serde(rename = "job options")]
  pub options: HashMap<String, String>,
  pub read: IoStats,
  pub write: IoStats,
  pub latency_depth: f64,
  #[serde(rename = "latency_target")]
  pub latency_target_us: i64,
  #[serde(rename = "latency_percentile")]
  pub latency_target_pct: f64,
  #[serde(rename = "latency_window")]
  pub latency_window_us: i64,
}

/// The subset of fio's `--output-format=json` document the report uses.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FioDocument {
  pub timestamp: i64,
  pub jobs: Vec<FioJob>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FioResult {
  pub timestamp: i64,
  pub jobs: Vec<FioJob>,
  pub observed_at: DateTime<Utc>,
  pub machine_type: String,
  pub disk_group: String,
}

pub fn parse_fio_results(path: &Path, text: &str) -> ParseResult<FioDocument> {
  serde_json::from_str(text).map_err(|source| ParseError::Json {
    path: path.to_path_buf(),
    source,
  })
}

fn io_stats_fields(s: &IoStats) -> Vec<String> {
  let mut fields = vec![
    // Number and rate of IO operations.
    s.total_ios.to_string(),
    format!("{:.3}", rate(s.total_ios, s.runtime_ms)),
    // Bytes transferred and bandwidth in KiB/s.
    s.io_bytes.to_string(),
    format!("{:.6}", rate(s.io_bytes, s.runtime_ms) / 1024.0),
    format!("{:.6}", s.lat.min),
    format!("{:.6}", s.lat.max),
    format!("{:.6}", s.lat.mean),
    format!("{:.6}", s.lat.stddev),
  ];
  fields.extend(
    CLAT_PERCENTILES
      .iter()
      .map(|pct| s.clat.percentile(pct).to_string()),
  );
  fields
}

pub struct Fio;

impl MetricFamily for Fio {
  type Record = FioResult;

  const FAMILY: Family = Family::Fio;

  fn key(cloud: &CloudDetails, machine_type: &str) -> String {
    group_machine_key(cloud, machine_type)
  }

  fn load(run: &RunHandle, cloud: &CloudDetails, machine_type: &str) -> ParseResult<FioResult> {
    let path = run.dir.join(FIO_RESULTS_FILE);
    let doc = parse_fio_results(&path, &read_artifact(&path)?)?;
    Ok(FioResult {
      timestamp: doc.timestamp,
      jobs: doc.jobs,
      observed_at: run.modified,
      machine_type: machine_type.to_string(),
      disk_group: cloud.group.clone(),
    })
  }

  fn csv_rows(cloud: &str, _key: &str, res: &FioResult) -> Vec<Vec<String>> {
    res
      .jobs
      .iter()
      .map(|j| {
        let mut fields = vec![
          cloud.to_string(),
          res.disk_group.clone(),
          res.machine_type.clone(),
          format_unix_timestamp(res.timestamp),
          j.name.clone(),
          j.options.get("bs").cloned().unwrap_or_default(),
          j.options
            .get("iodepth")
            .cloned()
            .unwrap_or_else(|| "1".to_string()),
        ];
        fields.extend(io_stats_fields(&j.read));
        fields.extend(io_stats_fields(&j.write));
        fields.push(format!("{:.2}", j.latency_depth));
        fields.push(j.latency_target_us.to_string());
        fields.push(format!("{:.2}", j.latency_target_pct));
        fields.push(j.latency_window_us.to_string());
        fields
      })
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::parse_fio_results;
  use super::Fio;
  use super::FioResult;
  use crate::error::ParseError;
  use crate::family::Family;
  use crate::family::MetricFamily;
  use chrono::Utc;
  use std::path::Path;

  const FIO_JSON: &str = r#"{
    "fio version": "fio-3.16",
    "timestamp": 1640995200,
    "jobs": [
      {
        "jobname": "read_8k",
        "job options": {"bs": "8k", "iodepth": "64", "rw": "randread"},
        "read": {
          "io_bytes": 8192000,
          "total_ios": 1000,
          "runtime": 2000,
          "lat_ns": {"min": 1000, "max": 90000, "mean": 4500.5, "stddev": 120.25},
          "clat_ns": {"min": 900, "percentile": {"90.000000": 5000, "99.900000": 70000, "50.000000": 4000}}
        },
        "write": {"io_bytes": 0, "total_ios": 0, "runtime": 0},
        "latency_depth": 64,
        "latency_target": 0,
        "latency_percentile": 100.0,
        "latency_window": 0
      },
      {
        "jobname": "write_seq",
        "job options": {"bs": "1m"},
        "read": {},
        "write": {"io_bytes": 1048576, "total_ios": 1, "runtime": 1000}
      }
    ]
  }"#;

  #[test]
  fn test_parse_document() {
    let doc = parse_fio_results(Path::new("fio-results.json"), FIO_JSON).unwrap();
    assert_eq!(doc.timestamp, 1640995200);
    assert_eq!(doc.jobs.len(), 2);
    let job = &doc.jobs[0];
    assert_eq!(job.name, "read_8k");
    assert_eq!(job.options.get("bs").map(String::as_str), Some("8k"));
    assert_eq!(job.read.total_ios, 1000);
    assert_eq!(job.read.runtime_ms, 2000);
    assert_eq!(job.read.lat.mean, 4500.5);
    assert_eq!(job.read.clat.percentile("99.900000"), 70000);
    assert_eq!(job.read.clat.percentile("99.990000"), 0);
    assert_eq!(job.latency_depth, 64.0);
    assert_eq!(doc.jobs[1].read.total_ios, 0);
  }

  #[test]
  fn test_malformed_document() {
    let err = parse_fio_results(Path::new("/logs/fio-results.json"), "{\"jobs\": 5}").unwrap_err();
    assert!(matches!(err, ParseError::Json { .. }));
    assert!(err.to_string().contains("/logs/fio-results.json"));
  }

  #[test]
  fn test_csv_rows_one_per_job() {
    let doc = parse_fio_results(Path::new("fio-results.json"), FIO_JSON).unwrap();
    let res = FioResult {
      timestamp: doc.timestamp,
      jobs: doc.jobs,
      observed_at: Utc::now(),
      machine_type: "m5.xlarge".to_string(),
      disk_group: "ebs-gp3".to_string(),
    };
    let rows = Fio::csv_rows("aws", "ebs-gp3-m5.xlarge", &res);
    let width = Family::Fio.csv_header().split(',').count();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.len() == width));

    let read = &rows[0];
    assert_eq!(&read[..7], &[
      "aws",
      "ebs-gp3",
      "m5.xlarge",
      "2022-01-01 00:00:00 UTC",
      "read_8k",
      "8k",
      "64",
    ]);
    // 1000 ops over 2s, 8192000 bytes over 2s in KiB/s.
    assert_eq!(read[7], "1000");
    assert_eq!(read[8], "500.000");
    assert_eq!(read[10], "4000.000000");
    assert_eq!(read[12], "90000.000000");
    assert_eq!(read[13], "4500.500000");
    assert_eq!(&read[15..20], &["5000", "0", "0", "70000", "0"]);
    // Zero runtime yields zero rates.
    assert_eq!(read[21], "0.000");
    assert_eq!(read[width - 4], "64.00");
    assert_eq!(read[width - 2], "100.00");

    let write = &rows[1];
    assert_eq!(write[6], "1");
    assert_eq!(write[21], "1.000");
    assert_eq!(write[23], "1024.000000");
  }
}
