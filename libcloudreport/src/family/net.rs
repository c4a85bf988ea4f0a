use super::Family;
use super::MetricFamily;
use crate::cloud::CloudDetails;
use crate::csv::format_timestamp;
use crate::discovery::list_artifacts;
use crate::discovery::RunHandle;
use crate::error::ParseError;
use crate::error::ParseResult;
use crate::parse::fields_exactly;
use crate::parse::last_line;
use crate::parse::parse_number;
use crate::parse::read_artifact;
use chrono::DateTime;
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

static NETPERF_LOG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^netperf-result").unwrap());

// Receive socket, send socket, message size, elapsed seconds, throughput, unit.
const THROUGHPUT_FIELDS: usize = 6;
const LATENCY_FIELDS: usize = 7;
// The latency summary is the 7th line from the end of the log.
const LATENCY_LINE_FROM_END: usize = 7;

#[derive(Clone, Debug, PartialEq)]
pub struct NetworkResult {
  pub throughput: f64,
  pub throughput_units: String,
  pub min_lat: f64,
  pub mean_lat: f64,
  pub p90_lat: f64,
  pub p99_lat: f64,
  pub max_lat: f64,
  pub lat_std_dev: f64,
  pub txn_rate: f64,
  pub observed_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LatencySummary {
  pub min: f64,
  pub mean: f64,
  pub p90: f64,
  pub p99: f64,
  pub max: f64,
  pub std_dev: f64,
  pub txn_rate: f64,
}

/// Throughput and its unit are the last two of the six fields on the last line:
///
/// ```text
///  87380  16384  16384    10.00    9387.55   10^6bits/s
/// ```
pub fn parse_netperf_throughput(path: &Path, text: &str) -> ParseResult<(f64, String)> {
  let f = fields_exactly(path, last_line(path, text)?, THROUGHPUT_FIELDS)?;
  let throughput = parse_number(path, f[4])?;
  Ok((throughput, f[5].to_string()))
}

pub fn parse_netperf_latency(path: &Path, text: &str) -> ParseResult<LatencySummary> {
  let lines: Vec<&str> = text.lines().collect();
  if lines.len() < LATENCY_LINE_FROM_END {
    return Err(ParseError::MissingLine {
      path: path.to_path_buf(),
      line: "latency summary",
    });
  };
  let line = lines[lines.len() - LATENCY_LINE_FROM_END];
  let f = fields_exactly(path, line, LATENCY_FIELDS)?;
  Ok(LatencySummary {
    min: parse_number(path, f[0])?,
    mean: parse_number(path, f[1])?,
    p90: parse_number(path, f[2])?,
    p99: parse_number(path, f[3])?,
    max: parse_number(path, f[4])?,
    std_dev: parse_number(path, f[5])?,
    txn_rate: parse_number(path, f[6])?,
  })
}

pub struct Netperf;

impl MetricFamily for Netperf {
  type Record = NetworkResult;

  const FAMILY: Family = Family::Net;

  fn key(_cloud: &CloudDetails, machine_type: &str) -> String {
    machine_type.to_string()
  }

  fn load(run: &RunHandle, _cloud: &CloudDetails, _machine_type: &str) -> ParseResult<NetworkResult> {
    let logs = list_artifacts(&run.dir, &NETPERF_LOG_RE).map_err(|source| ParseError::Read {
      path: run.dir.clone(),
      source,
    })?;
    // Throughput and latency summaries both come from the run's single netperf log.
    if logs.len() != 1 {
      return Err(ParseError::ArtifactCount {
        dir: run.dir.clone(),
        pattern: NETPERF_LOG_RE.as_str().to_string(),
        expected: 1,
        found: logs.len(),
      });
    };
    let path = &logs[0];
    let text = read_artifact(path)?;
    let (throughput, throughput_units) = parse_netperf_throughput(path, &text)?;
    let lat = parse_netperf_latency(path, &text)?;
    Ok(NetworkResult {
      throughput,
      throughput_units,
      min_lat: lat.min,
      mean_lat: lat.mean,
      p90_lat: lat.p90,
      p99_lat: lat.p99,
      max_lat: lat.max,
      lat_std_dev: lat.std_dev,
      txn_rate: lat.txn_rate,
      observed_at: run.modified,
    })
  }

  fn csv_rows(cloud: &str, key: &str, res: &NetworkResult) -> Vec<Vec<String>> {
    vec![vec![
      cloud.to_string(),
      format_timestamp(res.observed_at),
      key.to_string(),
      format!("{:.6}", res.throughput),
      res.throughput_units.clone(),
      format!("{:.6}", res.min_lat),
      format!("{:.6}", res.mean_lat),
      format!("{:.6}", res.p90_lat),
      format!("{:.6}", res.p99_lat),
      format!("{:.6}", res.max_lat),
      format!("{:.6}", res.lat_std_dev),
      format!("{:.6}", res.txn_rate),
    ]]
  }
}
