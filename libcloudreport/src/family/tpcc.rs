use super::group_machine_key;
use super::Family;
use super::MetricFamily;
use crate::cloud::CloudDetails;
use crate::csv::format_timestamp;
use crate::discovery::RunHandle;
use crate::error::ParseError;
use crate::error::ParseResult;
use crate::parse::fields_exactly;
use crate::parse::first_line;
use crate::parse::last_line;
use crate::parse::load_artifacts;
use crate::parse::parse_number;
use chrono::DateTime;
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

static TPCC_LOG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^tpcc-result.*\.txt$").unwrap());

const SUMMARY_FIELDS: usize = 9;
// The workload opens two connections per warehouse by default.
const CONNECTIONS_PER_WAREHOUSE: i64 = 2;
const PASS_MIN_EFFICIENCY_PCT: f64 = 85.0;
const PASS_MAX_P95_MS: f64 = 10000.0;

/// Latencies are in milliseconds.
#[derive(Clone, Debug, PartialEq)]
pub struct TpccRun {
  pub warehouses: i64,
  pub tpmc: f64,
  pub efficiency_pct: f64,
  pub avg: f64,
  pub p50: f64,
  pub p90: f64,
  pub p95: f64,
  pub p99: f64,
  pub pmax: f64,
}

impl TpccRun {
  /// A run passes if efficiency exceeds 85% and p95 is under 10s.
  pub fn pass(&self) -> bool {
    self.efficiency_pct > PASS_MIN_EFFICIENCY_PCT && self.p95 < PASS_MAX_P95_MS
  }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TpccResult {
  pub runs: Vec<TpccRun>,
  pub observed_at: DateTime<Utc>,
  pub machine: String,
  pub disk_group: String,
}

/// Parses one workload log. The first line announces the connections, e.g. `Initializing 2000 connections...`, and the last line is the summary:
///
/// ```text
/// _elapsed_______tpmC____efc__avg(ms)__p50(ms)__p90(ms)__p95(ms)__p99(ms)_pMax(ms)
///   900.0s    30733.3  95.6%    180.8    167.8    369.1    419.4    570.4   1677.7
/// ```
pub fn parse_tpcc_run(path: &Path, text: &str) -> ParseResult<TpccRun> {
  let header: Vec<&str> = first_line(path, text)?.split_whitespace().collect();
  let Some(connections) = header.get(1) else {
    return Err(ParseError::FieldCount {
      path: path.to_path_buf(),
      expected: 2,
      found: header.len(),
    });
  };
  let connections: i64 = parse_number(path, connections)?;

  let f = fields_exactly(path, last_line(path, text)?, SUMMARY_FIELDS)?;
  let efficiency = f[2].strip_suffix('%').unwrap_or(f[2]);
  Ok(TpccRun {
    warehouses: connections / CONNECTIONS_PER_WAREHOUSE,
    tpmc: parse_number(path, f[1])?,
    efficiency_pct: parse_number(path, efficiency)?,
    avg: parse_number(path, f[3])?,
    p50: parse_number(path, f[4])?,
    p90: parse_number(path, f[5])?,
    p95: parse_number(path, f[6])?,
    p99: parse_number(path, f[7])?,
    pmax: parse_number(path, f[8])?,
  })
}

pub struct Tpcc;

impl MetricFamily for Tpcc {
  type Record = TpccResult;

  const FAMILY: Family = Family::Tpcc;

  fn key(cloud: &CloudDetails, machine_type: &str) -> String {
    group_machine_key(cloud, machine_type)
  }

  fn load(run: &RunHandle, cloud: &CloudDetails, machine_type: &str) -> ParseResult<TpccResult> {
    let runs = load_artifacts(&run.dir, &TPCC_LOG_RE)?
      .iter()
      .map(|(path, text)| parse_tpcc_run(path, text))
      .collect::<ParseResult<Vec<_>>>()?;
    Ok(TpccResult {
      runs,
      observed_at: run.modified,
      machine: machine_type.to_string(),
      disk_group: cloud.group.clone(),
    })
  }

  fn csv_rows(cloud: &str, _key: &str, res: &TpccResult) -> Vec<Vec<String>> {
    res
      .runs
      .iter()
      .map(|run| {
        vec![
          cloud.to_string(),
          res.disk_group.clone(),
          format_timestamp(res.observed_at),
          res.machine.clone(),
          run.warehouses.to_string(),
          run.pass().to_string(),
          format!("{:.6}", run.tpmc),
          format!("{:.6}", run.efficiency_pct),
          format!("{:.6}", run.avg),
          format!("{:.6}", run.p50),
          format!("{:.6}", run.p90),
          format!("{:.6}", run.p95),
          format!("{:.6}", run.p99),
          format!("{:.6}", run.pmax),
        ]
      })
      .collect()
  }
}
