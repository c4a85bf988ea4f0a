use super::Family;
use super::MetricFamily;
use crate::cloud::CloudDetails;
use crate::csv::format_timestamp;
use crate::discovery::RunHandle;
use crate::error::ParseError;
use crate::error::ParseResult;
use crate::parse::last_line;
use crate::parse::load_artifacts;
use crate::parse::parse_number;
use chrono::DateTime;
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use std::path::PathBuf;

static SINGLE_LOG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^single-.*\.log$").unwrap());
static MULTI_LOG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^multi-.*\.log$").unwrap());

#[derive(Clone, Debug, PartialEq)]
pub struct CoremarkResult {
  /// Cores used by the multi-threaded runs.
  pub cores: i64,
  pub single: f64,
  pub multi: f64,
  pub observed_at: DateTime<Utc>,
}

/// Extracts `(cores, iterations/sec)` from a coremark summary line such as
/// `CoreMark 1.0 : 25316.227848 / GCC9.3.0 -O2 / Heap / 4:Threads`.
///
/// The score is the first `/`-separated field and the core count the fourth, each taken after the first `:` of their concatenation. Single-threaded runs have no fourth field, which means one core.
pub fn parse_coremark_line(path: &Path, line: &str) -> ParseResult<(i64, f64)> {
  let slashed: Vec<&str> = line.split('/').collect();
  let mut selected = slashed[0].to_string();
  if let Some(cores) = slashed.get(3) {
    selected.push('/');
    selected.push_str(cores);
  };
  let summary = selected.split(':').nth(1).unwrap_or(selected.as_str());

  let pieces: Vec<&str> = summary.split('/').collect();
  if pieces.len() > 2 {
    return Err(ParseError::TooManyFields {
      path: path.to_path_buf(),
      max: 2,
      found: pieces.len(),
    });
  };
  let iters: f64 = parse_number(path, pieces[0])?;
  let cores = match pieces.get(1) {
    Some(c) => parse_number(path, c)?,
    None => 1,
  };
  Ok((cores, iters))
}

pub fn parse_coremark_log(path: &Path, text: &str) -> ParseResult<(i64, f64)> {
  parse_coremark_line(path, last_line(path, text)?)
}

/// Averages the scores of several logs of the same kind, which must all agree on the core count.
pub fn average_coremark_logs(logs: &[(PathBuf, String)]) -> ParseResult<(i64, f64)> {
  let mut cores: Option<i64> = None;
  let mut total_iters = 0.0;
  for (path, text) in logs {
    let (nc, iters) = parse_coremark_log(path, text)?;
    match cores {
      None => cores = Some(nc),
      Some(expected) if expected != nc => {
        return Err(ParseError::CoreCountMismatch {
          path: path.clone(),
          expected,
          found: nc,
        });
      }
      Some(_) => {}
    };
    total_iters += iters;
  }
  let avg = if logs.is_empty() {
    0.0
  } else {
    total_iters / logs.len() as f64
  };
  Ok((cores.unwrap_or(1), avg))
}

pub struct Coremark;

impl MetricFamily for Coremark {
  type Record = CoremarkResult;

  const FAMILY: Family = Family::Cpu;

  fn key(_cloud: &CloudDetails, machine_type: &str) -> String {
    machine_type.to_string()
  }

  fn load(run: &RunHandle, _cloud: &CloudDetails, _machine_type: &str) -> ParseResult<CoremarkResult> {
    let (_, single) = average_coremark_logs(&load_artifacts(&run.dir, &SINGLE_LOG_RE)?)?;
    let (cores, multi) = average_coremark_logs(&load_artifacts(&run.dir, &MULTI_LOG_RE)?)?;
    Ok(CoremarkResult {
      cores,
      single,
      multi,
      observed_at: run.modified,
    })
  }

  fn csv_rows(cloud: &str, key: &str, res: &CoremarkResult) -> Vec<Vec<String>> {
    let per_core = if res.cores > 0 {
      res.multi / res.cores as f64
    } else {
      0.0
    };
    vec![vec![
      cloud.to_string(),
      format_timestamp(res.observed_at),
      key.to_string(),
      res.cores.to_string(),
      format!("{:.6}", res.single),
      format!("{:.6}", res.multi),
      format!("{:.6}", per_core),
    ]]
  }
}
