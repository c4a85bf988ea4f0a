use crate::cloud::format_machine_type;
use crate::error::AnalyzeError;
use crate::error::Result;
use crate::family::Family;
use chrono::DateTime;
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::io;
use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;

/// Marks a run whose artifacts were fully fetched.
pub const SUCCESS_SENTINEL: &str = "success";

static RUN_DIR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.+)-results\.(.+)$").unwrap());

/// A completed benchmark run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunHandle {
  pub dir: PathBuf,
  pub sentinel: PathBuf,
  /// Last-modified time of the sentinel.
  pub modified: DateTime<Utc>,
}

fn parse_run_dir_name(name: &str) -> Option<(&str, &str)> {
  // Pattern: {prefix}-results.{id}
  let caps = RUN_DIR_RE.captures(name)?;
  Some((caps.get(1)?.as_str(), caps.get(2)?.as_str()))
}

fn discovery_error(path: &Path) -> impl FnOnce(io::Error) -> AnalyzeError + '_ {
  move |source| AnalyzeError::Discovery {
    path: path.to_path_buf(),
    source,
  }
}

/// Lists the completed runs of `family` for one machine type under `log_dir`, ordered by run directory name. Run ids are date-suffixed, so this is also chronological for runs fetched by the benchmark scripts.
pub fn discover_runs(log_dir: &Path, machine_type: &str, family: Family) -> Result<Vec<RunHandle>> {
  let machine_dir = log_dir.join(format_machine_type(machine_type));
  let entries = match fs::read_dir(&machine_dir) {
    Ok(entries) => entries,
    Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
    Err(err) => return Err(discovery_error(&machine_dir)(err)),
  };

  let mut runs = Vec::new();
  for entry in entries {
    let entry = entry.map_err(discovery_error(&machine_dir))?;
    let name = entry.file_name().to_string_lossy().to_string();
    let Some((prefix, _)) = parse_run_dir_name(&name) else {
      continue;
    };
    if prefix != family.run_prefix() {
      continue;
    };
    let dir = entry.path();
    if !entry.file_type().map_err(discovery_error(&dir))?.is_dir() {
      continue;
    };
    let sentinel = dir.join(SUCCESS_SENTINEL);
    let meta = match fs::metadata(&sentinel) {
      Ok(meta) => meta,
      Err(err) if err.kind() == ErrorKind::NotFound => continue,
      Err(err) => return Err(discovery_error(&sentinel)(err)),
    };
    if !meta.is_file() {
      continue;
    };
    let modified = meta.modified().map_err(discovery_error(&sentinel))?;
    runs.push(RunHandle {
      dir,
      sentinel,
      modified: modified.into(),
    });
  }
  runs.sort_by(|a, b| a.dir.cmp(&b.dir));
  Ok(runs)
}

/// Files directly inside `dir` whose name matches `pattern`, sorted by name.
pub fn list_artifacts(dir: &Path, pattern: &Regex) -> io::Result<Vec<PathBuf>> {
  let mut found = Vec::new();
  for entry in fs::read_dir(dir)? {
    let entry = entry?;
    if !entry.file_type()?.is_file() {
      continue;
    };
    if pattern.is_match(&entry.file_name().to_string_lossy()) {
      found.push(entry.path());
    };
  }
  found.sort();
  Ok(found)
}
