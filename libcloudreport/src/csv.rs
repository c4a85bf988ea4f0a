use chrono::DateTime;
use chrono::TimeZone;
use chrono::Utc;
use std::borrow::Cow;
use std::fs::File;
use std::io;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;

pub fn format_timestamp(ts: DateTime<Utc>) -> String {
  ts.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

pub fn format_unix_timestamp(secs: i64) -> String {
  Utc
    .timestamp_opt(secs, 0)
    .single()
    .map(format_timestamp)
    .unwrap_or_else(|| secs.to_string())
}

/// Per-second rate of `value` over `runtime_ms`, or 0 when either is zero.
pub fn rate(value: i64, runtime_ms: i64) -> f64 {
  if value <= 0 || runtime_ms <= 0 {
    return 0.0;
  };
  value as f64 / (runtime_ms as f64 / 1000.0)
}

fn escape_field(field: &str) -> Cow<'_, str> {
  if field.contains(&[',', '"', '\n', '\r'][..]) {
    Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
  } else {
    Cow::Borrowed(field)
  }
}

/// Writes the header and rows to `path`, replacing whatever was there. Returns the number of data rows.
pub fn write_csv<I>(path: &Path, header: &str, rows: I) -> io::Result<usize>
where
  I: IntoIterator<Item = Vec<String>>,
{
  let mut out = BufWriter::new(File::create(path)?);
  writeln!(out, "{header}")?;
  let mut written = 0;
  for row in rows {
    let line = row
      .iter()
      .map(|f| escape_field(f))
      .collect::<Vec<_>>()
      .join(",");
    writeln!(out, "{line}")?;
    written += 1;
  }
  out.flush()?;
  Ok(written)
}

#[cfg(test)]
mod tests {
  use super::escape_field;
  use super::format_timestamp;
  use super::format_unix_timestamp;
  use super::rate;
  use super::write_csv;
  use chrono::TimeZone;
  use chrono::Utc;
  use std::fs;

  #[test]
  fn test_rate() {
    assert_eq!(rate(5000, 2000), 2500.0);
    assert_eq!(rate(0, 2000), 0.0);
    assert_eq!(rate(5000, 0), 0.0);
  }

  #[test]
  fn test_timestamps() {
    let ts = Utc.with_ymd_and_hms(2022, 3, 4, 5, 6, 7).unwrap();
    assert_eq!(format_timestamp(ts), "2022-03-04 05:06:07 UTC");
    assert_eq!(format_unix_timestamp(ts.timestamp()), "2022-03-04 05:06:07 UTC");
  }

  #[test]
  fn test_escape_field() {
    assert_eq!(escape_field("plain"), "plain");
    assert_eq!(escape_field("a,b"), "\"a,b\"");
    assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
  }

  #[test]
  fn test_write_csv_truncates() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("out.csv");
    let rows = vec![
      vec!["a".to_string(), "1".to_string()],
      vec!["b".to_string(), "2".to_string()],
    ];
    assert_eq!(write_csv(&path, "Name,Value", rows).unwrap(), 2);
    assert_eq!(write_csv(&path, "Name,Value", vec![vec!["c".to_string(), "3".to_string()]]).unwrap(), 1);
    assert_eq!(fs::read_to_string(&path).unwrap(), "Name,Value\nc,3\n");
  }
}
