//! Shared helpers for the text-log parsers. Every failure names the artifact it came from.

use crate::discovery::list_artifacts;
use crate::error::ParseError;
use crate::error::ParseResult;
use regex::Regex;
use std::fmt::Display;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;

pub(crate) fn read_artifact(path: &Path) -> ParseResult<String> {
  fs::read_to_string(path).map_err(|source| ParseError::Read {
    path: path.to_path_buf(),
    source,
  })
}

/// Reads every file in `dir` matching `pattern`, in name order. At least one must exist.
pub(crate) fn load_artifacts(dir: &Path, pattern: &Regex) -> ParseResult<Vec<(PathBuf, String)>> {
  let paths = list_artifacts(dir, pattern).map_err(|source| ParseError::Read {
    path: dir.to_path_buf(),
    source,
  })?;
  if paths.is_empty() {
    return Err(ParseError::MissingArtifact {
      dir: dir.to_path_buf(),
      pattern: pattern.as_str().to_string(),
    });
  };
  paths
    .into_iter()
    .map(|path| {
      let text = read_artifact(&path)?;
      Ok((path, text))
    })
    .collect()
}

pub(crate) fn first_line<'t>(path: &Path, text: &'t str) -> ParseResult<&'t str> {
  text.lines().next().ok_or_else(|| ParseError::MissingLine {
    path: path.to_path_buf(),
    line: "first",
  })
}

/// Trailing blank lines are ignored.
pub(crate) fn last_line<'t>(path: &Path, text: &'t str) -> ParseResult<&'t str> {
  text
    .lines()
    .rev()
    .find(|l| !l.trim().is_empty())
    .ok_or_else(|| ParseError::MissingLine {
      path: path.to_path_buf(),
      line: "last",
    })
}

pub(crate) fn fields_exactly<'t>(
  path: &Path,
  line: &'t str,
  expected: usize,
) -> ParseResult<Vec<&'t str>> {
  let fields: Vec<&str> = line.split_whitespace().collect();
  if fields.len() != expected {
    return Err(ParseError::FieldCount {
      path: path.to_path_buf(),
      expected,
      found: fields.len(),
    });
  };
  Ok(fields)
}

pub(crate) fn parse_number<T>(path: &Path, value: &str) -> ParseResult<T>
where
  T: FromStr,
  T::Err: Display,
{
  value
    .trim()
    .parse()
    .map_err(|err: T::Err| ParseError::InvalidNumber {
      path: path.to_path_buf(),
      value: value.to_string(),
      reason: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
  use super::fields_exactly;
  use super::last_line;
  use super::load_artifacts;
  use super::parse_number;
  use crate::error::ParseError;
  use regex::Regex;
  use std::path::Path;

  #[test]
  fn test_last_line_skips_trailing_blank_lines() {
    let p = Path::new("x.log");
    assert_eq!(last_line(p, "a\nb\n\n  \n").unwrap(), "b");
    assert!(matches!(
      last_line(p, "\n\n"),
      Err(ParseError::MissingLine { line: "last", .. })
    ));
  }

  #[test]
  fn test_field_count_error_names_path_and_shape() {
    let err = fields_exactly(Path::new("/logs/run.txt"), "1 2 3", 9).unwrap_err();
    assert_eq!(
      err.to_string(),
      "unexpected number of fields in /logs/run.txt: expected 9, found 3"
    );
  }

  #[test]
  fn test_parse_number() {
    let p = Path::new("x.log");
    assert_eq!(parse_number::<f64>(p, " 12.5\n").unwrap(), 12.5);
    assert_eq!(parse_number::<i64>(p, "42").unwrap(), 42);
    let err = parse_number::<f64>(p, "abc").unwrap_err();
    assert!(err.to_string().starts_with("error parsing \"abc\" in x.log"));
  }

  #[test]
  fn test_load_artifacts_requires_a_match() {
    let tmp = tempfile::tempdir().unwrap();
    let re = Regex::new(r"^tpcc-result.*\.txt$").unwrap();
    let err = load_artifacts(tmp.path(), &re).unwrap_err();
    assert!(matches!(err, ParseError::MissingArtifact { .. }));
    assert_eq!(err.path(), tmp.path());
  }
}
