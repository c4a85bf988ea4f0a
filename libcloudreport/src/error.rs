use std::io;
use std::path::Path;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalyzeError>;

pub type ParseResult<T> = std::result::Result<T, ParseError>;

#[derive(Debug, Error)]
pub enum AnalyzeError {
  /// The run directories of one machine type could not be enumerated. The analyzer skips the machine type.
  #[error("failed to discover runs under {}: {source}", path.display())]
  Discovery {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
  #[error(transparent)]
  Parse(#[from] ParseError),
  #[error("expected {expected} cloud, got {actual}")]
  IdentityMismatch { expected: String, actual: String },
  #[error("analyzer for {cloud} cloud is already closed")]
  Closed { cloud: String },
  #[error("failed to write {}: {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// Every variant names the artifact it came from.
#[derive(Debug, Error)]
pub enum ParseError {
  #[error("failed to read {}: {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
  #[error("no artifact matching {pattern} in {}", dir.display())]
  MissingArtifact { dir: PathBuf, pattern: String },
  #[error("unexpected number of artifacts matching {pattern} in {}: expected {expected}, found {found}", dir.display())]
  ArtifactCount {
    dir: PathBuf,
    pattern: String,
    expected: usize,
    found: usize,
  },
  #[error("{} has no {line} line", path.display())]
  MissingLine { path: PathBuf, line: &'static str },
  #[error("unexpected number of fields in {}: expected {expected}, found {found}", path.display())]
  FieldCount {
    path: PathBuf,
    expected: usize,
    found: usize,
  },
  #[error("unexpected number of fields in {}: expected up to {max}, found {found}", path.display())]
  TooManyFields {
    path: PathBuf,
    max: usize,
    found: usize,
  },
  #[error("error parsing {value:?} in {}: {reason}", path.display())]
  InvalidNumber {
    path: PathBuf,
    value: String,
    reason: String,
  },
  #[error("expected same number of cores ({expected}), found {found} in {}", path.display())]
  CoreCountMismatch {
    path: PathBuf,
    expected: i64,
    found: i64,
  },
  #[error("error unmarshalling {}: {source}", path.display())]
  Json {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },
}

impl ParseError {
  pub fn path(&self) -> &Path {
    match self {
      ParseError::Read { path, .. }
      | ParseError::MissingLine { path, .. }
      | ParseError::FieldCount { path, .. }
      | ParseError::TooManyFields { path, .. }
      | ParseError::InvalidNumber { path, .. }
      | ParseError::CoreCountMismatch { path, .. }
      | ParseError::Json { path, .. } => path,
      ParseError::MissingArtifact { dir, .. } | ParseError::ArtifactCount { dir, .. } => dir,
    }
  }
}
