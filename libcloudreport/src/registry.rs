use crate::analyzer::ResultsAnalyzer;
use crate::cloud::CloudDetails;
use crate::error::AnalyzeError;
use crate::error::Result;
use ahash::HashMap;
use ahash::HashMapExt;
use itertools::Itertools;
use tracing::error;

/// Routes each cloud to its own analyzer, creating it on first use. The registry itself holds no results.
pub struct AnalyzerRegistry<A, F> {
  factory: F,
  analyzers: HashMap<String, A>,
  closed: bool,
}

impl<A, F> AnalyzerRegistry<A, F>
where
  A: ResultsAnalyzer,
  F: FnMut(&str) -> A,
{
  pub fn new(factory: F) -> Self {
    Self {
      factory,
      analyzers: HashMap::new(),
      closed: false,
    }
  }

  pub fn len(&self) -> usize {
    self.analyzers.len()
  }

  pub fn is_empty(&self) -> bool {
    self.analyzers.is_empty()
  }

  pub fn get(&self, cloud: &str) -> Option<&A> {
    self.analyzers.get(cloud)
  }
}

impl<A, F> ResultsAnalyzer for AnalyzerRegistry<A, F>
where
  A: ResultsAnalyzer,
  F: FnMut(&str) -> A,
{
  fn analyze(&mut self, cloud: &CloudDetails) -> Result<()> {
    if self.closed {
      return Err(AnalyzeError::Closed {
        cloud: cloud.cloud.clone(),
      });
    };
    let factory = &mut self.factory;
    self
      .analyzers
      .entry(cloud.cloud.clone())
      .or_insert_with(|| factory(&cloud.cloud))
      .analyze(cloud)
  }

  /// Closes every analyzer in cloud name order, even after one fails. Returns the first failure.
  fn close(&mut self) -> Result<()> {
    if self.closed {
      return Ok(());
    };
    self.closed = true;

    let mut first_err = None;
    for (cloud, analyzer) in self.analyzers.iter_mut().sorted_by(|a, b| a.0.cmp(b.0)) {
      if let Err(err) = analyzer.close() {
        if first_err.is_none() {
          first_err = Some(err);
        } else {
          error!(cloud = %cloud, error = %err, "failed to close analyzer");
        };
      };
    }
    match first_err {
      Some(err) => Err(err),
      None => Ok(()),
    }
  }
}
