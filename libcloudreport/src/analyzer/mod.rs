
use crate::cloud::CloudDetails;
use crate::cloud::ReportLayout;
use crate::csv::write_csv;
use crate::discovery::discover_runs;
use crate::error::AnalyzeError;
use crate::error::Result;
use crate::family::MetricFamily;
use crate::store::ResultStore;
use std::marker::PhantomData;
use tracing::debug;
use tracing::info;
use tracing::warn;

/// Something that accumulates results over one or more analysis passes and emits them once on close.
pub trait ResultsAnalyzer {
  fn analyze(&mut self, cloud: &CloudDetails) -> Result<()>;

  fn close(&mut self) -> Result<()>;
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AnalyzerState {
  /// Nothing stored yet.
  Idle,
  /// At least one result stored.
  Accumulating,
  /// The report was written; no further analysis is accepted.
  Closed,
}

/// Analyzer of one metric family for one cloud. Holds the latest result per key and writes them as a CSV on close.
pub struct CloudAnalyzer<M: MetricFamily> {
  cloud: String,
  layout: ReportLayout,
  state: AnalyzerState,
  results: ResultStore<M::Record>,
  _family: PhantomData<M>,
}

impl<M: MetricFamily> CloudAnalyzer<M> {
  pub fn new(cloud: impl Into<String>, layout: ReportLayout) -> Self {
    Self {
      cloud: cloud.into(),
      layout,
      state: AnalyzerState::Idle,
      results: ResultStore::new(),
      _family: PhantomData,
    }
  }

  pub fn cloud(&self) -> &str {
    &self.cloud
  }

  pub fn state(&self) -> AnalyzerState {
    self.state
  }

  pub fn results(&self) -> &ResultStore<M::Record> {
    &self.results
  }
}

impl<M: MetricFamily> ResultsAnalyzer for CloudAnalyzer<M> {
  fn analyze(&mut self, cloud: &CloudDetails) -> Result<()> {
    if self.state == AnalyzerState::Closed {
      return Err(AnalyzeError::Closed {
        cloud: self.cloud.clone(),
      });
    };
    if cloud.cloud != self.cloud {
      return Err(AnalyzeError::IdentityMismatch {
        expected: self.cloud.clone(),
        actual: cloud.cloud.clone(),
      });
    };

    let log_dir = self.layout.log_dir(cloud);
    let mut analyzed = 0usize;
    let mut skipped = 0usize;
    for machine_type in cloud.machine_types.iter() {
      let runs = match discover_runs(&log_dir, machine_type, M::FAMILY) {
        Ok(runs) => runs,
        Err(err) => {
          warn!(
            cloud = %self.cloud,
            family = %M::FAMILY,
            machine_type = %machine_type,
            error = %err,
            "skipping machine type"
          );
          continue;
        }
      };
      let key = M::key(cloud, machine_type);
      for run in runs {
        if !self.results.should_process(&key, run.modified) {
          debug!(run = %run.dir.display(), "run already analyzed");
          skipped += 1;
          continue;
        };
        info!(run = %run.dir.display(), "analyzing run");
        let record = M::load(&run, cloud, machine_type)?;
        self.results.record(key.clone(), run.modified, record);
        self.state = AnalyzerState::Accumulating;
        analyzed += 1;
      }
    }
    info!(
      cloud = %self.cloud,
      family = %M::FAMILY,
      analyzed,
      skipped,
      "analysis pass complete"
    );
    Ok(())
  }

  /// Writes the report. The analyzer only becomes closed once the write succeeds, so a failed close can be retried.
  fn close(&mut self) -> Result<()> {
    if self.state == AnalyzerState::Closed {
      return Ok(());
    };

    let family = M::FAMILY;
    let path = self
      .layout
      .results_file(family.csv_file_name(), &self.cloud)
      .map_err(|source| AnalyzeError::Io {
        path: self.layout.results_dir(&self.cloud),
        source,
      })?;
    let rows = self
      .results
      .iter()
      .flat_map(|(key, stored)| M::csv_rows(&self.cloud, key, &stored.record));
    let written = write_csv(&path, family.csv_header(), rows).map_err(|source| AnalyzeError::Io {
      path: path.clone(),
      source,
    })?;
    self.state = AnalyzerState::Closed;
    info!(
      cloud = %self.cloud,
      family = %family,
      rows = written,
      path = %path.display(),
      "wrote report"
    );
    Ok(())
  }
}
