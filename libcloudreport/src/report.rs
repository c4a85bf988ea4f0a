use crate::analyzer::CloudAnalyzer;
use crate::analyzer::ResultsAnalyzer;
use crate::cloud::CloudDetails;
use crate::cloud::ReportLayout;
use crate::error::Result;
use crate::family::Coremark;
use crate::family::Family;
use crate::family::Fio;
use crate::family::MetricFamily;
use crate::family::Netperf;
use crate::family::Tpcc;
use crate::registry::AnalyzerRegistry;
use tracing::error;

pub type BoxedAnalyzer = Box<dyn ResultsAnalyzer + Send>;

fn registry_for<M: MetricFamily>(layout: &ReportLayout) -> BoxedAnalyzer {
  let layout = layout.clone();
  Box::new(AnalyzerRegistry::new(move |cloud: &str| {
    CloudAnalyzer::<M>::new(cloud, layout.clone())
  }))
}

/// A registry of per-cloud analyzers for `family`, writing under `layout`.
pub fn family_registry(family: Family, layout: &ReportLayout) -> BoxedAnalyzer {
  match family {
    Family::Cpu => registry_for::<Coremark>(layout),
    Family::Net => registry_for::<Netperf>(layout),
    Family::Fio => registry_for::<Fio>(layout),
    Family::Tpcc => registry_for::<Tpcc>(layout),
  }
}

/// Analyzes `clouds` in order for one family and closes its registry. The registry is closed even if analysis fails, so every cloud's report holds what was accumulated before the failure; the analysis error wins over any close error.
pub fn analyze_family(family: Family, layout: &ReportLayout, clouds: &[CloudDetails]) -> Result<()> {
  let mut registry = family_registry(family, layout);
  let analyzed = clouds.iter().try_for_each(|cloud| registry.analyze(cloud));
  let closed = registry.close();
  if let (Err(_), Err(err)) = (&analyzed, &closed) {
    error!(family = %family, error = %err, "failed to close reports after analysis failure");
  };
  analyzed.and(closed)
}

/// All requested families of one report, driven one cloud at a time.
pub struct Report {
  families: Vec<(Family, BoxedAnalyzer)>,
}

impl Report {
  pub fn new(layout: &ReportLayout, families: impl IntoIterator<Item = Family>) -> Self {
    Self {
      families: families
        .into_iter()
        .map(|family| (family, family_registry(family, layout)))
        .collect(),
    }
  }

  pub fn families(&self) -> impl Iterator<Item = Family> + '_ {
    self.families.iter().map(|(family, _)| *family)
  }
}

impl ResultsAnalyzer for Report {
  fn analyze(&mut self, cloud: &CloudDetails) -> Result<()> {
    for (_, registry) in self.families.iter_mut() {
      registry.analyze(cloud)?;
    }
    Ok(())
  }

  fn close(&mut self) -> Result<()> {
    let mut first_err = None;
    for (family, registry) in self.families.iter_mut() {
      if let Err(err) = registry.close() {
        if first_err.is_none() {
          first_err = Some(err);
        } else {
          error!(family = %family, error = %err, "failed to close reports");
        };
      };
    }
    match first_err {
      Some(err) => Err(err),
      None => Ok(()),
    }
  }
}
