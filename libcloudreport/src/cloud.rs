use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

/// Scope of one analysis pass: a cloud, its disk/class group, and the machine types benchmarked on it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudDetails {
  pub cloud: String,
  pub group: String,
  pub machine_types: BTreeSet<String>,
}

impl CloudDetails {
  pub fn new<M: Into<String>>(
    cloud: impl Into<String>,
    group: impl Into<String>,
    machine_types: impl IntoIterator<Item = M>,
  ) -> Self {
    Self {
      cloud: cloud.into(),
      group: group.into(),
      machine_types: machine_types.into_iter().map(Into::into).collect(),
    }
  }
}

/// Machine type names may contain dots (e.g. `m5.xlarge`), which are replaced for use as directory names.
pub fn format_machine_type(machine_type: &str) -> String {
  machine_type.replace('.', "-")
}

/// Where raw benchmark logs are read from and where CSV reports are written to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportLayout {
  log_root: PathBuf,
  results_dir: PathBuf,
}

impl ReportLayout {
  pub fn new(log_root: impl Into<PathBuf>, results_dir: impl Into<PathBuf>) -> Self {
    Self {
      log_root: log_root.into(),
      results_dir: results_dir.into(),
    }
  }

  /// Logs live under `<base>/<version>/logs`, reports under `<base>/<version>/results`.
  pub fn for_report(base_dir: &Path, report_version: &str) -> Self {
    let version_dir = base_dir.join(report_version);
    Self::new(version_dir.join("logs"), version_dir.join("results"))
  }

  pub fn log_root(&self) -> &Path {
    &self.log_root
  }

  pub fn results_root(&self) -> &Path {
    &self.results_dir
  }

  pub fn log_dir(&self, cloud: &CloudDetails) -> PathBuf {
    self.log_root.join(&cloud.cloud).join(&cloud.group)
  }

  pub fn results_dir(&self, cloud: &str) -> PathBuf {
    self.results_dir.join(cloud)
  }

  /// Creates the cloud's results directory if it doesn't exist yet.
  pub fn results_file(&self, file_name: &str, cloud: &str) -> io::Result<PathBuf> {
    let dir = self.results_dir(cloud);
    fs::create_dir_all(&dir)?;
    Ok(dir.join(file_name))
  }
}

#[cfg(test)]
mod tests {
  use super::format_machine_type;
  use super::CloudDetails;
  use super::ReportLayout;
  use std::path::Path;
  use std::path::PathBuf;

  #[test]
  fn test_format_machine_type() {
    assert_eq!(format_machine_type("m5.xlarge"), "m5-xlarge");
    assert_eq!(format_machine_type("n2-standard-8"), "n2-standard-8");
    assert_eq!(format_machine_type("a.b.c"), "a-b-c");
  }

  #[test]
  fn test_layout_paths() {
    let layout = ReportLayout::for_report(Path::new("/reports"), "2022");
    let cloud = CloudDetails::new("aws", "ebs", ["m5.xlarge"]);
    assert_eq!(layout.log_dir(&cloud), PathBuf::from("/reports/2022/logs/aws/ebs"));
    assert_eq!(layout.results_dir("aws"), PathBuf::from("/reports/2022/results/aws"));
  }

  #[test]
  fn test_results_file_creates_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let layout = ReportLayout::new(tmp.path().join("logs"), tmp.path().join("out"));
    let path = layout.results_file("cpu.csv", "gcp").unwrap();
    assert_eq!(path, tmp.path().join("out").join("gcp").join("cpu.csv"));
    assert!(tmp.path().join("out").join("gcp").is_dir());
  }

  #[test]
  fn test_machine_types_are_deduplicated_and_sorted() {
    let cloud = CloudDetails::new("azure", "premium", ["Standard_D8s", "Standard_D4s", "Standard_D8s"]);
    let types: Vec<&str> = cloud.machine_types.iter().map(String::as_str).collect();
    assert_eq!(types, vec!["Standard_D4s", "Standard_D8s"]);
  }
}
