use anyhow::bail;
use libcloudreport::CloudDetails;
use libcloudreport::ReportLayout;
use serde::Deserialize;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConfCloud {
  pub cloud: String,
  // Disk or machine class the logs were collected under, e.g. `ebs-gp3`.
  pub group: String,
  pub machine_types: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Conf {
  pub base_dir: PathBuf,
  pub report_version: String,
  // Override `<base_dir>/<report_version>/logs`.
  pub log_root: Option<PathBuf>,
  // Override `<base_dir>/<report_version>/results`.
  pub results_dir: Option<PathBuf>,

  #[serde(default)]
  pub sequential: bool,

  pub clouds: Vec<ConfCloud>,
}

impl Conf {
  pub fn layout(&self) -> ReportLayout {
    let default = ReportLayout::for_report(&self.base_dir, &self.report_version);
    ReportLayout::new(
      self
        .log_root
        .clone()
        .unwrap_or_else(|| default.log_root().to_path_buf()),
      self
        .results_dir
        .clone()
        .unwrap_or_else(|| default.results_root().to_path_buf()),
    )
  }

  /// The configured clouds in file order, restricted to `only` if it isn't empty.
  pub fn clouds(&self, only: &[String]) -> anyhow::Result<Vec<CloudDetails>> {
    for name in only {
      if !self.clouds.iter().any(|c| &c.cloud == name) {
        bail!("cloud {name} is not configured");
      };
    }
    Ok(
      self
        .clouds
        .iter()
        .filter(|c| only.is_empty() || only.contains(&c.cloud))
        .map(|c| CloudDetails::new(&c.cloud, &c.group, &c.machine_types))
        .collect(),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::Conf;
  use std::path::Path;

  const CONF: &str = r#"
base_dir = "/srv/reports"
report_version = "2022"

[[clouds]]
cloud = "aws"
group = "ebs-gp3"
machine_types = ["m5.xlarge", "c5.2xlarge"]

[[clouds]]
cloud = "gcp"
group = "pd-ssd"
machine_types = ["n2-standard-8"]
"#;

  #[test]
  fn test_defaults() {
    let conf: Conf = toml::from_str(CONF).unwrap();
    assert!(!conf.sequential);
    let layout = conf.layout();
    assert_eq!(layout.log_root(), Path::new("/srv/reports/2022/logs"));
    assert_eq!(layout.results_root(), Path::new("/srv/reports/2022/results"));

    let clouds = conf.clouds(&[]).unwrap();
    assert_eq!(clouds.len(), 2);
    assert_eq!(clouds[0].cloud, "aws");
    assert_eq!(clouds[0].group, "ebs-gp3");
    assert!(clouds[0].machine_types.contains("m5.xlarge"));
  }

  #[test]
  fn test_overrides() {
    let raw = format!("log_root = \"/mnt/logs\"\nresults_dir = \"/tmp/out\"\nsequential = true\n{CONF}");
    let conf: Conf = toml::from_str(&raw).unwrap();
    assert!(conf.sequential);
    let layout = conf.layout();
    assert_eq!(layout.log_root(), Path::new("/mnt/logs"));
    assert_eq!(layout.results_root(), Path::new("/tmp/out"));
  }

  #[test]
  fn test_cloud_selection() {
    let conf: Conf = toml::from_str(CONF).unwrap();
    let clouds = conf.clouds(&["gcp".to_string()]).unwrap();
    assert_eq!(clouds.len(), 1);
    assert_eq!(clouds[0].cloud, "gcp");

    let err = conf.clouds(&["azure".to_string()]).unwrap_err();
    assert_eq!(err.to_string(), "cloud azure is not configured");
  }
}
