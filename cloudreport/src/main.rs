use anyhow::Context;
use clap::Parser;
use conf::Conf;
use itertools::Itertools;
use libcloudreport::analyze_family;
use libcloudreport::Family;
use libcloudreport::Report;
use libcloudreport::ResultsAnalyzer;
use std::path::PathBuf;
use std::sync::Arc;
use strum::IntoEnumIterator;
use tokio::fs::read_to_string;
use tokio::task::spawn_blocking;
use tracing::error;
use tracing::info;

pub mod conf;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
  /// Path to the configuration file.
  #[arg(long)]
  config: PathBuf,

  /// Only analyze this cloud. Can be repeated.
  #[arg(long = "cloud")]
  clouds: Vec<String>,

  /// Only write this report (cpu, net, fio, or tpcc). Can be repeated.
  #[arg(long = "family")]
  families: Vec<Family>,

  /// Analyze one family at a time instead of all in parallel.
  #[arg(long)]
  sequential: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt::init();

  let cli = Cli::parse();

  let conf_raw = read_to_string(&cli.config)
    .await
    .with_context(|| format!("read config file {}", cli.config.display()))?;
  let conf: Conf = toml::from_str(&conf_raw).context("parse config file")?;

  let layout = conf.layout();
  let clouds = conf.clouds(&cli.clouds)?;
  let families = if cli.families.is_empty() {
    Family::iter().collect_vec()
  } else {
    cli.families.into_iter().unique().collect_vec()
  };
  info!(
    log_root = %layout.log_root().display(),
    results = %layout.results_root().display(),
    clouds = clouds.len(),
    families = %families.iter().join(","),
    "generating report"
  );

  if cli.sequential || conf.sequential {
    let mut report = Report::new(&layout, families);
    let analyzed = clouds.iter().try_for_each(|cloud| report.analyze(cloud));
    let closed = report.close();
    analyzed.and(closed)?;
  } else {
    let clouds = Arc::new(clouds);
    let tasks = families
      .into_iter()
      .map(|family| {
        let layout = layout.clone();
        let clouds = clouds.clone();
        (
          family,
          spawn_blocking(move || analyze_family(family, &layout, &clouds)),
        )
      })
      .collect_vec();
    // Every family runs to completion; the first failure is reported.
    let mut first_err = None;
    for (family, task) in tasks {
      let res = task
        .await
        .with_context(|| format!("{family} analysis task"))?;
      if let Err(err) = res {
        error!(family = %family, error = %err, "analysis failed");
        first_err.get_or_insert(anyhow::Error::new(err).context(format!("{family} report")));
      };
    }
    if let Some(err) = first_err {
      return Err(err);
    };
  };

  info!("report complete");
  Ok(())
}
