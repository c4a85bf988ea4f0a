use crate::cloud::CloudDetails;
use crate::discovery::RunHandle;
use crate::error::ParseResult;
use strum::Display;
use strum::EnumIter;
use strum::EnumString;

pub mod cpu;
pub mod fio;
pub mod net;
pub mod tpcc;

pub use cpu::Coremark;
pub use fio::Fio;
pub use net::Netperf;
pub use tpcc::Tpcc;

const CPU_CSV_HEADER: &str = "Cloud,Date,MachineType,Cores,Single,Multi,Multi/vCPU";

const NET_CSV_HEADER: &str = "Cloud,Date,MachineType,Throughput,ThroughputUnits,minLat,meanLat,p90Lat,p99Lat,maxLat,latStdDev,txnRate";

const FIO_CSV_HEADER: &str = concat!(
  "Cloud,Group,Machine,Date,Job,BS,IoDepth,",
  "RdIOPs,RdIOP/s,RdBytes,RdBW(KiB/s),RdlMin,RdlMax,RdlMean,RdlStd,Rd90,Rd95,Rd99,Rd99.9,Rd99.99,",
  "WrIOPs,WrIOP/s,WrBytes,WrBW(KiB/s),WrlMin,WrlMax,WrlMean,WrlStd,Wr90,Wr95,Wr99,Wr99.9,Wr99.99,",
  "LatDepth,LatTarget,LatTargetPct,LatWindow",
);

const TPCC_CSV_HEADER: &str = "Cloud,Group,Date,MachineType,Warehouses,Pass,TpmC,Efc,Avg,P50,P90,P95,P99,PMax";

/// The metric families a report is made of. No other family exists without a matching CSV schema.
#[derive(
  Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Display, EnumIter, EnumString,
)]
#[strum(serialize_all = "lowercase")]
pub enum Family {
  Cpu,
  Net,
  Fio,
  Tpcc,
}

impl Family {
  /// Run directories are named `<prefix>-results.<id>`.
  pub fn run_prefix(self) -> &'static str {
    match self {
      Family::Cpu => "coremark",
      Family::Net => "netperf",
      Family::Fio => "fio",
      Family::Tpcc => "tpcc",
    }
  }

  pub fn csv_file_name(self) -> &'static str {
    match self {
      Family::Cpu => "cpu.csv",
      Family::Net => "net.csv",
      Family::Fio => "fio.csv",
      Family::Tpcc => "tpcc.csv",
    }
  }

  pub fn csv_header(self) -> &'static str {
    match self {
      Family::Cpu => CPU_CSV_HEADER,
      Family::Net => NET_CSV_HEADER,
      Family::Fio => FIO_CSV_HEADER,
      Family::Tpcc => TPCC_CSV_HEADER,
    }
  }
}

/// How one metric family turns a completed run into a record, and a record into CSV rows.
pub trait MetricFamily: Send + 'static {
  type Record: Send + 'static;

  const FAMILY: Family;

  /// Key of the result store entry a machine type's runs compete for.
  fn key(cloud: &CloudDetails, machine_type: &str) -> String;

  fn load(run: &RunHandle, cloud: &CloudDetails, machine_type: &str) -> ParseResult<Self::Record>;

  /// One row per sub-record; each row has as many fields as the family's CSV header.
  fn csv_rows(cloud: &str, key: &str, record: &Self::Record) -> Vec<Vec<String>>;
}

pub(crate) fn group_machine_key(cloud: &CloudDetails, machine_type: &str) -> String {
  format!("{}-{}", cloud.group, machine_type)
}

#[cfg(test)]
mod tests {
  use super::Family;
  use std::str::FromStr;
  use strum::IntoEnumIterator;

  #[test]
  fn test_family_names() {
    assert_eq!(Family::Cpu.to_string(), "cpu");
    assert_eq!(Family::from_str("tpcc").unwrap(), Family::Tpcc);
    assert!(Family::from_str("gpu").is_err());
    assert_eq!(Family::iter().count(), 4);
  }

  #[test]
  fn test_io_header_has_thirteen_columns_per_direction() {
    let header = Family::Fio.csv_header();
    let columns: Vec<&str> = header.split(',').collect();
    assert_eq!(columns.len(), 7 + 13 + 13 + 4);
    assert_eq!(columns.iter().filter(|c| c.starts_with("Rd")).count(), 13);
    assert_eq!(columns.iter().filter(|c| c.starts_with("Wr")).count(), 13);
    assert_eq!(columns.last(), Some(&"LatWindow"));
  }
}
