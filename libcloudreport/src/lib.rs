pub mod analyzer;
pub mod cloud;
pub mod csv;
pub mod discovery;
pub mod error;
pub mod family;
mod parse;
pub mod registry;
pub mod report;
pub mod store;

pub use analyzer::AnalyzerState;
pub use analyzer::CloudAnalyzer;
pub use analyzer::ResultsAnalyzer;
pub use cloud::format_machine_type;
pub use cloud::CloudDetails;
pub use cloud::ReportLayout;
pub use error::AnalyzeError;
pub use error::ParseError;
pub use error::Result;
pub use family::Family;
pub use family::MetricFamily;
pub use registry::AnalyzerRegistry;
pub use report::analyze_family;
pub use report::family_registry;
pub use report::Report;
