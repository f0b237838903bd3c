pub mod json;

pub use json::{JsonFormatter, PrinterReportJson, SupplyJson, SupplySummary};
