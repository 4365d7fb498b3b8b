//! Emission backends.

mod report;
mod sql;

pub use report::ReportGenerator;
pub use sql::SqlGenerator;
