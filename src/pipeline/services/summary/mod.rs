pub mod export;
pub mod summary_builder;

pub use summary_builder::{summary_rows, SummaryRow, SummaryTable, SUMMARY_HEADER};
