pub mod data_service;

pub use data_service::{parse_csv, parse_workbook, DataService};
