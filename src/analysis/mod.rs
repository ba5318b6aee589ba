pub mod correlation;
pub mod insight;
pub mod summary;

pub use correlation::{correlation_matrix, CorrelationMatrix};
pub use insight::{insights, CorrelatedPair, InsightReport, TOP_N};
pub use summary::{column_info, describe, overview, ColumnInfo, DescribeRow, Overview};
