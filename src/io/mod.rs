pub mod reporting;
pub mod summary;
