pub mod error;
pub mod load;
pub mod metrics;
pub mod report;
pub mod schema;
pub mod source;
