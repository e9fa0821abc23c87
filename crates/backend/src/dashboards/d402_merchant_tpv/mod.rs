pub mod aggregator;
pub mod coordinator;
pub mod error;
pub mod executor;
pub mod export;
pub mod hermes_client;
pub mod input;
pub mod progress_tracker;
pub mod query_builder;
pub mod service;

pub use error::{TpvError, TpvResult};
pub use executor::{get_executor, initialize_executor, ReportExecutor};
pub use hermes_client::{FetchOutcome, HermesClient, RawRow, RowSource};
