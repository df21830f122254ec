//! End-of-day ingestion: fetch, normalize, persist

pub mod marketstack;
pub mod normalize;
pub mod provider;
pub mod schema;
pub mod store;

pub use marketstack::MarketstackProvider;
pub use normalize::normalize;
pub use provider::{fetch, DataError, EodProvider, EodRequest, RawEodRecord};
pub use schema::{EodSchema, COLUMNS};
pub use store::{load_table, persist};
