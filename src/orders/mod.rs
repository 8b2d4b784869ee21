//! Order tracking against the store's REST API, from the wire model through
//! to the formatted reply text.

pub mod client;
pub mod format;
pub mod model;
pub mod status;

pub use client::OrderApi;
pub use model::{LookupOutcome, OrderRecord, OrderSummary, SearchOutcome};
