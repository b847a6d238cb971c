//! Analytics over collected intake responses.
//!
//! - `dataset`: pure lookups over the response table
//! - `summary`: headline numbers for the report
//! - `agent`: tool-calling analyst for free-form admin questions
//! - `routes`: admin REST endpoints

pub mod agent;
pub mod dataset;
pub mod routes;
pub mod summary;

pub use agent::AnalyticsAgent;
pub use routes::{AnalyticsRouteState, analytics_routes};
pub use summary::{AnalyticsSummary, SummaryBuilder};
