//! HTTP API handlers for asana-ci

pub mod csv_import;
pub mod health;
pub mod sse;
pub mod uploads;

pub use csv_import::import_routes;
pub use health::health_routes;
pub use sse::upload_event_stream;
pub use uploads::upload_routes;
