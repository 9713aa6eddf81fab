//! Start/stop control of the ingestion run loop

pub mod routes;

pub use routes::control_routes;
