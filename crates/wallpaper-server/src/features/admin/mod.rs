//! Trusted-deployment endpoints: browse the source API, grow the work queue,
//! run single ingestion steps

pub mod routes;

pub use routes::{admin_routes, AdminState};
