//! Public read access to the ingested catalog

pub mod queries;
pub mod routes;

pub use queries::PAGE_SIZE;
pub use routes::catalog_routes;
