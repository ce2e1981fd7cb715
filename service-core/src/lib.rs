//! service-core: Shared infrastructure for the todo service.
pub mod config;
pub mod error;
pub mod middleware;
pub mod observability;
