//! Service layer for the pet adoption workflow.
//! - Business rules live here, persistence and presence sit behind ports.
//! - sea-orm adapters for production, in-memory mocks for tests and docs.
//! - Errors carry their HTTP status as metadata for the web layer.

pub mod errors;
pub mod metrics;
pub mod notification;
pub mod pagination;
pub mod pet;
pub mod presence;
#[cfg(test)]
pub mod test_support;

pub use errors::ServiceError;
pub use pet::service::{DynPetService, PetService, PetServiceConfig};
