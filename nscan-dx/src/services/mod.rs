//! Orchestration services for the diagnosis subsystem
//!
//! Each service is a per-request pipeline over injected collaborators
//! (record store pool, image store, inference client); no cross-request
//! shared mutable state.

pub mod diagnosis;
pub mod feedback;
pub mod history;
pub mod image_store;
pub mod inference;
