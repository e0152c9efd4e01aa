//! Palisade Core — domain models, boundary DTOs, repository contracts,
//! the error taxonomy, pagination/filtering primitives and identifier
//! generation shared across all crates.

pub mod dto;
pub mod error;
pub mod id;
pub mod models;
pub mod query;
pub mod repository;
