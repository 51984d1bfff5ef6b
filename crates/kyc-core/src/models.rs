//! Domain models for the KYC registry.

pub mod event;
pub mod genesis;
pub mod names;
pub mod organization;
pub mod user_tags;
