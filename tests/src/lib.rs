//! Shared fixtures and mock collaborators for the end-to-end tests.

pub mod fixtures;
pub mod mocks;
