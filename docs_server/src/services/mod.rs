//! Business logic — registry, resolution, generation lifecycle, artifacts.

pub mod artifact_service;
pub mod build_queue;
pub mod cdn;
pub mod generator;
pub mod provider;
pub mod ref_resolver;
pub mod repo_service;
pub mod revision_service;
