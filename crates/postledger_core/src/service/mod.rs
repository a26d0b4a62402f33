//! Core use-case services.
//!
//! # Responsibility
//! - Run registry operations against persisted state atomically.
//! - Keep CLI and other callers decoupled from storage details.

pub mod registry_service;
