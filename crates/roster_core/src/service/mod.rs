//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository and relation calls into school use-cases.
//! - Keep CLI callers decoupled from storage details.

pub mod school_service;
