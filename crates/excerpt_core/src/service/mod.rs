//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Own connection scoping: one acquisition per call, released on return.
//! - Keep CLI/API shims decoupled from storage details.

pub mod library_service;
