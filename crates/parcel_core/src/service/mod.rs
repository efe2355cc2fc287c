//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into user-facing tracking actions.
//! - Keep CLI callers decoupled from storage details.

pub mod tracking_service;
