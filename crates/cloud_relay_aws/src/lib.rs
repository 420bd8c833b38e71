//! AWS bindings for the cloud relay.
//!
//! This crate owns SDK client construction, the adapters that implement the
//! `cloud_relay_core` collaborator traits, the pass-through operations for
//! storage, notifications, functions and parameters, and the queue relay
//! Lambda handler.

pub mod adapters;
pub mod config;
pub mod error;
pub mod handlers;
pub mod publisher;
