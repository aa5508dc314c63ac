//! HTTP handlers for the webhook API group.

pub mod challenge;
pub mod discovery;
pub mod health;
