//! Utility modules.

/// Log sanitization utilities to keep credentials out of debug logs.
pub mod log_sanitizer;
