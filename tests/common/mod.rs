//! Shared helpers for integration tests.

#![allow(dead_code)]

pub mod credentials;

/// Route `log` output through env_logger; repeated calls are ignored.
pub fn init_logging() {
    env_logger::builder().is_test(true).try_init().ok();
}
