//! Fuzz target for deserializing and resolving client configuration.

#![no_main]

use libfuzzer_sys::fuzz_target;
use ssekit_core::ClientConfig;

fuzz_target!(|data: &[u8]| {
    if let Ok(config) = serde_json::from_slice::<ClientConfig>(data) {
        // Resolution may fail, but must not panic.
        if config.validate().is_ok() {
            let backoff = config.retry.backoff();
            let _ = backoff.ceiling_for_attempt(u32::MAX);
        }
        let _ = serde_json::to_string(&config);
    }
});
