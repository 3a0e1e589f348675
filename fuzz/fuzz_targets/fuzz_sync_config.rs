#![no_main]

use formsync_runtime::{MIN_DEBOUNCE, SyncConfig};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(src) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(config) = SyncConfig::from_toml_str(src) {
        assert!(config.debounce >= MIN_DEBOUNCE);
        assert!(config.validate().is_ok());
    }
});
