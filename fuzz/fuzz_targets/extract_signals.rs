// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: 2026 Autofix Contributors

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let signals = autofix_core::extract_signals(s);
        for path in &signals.file_paths {
            assert!(!path.is_empty());
        }
    }
});
