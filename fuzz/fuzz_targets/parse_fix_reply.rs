// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: 2026 Autofix Contributors

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Some(json) = autofix_core::ai::extract_json_object(s) {
            assert!(json.starts_with('{') && json.ends_with('}'));
        }
        let _ = autofix_core::ai::parse_fix_reply(s);
    }
});
