//! Fuzz target: `console::parse_line`
//!
//! Arbitrary UTF-8 lines must parse to a command or a typed error.
//!
//! cargo fuzz run fuzz_console_line

#![no_main]

use libfuzzer_sys::fuzz_target;
use zbshade::adapters::console::parse_line;

fuzz_target!(|data: &[u8]| {
    if let Ok(line) = core::str::from_utf8(data) {
        let _ = parse_line(line);
    }
});
