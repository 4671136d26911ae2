//! Fuzz target for single-line annotation record parsing.
//!
//! Feeds arbitrary UTF-8 lines to the record parser, checking for panics,
//! crashes, or hangs.

#![no_main]

use libfuzzer_sys::fuzz_target;
use yolo_curate::annotation::codec::fuzz_parse_record_line;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let Ok(line) = std::str::from_utf8(data) else {
        return;
    };

    let _ = fuzz_parse_record_line(line);
});
