//! Fuzz target for whole annotation files: parse, repair, and re-format.
//!
//! Every repaired record must be valid and must survive a format/parse pass.

#![no_main]

use std::path::Path;

use libfuzzer_sys::fuzz_target;
use yolo_curate::annotation::{format_record, parse_record_line, parse_records, repair_records};

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }

    let Ok(content) = std::str::from_utf8(data) else {
        return;
    };

    let path = Path::new("<fuzz>");
    for record in repair_records(&parse_records(content, path)) {
        assert!(record.is_valid(), "repaired record out of range: {record:?}");
        let line = format_record(&record);
        let reparsed = parse_record_line(&line, path, 1);
        assert!(matches!(reparsed, Ok(Some(_))), "cannot reparse {line:?}");
    }
});
