#![no_main]

use libfuzzer_sys::fuzz_target;
use steplog::reader::parse_line;

fuzz_target!(|data: &[u8]| {
    // Sink lines may be truncated mid-append; parsing must fail cleanly
    if let Ok(input) = std::str::from_utf8(data) {
        if let Ok(record) = parse_line(input) {
            let _ = record.to_json_line();
        }
    }
});
