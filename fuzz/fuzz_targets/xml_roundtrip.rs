#![no_main]
use libfuzzer_sys::fuzz_target;
use saxtree::{from_str, write_xml};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(value) = from_str(s) {
            // A decoded tree must re-encode and decode again without error
            let xml = write_xml("root", &value);
            let _ = from_str(&xml);
        }
    }
});
