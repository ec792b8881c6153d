#![no_main]

use libfuzzer_sys::fuzz_target;
use mcp_bridge_runtime::frame::{extract, try_parse, ParseOutcome};

fuzz_target!(|data: &[u8]| {
    match try_parse(data) {
        ParseOutcome::Complete(parsed) => {
            let _ = extract(data, parsed);
        }
        ParseOutcome::Incomplete(_) | ParseOutcome::NeedMoreData | ParseOutcome::Malformed => {}
    }
});
