//! Fuzz target: `LineDecoder::feed`
//!
//! Drives arbitrary byte sequences into the streaming line decoder, whole
//! and split at an arbitrary point, and checks both give the same lines.
//!
//! cargo fuzz run fuzz_line_decoder

#![no_main]

use libfuzzer_sys::fuzz_target;
use pulselink::link::{LineDecoder, MAX_LINE};

fuzz_target!(|data: &[u8]| {
    let mut whole = LineDecoder::new();
    let lines = whole.feed(data);
    for line in &lines {
        assert!(!line.contains('\n'));
        assert!(!line.trim().is_empty(), "blank lines must be skipped");
    }
    assert!(whole.pending() <= MAX_LINE);

    let split = data.first().map_or(0, |b| usize::from(*b)).min(data.len());
    let mut chunked = LineDecoder::new();
    let mut again = chunked.feed(&data[..split]);
    again.extend(chunked.feed(&data[split..]));
    assert_eq!(lines, again);
});
