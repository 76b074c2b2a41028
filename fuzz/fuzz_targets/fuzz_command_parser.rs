//! Fuzz target: `Command::parse_line`
//!
//! Any text must parse to a command or a typed protocol error, and any
//! command that parses must survive a trip back through its own encoding.
//!
//! cargo fuzz run fuzz_command_parser

#![no_main]

use libfuzzer_sys::fuzz_target;
use pulselink::app::Command;

fuzz_target!(|data: &[u8]| {
    let Ok(line) = core::str::from_utf8(data) else {
        return;
    };
    if let Ok(cmd) = Command::parse_line(line) {
        if cmd == Command::Unknown {
            return;
        }
        let encoded = serde_json::to_string(&cmd).expect("commands always serialise");
        assert_eq!(Command::parse_line(&encoded).ok(), Some(cmd));
    }
});
