//! Fuzz target: `protocol::decode`
//!
//! Builds a window-covering message from arbitrary bytes (cluster id,
//! command id, payload) and asserts that decoding never panics and that
//! every accepted go-to-tilt carries exactly one payload byte.
//!
//! cargo fuzz run fuzz_zcl_decode

#![no_main]

use libfuzzer_sys::fuzz_target;
use zbshade::app::commands::ShadeCommand;
use zbshade::protocol::{self, ZclMessage};

fuzz_target!(|data: &[u8]| {
    let [c0, c1, command, payload @ ..] = data else {
        return;
    };
    let cluster = u16::from_le_bytes([*c0, *c1]);
    let Some(msg) = ZclMessage::new(cluster, *command, payload) else {
        // Longer than the payload bound: refused at construction.
        return;
    };

    if let Ok(ShadeCommand::GoToTiltPercentage(v)) = protocol::decode(&msg) {
        assert_eq!(msg.payload.as_slice(), &[v]);
    }
});
