#![no_main]

//! Relay input fuzzer.
//!
//! Feeds arbitrary lines from a handful of participants through the codec and
//! the relay. The relay must never panic and must never seat more than two
//! participants in a room.

use arbitrary::Arbitrary;
use knight_chase::online::{ClientMessage, ROOM_CAPACITY, Relay, RelayPolicy, decode_line};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct RelayInput {
    strict: bool,
    lines: Vec<(u8, String)>,
}

fuzz_target!(|input: RelayInput| {
    let mut relay = Relay::new(
        RelayPolicy {
            reject_stale: input.strict,
        },
        0,
    );
    let participants: Vec<_> = (0..4).map(|_| relay.connect().0).collect();

    for (who, line) in input.lines.into_iter().take(100) {
        let from = participants[usize::from(who % 4)];
        let _ = match decode_line::<ClientMessage>(&line) {
            Ok(message) => relay.handle(from, message),
            Err(e) => relay.malformed(from, &e.to_string()),
        };
        for room in relay.room_list() {
            assert!(room.occupancy >= 1 && room.occupancy <= ROOM_CAPACITY);
        }
    }
});
