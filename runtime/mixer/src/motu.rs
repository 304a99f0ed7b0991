// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (c) 2024 Takashi Sakamoto

//! Control tables for models of Mark of the Unicorn.
//!
//! The server publishes one node per mix bus with fader and mute per source, along with
//! output assignment and input detail controls. The lock state of the sampling clock is
//! never pushed; the periodic poll refreshes it.

use super::table::{ControlKind, ControlSpec};

const CLOCK_LOCK: ControlSpec = ControlSpec {
    id: "clock-lock",
    path: "Mixer/Control/ClockLock",
    index: None,
    kind: ControlKind::Discrete,
    link: None,
    volatile: true,
};

pub const TRAVELER: &[ControlSpec] = &[
    ControlSpec::matrix("mix-1-fader", "Mixer/Mix1/Fader"),
    ControlSpec::matrix("mix-2-fader", "Mixer/Mix2/Fader"),
    ControlSpec::matrix("mix-3-fader", "Mixer/Mix3/Fader"),
    ControlSpec::matrix("mix-4-fader", "Mixer/Mix4/Fader"),
    ControlSpec::continuous("main-out-volume", "Mixer/MainOut/Fader", None),
    ControlSpec::continuous("headphone-volume", "Mixer/Phones/Fader", None),
    ControlSpec::enumerated("headphone-assign", "Mixer/Control/Phones/Assign"),
    ControlSpec::enumerated("optical-in-mode", "Mixer/Control/OpticalIn/Mode"),
    ControlSpec::enumerated("optical-out-mode", "Mixer/Control/OpticalOut/Mode"),
    ControlSpec::discrete("word-out-single-speed", "Mixer/Control/WordClk/SingleSpeed", None),
    CLOCK_LOCK,
];

pub const ULTRALITE: &[ControlSpec] = &[
    ControlSpec::matrix("mix-1-fader", "Mixer/Mix1/Fader"),
    ControlSpec::matrix("mix-2-fader", "Mixer/Mix2/Fader"),
    ControlSpec::continuous("main-out-volume", "Mixer/MainOut/Fader", None),
    ControlSpec::continuous("headphone-volume", "Mixer/Phones/Fader", None),
    ControlSpec::enumerated("headphone-assign", "Mixer/Control/Phones/Assign"),
    CLOCK_LOCK,
];

pub const F828MK2: &[ControlSpec] = &[
    ControlSpec::matrix("mix-1-fader", "Mixer/Mix1/Fader"),
    ControlSpec::matrix("mix-2-fader", "Mixer/Mix2/Fader"),
    ControlSpec::matrix("mix-3-fader", "Mixer/Mix3/Fader"),
    ControlSpec::matrix("mix-4-fader", "Mixer/Mix4/Fader"),
    ControlSpec::continuous("main-out-volume", "Mixer/MainOut/Fader", None),
    ControlSpec::continuous("headphone-volume", "Mixer/Phones/Fader", None),
    ControlSpec::enumerated("headphone-assign", "Mixer/Control/Phones/Assign"),
    ControlSpec::enumerated("optical-in-mode", "Mixer/Control/OpticalIn/Mode"),
    ControlSpec::enumerated("optical-out-mode", "Mixer/Control/OpticalOut/Mode"),
    CLOCK_LOCK,
];

pub const F896HD: &[ControlSpec] = &[
    ControlSpec::matrix("mix-1-fader", "Mixer/Mix1/Fader"),
    ControlSpec::matrix("mix-2-fader", "Mixer/Mix2/Fader"),
    ControlSpec::matrix("mix-3-fader", "Mixer/Mix3/Fader"),
    ControlSpec::matrix("mix-4-fader", "Mixer/Mix4/Fader"),
    ControlSpec::continuous("main-out-volume", "Mixer/MainOut/Fader", None),
    ControlSpec::continuous("headphone-volume", "Mixer/Phones/Fader", None),
    ControlSpec::enumerated("headphone-assign", "Mixer/Control/Phones/Assign"),
    ControlSpec::enumerated("meter-in-mode", "Mixer/Control/Meter/InputMode"),
    CLOCK_LOCK,
];

#[cfg(test)]
mod test {
    use {super::*, crate::mock::assert_table_coherent};

    #[test]
    fn tables_are_coherent() {
        [TRAVELER, ULTRALITE, F828MK2, F896HD]
            .iter()
            .for_each(|table| assert_table_coherent(table));
    }

    #[test]
    fn clock_lock_is_polled_everywhere() {
        [TRAVELER, ULTRALITE, F828MK2, F896HD]
            .iter()
            .for_each(|table| {
                let spec = table.iter().find(|spec| spec.id == "clock-lock").unwrap();
                assert!(spec.volatile);
            });
    }
}
