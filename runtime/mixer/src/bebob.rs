// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (c) 2024 Takashi Sakamoto

//! Control tables for models based on BridgeCo. BeBoB solution.
//!
//! The server publishes their controls as `Feature_Volume`, `Feature_LRBalance` and
//! `Selector` elements below the `Mixer` node, numbered per function block of the unit.

use super::table::{ControlKind, ControlSpec};

pub const PHASE88: &[ControlSpec] = &[
    ControlSpec {
        id: "master-out-volume-left",
        path: "Mixer/Feature_Volume_1",
        index: Some(1),
        kind: ControlKind::Continuous,
        link: Some("master-out-volume-right"),
        volatile: false,
    },
    ControlSpec {
        id: "master-out-volume-right",
        path: "Mixer/Feature_Volume_1",
        index: Some(2),
        kind: ControlKind::Continuous,
        link: Some("master-out-volume-left"),
        volatile: false,
    },
    ControlSpec::continuous("analog-in-1/2-gain", "Mixer/Feature_Volume_2", None),
    ControlSpec::continuous("analog-in-3/4-gain", "Mixer/Feature_Volume_3", None),
    ControlSpec::continuous("analog-in-5/6-gain", "Mixer/Feature_Volume_4", None),
    ControlSpec::continuous("analog-in-7/8-gain", "Mixer/Feature_Volume_5", None),
    ControlSpec::continuous("digital-in-gain", "Mixer/Feature_Volume_6", None),
    ControlSpec::continuous("stream-in-gain", "Mixer/Feature_Volume_7", None),
    ControlSpec::enumerated("output-source", "Mixer/Selector_1"),
    ControlSpec::enumerated("external-sync-source", "Mixer/Selector_2"),
];

pub const FW410: &[ControlSpec] = &[
    ControlSpec {
        id: "analog-out-1/2-volume-left",
        path: "Mixer/Feature_Volume_1",
        index: Some(1),
        kind: ControlKind::Continuous,
        link: Some("analog-out-1/2-volume-right"),
        volatile: false,
    },
    ControlSpec {
        id: "analog-out-1/2-volume-right",
        path: "Mixer/Feature_Volume_1",
        index: Some(2),
        kind: ControlKind::Continuous,
        link: Some("analog-out-1/2-volume-left"),
        volatile: false,
    },
    ControlSpec::continuous("analog-in-gain", "Mixer/Feature_Volume_2", None),
    ControlSpec::continuous("digital-in-gain", "Mixer/Feature_Volume_3", None),
    ControlSpec::continuous("stream-in-1/2-gain", "Mixer/Feature_Volume_4", None),
    ControlSpec::continuous("stream-in-3/4-gain", "Mixer/Feature_Volume_5", None),
    ControlSpec::continuous("headphone-volume", "Mixer/Feature_Volume_6", None),
    ControlSpec::continuous("analog-in-balance", "Mixer/Feature_LRBalance_1", None),
    ControlSpec::enumerated("headphone-source", "Mixer/Selector_1"),
    ControlSpec::enumerated("digital-out-source", "Mixer/Selector_2"),
];

pub const AUDIOPHILE: &[ControlSpec] = &[
    ControlSpec::continuous("analog-out-volume", "Mixer/Feature_Volume_1", None),
    ControlSpec::continuous("analog-in-gain", "Mixer/Feature_Volume_2", None),
    ControlSpec::continuous("digital-in-gain", "Mixer/Feature_Volume_3", None),
    ControlSpec::continuous("stream-in-gain", "Mixer/Feature_Volume_4", None),
    ControlSpec::continuous("headphone-volume", "Mixer/Feature_Volume_5", None),
    ControlSpec::enumerated("headphone-source", "Mixer/Selector_1"),
];

pub const SOLO: &[ControlSpec] = &[
    ControlSpec::continuous("analog-out-volume", "Mixer/Feature_Volume_1", None),
    ControlSpec::continuous("analog-in-gain", "Mixer/Feature_Volume_2", None),
    ControlSpec::continuous("digital-in-gain", "Mixer/Feature_Volume_3", None),
    ControlSpec::continuous("stream-in-gain", "Mixer/Feature_Volume_4", None),
];

pub const OZONIC: &[ControlSpec] = &[
    ControlSpec::continuous("analog-out-volume", "Mixer/Feature_Volume_1", None),
    ControlSpec::continuous("analog-in-gain", "Mixer/Feature_Volume_2", None),
    ControlSpec::continuous("stream-in-gain", "Mixer/Feature_Volume_3", None),
    ControlSpec::continuous("analog-in-balance", "Mixer/Feature_LRBalance_1", None),
];

pub const FIREBOX: &[ControlSpec] = &[
    ControlSpec::continuous("analog-out-volume", "Mixer/Feature_Volume_1", None),
    ControlSpec::continuous("headphone-volume", "Mixer/Feature_Volume_2", None),
    ControlSpec::continuous("analog-in-gain", "Mixer/Feature_Volume_3", None),
    ControlSpec::continuous("digital-in-gain", "Mixer/Feature_Volume_4", None),
    ControlSpec::continuous("mixer-out-volume", "Mixer/Feature_Volume_5", None),
    ControlSpec::enumerated("headphone-source", "Mixer/Selector_1"),
];

// Saffire and Saffire LE share the model identifier in unit directory; the model name
// distinguishes them at detection time.
pub const SAFFIRE: &[ControlSpec] = &[
    ControlSpec {
        id: "monitor-out-volume-left",
        path: "Mixer/Feature_Volume_1",
        index: Some(1),
        kind: ControlKind::Continuous,
        link: Some("monitor-out-volume-right"),
        volatile: false,
    },
    ControlSpec {
        id: "monitor-out-volume-right",
        path: "Mixer/Feature_Volume_1",
        index: Some(2),
        kind: ControlKind::Continuous,
        link: Some("monitor-out-volume-left"),
        volatile: false,
    },
    ControlSpec::continuous("stream-in-1/2-gain", "Mixer/Feature_Volume_2", None),
    ControlSpec::continuous("stream-in-3/4-gain", "Mixer/Feature_Volume_3", None),
    ControlSpec::continuous("analog-in-gain", "Mixer/Feature_Volume_4", None),
    ControlSpec::matrix("monitor-mix", "Mixer/MonitorMixer"),
];

pub const SAFFIRE_LE: &[ControlSpec] = &[
    ControlSpec::continuous("analog-out-1/2-volume", "Mixer/Feature_Volume_1", None),
    ControlSpec::continuous("analog-out-3/4-volume", "Mixer/Feature_Volume_2", None),
    ControlSpec::continuous("headphone-volume", "Mixer/Feature_Volume_3", None),
    ControlSpec::matrix("monitor-mix", "Mixer/MonitorMixer"),
    ControlSpec::discrete("high-gain-mode", "Mixer/HighGainMode", None),
];

pub const SAFFIRE_PRO10IO: &[ControlSpec] = &[
    ControlSpec::matrix("mixer", "Mixer/MatrixMixer"),
    ControlSpec::continuous("monitor-volume", "Mixer/Feature_Volume_1", None),
    ControlSpec::continuous("headphone-1-volume", "Mixer/Feature_Volume_2", None),
    ControlSpec::continuous("headphone-2-volume", "Mixer/Feature_Volume_3", None),
    ControlSpec::discrete("dim", "Mixer/Dim", None),
    ControlSpec::discrete("mute", "Mixer/Mute", None),
    ControlSpec {
        id: "through-0",
        path: "Mixer/Through_0",
        index: None,
        kind: ControlKind::Discrete,
        link: None,
        volatile: true,
    },
];

pub const SAFFIRE_PRO26IO: &[ControlSpec] = &[
    ControlSpec::matrix("mixer", "Mixer/MatrixMixer"),
    ControlSpec::continuous("monitor-volume", "Mixer/Feature_Volume_1", None),
    ControlSpec::continuous("headphone-1-volume", "Mixer/Feature_Volume_2", None),
    ControlSpec::continuous("headphone-2-volume", "Mixer/Feature_Volume_3", None),
    ControlSpec::discrete("dim", "Mixer/Dim", None),
    ControlSpec::discrete("mute", "Mixer/Mute", None),
    ControlSpec::enumerated("adat-mode", "Mixer/AdatMode"),
];

#[cfg(test)]
mod test {
    use {super::*, crate::mock::assert_table_coherent};

    #[test]
    fn tables_are_coherent() {
        [
            PHASE88,
            FW410,
            AUDIOPHILE,
            SOLO,
            OZONIC,
            FIREBOX,
            SAFFIRE,
            SAFFIRE_LE,
            SAFFIRE_PRO10IO,
            SAFFIRE_PRO26IO,
        ]
        .iter()
        .for_each(|table| assert_table_coherent(table));
    }
}
