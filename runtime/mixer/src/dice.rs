// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (c) 2024 Takashi Sakamoto

//! Control tables for models based on DICE ASICs of TC Applied Technologies.
//!
//! Models with the protocol extension publish one monitor matrix and per-output volumes.
//! Models without it only carry the shared header; the placeholder table keeps the panel
//! to the global elements.

use super::table::{ControlKind, ControlSpec};

pub const TCD22XX: &[ControlSpec] = &[
    ControlSpec::matrix("monitor-mix", "Mixer/MatrixMixer"),
    ControlSpec::continuous("main-out-volume", "Mixer/MainOut/Volume", None),
];

pub const SAFFIRE_PRO40: &[ControlSpec] = &[
    ControlSpec::matrix("monitor-mix", "Mixer/MatrixMixer"),
    ControlSpec::continuous("monitor-volume", "Mixer/MonitorDial", None),
    ControlSpec::continuous("headphone-1-volume", "Mixer/Phones1/Volume", None),
    ControlSpec::continuous("headphone-2-volume", "Mixer/Phones2/Volume", None),
    ControlSpec::discrete("dim", "Mixer/Dim", None),
    ControlSpec::discrete("mute", "Mixer/Mute", None),
    ControlSpec {
        id: "adat-lock",
        path: "Mixer/Status/AdatLock",
        index: None,
        kind: ControlKind::Discrete,
        link: None,
        volatile: true,
    },
];

pub const IONIX: &[ControlSpec] = &[
    ControlSpec::matrix("monitor-mix", "Mixer/MatrixMixer"),
    ControlSpec::continuous("main-out-volume", "Mixer/MainOut/Volume", None),
    ControlSpec::continuous("headphone-volume", "Mixer/Phones/Volume", None),
];
