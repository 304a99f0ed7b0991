// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (c) 2024 Takashi Sakamoto

//! Control tables for Fireface series of RME GmbH.
//!
//! The heart of the series is one large matrix mixer from every physical and stream input
//! to every physical output. External lock states are refreshed by the periodic poll.

use super::table::{ControlKind, ControlSpec};

const SPDIF_LOCK: ControlSpec = ControlSpec {
    id: "spdif-lock",
    path: "Mixer/Status/SpdifLock",
    index: None,
    kind: ControlKind::Discrete,
    link: None,
    volatile: true,
};

const ADAT_LOCK: ControlSpec = ControlSpec {
    id: "adat-lock",
    path: "Mixer/Status/AdatLock",
    index: None,
    kind: ControlKind::Discrete,
    link: None,
    volatile: true,
};

pub const FF400: &[ControlSpec] = &[
    ControlSpec::matrix("mixer", "Mixer/MatrixMixer"),
    ControlSpec::continuous("main-out-volume", "Mixer/MainOut/Volume", None),
    ControlSpec::continuous("headphone-volume", "Mixer/Phones/Volume", None),
    ControlSpec::discrete("mic-1-phantom", "Mixer/Input1/Phantom", None),
    ControlSpec::discrete("mic-2-phantom", "Mixer/Input2/Phantom", None),
    ControlSpec::enumerated("input-3-level", "Mixer/Input3/Level"),
    ControlSpec::enumerated("input-4-level", "Mixer/Input4/Level"),
    SPDIF_LOCK,
    ADAT_LOCK,
];

pub const FF800: &[ControlSpec] = &[
    ControlSpec::matrix("mixer", "Mixer/MatrixMixer"),
    ControlSpec::continuous("main-out-volume", "Mixer/MainOut/Volume", None),
    ControlSpec::continuous("headphone-volume", "Mixer/Phones/Volume", None),
    ControlSpec::discrete("mic-7-phantom", "Mixer/Input7/Phantom", None),
    ControlSpec::discrete("mic-8-phantom", "Mixer/Input8/Phantom", None),
    ControlSpec::discrete("mic-9-phantom", "Mixer/Input9/Phantom", None),
    ControlSpec::discrete("mic-10-phantom", "Mixer/Input10/Phantom", None),
    ControlSpec::enumerated("instrument-input", "Mixer/Input1/Instrument"),
    SPDIF_LOCK,
    ADAT_LOCK,
];

#[cfg(test)]
mod test {
    use {super::*, crate::mock::assert_table_coherent};

    #[test]
    fn tables_are_coherent() {
        [FF400, FF800]
            .iter()
            .for_each(|table| assert_table_coherent(table));
    }
}
