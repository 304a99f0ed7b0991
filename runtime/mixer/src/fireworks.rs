// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (c) 2024 Takashi Sakamoto

//! Control tables for models based on Fireworks board module of Echo Audio.

use super::table::ControlSpec;

pub const AUDIOFIRE2: &[ControlSpec] = &[
    ControlSpec::matrix("monitor-gain", "Mixer/Monitor/Gain"),
    ControlSpec::continuous("playback-1/2-volume", "Mixer/Playback1/Volume", None),
    ControlSpec::continuous("playback-3/4-volume", "Mixer/Playback2/Volume", None),
    ControlSpec::continuous("headphone-volume", "Mixer/Phones/Volume", None),
    ControlSpec::discrete("playback-1/2-mute", "Mixer/Playback1/Mute", None),
    ControlSpec::discrete("playback-3/4-mute", "Mixer/Playback2/Mute", None),
];

pub const AUDIOFIRE4: &[ControlSpec] = &[
    ControlSpec::matrix("monitor-gain", "Mixer/Monitor/Gain"),
    ControlSpec::continuous("playback-1/2-volume", "Mixer/Playback1/Volume", None),
    ControlSpec::continuous("playback-3/4-volume", "Mixer/Playback2/Volume", None),
    ControlSpec::continuous("headphone-volume", "Mixer/Phones/Volume", None),
    ControlSpec::discrete("playback-1/2-mute", "Mixer/Playback1/Mute", None),
    ControlSpec::discrete("playback-3/4-mute", "Mixer/Playback2/Mute", None),
    ControlSpec::discrete("phantom-power", "Mixer/Input/Phantom", None),
];

pub const AUDIOFIRE8: &[ControlSpec] = &[
    ControlSpec::matrix("monitor-gain", "Mixer/Monitor/Gain"),
    ControlSpec::continuous("playback-1/2-volume", "Mixer/Playback1/Volume", None),
    ControlSpec::continuous("playback-3/4-volume", "Mixer/Playback2/Volume", None),
    ControlSpec::continuous("playback-5/6-volume", "Mixer/Playback3/Volume", None),
    ControlSpec::continuous("playback-7/8-volume", "Mixer/Playback4/Volume", None),
    ControlSpec::discrete("playback-1/2-mute", "Mixer/Playback1/Mute", None),
    ControlSpec::discrete("playback-3/4-mute", "Mixer/Playback2/Mute", None),
    ControlSpec::discrete("playback-5/6-mute", "Mixer/Playback3/Mute", None),
    ControlSpec::discrete("playback-7/8-mute", "Mixer/Playback4/Mute", None),
    ControlSpec::discrete("phantom-power", "Mixer/Input/Phantom", None),
];

pub const AUDIOFIRE12: &[ControlSpec] = &[
    ControlSpec::matrix("monitor-gain", "Mixer/Monitor/Gain"),
    ControlSpec::continuous("playback-1/2-volume", "Mixer/Playback1/Volume", None),
    ControlSpec::continuous("playback-3/4-volume", "Mixer/Playback2/Volume", None),
    ControlSpec::continuous("playback-5/6-volume", "Mixer/Playback3/Volume", None),
    ControlSpec::continuous("playback-7/8-volume", "Mixer/Playback4/Volume", None),
    ControlSpec::continuous("playback-9/10-volume", "Mixer/Playback5/Volume", None),
    ControlSpec::continuous("playback-11/12-volume", "Mixer/Playback6/Volume", None),
    ControlSpec::discrete("playback-1/2-mute", "Mixer/Playback1/Mute", None),
    ControlSpec::discrete("playback-3/4-mute", "Mixer/Playback2/Mute", None),
    ControlSpec::discrete("playback-5/6-mute", "Mixer/Playback3/Mute", None),
    ControlSpec::discrete("playback-7/8-mute", "Mixer/Playback4/Mute", None),
    ControlSpec::discrete("playback-9/10-mute", "Mixer/Playback5/Mute", None),
    ControlSpec::discrete("playback-11/12-mute", "Mixer/Playback6/Mute", None),
];

#[cfg(test)]
mod test {
    use {super::*, crate::mock::assert_table_coherent};

    #[test]
    fn tables_are_coherent() {
        [AUDIOFIRE2, AUDIOFIRE4, AUDIOFIRE8, AUDIOFIRE12]
            .iter()
            .for_each(|table| assert_table_coherent(table));
    }
}
