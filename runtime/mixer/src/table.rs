// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (c) 2024 Takashi Sakamoto

//! Declarative control tables.
//!
//! One record per control of the model: the stable identifier, the path of the remote
//! element relative to the device object, the optional channel index within the element,
//! the kind of the element interface, the optional partner for stereo link, and whether
//! the periodic poll refreshes the record. The tables are plain data; a single binder in
//! the panel module drives every model through them.

use firewire_control_client::CallError;

/// The kind of element interface behind a record.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ControlKind {
    Continuous,
    Discrete,
    Enumerated,
    Text,
    Matrix,
}

/// One record of a control table.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ControlSpec {
    /// Stable identifier of the control, also used in the settings file.
    pub id: &'static str,
    /// Path of the remote element relative to the device object.
    pub path: &'static str,
    /// Channel index within the element, when the element carries several channels.
    pub index: Option<u32>,
    pub kind: ControlKind,
    /// The identifier of the partner record for stereo link.
    pub link: Option<&'static str>,
    /// Whether the record is refreshed by the periodic poll. The server pushes no
    /// notification for such fields.
    pub volatile: bool,
}

impl ControlSpec {
    pub const fn continuous(id: &'static str, path: &'static str, index: Option<u32>) -> Self {
        ControlSpec {
            id,
            path,
            index,
            kind: ControlKind::Continuous,
            link: None,
            volatile: false,
        }
    }

    pub const fn discrete(id: &'static str, path: &'static str, index: Option<u32>) -> Self {
        ControlSpec {
            id,
            path,
            index,
            kind: ControlKind::Discrete,
            link: None,
            volatile: false,
        }
    }

    pub const fn enumerated(id: &'static str, path: &'static str) -> Self {
        ControlSpec {
            id,
            path,
            index: None,
            kind: ControlKind::Enumerated,
            link: None,
            volatile: false,
        }
    }

    pub const fn text(id: &'static str, path: &'static str) -> Self {
        ControlSpec {
            id,
            path,
            index: None,
            kind: ControlKind::Text,
            link: None,
            volatile: false,
        }
    }

    pub const fn matrix(id: &'static str, path: &'static str) -> Self {
        ControlSpec {
            id,
            path,
            index: None,
            kind: ControlKind::Matrix,
            link: None,
            volatile: false,
        }
    }
}

/// The mirrored value of a record.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlValue {
    Continuous(f64),
    Discrete(i32),
    Enumerated(u32),
    Text(String),
    Matrix {
        rows: u32,
        columns: u32,
        cells: Vec<f64>,
    },
}

impl ControlValue {
    pub fn kind(&self) -> ControlKind {
        match self {
            ControlValue::Continuous(_) => ControlKind::Continuous,
            ControlValue::Discrete(_) => ControlKind::Discrete,
            ControlValue::Enumerated(_) => ControlKind::Enumerated,
            ControlValue::Text(_) => ControlKind::Text,
            ControlValue::Matrix { .. } => ControlKind::Matrix,
        }
    }

    pub fn default_of(kind: ControlKind) -> Self {
        match kind {
            ControlKind::Continuous => ControlValue::Continuous(0.0),
            ControlKind::Discrete => ControlValue::Discrete(0),
            ControlKind::Enumerated => ControlValue::Enumerated(0),
            ControlKind::Text => ControlValue::Text(String::new()),
            ControlKind::Matrix => ControlValue::Matrix {
                rows: 0,
                columns: 0,
                cells: Vec::new(),
            },
        }
    }
}

/// Reject a value whose kind disagrees with the record.
pub fn check_kind(id: &str, expected: ControlKind, value: &ControlValue) -> Result<(), CallError> {
    if value.kind() == expected {
        Ok(())
    } else {
        Err(CallError::permanent(format!(
            "control `{}` expects {:?}, got {:?}",
            id,
            expected,
            value.kind()
        )))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn spec_constructors() {
        let spec = ControlSpec::continuous("out-volume", "Mixer/Feature_Volume_1", Some(1));
        assert_eq!(spec.kind, ControlKind::Continuous);
        assert_eq!(spec.index, Some(1));
        assert_eq!(spec.link, None);
        assert!(!spec.volatile);
    }

    #[test]
    fn kind_mismatch_is_permanent() {
        let err = check_kind("mute", ControlKind::Discrete, &ControlValue::Continuous(1.0))
            .unwrap_err();
        assert_eq!(err.kind, firewire_control_client::CallErrorKind::Permanent);
    }

    #[test]
    fn default_values_match_kind() {
        [
            ControlKind::Continuous,
            ControlKind::Discrete,
            ControlKind::Enumerated,
            ControlKind::Text,
            ControlKind::Matrix,
        ]
        .iter()
        .for_each(|&kind| {
            assert_eq!(ControlValue::default_of(kind).kind(), kind);
        });
    }
}
