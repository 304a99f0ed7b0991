// SPDX-License-Identifier: LGPL-3.0-or-later
// Copyright (c) 2024 Takashi Sakamoto

#![doc = include_str!("../README.md")]

pub mod dbus;

use {
    glib::{error::ErrorDomain, Quark},
    std::fmt,
};

/// The well-known name under which the control server registers itself on session bus.
pub const SERVICE_NAME: &str = "org.ffado.Control";

/// The object path of the device manager, the root container of the surface.
pub const DEVICE_MANAGER_PATH: &str = "/org/ffado/Control/DeviceManager";

/// The name of per-device sub-element for selection of clock source.
pub const CLOCK_SELECT_NAME: &str = "ClockSelect";

/// The name of per-device sub-element for selection of sampling rate.
pub const SAMPLERATE_SELECT_NAME: &str = "SamplerateSelect";

/// The name of per-device sub-element for the human-readable nickname.
pub const NICKNAME_NAME: &str = "Nickname";

/// The name of per-device sub-element which reports whether packet streaming runs. The
/// server never pushes a notification for it; readers poll.
pub const STREAMING_STATUS_NAME: &str = "StreamingStatus";

/// The name of per-device container with the model-agnostic control surface.
pub const GENERIC_MIXER_NODE_NAME: &str = "GenericMixer";

/// The path of an object in the control surface namespace.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ControlPath(String);

impl ControlPath {
    /// The root of the namespace.
    pub fn device_manager() -> Self {
        ControlPath(DEVICE_MANAGER_PATH.to_string())
    }

    /// The object of the device published under the given element name.
    pub fn device(element_name: &str) -> Self {
        ControlPath::device_manager().join(element_name)
    }

    /// The object at a relative path below this one. The relative part may carry several
    /// segments, as in `Mixer/Feature_Volume_3`.
    pub fn join(&self, relative: &str) -> Self {
        let mut path = self.0.clone();
        for segment in relative.split('/').filter(|s| !s.is_empty()) {
            path.push('/');
            path.push_str(segment);
        }
        ControlPath(path)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ControlPath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The class of failure of a remote call.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CallErrorKind {
    /// The server or unit is momentarily unable to complete the call; retry can succeed.
    Transient,
    /// The call can never succeed; the object, interface, or method is absent.
    Permanent,
    /// The connection to the server is lost.
    Disconnected,
}

impl ErrorDomain for CallErrorKind {
    fn domain() -> Quark {
        Quark::from_str("firewire-control-client-error-quark")
    }

    fn code(self) -> i32 {
        match self {
            CallErrorKind::Transient => 0,
            CallErrorKind::Permanent => 1,
            CallErrorKind::Disconnected => 2,
        }
    }

    fn from(code: i32) -> Option<Self> {
        match code {
            0 => Some(CallErrorKind::Transient),
            1 => Some(CallErrorKind::Permanent),
            2 => Some(CallErrorKind::Disconnected),
            _ => None,
        }
    }
}

/// Failure of a remote call, classified so that callers can tell a momentarily busy unit
/// from a control path which does not exist for the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallError {
    pub kind: CallErrorKind,
    pub message: String,
}

impl CallError {
    pub fn transient(message: impl Into<String>) -> Self {
        CallError {
            kind: CallErrorKind::Transient,
            message: message.into(),
        }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        CallError {
            kind: CallErrorKind::Permanent,
            message: message.into(),
        }
    }

    pub fn disconnected(message: impl Into<String>) -> Self {
        CallError {
            kind: CallErrorKind::Disconnected,
            message: message.into(),
        }
    }

    pub fn is_disconnected(&self) -> bool {
        self.kind == CallErrorKind::Disconnected
    }
}

impl fmt::Display for CallError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let class = match self.kind {
            CallErrorKind::Transient => "transient",
            CallErrorKind::Permanent => "permanent",
            CallErrorKind::Disconnected => "disconnected",
        };
        write!(f, "{}: {}", class, self.message)
    }
}

impl std::error::Error for CallError {}

/// The content of configuration ROM of the unit, resolved by the server and published as an
/// element of the device object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigRomData {
    /// Globally unique identifier of the unit.
    pub guid: u64,
    /// The identifier of vendor, in 24 bit of OUI.
    pub vendor_id: u32,
    /// The identifier of model in root directory.
    pub model_id: u32,
    /// The version field in unit directory. Some vendors encode the model variant here
    /// instead of the model field.
    pub unit_version: u32,
    pub vendor_name: String,
    pub model_name: String,
}

/// Change notification delivered by the device manager container.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UpdateSignal {
    /// Bus reconfiguration begins; the set of devices is about to change.
    PreUpdate,
    /// Bus reconfiguration finished; the set of devices should be enumerated again.
    PostUpdate,
    /// The content below the container changed.
    Updated,
    /// The container is going away.
    Destroyed,
}

/// Synchronous operations of the remote control surface. One method per operation of the
/// typed sub-interfaces, object safe so that runtimes can be driven by mock implementations
/// under test.
pub trait ControlClient {
    // Container introspection.
    fn nb_elements(&self, path: &ControlPath) -> Result<u32, CallError>;
    fn element_name(&self, path: &ControlPath, index: u32) -> Result<String, CallError>;

    // Continuous element.
    fn continuous_value(&self, path: &ControlPath, index: Option<u32>) -> Result<f64, CallError>;
    fn set_continuous_value(
        &self,
        path: &ControlPath,
        index: Option<u32>,
        value: f64,
    ) -> Result<(), CallError>;
    fn continuous_range(&self, path: &ControlPath) -> Result<(f64, f64), CallError>;

    // Discrete element.
    fn discrete_value(&self, path: &ControlPath, index: Option<u32>) -> Result<i32, CallError>;
    fn set_discrete_value(
        &self,
        path: &ControlPath,
        index: Option<u32>,
        value: i32,
    ) -> Result<(), CallError>;

    // Enumerated attribute element.
    fn enum_selected(&self, path: &ControlPath) -> Result<u32, CallError>;
    fn select_enum(&self, path: &ControlPath, index: u32) -> Result<(), CallError>;
    fn enum_count(&self, path: &ControlPath) -> Result<u32, CallError>;
    fn enum_label(&self, path: &ControlPath, index: u32) -> Result<String, CallError>;

    // Text element.
    fn text_value(&self, path: &ControlPath) -> Result<String, CallError>;
    fn set_text_value(&self, path: &ControlPath, value: &str) -> Result<(), CallError>;

    // Two-dimensional matrix element.
    fn matrix_value(&self, path: &ControlPath, row: u32, column: u32) -> Result<f64, CallError>;
    fn set_matrix_value(
        &self,
        path: &ControlPath,
        row: u32,
        column: u32,
        value: f64,
    ) -> Result<(), CallError>;
    fn matrix_dimension(&self, path: &ControlPath) -> Result<(u32, u32), CallError>;

    // Configuration ROM of the device object.
    fn config_rom(&self, path: &ControlPath) -> Result<ConfigRomData, CallError>;
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn path_join() {
        let path = ControlPath::device("00130e01deadbeef");
        assert_eq!(
            path.as_str(),
            "/org/ffado/Control/DeviceManager/00130e01deadbeef"
        );

        let ctl = path.join("Mixer/Feature_Volume_3");
        assert_eq!(
            ctl.as_str(),
            "/org/ffado/Control/DeviceManager/00130e01deadbeef/Mixer/Feature_Volume_3"
        );
    }

    #[test]
    fn path_join_skips_empty_segments() {
        let path = ControlPath::device_manager().join("/a//b/");
        assert_eq!(path.as_str(), "/org/ffado/Control/DeviceManager/a/b");
    }

    #[test]
    fn call_error_kind_domain() {
        // ErrorDomain round-trip so that runtimes rebuild the kind from glib::Error.
        [
            CallErrorKind::Transient,
            CallErrorKind::Permanent,
            CallErrorKind::Disconnected,
        ]
        .iter()
        .for_each(|&kind| {
            assert_eq!(ErrorDomain::from(kind.code()), Some(kind));
        });
    }
}
