// SPDX-License-Identifier: LGPL-3.0-or-later
// Copyright (c) 2024 Takashi Sakamoto

//! Implementation of the control surface operations over D-Bus session bus.
//!
//! Every call is synchronous; the calling thread blocks until the server responds or the
//! call fails. The server process is expected to run on the same machine, thus no timeout
//! or cancellation is layered on top of the bus defaults.

use {
    super::*,
    zbus::{
        blocking::{Connection, Proxy},
        proxy::CacheProperties,
    },
};

/// The interface of container elements.
pub const CONTAINER_INTERFACE: &str = "org.ffado.Control.Element.Container";

#[zbus::proxy(
    interface = "org.ffado.Control.Element.Container",
    default_service = "org.ffado.Control"
)]
pub trait Container {
    #[zbus(name = "getNbElements")]
    fn get_nb_elements(&self) -> zbus::Result<i32>;

    #[zbus(name = "getElementName")]
    fn get_element_name(&self, index: i32) -> zbus::Result<String>;

    #[zbus(signal)]
    fn updated(&self) -> zbus::Result<()>;

    #[zbus(signal)]
    fn destroyed(&self) -> zbus::Result<()>;

    #[zbus(signal)]
    fn pre_update(&self) -> zbus::Result<()>;

    #[zbus(signal)]
    fn post_update(&self) -> zbus::Result<()>;
}

#[zbus::proxy(
    interface = "org.ffado.Control.Element.Continuous",
    default_service = "org.ffado.Control"
)]
pub trait Continuous {
    #[zbus(name = "getValue")]
    fn get_value(&self) -> zbus::Result<f64>;

    #[zbus(name = "setValue")]
    fn set_value(&self, value: f64) -> zbus::Result<f64>;

    #[zbus(name = "getValueIdx")]
    fn get_value_idx(&self, index: i32) -> zbus::Result<f64>;

    #[zbus(name = "setValueIdx")]
    fn set_value_idx(&self, index: i32, value: f64) -> zbus::Result<f64>;

    #[zbus(name = "getMinimum")]
    fn get_minimum(&self) -> zbus::Result<f64>;

    #[zbus(name = "getMaximum")]
    fn get_maximum(&self) -> zbus::Result<f64>;
}

#[zbus::proxy(
    interface = "org.ffado.Control.Element.Discrete",
    default_service = "org.ffado.Control"
)]
pub trait Discrete {
    #[zbus(name = "getValue")]
    fn get_value(&self) -> zbus::Result<i32>;

    #[zbus(name = "setValue")]
    fn set_value(&self, value: i32) -> zbus::Result<i32>;

    #[zbus(name = "getValueIdx")]
    fn get_value_idx(&self, index: i32) -> zbus::Result<i32>;

    #[zbus(name = "setValueIdx")]
    fn set_value_idx(&self, index: i32, value: i32) -> zbus::Result<i32>;
}

#[zbus::proxy(
    interface = "org.ffado.Control.Element.AttributeEnum",
    default_service = "org.ffado.Control"
)]
pub trait AttributeEnum {
    #[zbus(name = "select")]
    fn select(&self, index: i32) -> zbus::Result<bool>;

    #[zbus(name = "selected")]
    fn selected(&self) -> zbus::Result<i32>;

    #[zbus(name = "count")]
    fn count(&self) -> zbus::Result<i32>;

    #[zbus(name = "getEnumLabel")]
    fn get_enum_label(&self, index: i32) -> zbus::Result<String>;
}

#[zbus::proxy(
    interface = "org.ffado.Control.Element.Text",
    default_service = "org.ffado.Control"
)]
pub trait Text {
    #[zbus(name = "getValue")]
    fn get_value(&self) -> zbus::Result<String>;

    #[zbus(name = "setValue")]
    fn set_value(&self, value: &str) -> zbus::Result<bool>;
}

#[zbus::proxy(
    interface = "org.ffado.Control.Element.MatrixMixer",
    default_service = "org.ffado.Control"
)]
pub trait MatrixMixer {
    #[zbus(name = "getValue")]
    fn get_value(&self, row: i32, column: i32) -> zbus::Result<f64>;

    #[zbus(name = "setValue")]
    fn set_value(&self, row: i32, column: i32, value: f64) -> zbus::Result<f64>;

    #[zbus(name = "getRowCount")]
    fn get_row_count(&self) -> zbus::Result<i32>;

    #[zbus(name = "getColCount")]
    fn get_col_count(&self) -> zbus::Result<i32>;
}

#[zbus::proxy(
    interface = "org.ffado.Control.Element.ConfigRomX",
    default_service = "org.ffado.Control"
)]
pub trait ConfigRom {
    #[zbus(name = "getGUID")]
    fn get_guid(&self) -> zbus::Result<String>;

    #[zbus(name = "getVendorId")]
    fn get_vendor_id(&self) -> zbus::Result<i32>;

    #[zbus(name = "getModelId")]
    fn get_model_id(&self) -> zbus::Result<i32>;

    #[zbus(name = "getUnitVersion")]
    fn get_unit_version(&self) -> zbus::Result<i32>;

    #[zbus(name = "getVendorName")]
    fn get_vendor_name(&self) -> zbus::Result<String>;

    #[zbus(name = "getModelName")]
    fn get_model_name(&self) -> zbus::Result<String>;
}

// Classification by the error name reported over the bus. Unlisted names degrade to the
// transient class so that a retry pass decides.
fn classify_error_name(name: &str, detail: &str) -> CallError {
    const PREFIX: &str = "org.freedesktop.DBus.Error.";

    let message = if detail.is_empty() {
        name.to_string()
    } else {
        format!("{}: {}", name, detail)
    };

    match name.strip_prefix(PREFIX) {
        Some("UnknownObject")
        | Some("UnknownInterface")
        | Some("UnknownMethod")
        | Some("UnknownProperty")
        | Some("InvalidArgs")
        | Some("NotSupported")
        | Some("AccessDenied") => CallError::permanent(message),
        Some("ServiceUnknown") | Some("NameHasNoOwner") | Some("Disconnected")
        | Some("NoServer") => CallError::disconnected(message),
        _ => CallError::transient(message),
    }
}

impl From<zbus::Error> for CallError {
    fn from(err: zbus::Error) -> Self {
        match &err {
            zbus::Error::MethodError(name, detail, _) => {
                classify_error_name(name.as_str(), detail.as_deref().unwrap_or(""))
            }
            zbus::Error::InputOutput(_) => CallError::disconnected(err.to_string()),
            _ => CallError::transient(err.to_string()),
        }
    }
}

fn index_arg(index: Option<u32>) -> Option<i32> {
    index.map(|idx| idx as i32)
}

fn count_from(val: i32) -> u32 {
    if val < 0 {
        0
    } else {
        val as u32
    }
}

fn guid_from(text: &str) -> Result<u64, CallError> {
    let digits = text.trim().trim_start_matches("0x").trim_start_matches("0X");
    u64::from_str_radix(digits, 16)
        .map_err(|_| CallError::permanent(format!("malformed GUID `{}`", text)))
}

/// The client of the control surface over D-Bus session bus. Cloning shares the underlying
/// connection.
#[derive(Clone)]
pub struct DbusControlClient {
    conn: Connection,
}

impl DbusControlClient {
    /// Connect to session bus. The server itself is contacted lazily, call by call.
    pub fn new() -> Result<Self, CallError> {
        let conn = Connection::session().map_err(CallError::from)?;
        Ok(DbusControlClient { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Block on the change notification stream of the device manager, invoking the
    /// callback per signal. Returns when the stream terminates, which happens when the
    /// connection closes.
    pub fn dispatch_update_signals<F>(&self, mut cb: F) -> Result<(), CallError>
    where
        F: FnMut(UpdateSignal),
    {
        let proxy = Proxy::new(
            &self.conn,
            SERVICE_NAME,
            DEVICE_MANAGER_PATH,
            CONTAINER_INTERFACE,
        )
        .map_err(CallError::from)?;

        let iter = proxy.receive_all_signals().map_err(CallError::from)?;
        for msg in iter {
            let header = msg.header();
            let signal = match header.member().map(|member| member.as_str()) {
                Some("PreUpdate") => UpdateSignal::PreUpdate,
                Some("PostUpdate") => UpdateSignal::PostUpdate,
                Some("Updated") => UpdateSignal::Updated,
                Some("Destroyed") => UpdateSignal::Destroyed,
                _ => continue,
            };
            cb(signal);
        }

        Ok(())
    }

    fn container(&self, path: &ControlPath) -> Result<ContainerProxyBlocking<'static>, CallError> {
        ContainerProxyBlocking::builder(&self.conn)
            .cache_properties(CacheProperties::No)
            .path(path.as_str().to_string())
            .and_then(|builder| builder.build())
            .map_err(CallError::from)
    }

    fn continuous(
        &self,
        path: &ControlPath,
    ) -> Result<ContinuousProxyBlocking<'static>, CallError> {
        ContinuousProxyBlocking::builder(&self.conn)
            .cache_properties(CacheProperties::No)
            .path(path.as_str().to_string())
            .and_then(|builder| builder.build())
            .map_err(CallError::from)
    }

    fn discrete(&self, path: &ControlPath) -> Result<DiscreteProxyBlocking<'static>, CallError> {
        DiscreteProxyBlocking::builder(&self.conn)
            .cache_properties(CacheProperties::No)
            .path(path.as_str().to_string())
            .and_then(|builder| builder.build())
            .map_err(CallError::from)
    }

    fn attribute_enum(
        &self,
        path: &ControlPath,
    ) -> Result<AttributeEnumProxyBlocking<'static>, CallError> {
        AttributeEnumProxyBlocking::builder(&self.conn)
            .cache_properties(CacheProperties::No)
            .path(path.as_str().to_string())
            .and_then(|builder| builder.build())
            .map_err(CallError::from)
    }

    fn text(&self, path: &ControlPath) -> Result<TextProxyBlocking<'static>, CallError> {
        TextProxyBlocking::builder(&self.conn)
            .cache_properties(CacheProperties::No)
            .path(path.as_str().to_string())
            .and_then(|builder| builder.build())
            .map_err(CallError::from)
    }

    fn matrix(&self, path: &ControlPath) -> Result<MatrixMixerProxyBlocking<'static>, CallError> {
        MatrixMixerProxyBlocking::builder(&self.conn)
            .cache_properties(CacheProperties::No)
            .path(path.as_str().to_string())
            .and_then(|builder| builder.build())
            .map_err(CallError::from)
    }

    fn rom(&self, path: &ControlPath) -> Result<ConfigRomProxyBlocking<'static>, CallError> {
        ConfigRomProxyBlocking::builder(&self.conn)
            .cache_properties(CacheProperties::No)
            .path(path.as_str().to_string())
            .and_then(|builder| builder.build())
            .map_err(CallError::from)
    }
}

impl ControlClient for DbusControlClient {
    fn nb_elements(&self, path: &ControlPath) -> Result<u32, CallError> {
        self.container(path)?
            .get_nb_elements()
            .map(count_from)
            .map_err(CallError::from)
    }

    fn element_name(&self, path: &ControlPath, index: u32) -> Result<String, CallError> {
        self.container(path)?
            .get_element_name(index as i32)
            .map_err(CallError::from)
    }

    fn continuous_value(&self, path: &ControlPath, index: Option<u32>) -> Result<f64, CallError> {
        let proxy = self.continuous(path)?;
        match index_arg(index) {
            Some(idx) => proxy.get_value_idx(idx),
            None => proxy.get_value(),
        }
        .map_err(CallError::from)
    }

    fn set_continuous_value(
        &self,
        path: &ControlPath,
        index: Option<u32>,
        value: f64,
    ) -> Result<(), CallError> {
        let proxy = self.continuous(path)?;
        match index_arg(index) {
            Some(idx) => proxy.set_value_idx(idx, value),
            None => proxy.set_value(value),
        }
        .map(|_| ())
        .map_err(CallError::from)
    }

    fn continuous_range(&self, path: &ControlPath) -> Result<(f64, f64), CallError> {
        let proxy = self.continuous(path)?;
        let min = proxy.get_minimum().map_err(CallError::from)?;
        let max = proxy.get_maximum().map_err(CallError::from)?;
        Ok((min, max))
    }

    fn discrete_value(&self, path: &ControlPath, index: Option<u32>) -> Result<i32, CallError> {
        let proxy = self.discrete(path)?;
        match index_arg(index) {
            Some(idx) => proxy.get_value_idx(idx),
            None => proxy.get_value(),
        }
        .map_err(CallError::from)
    }

    fn set_discrete_value(
        &self,
        path: &ControlPath,
        index: Option<u32>,
        value: i32,
    ) -> Result<(), CallError> {
        let proxy = self.discrete(path)?;
        match index_arg(index) {
            Some(idx) => proxy.set_value_idx(idx, value),
            None => proxy.set_value(value),
        }
        .map(|_| ())
        .map_err(CallError::from)
    }

    fn enum_selected(&self, path: &ControlPath) -> Result<u32, CallError> {
        self.attribute_enum(path)?
            .selected()
            .map(count_from)
            .map_err(CallError::from)
    }

    fn select_enum(&self, path: &ControlPath, index: u32) -> Result<(), CallError> {
        self.attribute_enum(path)?
            .select(index as i32)
            .map_err(CallError::from)
            .and_then(|accepted| {
                if accepted {
                    Ok(())
                } else {
                    Err(CallError::transient(format!(
                        "selection of entry {} refused by {}",
                        index, path
                    )))
                }
            })
    }

    fn enum_count(&self, path: &ControlPath) -> Result<u32, CallError> {
        self.attribute_enum(path)?
            .count()
            .map(count_from)
            .map_err(CallError::from)
    }

    fn enum_label(&self, path: &ControlPath, index: u32) -> Result<String, CallError> {
        self.attribute_enum(path)?
            .get_enum_label(index as i32)
            .map_err(CallError::from)
    }

    fn text_value(&self, path: &ControlPath) -> Result<String, CallError> {
        self.text(path)?.get_value().map_err(CallError::from)
    }

    fn set_text_value(&self, path: &ControlPath, value: &str) -> Result<(), CallError> {
        self.text(path)?
            .set_value(value)
            .map_err(CallError::from)
            .and_then(|accepted| {
                if accepted {
                    Ok(())
                } else {
                    Err(CallError::transient(format!(
                        "text update refused by {}",
                        path
                    )))
                }
            })
    }

    fn matrix_value(&self, path: &ControlPath, row: u32, column: u32) -> Result<f64, CallError> {
        self.matrix(path)?
            .get_value(row as i32, column as i32)
            .map_err(CallError::from)
    }

    fn set_matrix_value(
        &self,
        path: &ControlPath,
        row: u32,
        column: u32,
        value: f64,
    ) -> Result<(), CallError> {
        self.matrix(path)?
            .set_value(row as i32, column as i32, value)
            .map(|_| ())
            .map_err(CallError::from)
    }

    fn matrix_dimension(&self, path: &ControlPath) -> Result<(u32, u32), CallError> {
        let proxy = self.matrix(path)?;
        let rows = proxy.get_row_count().map_err(CallError::from)?;
        let columns = proxy.get_col_count().map_err(CallError::from)?;
        Ok((count_from(rows), count_from(columns)))
    }

    fn config_rom(&self, path: &ControlPath) -> Result<ConfigRomData, CallError> {
        let proxy = self.rom(path)?;

        let guid = proxy
            .get_guid()
            .map_err(CallError::from)
            .and_then(|text| guid_from(&text))?;
        let vendor_id = proxy.get_vendor_id().map_err(CallError::from)? as u32 & 0x00ffffff;
        let model_id = proxy.get_model_id().map_err(CallError::from)? as u32;
        let unit_version = proxy.get_unit_version().map_err(CallError::from)? as u32;
        let vendor_name = proxy.get_vendor_name().map_err(CallError::from)?;
        let model_name = proxy.get_model_name().map_err(CallError::from)?;

        Ok(ConfigRomData {
            guid,
            vendor_id,
            model_id,
            unit_version,
            vendor_name,
            model_name,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn error_name_classification() {
        let err = classify_error_name("org.freedesktop.DBus.Error.UnknownObject", "no such path");
        assert_eq!(err.kind, CallErrorKind::Permanent);

        let err = classify_error_name("org.freedesktop.DBus.Error.UnknownMethod", "");
        assert_eq!(err.kind, CallErrorKind::Permanent);

        let err = classify_error_name("org.freedesktop.DBus.Error.ServiceUnknown", "");
        assert_eq!(err.kind, CallErrorKind::Disconnected);

        let err = classify_error_name("org.freedesktop.DBus.Error.NoReply", "");
        assert_eq!(err.kind, CallErrorKind::Transient);

        // Unlisted names degrade to the transient class.
        let err = classify_error_name("org.ffado.Control.Error.Whatever", "busy");
        assert_eq!(err.kind, CallErrorKind::Transient);
    }

    #[test]
    fn guid_parse() {
        assert_eq!(guid_from("0x0001f20000a1b2c3").unwrap(), 0x0001f20000a1b2c3);
        assert_eq!(guid_from("0001F20000A1B2C3").unwrap(), 0x0001f20000a1b2c3);
        assert!(guid_from("not-a-guid").is_err());
    }
}
