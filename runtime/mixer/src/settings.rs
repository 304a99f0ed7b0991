// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (c) 2024 Takashi Sakamoto

//! Export and import of mixer settings.
//!
//! The file is an XML-like text emitted by hand, one line per element, versioned by a
//! major.minor pair near the top. The major number gates the import; unknown minor
//! numbers are accepted best-effort. Import parses the whole file before anything is
//! written to the bus, so a malformed file aborts with a positioned diagnostic and zero
//! side effects. Applying the parsed values degrades per control: a failed write is
//! logged and the rest continues, except when the server is gone.

use {
    super::{manager::PanelManager, table::ControlValue},
    firewire_control_client::{CallError, ControlClient},
    std::fmt,
    tracing::warn,
};

/// The version of the file format.
pub const FORMAT_VERSION: (u32, u32) = (1, 0);

/// Failure to parse a settings file, with the line of the failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsError {
    /// Counted from 1.
    pub line: usize,
    pub message: String,
}

impl SettingsError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        SettingsError {
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for SettingsError {}

/// The persisted state of one device.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceSettings {
    pub guid: u64,
    pub widget: String,
    pub nickname: Option<String>,
    pub clock_source: Option<u32>,
    pub sample_rate: Option<u32>,
    pub controls: Vec<(String, ControlValue)>,
}

/// The parsed content of a settings file.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsFile {
    pub version: (u32, u32),
    pub devices: Vec<DeviceSettings>,
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn unescape(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&gt;", ">")
        .replace("&lt;", "<")
        .replace("&amp;", "&")
}

/// Emit the current state of every panel.
pub fn export(manager: &PanelManager) -> String {
    let mut out = String::new();

    out.push_str("<?xml version=\"1.0\"?>\n");
    out.push_str(&format!(
        "<mixer-settings version=\"{}.{}\">\n",
        FORMAT_VERSION.0, FORMAT_VERSION.1
    ));

    for device in manager.devices() {
        let header = device.panel.header();
        out.push_str(&format!(
            "  <device guid=\"0x{:016x}\" widget=\"{:?}\" label=\"{}\" nickname=\"{}\" clock-source=\"{}\" sample-rate=\"{}\">\n",
            device.rom.guid,
            device.panel.widget(),
            escape(&header.label),
            escape(&header.nickname),
            header.clock_source,
            header.sample_rate,
        ));

        for (id, value) in device.panel.snapshot() {
            let line = match value {
                ControlValue::Continuous(v) => format!(
                    "    <control id=\"{}\" kind=\"continuous\">{}</control>\n",
                    escape(&id),
                    v
                ),
                ControlValue::Discrete(v) => format!(
                    "    <control id=\"{}\" kind=\"discrete\">{}</control>\n",
                    escape(&id),
                    v
                ),
                ControlValue::Enumerated(v) => format!(
                    "    <control id=\"{}\" kind=\"enum\">{}</control>\n",
                    escape(&id),
                    v
                ),
                ControlValue::Text(v) => format!(
                    "    <control id=\"{}\" kind=\"text\">{}</control>\n",
                    escape(&id),
                    escape(&v)
                ),
                ControlValue::Matrix {
                    rows,
                    columns,
                    cells,
                } => {
                    let body = cells
                        .iter()
                        .map(|cell| cell.to_string())
                        .collect::<Vec<String>>()
                        .join(" ");
                    format!(
                        "    <control id=\"{}\" kind=\"matrix\" rows=\"{}\" columns=\"{}\">{}</control>\n",
                        escape(&id),
                        rows,
                        columns,
                        body
                    )
                }
            };
            out.push_str(&line);
        }

        out.push_str("  </device>\n");
    }

    out.push_str("</mixer-settings>\n");
    out
}

fn attr(line: &str, name: &str) -> Option<String> {
    let marker = format!("{}=\"", name);
    let start = line.find(&marker)? + marker.len();
    let rest = &line[start..];
    let end = rest.find('"')?;
    Some(unescape(&rest[..end]))
}

fn required_attr(line: &str, name: &str, lineno: usize) -> Result<String, SettingsError> {
    attr(line, name).ok_or_else(|| SettingsError::new(lineno, format!("missing `{}`", name)))
}

fn numeric_attr<T: std::str::FromStr>(
    line: &str,
    name: &str,
    lineno: usize,
) -> Result<Option<T>, SettingsError> {
    match attr(line, name) {
        None => Ok(None),
        Some(text) => text
            .parse::<T>()
            .map(Some)
            .map_err(|_| SettingsError::new(lineno, format!("malformed `{}`", name))),
    }
}

fn content_of(line: &str, tag: &str, lineno: usize) -> Result<String, SettingsError> {
    let open_end = line
        .find('>')
        .ok_or_else(|| SettingsError::new(lineno, "unterminated tag"))?;
    let rest = &line[open_end + 1..];
    let closing = format!("</{}>", tag);
    let close = rest
        .rfind(&closing)
        .ok_or_else(|| SettingsError::new(lineno, format!("missing `{}`", closing)))?;
    Ok(rest[..close].to_string())
}

fn parse_control(line: &str, lineno: usize) -> Result<(String, ControlValue), SettingsError> {
    let id = required_attr(line, "id", lineno)?;
    let kind = required_attr(line, "kind", lineno)?;
    let content = content_of(line, "control", lineno)?;

    let value = match kind.as_str() {
        "continuous" => content
            .parse::<f64>()
            .map(ControlValue::Continuous)
            .map_err(|_| SettingsError::new(lineno, "malformed continuous value"))?,
        "discrete" => content
            .parse::<i32>()
            .map(ControlValue::Discrete)
            .map_err(|_| SettingsError::new(lineno, "malformed discrete value"))?,
        "enum" => content
            .parse::<u32>()
            .map(ControlValue::Enumerated)
            .map_err(|_| SettingsError::new(lineno, "malformed enumeration index"))?,
        "text" => ControlValue::Text(unescape(&content)),
        "matrix" => {
            let rows = numeric_attr::<u32>(line, "rows", lineno)?
                .ok_or_else(|| SettingsError::new(lineno, "missing `rows`"))?;
            let columns = numeric_attr::<u32>(line, "columns", lineno)?
                .ok_or_else(|| SettingsError::new(lineno, "missing `columns`"))?;
            let cells = content
                .split_whitespace()
                .map(|cell| cell.parse::<f64>())
                .collect::<Result<Vec<f64>, _>>()
                .map_err(|_| SettingsError::new(lineno, "malformed matrix cell"))?;
            if cells.len() != (rows * columns) as usize {
                Err(SettingsError::new(
                    lineno,
                    format!("expected {} cells, found {}", rows * columns, cells.len()),
                ))?
            }
            ControlValue::Matrix {
                rows,
                columns,
                cells,
            }
        }
        _ => Err(SettingsError::new(
            lineno,
            format!("unknown control kind `{}`", kind),
        ))?,
    };

    Ok((id, value))
}

fn parse_guid(text: &str, lineno: usize) -> Result<u64, SettingsError> {
    let digits = text.trim_start_matches("0x").trim_start_matches("0X");
    u64::from_str_radix(digits, 16).map_err(|_| SettingsError::new(lineno, "malformed GUID"))
}

/// Parse the whole file. Nothing is applied here.
pub fn import(input: &str) -> Result<SettingsFile, SettingsError> {
    let mut version = None;
    let mut devices = Vec::new();
    let mut current: Option<DeviceSettings> = None;
    let mut closed = false;
    let mut lineno = 0;

    for (pos, raw) in input.lines().enumerate() {
        lineno = pos + 1;
        let line = raw.trim();

        if line.is_empty() || line.starts_with("<?xml") {
            continue;
        }

        if line.starts_with("<mixer-settings") {
            let text = required_attr(line, "version", lineno)?;
            let mut parts = text.splitn(2, '.');
            let major = parts
                .next()
                .and_then(|part| part.parse::<u32>().ok())
                .ok_or_else(|| SettingsError::new(lineno, "malformed version"))?;
            let minor = parts
                .next()
                .and_then(|part| part.parse::<u32>().ok())
                .ok_or_else(|| SettingsError::new(lineno, "malformed version"))?;
            if major != FORMAT_VERSION.0 {
                Err(SettingsError::new(
                    lineno,
                    format!("unsupported version {}.{}", major, minor),
                ))?
            }
            version = Some((major, minor));
        } else if line.starts_with("</mixer-settings>") {
            if current.is_some() {
                Err(SettingsError::new(lineno, "unclosed device section"))?
            }
            closed = true;
        } else if line.starts_with("<device") {
            if version.is_none() {
                Err(SettingsError::new(lineno, "device before version header"))?
            }
            if current.is_some() {
                Err(SettingsError::new(lineno, "nested device section"))?
            }
            let guid = parse_guid(&required_attr(line, "guid", lineno)?, lineno)?;
            current = Some(DeviceSettings {
                guid,
                widget: required_attr(line, "widget", lineno)?,
                nickname: attr(line, "nickname"),
                clock_source: numeric_attr(line, "clock-source", lineno)?,
                sample_rate: numeric_attr(line, "sample-rate", lineno)?,
                controls: Vec::new(),
            });
        } else if line.starts_with("</device>") {
            let device = current
                .take()
                .ok_or_else(|| SettingsError::new(lineno, "stray `</device>`"))?;
            devices.push(device);
        } else if line.starts_with("<control") {
            let device = current
                .as_mut()
                .ok_or_else(|| SettingsError::new(lineno, "control outside device section"))?;
            device.controls.push(parse_control(line, lineno)?);
        } else {
            Err(SettingsError::new(
                lineno,
                format!("unrecognized line `{}`", line),
            ))?
        }
    }

    let version =
        version.ok_or_else(|| SettingsError::new(lineno.max(1), "missing version header"))?;
    if !closed {
        Err(SettingsError::new(
            lineno.max(1),
            "missing `</mixer-settings>`",
        ))?
    }

    Ok(SettingsFile { version, devices })
}

/// Apply parsed values to the panels. Devices absent from the display and controls the
/// unit refuses are logged and skipped; only loss of the server aborts. The count of
/// applied values is returned.
pub fn apply(
    file: &SettingsFile,
    client: &dyn ControlClient,
    manager: &mut PanelManager,
) -> Result<usize, CallError> {
    let mut applied = 0;

    for settings in &file.devices {
        let device = match manager.device_mut(settings.guid) {
            Some(device) => device,
            None => {
                warn!(
                    "device 0x{:016x} not attached, settings skipped",
                    settings.guid
                );
                continue;
            }
        };

        if let Some(nickname) = &settings.nickname {
            forgive(device.panel.set_nickname(client, nickname), &mut applied)?;
        }
        if let Some(index) = settings.clock_source {
            forgive(device.panel.select_clock_source(client, index), &mut applied)?;
        }
        if let Some(index) = settings.sample_rate {
            forgive(device.panel.select_sample_rate(client, index), &mut applied)?;
        }

        for (id, value) in &settings.controls {
            match value {
                ControlValue::Matrix {
                    rows,
                    columns,
                    cells,
                } => {
                    for row in 0..*rows {
                        for column in 0..*columns {
                            let cell = cells[(row * columns + column) as usize];
                            forgive(
                                device.panel.apply_matrix_cell(client, id, row, column, cell),
                                &mut applied,
                            )?;
                        }
                    }
                }
                value => forgive(
                    device.panel.apply(client, id, value.clone()),
                    &mut applied,
                )?,
            }
        }
    }

    Ok(applied)
}

// Log-and-continue for a single write; only disconnection propagates.
fn forgive(res: Result<(), CallError>, applied: &mut usize) -> Result<(), CallError> {
    match res {
        Ok(()) => {
            *applied += 1;
            Ok(())
        }
        Err(err) if err.is_disconnected() => Err(err),
        Err(err) => {
            warn!(%err, "value not restored");
            Ok(())
        }
    }
}

#[cfg(test)]
mod test {
    use {
        super::*,
        crate::mock::{device_rom, MockClient},
        firewire_device_descriptor::registry::DescriptorMap,
        std::time::Duration,
    };

    fn displayed_manager(client: &MockClient) -> PanelManager {
        let rom = device_rom(0x0001f2, 0x000001, 0x000009);
        client.add_device("unit-1", rom.clone());
        client.seed_matrix(
            "/org/ffado/Control/DeviceManager/unit-1/Mixer/Mix1/Fader",
            2,
            2,
        );
        client.seed_text("/org/ffado/Control/DeviceManager/unit-1/Nickname", "desk");

        let mut manager =
            PanelManager::with_retry_delay(DescriptorMap::default(), Duration::from_millis(0));
        manager.reconcile(client);
        manager
    }

    #[test]
    fn export_import_round_trip() {
        let client = MockClient::default();
        let mut manager = displayed_manager(&client);
        let guid = device_rom(0x0001f2, 0x000001, 0x000009).guid;

        let device = manager.device_mut(guid).unwrap();
        device
            .panel
            .apply(
                &client,
                "main-out-volume",
                ControlValue::Continuous(0.75),
            )
            .unwrap();
        device
            .panel
            .apply_matrix_cell(&client, "mix-1-fader", 1, 0, 0.5)
            .unwrap();

        let emitted = export(&manager);
        let file = import(&emitted).unwrap();

        assert_eq!(file.version, FORMAT_VERSION);
        assert_eq!(file.devices.len(), 1);

        let settings = &file.devices[0];
        assert_eq!(settings.guid, guid);
        assert_eq!(settings.widget, "MotuTraveler");
        assert_eq!(settings.nickname.as_deref(), Some("desk"));

        let volume = settings
            .controls
            .iter()
            .find(|(id, _)| id == "main-out-volume")
            .unwrap();
        assert_eq!(volume.1, ControlValue::Continuous(0.75));

        let matrix = settings
            .controls
            .iter()
            .find(|(id, _)| id == "mix-1-fader")
            .unwrap();
        assert_eq!(
            matrix.1,
            ControlValue::Matrix {
                rows: 2,
                columns: 2,
                cells: vec![0.0, 0.0, 0.5, 0.0],
            }
        );

        // The volatile record belongs to the unit and is not persisted.
        assert!(settings.controls.iter().all(|(id, _)| id != "clock-lock"));
    }

    #[test]
    fn import_rejects_other_major_version() {
        let input = "<mixer-settings version=\"2.0\">\n</mixer-settings>\n";
        let err = import(input).unwrap_err();
        assert_eq!(err.line, 1);
    }

    #[test]
    fn import_accepts_newer_minor_version() {
        let input = "<mixer-settings version=\"1.7\">\n</mixer-settings>\n";
        let file = import(input).unwrap();
        assert_eq!(file.version, (1, 7));
        assert!(file.devices.is_empty());
    }

    #[test]
    fn malformed_line_aborts_with_position() {
        let input = "<mixer-settings version=\"1.0\">\n\
                     <device guid=\"0x10\" widget=\"Generic\">\n\
                     <control id=\"a\" kind=\"continuous\">not-a-number</control>\n\
                     </device>\n\
                     </mixer-settings>\n";
        let err = import(input).unwrap_err();
        assert_eq!(err.line, 3);
    }

    #[test]
    fn truncated_file_is_detected() {
        let input = "<mixer-settings version=\"1.0\">\n<device guid=\"0x10\" widget=\"G\">\n";
        let err = import(input).unwrap_err();
        assert!(err.message.contains("mixer-settings") || err.message.contains("device"));
    }

    #[test]
    fn text_escaping_round_trip() {
        assert_eq!(unescape(&escape("a <b> & \"c\"")), "a <b> & \"c\"");
    }

    #[test]
    fn apply_restores_values_and_skips_unknown_devices() {
        let client = MockClient::default();
        let mut manager = displayed_manager(&client);
        let guid = device_rom(0x0001f2, 0x000001, 0x000009).guid;

        let file = SettingsFile {
            version: FORMAT_VERSION,
            devices: vec![
                DeviceSettings {
                    guid,
                    widget: "MotuTraveler".to_string(),
                    nickname: Some("stage".to_string()),
                    clock_source: None,
                    sample_rate: None,
                    controls: vec![
                        ("main-out-volume".to_string(), ControlValue::Continuous(0.3)),
                        // Refused by the panel, logged and skipped.
                        ("no-such-control".to_string(), ControlValue::Discrete(1)),
                    ],
                },
                // Not attached, skipped wholesale.
                DeviceSettings {
                    guid: 0xdead,
                    widget: "Generic".to_string(),
                    nickname: None,
                    clock_source: None,
                    sample_rate: None,
                    controls: vec![("x".to_string(), ControlValue::Discrete(1))],
                },
            ],
        };

        let applied = apply(&file, &client, &mut manager).unwrap();
        assert_eq!(applied, 2);

        let device = manager.device(guid).unwrap();
        assert_eq!(device.panel.header().nickname, "stage");
        assert_eq!(
            device.panel.value("main-out-volume"),
            Some(&ControlValue::Continuous(0.3))
        );
    }
}
