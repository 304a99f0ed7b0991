// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (c) 2024 Takashi Sakamoto

//! The panel of one attached device.
//!
//! A panel is built once when the device appears: the shared header (clock source,
//! sampling rate, nickname, streaming state) plus the model-specific control table, bound
//! by one generic routine. Values flow in two directions with different rules. Operator
//! changes are written to the remote element and mirrored locally. The reverse direction
//! is covered only for records marked volatile, by the periodic poll, which never writes;
//! a full bidirectional binding would echo the operator's own writes back.

use {
    super::{
        model::{PanelModel, WidgetClass},
        table::{check_kind, ControlKind, ControlSpec, ControlValue},
    },
    firewire_control_client::{
        CallError, CallErrorKind, ControlClient, ControlPath, CLOCK_SELECT_NAME,
        GENERIC_MIXER_NODE_NAME, NICKNAME_NAME, SAMPLERATE_SELECT_NAME, STREAMING_STATUS_NAME,
    },
    std::collections::BTreeSet,
    tracing::warn,
};

// A record which the server rejects permanently is shown at its default; the control
// simply does not exist for the unit. Transient failures and loss of the server abort the
// build so that the reconciliation pass retries.
fn read_or_default<T: Default>(
    res: Result<T, CallError>,
    path: &ControlPath,
) -> Result<T, CallError> {
    match res {
        Ok(value) => Ok(value),
        Err(err) if err.kind == CallErrorKind::Permanent => {
            warn!(path = path.as_str(), %err, "absent control, default shown");
            Ok(T::default())
        }
        Err(err) => Err(err),
    }
}

/// The shared header fields of every panel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlobalHeader {
    pub label: String,
    pub nickname: String,
    pub clock_sources: Vec<String>,
    pub clock_source: u32,
    pub sample_rates: Vec<String>,
    pub sample_rate: u32,
    pub streaming: bool,
}

fn enum_labels(
    client: &dyn ControlClient,
    path: &ControlPath,
) -> Result<(u32, Vec<String>), CallError> {
    let count = read_or_default(client.enum_count(path), path)?;
    let mut labels = Vec::with_capacity(count as usize);
    for index in 0..count {
        labels.push(read_or_default(client.enum_label(path, index), path)?);
    }
    let selected = read_or_default(client.enum_selected(path), path)?;
    Ok((selected, labels))
}

impl GlobalHeader {
    fn build(
        client: &dyn ControlClient,
        device_path: &ControlPath,
        label: String,
    ) -> Result<Self, CallError> {
        let clock_path = device_path.join(CLOCK_SELECT_NAME);
        let (clock_source, clock_sources) = enum_labels(client, &clock_path)?;

        let rate_path = device_path.join(SAMPLERATE_SELECT_NAME);
        let (sample_rate, sample_rates) = enum_labels(client, &rate_path)?;

        let nickname_path = device_path.join(NICKNAME_NAME);
        let nickname = read_or_default(client.text_value(&nickname_path), &nickname_path)?;

        let streaming_path = device_path.join(STREAMING_STATUS_NAME);
        let streaming = read_or_default(client.discrete_value(&streaming_path, None), &streaming_path)? != 0;

        Ok(GlobalHeader {
            label,
            nickname,
            clock_sources,
            clock_source,
            sample_rates,
            sample_rate,
            streaming,
        })
    }
}

#[derive(Debug)]
struct BoundControl {
    id: String,
    path: ControlPath,
    index: Option<u32>,
    kind: ControlKind,
    link: Option<String>,
    volatile: bool,
    value: ControlValue,
}

/// The panel of one attached device.
#[derive(Debug)]
pub struct Panel {
    device_path: ControlPath,
    widget: WidgetClass,
    header: GlobalHeader,
    controls: Vec<BoundControl>,
    engaged_links: BTreeSet<String>,
}

impl Panel {
    pub fn build(
        client: &dyn ControlClient,
        device_path: &ControlPath,
        model: &PanelModel,
    ) -> Result<Self, CallError> {
        let header = GlobalHeader::build(client, device_path, model.label.clone())?;

        let mut controls = Vec::new();
        match model.widget {
            WidgetClass::Generic => {
                // The model-agnostic surface is discovered by introspection; every child
                // of the node is served as a continuous element.
                let node = device_path.join(GENERIC_MIXER_NODE_NAME);
                let count = read_or_default(client.nb_elements(&node), &node)?;
                for index in 0..count {
                    let name = read_or_default(client.element_name(&node, index), &node)?;
                    if name.is_empty() {
                        continue;
                    }
                    let path = node.join(&name);
                    let value = read_value(client, &path, None, ControlKind::Continuous)?;
                    controls.push(BoundControl {
                        id: name,
                        path,
                        index: None,
                        kind: ControlKind::Continuous,
                        link: None,
                        volatile: false,
                        value,
                    });
                }
            }
            widget => {
                for spec in widget.specs() {
                    controls.push(bind(client, device_path, spec)?);
                }
            }
        }

        Ok(Panel {
            device_path: device_path.clone(),
            widget: model.widget,
            header,
            controls,
            engaged_links: BTreeSet::new(),
        })
    }

    pub fn widget(&self) -> WidgetClass {
        self.widget
    }

    pub fn header(&self) -> &GlobalHeader {
        &self.header
    }

    pub fn value(&self, id: &str) -> Option<&ControlValue> {
        self.controls
            .iter()
            .find(|ctl| ctl.id == id)
            .map(|ctl| &ctl.value)
    }

    /// The values to persist: every record except the volatile ones, whose state belongs
    /// to the unit rather than to the operator.
    pub fn snapshot(&self) -> Vec<(String, ControlValue)> {
        self.controls
            .iter()
            .filter(|ctl| !ctl.volatile)
            .map(|ctl| (ctl.id.clone(), ctl.value.clone()))
            .collect()
    }

    fn position(&self, id: &str) -> Result<usize, CallError> {
        self.controls
            .iter()
            .position(|ctl| ctl.id == id)
            .ok_or_else(|| CallError::permanent(format!("no control `{}` in the panel", id)))
    }

    /// Engage or release the stereo link of the record. Only records with a partner can
    /// be engaged.
    pub fn engage_link(&mut self, id: &str, engaged: bool) -> Result<(), CallError> {
        let pos = self.position(id)?;
        let partner = self.controls[pos].link.clone().ok_or_else(|| {
            CallError::permanent(format!("control `{}` has no stereo partner", id))
        })?;

        if engaged {
            self.engaged_links.insert(id.to_string());
            self.engaged_links.insert(partner);
        } else {
            self.engaged_links.remove(id);
            self.engaged_links.remove(&partner);
        }
        Ok(())
    }

    /// Operator-initiated change: write the remote element, then mirror. The engaged
    /// stereo partner follows with the same value.
    pub fn apply(
        &mut self,
        client: &dyn ControlClient,
        id: &str,
        value: ControlValue,
    ) -> Result<(), CallError> {
        let pos = self.position(id)?;
        check_kind(id, self.controls[pos].kind, &value)?;

        self.write_and_mirror(client, pos, value.clone())?;

        if self.engaged_links.contains(id) {
            if let Some(partner) = self.controls[pos].link.clone() {
                let ppos = self.position(&partner)?;
                self.write_and_mirror(client, ppos, value)?;
            }
        }

        Ok(())
    }

    /// Operator-initiated change of one matrix cell.
    pub fn apply_matrix_cell(
        &mut self,
        client: &dyn ControlClient,
        id: &str,
        row: u32,
        column: u32,
        value: f64,
    ) -> Result<(), CallError> {
        let pos = self.position(id)?;

        match &self.controls[pos].value {
            ControlValue::Matrix { rows, columns, .. } => {
                if row >= *rows || column >= *columns {
                    return Err(CallError::permanent(format!(
                        "cell {}x{} out of the {}x{} matrix `{}`",
                        row, column, rows, columns, id
                    )));
                }
            }
            _ => {
                return Err(CallError::permanent(format!(
                    "control `{}` is not a matrix",
                    id
                )))
            }
        }

        client.set_matrix_value(&self.controls[pos].path, row, column, value)?;

        if let ControlValue::Matrix { columns, cells, .. } = &mut self.controls[pos].value {
            cells[(row * *columns + column) as usize] = value;
        }
        Ok(())
    }

    fn write_and_mirror(
        &mut self,
        client: &dyn ControlClient,
        pos: usize,
        value: ControlValue,
    ) -> Result<(), CallError> {
        {
            let ctl = &self.controls[pos];
            match &value {
                ControlValue::Continuous(v) => {
                    client.set_continuous_value(&ctl.path, ctl.index, *v)?
                }
                ControlValue::Discrete(v) => client.set_discrete_value(&ctl.path, ctl.index, *v)?,
                ControlValue::Enumerated(v) => client.select_enum(&ctl.path, *v)?,
                ControlValue::Text(v) => client.set_text_value(&ctl.path, v)?,
                ControlValue::Matrix { .. } => {
                    return Err(CallError::permanent(format!(
                        "matrix `{}` is applied cell by cell",
                        ctl.id
                    )))
                }
            }
        }
        self.controls[pos].value = value;
        Ok(())
    }

    pub fn select_clock_source(
        &mut self,
        client: &dyn ControlClient,
        index: u32,
    ) -> Result<(), CallError> {
        let path = self.device_path.join(CLOCK_SELECT_NAME);
        client.select_enum(&path, index)?;
        self.header.clock_source = index;
        Ok(())
    }

    pub fn select_sample_rate(
        &mut self,
        client: &dyn ControlClient,
        index: u32,
    ) -> Result<(), CallError> {
        let path = self.device_path.join(SAMPLERATE_SELECT_NAME);
        client.select_enum(&path, index)?;
        self.header.sample_rate = index;
        Ok(())
    }

    pub fn set_nickname(
        &mut self,
        client: &dyn ControlClient,
        nickname: &str,
    ) -> Result<(), CallError> {
        let path = self.device_path.join(NICKNAME_NAME);
        client.set_text_value(&path, nickname)?;
        self.header.nickname = nickname.to_string();
        Ok(())
    }

    /// Poll-driven refresh of the fields whose remote value is not pushed by any
    /// notification. This direction performs reads only.
    pub fn refresh(&mut self, client: &dyn ControlClient) -> Result<(), CallError> {
        let path = self.device_path.join(STREAMING_STATUS_NAME);
        match client.discrete_value(&path, None) {
            Ok(value) => self.header.streaming = value != 0,
            Err(err) if err.is_disconnected() => return Err(err),
            Err(err) => warn!(path = path.as_str(), %err, "streaming state kept stale"),
        }

        for pos in 0..self.controls.len() {
            if !self.controls[pos].volatile {
                continue;
            }

            let (path, index, kind) = {
                let ctl = &self.controls[pos];
                (ctl.path.clone(), ctl.index, ctl.kind)
            };

            let res = match kind {
                ControlKind::Continuous => client
                    .continuous_value(&path, index)
                    .map(ControlValue::Continuous),
                ControlKind::Discrete => client
                    .discrete_value(&path, index)
                    .map(ControlValue::Discrete),
                ControlKind::Enumerated => {
                    client.enum_selected(&path).map(ControlValue::Enumerated)
                }
                ControlKind::Text => client.text_value(&path).map(ControlValue::Text),
                // Matrices are never volatile.
                ControlKind::Matrix => continue,
            };

            match res {
                Ok(value) => self.controls[pos].value = value,
                Err(err) if err.is_disconnected() => return Err(err),
                Err(err) => warn!(path = path.as_str(), %err, "volatile value kept stale"),
            }
        }

        Ok(())
    }
}

fn bind(
    client: &dyn ControlClient,
    device_path: &ControlPath,
    spec: &ControlSpec,
) -> Result<BoundControl, CallError> {
    let path = device_path.join(spec.path);
    let value = read_value(client, &path, spec.index, spec.kind)?;

    Ok(BoundControl {
        id: spec.id.to_string(),
        path,
        index: spec.index,
        kind: spec.kind,
        link: spec.link.map(|partner| partner.to_string()),
        volatile: spec.volatile,
        value,
    })
}

// Seed one record from its remote element.
fn read_value(
    client: &dyn ControlClient,
    path: &ControlPath,
    index: Option<u32>,
    kind: ControlKind,
) -> Result<ControlValue, CallError> {
    if kind == ControlKind::Matrix {
        let (rows, columns) = read_or_default(client.matrix_dimension(path), path)?;
        let mut cells = Vec::with_capacity((rows * columns) as usize);
        for row in 0..rows {
            for column in 0..columns {
                cells.push(read_or_default(client.matrix_value(path, row, column), path)?);
            }
        }
        return Ok(ControlValue::Matrix {
            rows,
            columns,
            cells,
        });
    }

    let res = match kind {
        ControlKind::Continuous => client
            .continuous_value(path, index)
            .map(ControlValue::Continuous),
        ControlKind::Discrete => client
            .discrete_value(path, index)
            .map(ControlValue::Discrete),
        ControlKind::Enumerated => client.enum_selected(path).map(ControlValue::Enumerated),
        ControlKind::Text => client.text_value(path).map(ControlValue::Text),
        ControlKind::Matrix => unreachable!(),
    };

    match res {
        Ok(value) => Ok(value),
        Err(err) if err.kind == CallErrorKind::Permanent => {
            warn!(path = path.as_str(), %err, "absent control, default shown");
            Ok(ControlValue::default_of(kind))
        }
        Err(err) => Err(err),
    }
}
