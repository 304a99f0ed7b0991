// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (c) 2024 Takashi Sakamoto

//! In-memory stand-in for the control server, driving the runtime under test.

use {
    super::table::{ControlKind, ControlSpec},
    firewire_control_client::{
        CallError, ConfigRomData, ControlClient, ControlPath, DEVICE_MANAGER_PATH,
    },
    std::cell::RefCell,
    std::collections::BTreeMap,
};

pub fn device_rom(vendor_id: u32, model_id: u32, unit_version: u32) -> ConfigRomData {
    ConfigRomData {
        guid: ((vendor_id as u64) << 40) | ((unit_version as u64) << 24) | model_id as u64,
        vendor_id,
        model_id,
        unit_version,
        vendor_name: format!("vendor-{:06x}", vendor_id),
        model_name: format!("model-{:06x}", model_id),
    }
}

#[derive(Debug, Default)]
struct MockMatrix {
    rows: u32,
    columns: u32,
    cells: BTreeMap<(u32, u32), f64>,
}

#[derive(Default)]
struct MockState {
    devices: Vec<(String, ConfigRomData)>,
    containers: BTreeMap<String, Vec<String>>,
    continuous: BTreeMap<(String, Option<u32>), f64>,
    discrete: BTreeMap<(String, Option<u32>), i32>,
    enums: BTreeMap<String, (u32, Vec<String>)>,
    texts: BTreeMap<String, String>,
    matrices: BTreeMap<String, MockMatrix>,
    writes: usize,
    fail_enumerations: usize,
    disconnected: bool,
}

#[derive(Default)]
pub struct MockClient {
    state: RefCell<MockState>,
}

impl MockClient {
    pub fn add_device(&self, element_name: &str, rom: ConfigRomData) {
        self.state
            .borrow_mut()
            .devices
            .push((element_name.to_string(), rom));
    }

    pub fn remove_device(&self, element_name: &str) {
        self.state
            .borrow_mut()
            .devices
            .retain(|(name, _)| name != element_name);
    }

    pub fn seed_container(&self, path: &str, children: &[&str]) {
        self.state.borrow_mut().containers.insert(
            path.to_string(),
            children.iter().map(|name| name.to_string()).collect(),
        );
    }

    pub fn seed_continuous(&self, path: &str, index: Option<u32>, value: f64) {
        self.state
            .borrow_mut()
            .continuous
            .insert((path.to_string(), index), value);
    }

    pub fn seed_discrete(&self, path: &str, index: Option<u32>, value: i32) {
        self.state
            .borrow_mut()
            .discrete
            .insert((path.to_string(), index), value);
    }

    pub fn seed_enum(&self, path: &str, selected: u32, labels: &[&str]) {
        self.state.borrow_mut().enums.insert(
            path.to_string(),
            (
                selected,
                labels.iter().map(|label| label.to_string()).collect(),
            ),
        );
    }

    pub fn seed_text(&self, path: &str, value: &str) {
        self.state
            .borrow_mut()
            .texts
            .insert(path.to_string(), value.to_string());
    }

    pub fn seed_matrix(&self, path: &str, rows: u32, columns: u32) {
        self.state.borrow_mut().matrices.insert(
            path.to_string(),
            MockMatrix {
                rows,
                columns,
                cells: BTreeMap::new(),
            },
        );
    }

    pub fn writes(&self) -> usize {
        self.state.borrow().writes
    }

    /// Every call fails as disconnected from now on, as if the server exited.
    pub fn disconnect(&self) {
        self.state.borrow_mut().disconnected = true;
    }

    /// The next `count` enumerations of the device manager fail, as under a burst of bus
    /// resets.
    pub fn fail_enumerations(&self, count: usize) {
        self.state.borrow_mut().fail_enumerations = count;
    }

    fn guard(&self) -> Result<(), CallError> {
        if self.state.borrow().disconnected {
            Err(CallError::disconnected("mock connection closed"))
        } else {
            Ok(())
        }
    }
}

fn absent(path: &ControlPath) -> CallError {
    CallError::permanent(format!("no such object {}", path))
}

impl ControlClient for MockClient {
    fn nb_elements(&self, path: &ControlPath) -> Result<u32, CallError> {
        self.guard()?;
        let mut state = self.state.borrow_mut();

        if path.as_str() == DEVICE_MANAGER_PATH {
            if state.fail_enumerations > 0 {
                state.fail_enumerations -= 1;
                return Err(CallError::transient("bus reconfiguration in progress"));
            }
            return Ok(state.devices.len() as u32);
        }

        state
            .containers
            .get(path.as_str())
            .map(|children| children.len() as u32)
            .ok_or_else(|| absent(path))
    }

    fn element_name(&self, path: &ControlPath, index: u32) -> Result<String, CallError> {
        self.guard()?;
        let state = self.state.borrow();

        if path.as_str() == DEVICE_MANAGER_PATH {
            return state
                .devices
                .get(index as usize)
                .map(|(name, _)| name.clone())
                .ok_or_else(|| CallError::transient("device index out of enumeration"));
        }

        state
            .containers
            .get(path.as_str())
            .and_then(|children| children.get(index as usize).cloned())
            .ok_or_else(|| absent(path))
    }

    fn continuous_value(&self, path: &ControlPath, index: Option<u32>) -> Result<f64, CallError> {
        self.guard()?;
        self.state
            .borrow()
            .continuous
            .get(&(path.as_str().to_string(), index))
            .copied()
            .ok_or_else(|| absent(path))
    }

    fn set_continuous_value(
        &self,
        path: &ControlPath,
        index: Option<u32>,
        value: f64,
    ) -> Result<(), CallError> {
        self.guard()?;
        let mut state = self.state.borrow_mut();
        state
            .continuous
            .insert((path.as_str().to_string(), index), value);
        state.writes += 1;
        Ok(())
    }

    fn continuous_range(&self, path: &ControlPath) -> Result<(f64, f64), CallError> {
        self.guard()?;
        let _ = path;
        Ok((0.0, 1.0))
    }

    fn discrete_value(&self, path: &ControlPath, index: Option<u32>) -> Result<i32, CallError> {
        self.guard()?;
        self.state
            .borrow()
            .discrete
            .get(&(path.as_str().to_string(), index))
            .copied()
            .ok_or_else(|| absent(path))
    }

    fn set_discrete_value(
        &self,
        path: &ControlPath,
        index: Option<u32>,
        value: i32,
    ) -> Result<(), CallError> {
        self.guard()?;
        let mut state = self.state.borrow_mut();
        state
            .discrete
            .insert((path.as_str().to_string(), index), value);
        state.writes += 1;
        Ok(())
    }

    fn enum_selected(&self, path: &ControlPath) -> Result<u32, CallError> {
        self.guard()?;
        self.state
            .borrow()
            .enums
            .get(path.as_str())
            .map(|(selected, _)| *selected)
            .ok_or_else(|| absent(path))
    }

    fn select_enum(&self, path: &ControlPath, index: u32) -> Result<(), CallError> {
        self.guard()?;
        let mut state = self.state.borrow_mut();
        let entry = state
            .enums
            .entry(path.as_str().to_string())
            .or_insert_with(|| (0, Vec::new()));
        entry.0 = index;
        state.writes += 1;
        Ok(())
    }

    fn enum_count(&self, path: &ControlPath) -> Result<u32, CallError> {
        self.guard()?;
        self.state
            .borrow()
            .enums
            .get(path.as_str())
            .map(|(_, labels)| labels.len() as u32)
            .ok_or_else(|| absent(path))
    }

    fn enum_label(&self, path: &ControlPath, index: u32) -> Result<String, CallError> {
        self.guard()?;
        self.state
            .borrow()
            .enums
            .get(path.as_str())
            .and_then(|(_, labels)| labels.get(index as usize).cloned())
            .ok_or_else(|| absent(path))
    }

    fn text_value(&self, path: &ControlPath) -> Result<String, CallError> {
        self.guard()?;
        self.state
            .borrow()
            .texts
            .get(path.as_str())
            .cloned()
            .ok_or_else(|| absent(path))
    }

    fn set_text_value(&self, path: &ControlPath, value: &str) -> Result<(), CallError> {
        self.guard()?;
        let mut state = self.state.borrow_mut();
        state
            .texts
            .insert(path.as_str().to_string(), value.to_string());
        state.writes += 1;
        Ok(())
    }

    fn matrix_value(&self, path: &ControlPath, row: u32, column: u32) -> Result<f64, CallError> {
        self.guard()?;
        self.state
            .borrow()
            .matrices
            .get(path.as_str())
            .map(|matrix| matrix.cells.get(&(row, column)).copied().unwrap_or(0.0))
            .ok_or_else(|| absent(path))
    }

    fn set_matrix_value(
        &self,
        path: &ControlPath,
        row: u32,
        column: u32,
        value: f64,
    ) -> Result<(), CallError> {
        self.guard()?;
        let mut state = self.state.borrow_mut();
        let matrix = state
            .matrices
            .get_mut(path.as_str())
            .ok_or_else(|| absent(path))?;
        matrix.cells.insert((row, column), value);
        state.writes += 1;
        Ok(())
    }

    fn matrix_dimension(&self, path: &ControlPath) -> Result<(u32, u32), CallError> {
        self.guard()?;
        self.state
            .borrow()
            .matrices
            .get(path.as_str())
            .map(|matrix| (matrix.rows, matrix.columns))
            .ok_or_else(|| absent(path))
    }

    fn config_rom(&self, path: &ControlPath) -> Result<ConfigRomData, CallError> {
        self.guard()?;
        self.state
            .borrow()
            .devices
            .iter()
            .find(|(name, _)| ControlPath::device(name) == *path)
            .map(|(_, rom)| rom.clone())
            .ok_or_else(|| absent(path))
    }
}

/// Structural checks shared by every control table test: identifiers are unique, stereo
/// partners exist and point back, indexes appear only on multi-channel kinds, and no
/// matrix is marked volatile.
pub fn assert_table_coherent(specs: &[ControlSpec]) {
    specs.iter().enumerate().for_each(|(pos, spec)| {
        assert!(!spec.id.is_empty());
        assert!(!spec.path.is_empty());

        assert!(
            !specs
                .iter()
                .skip(pos + 1)
                .any(|other| other.id == spec.id),
            "duplicate id `{}`",
            spec.id
        );

        if let Some(partner) = spec.link {
            let other = specs
                .iter()
                .find(|other| other.id == partner)
                .unwrap_or_else(|| panic!("`{}` links to unknown `{}`", spec.id, partner));
            assert_eq!(
                other.link,
                Some(spec.id),
                "`{}` does not link back to `{}`",
                partner,
                spec.id
            );
            assert_eq!(other.kind, spec.kind);
        }

        match spec.kind {
            ControlKind::Continuous | ControlKind::Discrete => (),
            _ => assert_eq!(spec.index, None, "`{}` cannot carry an index", spec.id),
        }

        if spec.kind == ControlKind::Matrix {
            assert!(!spec.volatile, "matrix `{}` cannot be polled", spec.id);
        }
    });
}
