// SPDX-License-Identifier: LGPL-3.0-or-later
// Copyright (c) 2023 Takashi Sakamoto

//! Registry for descriptor entries keyed by the pair of vendor and model identifiers.
//!
//! The descriptor file carries the entries as a list of groups bound to
//! `device_definitions`. Each group includes `vendorid` and `modelid` bindings as the key
//! along with an open set of further bindings. Two files are usually read in sequence; the
//! later file overwrites the earlier one binding by binding for the same device, while
//! bindings absent from the later file are retained.

use {
    super::{parser::parse_str, *},
    std::collections::BTreeMap,
    std::fmt,
    std::io::Read,
    std::path::Path,
};

/// The name of binding which carries the list of device entries.
pub const DEVICE_DEFINITIONS_NAME: &str = "device_definitions";

/// The name of binding which selects the mixer model for the device.
pub const MIXER_NAME: &str = "mixer";

const VENDOR_ID_NAME: &str = "vendorid";
const MODEL_ID_NAME: &str = "modelid";

/// The open-ended set of bindings describing one device. Binding order is preserved so that
/// the emitted form stays close to the authored one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceDescriptor {
    bindings: Vec<(String, Setting)>,
}

impl DeviceDescriptor {
    pub fn get(&self, name: &str) -> Option<&Setting> {
        self.bindings
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(|value| value.as_int())
    }

    pub fn string(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|value| value.as_str())
    }

    /// The name of mixer model selected for the device, when bound.
    pub fn mixer(&self) -> Option<&str> {
        self.string(MIXER_NAME)
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, Setting)> {
        self.bindings.iter()
    }

    fn set(&mut self, name: &str, value: Setting) {
        if let Some(entry) = self.bindings.iter_mut().find(|(key, _)| key == name) {
            entry.1 = value;
        } else {
            self.bindings.push((name.to_string(), value));
        }
    }

    fn merge_from(&mut self, later: &DeviceDescriptor) {
        later
            .bindings
            .iter()
            .for_each(|(name, value)| self.set(name, value.clone()));
    }
}

/// The cause of failure to build the registry from parsed bindings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Failure of the underlying parser.
    Parse(ParseError),
    /// The entry at the index is not a group.
    EntryNotGroup(usize),
    /// The entry at the index lacks the named identifier binding.
    MissingId(usize, &'static str),
    /// The entry at the index binds the named identifier out of its domain.
    InvalidId(usize, &'static str),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RegistryError::Parse(err) => write!(f, "{}", err),
            RegistryError::EntryNotGroup(index) => {
                write!(f, "device entry {} is not a group", index)
            }
            RegistryError::MissingId(index, name) => {
                write!(f, "device entry {} lacks `{}`", index, name)
            }
            RegistryError::InvalidId(index, name) => {
                write!(f, "device entry {} binds `{}` out of domain", index, name)
            }
        }
    }
}

impl std::error::Error for RegistryError {}

impl From<ParseError> for RegistryError {
    fn from(err: ParseError) -> Self {
        RegistryError::Parse(err)
    }
}

/// The mapping from the pair of vendor and model identifiers to device descriptor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescriptorMap {
    entries: BTreeMap<(u32, u32), DeviceDescriptor>,
}

impl DescriptorMap {
    /// Parse input and collect the entries of `device_definitions`. Devices appearing
    /// several times in one file are merged binding by binding, later occurrence first.
    pub fn parse(input: &str) -> Result<Self, RegistryError> {
        let bindings = parse_str(input)?;

        let mut entries = BTreeMap::new();

        let definitions = bindings
            .iter()
            .filter(|(name, _)| name == DEVICE_DEFINITIONS_NAME)
            .filter_map(|(_, value)| value.as_list())
            .flatten();

        for (index, entry) in definitions.enumerate() {
            let group = entry
                .as_group()
                .ok_or(RegistryError::EntryNotGroup(index))?;

            let mut desc = DeviceDescriptor::default();
            group
                .iter()
                .for_each(|(name, value)| desc.set(name, value.clone()));

            let vendor_id = descriptor_id(&desc, index, VENDOR_ID_NAME, 0xffffff)?;
            let model_id = descriptor_id(&desc, index, MODEL_ID_NAME, 0xffffffff)?;

            entries
                .entry((vendor_id, model_id))
                .or_insert_with(DeviceDescriptor::default)
                .merge_from(&desc);
        }

        Ok(DescriptorMap { entries })
    }

    /// Overwrite entries by the later map, binding by binding per device. Devices only in
    /// the later map are added as they are.
    pub fn merge(&mut self, later: &DescriptorMap) {
        later.entries.iter().for_each(|(key, desc)| {
            self.entries
                .entry(*key)
                .or_insert_with(DeviceDescriptor::default)
                .merge_from(desc);
        });
    }

    /// Exact match on the pair of identifiers.
    pub fn lookup(&self, vendor_id: u32, model_id: u32) -> Option<&DeviceDescriptor> {
        self.entries.get(&(vendor_id, model_id))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&(u32, u32), &DeviceDescriptor)> {
        self.entries.iter()
    }

    /// Read the system-wide file, then overlay the user-specific file when present.
    pub fn from_files(system: &Path, user: Option<&Path>) -> Result<Self, LoadError> {
        let mut map = load_one(system)?;

        if let Some(path) = user {
            if path.exists() {
                let overlay = load_one(path)?;
                map.merge(&overlay);
            }
        }

        Ok(map)
    }
}

fn descriptor_id(
    desc: &DeviceDescriptor,
    index: usize,
    name: &'static str,
    ceiling: i64,
) -> Result<u32, RegistryError> {
    let value = desc
        .int(name)
        .ok_or(RegistryError::MissingId(index, name))?;
    if value < 0 || value > ceiling {
        Err(RegistryError::InvalidId(index, name))
    } else {
        Ok(value as u32)
    }
}

/// Failure to load descriptor files from storage.
#[derive(Debug)]
pub enum LoadError {
    Io(std::io::Error),
    Registry(RegistryError),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LoadError::Io(err) => write!(f, "{}", err),
            LoadError::Registry(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for LoadError {}

fn load_one(path: &Path) -> Result<DescriptorMap, LoadError> {
    let mut input = String::new();
    std::fs::File::open(path)
        .and_then(|mut file| file.read_to_string(&mut input))
        .map_err(LoadError::Io)?;
    DescriptorMap::parse(&input).map_err(LoadError::Registry)
}

fn emit_setting(f: &mut fmt::Formatter, name: &str, value: &Setting) -> fmt::Result {
    match value {
        // Identifiers read best in the same radix the kernel drivers log them.
        Setting::Int(val) if name == VENDOR_ID_NAME || name == MODEL_ID_NAME => {
            write!(f, "0x{:06x}", val)
        }
        Setting::Int(val) => write!(f, "{}", val),
        Setting::Float(val) => write!(f, "{:?}", val),
        Setting::Bool(val) => write!(f, "{}", val),
        Setting::Str(text) => {
            write!(f, "\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
        }
        Setting::List(entries) => {
            write!(f, "(")?;
            for (pos, entry) in entries.iter().enumerate() {
                if pos > 0 {
                    write!(f, ", ")?;
                }
                emit_setting(f, "", entry)?;
            }
            write!(f, ")")
        }
        Setting::Group(bindings) => {
            writeln!(f, "{{")?;
            for (key, entry) in bindings {
                write!(f, "      {} = ", key)?;
                emit_setting(f, key, entry)?;
                writeln!(f, ";")?;
            }
            write!(f, "    }}")
        }
    }
}

impl fmt::Display for DescriptorMap {
    /// The canonical text form; parsing it again yields an equal map.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{} = (", DEVICE_DEFINITIONS_NAME)?;
        for (pos, (_, desc)) in self.entries.iter().enumerate() {
            writeln!(f, "  {{")?;
            for (name, value) in desc.iter() {
                write!(f, "    {} = ", name)?;
                emit_setting(f, name, value)?;
                writeln!(f, ";")?;
            }
            if pos + 1 < self.entries.len() {
                writeln!(f, "  }},")?;
            } else {
                writeln!(f, "  }}")?;
            }
        }
        writeln!(f, ");")
    }
}
