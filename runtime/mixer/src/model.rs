// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (c) 2024 Takashi Sakamoto

use {
    super::{bebob, dice, fireface, fireworks, motu, table::ControlSpec},
    firewire_control_client::ConfigRomData,
    firewire_device_descriptor::registry::{DescriptorMap, DeviceDescriptor},
    tracing::warn,
};

/// The class of mixer widget which handles the device. One entry per supported model, plus
/// the introspected generic surface and the placeholder for devices without any support.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WidgetClass {
    // BridgeCo. BeBoB solution.
    TerratecPhase88,
    MaudioFw410,
    MaudioAudiophile,
    MaudioSolo,
    MaudioOzonic,
    PresonusFirebox,
    FocusriteSaffire,
    FocusriteSaffireLe,
    FocusriteSaffirePro10io,
    FocusriteSaffirePro26io,
    // DICE ASICs.
    Tcd22xx,
    FocusriteSaffirePro40,
    LexiconIonix,
    // Mark of the Unicorn.
    MotuTraveler,
    MotuUltralite,
    Motu828mk2,
    Motu896hd,
    // RME Fireface series.
    Ff400,
    Ff800,
    // Echo Audio Fireworks board module.
    AudioFire2,
    AudioFire4,
    AudioFire8,
    AudioFire12,
    // The model-agnostic surface published below `GenericMixer`, introspected at build.
    Generic,
    // Header-only placeholder.
    Unsupported,
}

impl WidgetClass {
    /// Resolve the name bound to `mixer` in descriptor file.
    pub fn from_name(name: &str) -> Option<Self> {
        let class = match name {
            "Phase88" => WidgetClass::TerratecPhase88,
            "Fw410" => WidgetClass::MaudioFw410,
            "Audiophile" => WidgetClass::MaudioAudiophile,
            "Solo" => WidgetClass::MaudioSolo,
            "Ozonic" => WidgetClass::MaudioOzonic,
            "Firebox" => WidgetClass::PresonusFirebox,
            "Saffire" => WidgetClass::FocusriteSaffire,
            "SaffireLe" => WidgetClass::FocusriteSaffireLe,
            "SaffirePro10io" => WidgetClass::FocusriteSaffirePro10io,
            "SaffirePro26io" => WidgetClass::FocusriteSaffirePro26io,
            "Tcd22xx" => WidgetClass::Tcd22xx,
            "SaffirePro40" => WidgetClass::FocusriteSaffirePro40,
            "Ionix" => WidgetClass::LexiconIonix,
            "MotuTraveler" => WidgetClass::MotuTraveler,
            "MotuUltralite" => WidgetClass::MotuUltralite,
            "Motu828mk2" => WidgetClass::Motu828mk2,
            "Motu896hd" => WidgetClass::Motu896hd,
            "Ff400" => WidgetClass::Ff400,
            "Ff800" => WidgetClass::Ff800,
            "AudioFire2" => WidgetClass::AudioFire2,
            "AudioFire4" => WidgetClass::AudioFire4,
            "AudioFire8" => WidgetClass::AudioFire8,
            "AudioFire12" => WidgetClass::AudioFire12,
            "Generic" => WidgetClass::Generic,
            _ => return None,
        };
        Some(class)
    }

    /// The control table of the class. The generic surface and the placeholder carry no
    /// static table; the former is introspected when the panel is built.
    pub fn specs(&self) -> &'static [ControlSpec] {
        match self {
            WidgetClass::TerratecPhase88 => bebob::PHASE88,
            WidgetClass::MaudioFw410 => bebob::FW410,
            WidgetClass::MaudioAudiophile => bebob::AUDIOPHILE,
            WidgetClass::MaudioSolo => bebob::SOLO,
            WidgetClass::MaudioOzonic => bebob::OZONIC,
            WidgetClass::PresonusFirebox => bebob::FIREBOX,
            WidgetClass::FocusriteSaffire => bebob::SAFFIRE,
            WidgetClass::FocusriteSaffireLe => bebob::SAFFIRE_LE,
            WidgetClass::FocusriteSaffirePro10io => bebob::SAFFIRE_PRO10IO,
            WidgetClass::FocusriteSaffirePro26io => bebob::SAFFIRE_PRO26IO,
            WidgetClass::Tcd22xx => dice::TCD22XX,
            WidgetClass::FocusriteSaffirePro40 => dice::SAFFIRE_PRO40,
            WidgetClass::LexiconIonix => dice::IONIX,
            WidgetClass::MotuTraveler => motu::TRAVELER,
            WidgetClass::MotuUltralite => motu::ULTRALITE,
            WidgetClass::Motu828mk2 => motu::F828MK2,
            WidgetClass::Motu896hd => motu::F896HD,
            WidgetClass::Ff400 => fireface::FF400,
            WidgetClass::Ff800 => fireface::FF800,
            WidgetClass::AudioFire2 => fireworks::AUDIOFIRE2,
            WidgetClass::AudioFire4 => fireworks::AUDIOFIRE4,
            WidgetClass::AudioFire8 => fireworks::AUDIOFIRE8,
            WidgetClass::AudioFire12 => fireworks::AUDIOFIRE12,
            WidgetClass::Generic | WidgetClass::Unsupported => &[],
        }
    }
}

const VENDOR_MOTU: u32 = 0x0001f2;
const VENDOR_RME: u32 = 0x000a35;
const VENDOR_ECHO: u32 = 0x001486;
const VENDOR_TERRATEC: u32 = 0x000aac;
const VENDOR_MAUDIO: u32 = 0x000d6c;
const VENDOR_MAUDIO_BEBOB: u32 = 0x0007f5;
const VENDOR_PRESONUS: u32 = 0x000a92;
const VENDOR_FOCUSRITE: u32 = 0x00130e;
const VENDOR_TC: u32 = 0x000166;
const VENDOR_LEXICON: u32 = 0x000fd7;

// Built-in dispatch for devices absent from the descriptor files. MOTU and RME leave the
// model field of root directory meaningless; the version field of unit directory carries
// the variant instead.
fn builtin_lookup(rom: &ConfigRomData) -> Option<WidgetClass> {
    let class = match rom.vendor_id {
        VENDOR_MOTU => match rom.unit_version {
            0x000003 => WidgetClass::Motu828mk2,
            0x000005 => WidgetClass::Motu896hd,
            0x000009 => WidgetClass::MotuTraveler,
            0x00000d => WidgetClass::MotuUltralite,
            _ => return None,
        },
        VENDOR_RME => match rom.unit_version {
            0x000001 => WidgetClass::Ff800,
            0x000002 => WidgetClass::Ff400,
            _ => return None,
        },
        VENDOR_ECHO => match rom.model_id {
            0x000af2 => WidgetClass::AudioFire2,
            0x000af4 => WidgetClass::AudioFire4,
            0x000af8 => WidgetClass::AudioFire8,
            0x00af12 => WidgetClass::AudioFire12,
            _ => return None,
        },
        VENDOR_TERRATEC => match rom.model_id {
            0x000003 => WidgetClass::TerratecPhase88,
            _ => return None,
        },
        VENDOR_MAUDIO => match rom.model_id {
            0x00000a => WidgetClass::MaudioOzonic,
            0x010060 => WidgetClass::MaudioAudiophile,
            0x010062 => WidgetClass::MaudioSolo,
            _ => return None,
        },
        VENDOR_MAUDIO_BEBOB => match rom.model_id {
            0x010046 => WidgetClass::MaudioFw410,
            _ => return None,
        },
        VENDOR_PRESONUS => match rom.model_id {
            0x010000 => WidgetClass::PresonusFirebox,
            _ => return None,
        },
        VENDOR_FOCUSRITE => match rom.model_id {
            0x000003 => WidgetClass::FocusriteSaffirePro26io,
            0x000005 => WidgetClass::FocusriteSaffirePro40,
            0x000006 => WidgetClass::FocusriteSaffirePro10io,
            0x000000 => {
                // Both carry the same model identifier in unit directory. Use the model
                // name to distinguish.
                if rom.model_name == "Saffire" {
                    WidgetClass::FocusriteSaffire
                } else {
                    WidgetClass::FocusriteSaffireLe
                }
            }
            _ => return None,
        },
        VENDOR_TC => WidgetClass::Tcd22xx,
        VENDOR_LEXICON => match rom.model_id {
            0x000001 => WidgetClass::LexiconIonix,
            _ => return None,
        },
        _ => return None,
    };
    Some(class)
}

/// The resolved presentation of one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelModel {
    pub widget: WidgetClass,
    /// Human-readable label shown in the panel header.
    pub label: String,
}

fn label_of(desc: Option<&DeviceDescriptor>, rom: &ConfigRomData) -> String {
    let vendor = desc
        .and_then(|d| d.string("vendorname"))
        .unwrap_or(rom.vendor_name.as_str());
    let model = desc
        .and_then(|d| d.string("modelname"))
        .unwrap_or(rom.model_name.as_str());

    if vendor.is_empty() && model.is_empty() {
        format!("0x{:06x}:0x{:08x}", rom.vendor_id, rom.model_id)
    } else {
        format!("{} {}", vendor, model).trim().to_string()
    }
}

/// Choose the widget class for the device: the descriptor entry first, the built-in
/// dispatch next, the placeholder last.
pub fn detect(descriptors: &DescriptorMap, rom: &ConfigRomData) -> PanelModel {
    let desc = descriptors.lookup(rom.vendor_id, rom.model_id);

    let widget = desc
        .and_then(|d| d.mixer())
        .and_then(|name| {
            let class = WidgetClass::from_name(name);
            if class.is_none() {
                warn!(
                    vendor_id = rom.vendor_id,
                    model_id = rom.model_id,
                    name, "descriptor names an unknown mixer class"
                );
            }
            class
        })
        .or_else(|| builtin_lookup(rom))
        .unwrap_or(WidgetClass::Unsupported);

    PanelModel {
        widget,
        label: label_of(desc, rom),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn rom(vendor_id: u32, model_id: u32, unit_version: u32) -> ConfigRomData {
        ConfigRomData {
            guid: 0x0123456789abcdef,
            vendor_id,
            model_id,
            unit_version,
            vendor_name: "Vendor".to_string(),
            model_name: "Model".to_string(),
        }
    }

    #[test]
    fn descriptor_entry_wins_over_builtin() {
        let input = r#"
device_definitions = (
  { vendorid = 0x0001f2; modelid = 0x000001; mixer = "Generic"; }
);
"#;
        let map = DescriptorMap::parse(input).unwrap();

        // The built-in dispatch would pick the Traveler through the unit version.
        let model = detect(&map, &rom(0x0001f2, 0x000001, 0x000009));
        assert_eq!(model.widget, WidgetClass::Generic);
    }

    #[test]
    fn motu_variant_from_unit_version() {
        let map = DescriptorMap::default();

        let model = detect(&map, &rom(0x0001f2, 0x000001, 0x000009));
        assert_eq!(model.widget, WidgetClass::MotuTraveler);

        let model = detect(&map, &rom(0x0001f2, 0x000001, 0x00000d));
        assert_eq!(model.widget, WidgetClass::MotuUltralite);
    }

    #[test]
    fn saffire_distinguished_by_model_name() {
        let map = DescriptorMap::default();

        let mut data = rom(0x00130e, 0x000000, 0);
        data.model_name = "Saffire".to_string();
        assert_eq!(detect(&map, &data).widget, WidgetClass::FocusriteSaffire);

        data.model_name = "Saffire LE".to_string();
        assert_eq!(detect(&map, &data).widget, WidgetClass::FocusriteSaffireLe);
    }

    #[test]
    fn unknown_device_gets_placeholder() {
        let map = DescriptorMap::default();
        let model = detect(&map, &rom(0x123456, 0x000001, 0));
        assert_eq!(model.widget, WidgetClass::Unsupported);
        assert!(model.widget.specs().is_empty());
    }

    #[test]
    fn descriptor_with_unknown_name_falls_back() {
        let input = r#"
device_definitions = (
  { vendorid = 0x000a35; modelid = 0x000000; mixer = "NoSuchWidget"; }
);
"#;
        let map = DescriptorMap::parse(input).unwrap();
        let model = detect(&map, &rom(0x000a35, 0x000000, 0x000002));
        assert_eq!(model.widget, WidgetClass::Ff400);
    }

    #[test]
    fn every_name_resolves_to_its_class() {
        [
            ("MotuTraveler", WidgetClass::MotuTraveler),
            ("Ff400", WidgetClass::Ff400),
            ("SaffirePro40", WidgetClass::FocusriteSaffirePro40),
            ("AudioFire8", WidgetClass::AudioFire8),
            ("Generic", WidgetClass::Generic),
        ]
        .iter()
        .for_each(|(name, class)| {
            assert_eq!(WidgetClass::from_name(name), Some(*class));
        });

        assert_eq!(WidgetClass::from_name("Unsupported"), None);
    }
}
