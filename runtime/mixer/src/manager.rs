// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (c) 2024 Takashi Sakamoto

//! Reconciliation of the displayed panels against the set of attached devices.
//!
//! The device manager signals a pre-update when bus reconfiguration begins and a
//! post-update once it settled. In between the display is frozen. A pass enumerates the
//! devices by index, resolves each to its stable GUID through the configuration ROM
//! element, removes panels of vanished devices and builds panels of new ones. A pass can
//! fail while bus resets come in bursts; the pass then discards every panel, waits
//! shortly, and retries up to a fixed bound, after which the display is given up until
//! restart. After a successful pass the set of displayed GUIDs equals the enumerated set.

use {
    super::{
        model::detect,
        panel::Panel,
    },
    firewire_control_client::{CallError, ConfigRomData, ControlClient, ControlPath},
    firewire_device_descriptor::registry::DescriptorMap,
    std::{collections::BTreeMap, time::Duration},
    tracing::{debug, error, info, warn},
};

/// One device currently attached to the bus, with its panel.
#[derive(Debug)]
pub struct AttachedDevice {
    pub element_name: String,
    pub rom: ConfigRomData,
    pub panel: Panel,
}

/// Why the display was given up.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TerminalReason {
    /// Reconciliation kept failing beyond the retry bound; restart required.
    RetryExhausted,
    /// The control server became unreachable.
    ServerLost,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ManagerState {
    /// Panels track the attached devices.
    Displayed,
    /// Bus reconfiguration announced; no panel mutation until the post-update.
    Frozen,
    /// Unrecoverable.
    Terminal(TerminalReason),
}

pub struct PanelManager {
    descriptors: DescriptorMap,
    devices: BTreeMap<u64, AttachedDevice>,
    state: ManagerState,
    retry_delay: Duration,
}

impl PanelManager {
    pub const RETRY_COUNT_MAX: usize = 10;
    const RETRY_DELAY: Duration = Duration::from_millis(500);

    pub fn new(descriptors: DescriptorMap) -> Self {
        Self::with_retry_delay(descriptors, Self::RETRY_DELAY)
    }

    pub fn with_retry_delay(descriptors: DescriptorMap, retry_delay: Duration) -> Self {
        PanelManager {
            descriptors,
            devices: BTreeMap::new(),
            state: ManagerState::Displayed,
            retry_delay,
        }
    }

    pub fn state(&self) -> ManagerState {
        self.state
    }

    pub fn guids(&self) -> Vec<u64> {
        self.devices.keys().copied().collect()
    }

    pub fn devices(&self) -> impl Iterator<Item = &AttachedDevice> {
        self.devices.values()
    }

    pub fn device(&self, guid: u64) -> Option<&AttachedDevice> {
        self.devices.get(&guid)
    }

    pub fn device_mut(&mut self, guid: u64) -> Option<&mut AttachedDevice> {
        self.devices.get_mut(&guid)
    }

    /// Bus reconfiguration announced. The display freezes; nothing is torn down yet since
    /// the enumeration is in flux until the post-update arrives.
    pub fn freeze(&mut self) {
        if let ManagerState::Terminal(_) = self.state {
            return;
        }
        info!("bus reconfiguration in progress");
        self.state = ManagerState::Frozen;
    }

    /// One reconciliation pass with bounded retry.
    pub fn reconcile(&mut self, client: &dyn ControlClient) {
        if let ManagerState::Terminal(_) = self.state {
            return;
        }

        for attempt in 1..=Self::RETRY_COUNT_MAX {
            match self.reconcile_once(client) {
                Ok(()) => {
                    self.state = ManagerState::Displayed;
                    return;
                }
                Err(err) if err.is_disconnected() => {
                    self.server_lost();
                    return;
                }
                Err(err) => {
                    // A burst of bus resets leaves the enumeration inconsistent. Drop
                    // everything and take the next pass from a clean slate.
                    warn!(attempt, %err, "reconciliation pass failed");
                    self.devices.clear();
                    std::thread::sleep(self.retry_delay);
                }
            }
        }

        error!(
            "reconciliation failed {} times; restart the service",
            Self::RETRY_COUNT_MAX
        );
        self.state = ManagerState::Terminal(TerminalReason::RetryExhausted);
    }

    fn reconcile_once(&mut self, client: &dyn ControlClient) -> Result<(), CallError> {
        let root = ControlPath::device_manager();
        let count = client.nb_elements(&root)?;

        let mut current = BTreeMap::new();
        for index in 0..count {
            let name = client.element_name(&root, index)?;
            let rom = client.config_rom(&ControlPath::device(&name))?;
            current.insert(rom.guid, (name, rom));
        }

        let stale: Vec<u64> = self
            .devices
            .keys()
            .filter(|guid| !current.contains_key(guid))
            .copied()
            .collect();
        for guid in stale {
            if let Some(device) = self.devices.remove(&guid) {
                info!("panel removed: 0x{:016x} ({})", guid, device.element_name);
            }
        }

        for (guid, (name, rom)) in current {
            if self.devices.contains_key(&guid) {
                debug!(name = name.as_str(), "panel retained");
                continue;
            }

            let model = detect(&self.descriptors, &rom);
            let path = ControlPath::device(&name);
            let panel = Panel::build(client, &path, &model)?;
            info!(
                "panel built: 0x{:016x} ({}) as {:?}",
                guid, name, model.widget
            );
            self.devices.insert(
                guid,
                AttachedDevice {
                    element_name: name,
                    rom,
                    panel,
                },
            );
        }

        Ok(())
    }

    /// Periodic refresh of the fields the server never pushes.
    pub fn poll(&mut self, client: &dyn ControlClient) {
        if self.state != ManagerState::Displayed {
            return;
        }

        let mut lost = false;
        for device in self.devices.values_mut() {
            if let Err(err) = device.panel.refresh(client) {
                warn!(name = device.element_name.as_str(), %err, "refresh aborted");
                if err.is_disconnected() {
                    lost = true;
                    break;
                }
            }
        }

        if lost {
            self.server_lost();
        }
    }

    /// Cheap probe against the device manager. Failure means the server exited.
    pub fn check_liveness(&mut self, client: &dyn ControlClient) -> bool {
        if let ManagerState::Terminal(_) = self.state {
            return false;
        }

        match client.nb_elements(&ControlPath::device_manager()) {
            Ok(_) => true,
            Err(err) => {
                warn!(%err, "liveness probe failed");
                self.server_lost();
                false
            }
        }
    }

    fn server_lost(&mut self) {
        error!("control server is unreachable; every panel torn down");
        self.devices.clear();
        self.state = ManagerState::Terminal(TerminalReason::ServerLost);
    }
}

#[cfg(test)]
mod test {
    use {
        super::*,
        crate::mock::{device_rom, MockClient},
        crate::model::WidgetClass,
    };

    fn manager() -> PanelManager {
        PanelManager::with_retry_delay(DescriptorMap::default(), Duration::from_millis(0))
    }

    #[test]
    fn panels_track_snapshots() {
        let client = MockClient::default();
        let g1 = device_rom(0x0001f2, 0x000001, 0x000009);
        let g2 = device_rom(0x123456, 0x000001, 0);
        client.add_device("unit-1", g1.clone());
        client.add_device("unit-2", g2.clone());

        let mut manager = manager();
        manager.reconcile(&client);

        assert_eq!(manager.state(), ManagerState::Displayed);
        assert_eq!(manager.guids(), vec![g1.guid, g2.guid]);

        // The widget class follows the dispatch: MOTU by unit version, placeholder for
        // the unknown vendor.
        assert_eq!(
            manager.device(g1.guid).unwrap().panel.widget(),
            WidgetClass::MotuTraveler
        );
        assert_eq!(
            manager.device(g2.guid).unwrap().panel.widget(),
            WidgetClass::Unsupported
        );

        // G1 unplugged, G3 plugged.
        let g3 = device_rom(0x000a35, 0x000000, 0x000002);
        client.remove_device("unit-1");
        client.add_device("unit-3", g3.clone());

        manager.freeze();
        assert_eq!(manager.state(), ManagerState::Frozen);

        manager.reconcile(&client);
        assert_eq!(manager.state(), ManagerState::Displayed);
        assert_eq!(manager.guids(), vec![g3.guid, g2.guid]);
        assert_eq!(
            manager.device(g3.guid).unwrap().panel.widget(),
            WidgetClass::Ff400
        );
    }

    #[test]
    fn transient_failures_converge_within_bound() {
        let client = MockClient::default();
        let rom = device_rom(0x0001f2, 0x000001, 0x00000d);
        client.add_device("unit-1", rom.clone());
        client.fail_enumerations(3);

        let mut manager = manager();
        manager.reconcile(&client);

        assert_eq!(manager.state(), ManagerState::Displayed);
        assert_eq!(manager.guids(), vec![rom.guid]);
    }

    #[test]
    fn retry_bound_reaches_terminal_state() {
        let client = MockClient::default();
        let rom = device_rom(0x0001f2, 0x000001, 0x00000d);
        client.add_device("unit-1", rom.clone());
        client.fail_enumerations(PanelManager::RETRY_COUNT_MAX);

        let mut manager = manager();
        manager.reconcile(&client);

        assert_eq!(
            manager.state(),
            ManagerState::Terminal(TerminalReason::RetryExhausted)
        );
        // No panel survives for a GUID absent from the last successful snapshot.
        assert!(manager.guids().is_empty());

        // Terminal is sticky; a later pass does not resurrect the display.
        manager.reconcile(&client);
        assert_eq!(
            manager.state(),
            ManagerState::Terminal(TerminalReason::RetryExhausted)
        );
    }

    #[test]
    fn failed_pass_never_leaves_stale_panels() {
        let client = MockClient::default();
        let g1 = device_rom(0x0001f2, 0x000001, 0x000009);
        client.add_device("unit-1", g1.clone());

        let mut manager = manager();
        manager.reconcile(&client);
        assert_eq!(manager.guids(), vec![g1.guid]);

        // The device vanishes while every pass fails; the stale panel must not survive
        // the failing passes.
        client.remove_device("unit-1");
        client.fail_enumerations(PanelManager::RETRY_COUNT_MAX);
        manager.reconcile(&client);

        assert!(manager.guids().is_empty());
    }

    #[test]
    fn disconnect_is_terminal_server_lost() {
        let client = MockClient::default();
        let rom = device_rom(0x0001f2, 0x000001, 0x000009);
        client.add_device("unit-1", rom.clone());

        let mut manager = manager();
        manager.reconcile(&client);
        assert_eq!(manager.guids(), vec![rom.guid]);

        client.disconnect();
        manager.reconcile(&client);

        assert_eq!(
            manager.state(),
            ManagerState::Terminal(TerminalReason::ServerLost)
        );
        assert!(manager.guids().is_empty());
    }

    #[test]
    fn liveness_failure_halts_the_display() {
        let client = MockClient::default();
        let rom = device_rom(0x0001f2, 0x000001, 0x000009);
        client.add_device("unit-1", rom.clone());

        let mut manager = manager();
        manager.reconcile(&client);
        assert!(manager.check_liveness(&client));

        client.disconnect();
        assert!(!manager.check_liveness(&client));
        assert_eq!(
            manager.state(),
            ManagerState::Terminal(TerminalReason::ServerLost)
        );
        assert!(manager.guids().is_empty());
        // Halted for good.
        assert!(!manager.check_liveness(&client));
    }

    #[test]
    fn poll_skips_frozen_display() {
        let client = MockClient::default();
        let rom = device_rom(0x0001f2, 0x000001, 0x000009);
        client.add_device("unit-1", rom.clone());

        let mut manager = manager();
        manager.reconcile(&client);

        client.seed_discrete(
            "/org/ffado/Control/DeviceManager/unit-1/Mixer/Control/ClockLock",
            None,
            1,
        );

        manager.freeze();
        manager.poll(&client);
        // Frozen display is not touched.
        assert_eq!(
            manager
                .device(rom.guid)
                .unwrap()
                .panel
                .value("clock-lock"),
            Some(&crate::table::ControlValue::Discrete(0))
        );

        manager.reconcile(&client);
        manager.poll(&client);
        assert_eq!(
            manager
                .device(rom.guid)
                .unwrap()
                .panel
                .value("clock-lock"),
            Some(&crate::table::ControlValue::Discrete(1))
        );
    }
}
