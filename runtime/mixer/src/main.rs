// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (c) 2024 Takashi Sakamoto
mod manager;
mod model;
mod panel;
mod settings;
mod table;

mod bebob;
mod dice;
mod fireface;
mod fireworks;
mod motu;

#[cfg(test)]
mod mock;

use {
    clap::Parser,
    firewire_control_client::{
        dbus::DbusControlClient, CallError, CallErrorKind, UpdateSignal,
    },
    firewire_device_descriptor::registry::{DescriptorMap, LoadError},
    glib::{ControlFlow, Error, FileError},
    manager::{ManagerState, PanelManager, TerminalReason},
    nix::sys::signal,
    runtime_core::{cmdline::*, dispatcher::*, LogLevel, *},
    std::{path::PathBuf, sync::mpsc, thread},
    tracing::{debug, debug_span, info, Level},
};

/// The system-wide descriptor file, installed by the distribution.
const SYSTEM_DESCRIPTOR_PATH: &str = "/usr/share/firewire-mixer/configuration";

enum Event {
    Shutdown,
    PreUpdate,
    PostUpdate,
    Poll,
    Liveness,
}

#[derive(Debug, Default, Clone)]
struct MixerParams {
    system_file: Option<PathBuf>,
    user_file: Option<PathBuf>,
    export: Option<PathBuf>,
    import: Option<PathBuf>,
}

struct MixerRuntime {
    client: DbusControlClient,
    manager: PanelManager,
    params: MixerParams,
    rx: mpsc::Receiver<Event>,
    tx: mpsc::SyncSender<Event>,
    dispatchers: Vec<Dispatcher>,
}

fn ctl_err(err: &CallError) -> Error {
    Error::new(err.kind, &err.message)
}

fn load_err(err: &LoadError) -> Error {
    match err {
        LoadError::Io(cause) => Error::new(FileError::Failed, &cause.to_string()),
        LoadError::Registry(cause) => Error::new(FileError::Inval, &cause.to_string()),
    }
}

fn terminal_err(reason: TerminalReason) -> Error {
    match reason {
        TerminalReason::RetryExhausted => Error::new(
            FileError::Failed,
            "Reconciliation against bus reconfiguration failed repeatedly",
        ),
        TerminalReason::ServerLost => Error::new(
            CallErrorKind::Disconnected,
            "Connection to control server is lost",
        ),
    }
}

fn user_descriptor_path() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .map(|home| PathBuf::from(home).join(".config/firewire-mixer/configuration"))
}

fn load_descriptors(params: &MixerParams) -> Result<DescriptorMap, Error> {
    let system = params
        .system_file
        .clone()
        .unwrap_or_else(|| PathBuf::from(SYSTEM_DESCRIPTOR_PATH));
    let user = params.user_file.clone().or_else(user_descriptor_path);

    if system.exists() {
        DescriptorMap::from_files(&system, user.as_deref()).map_err(|err| load_err(&err))
    } else if let Some(path) = user.filter(|path| path.exists()) {
        DescriptorMap::from_files(&path, None).map_err(|err| load_err(&err))
    } else {
        // The built-in dispatch still covers the common models.
        info!("no descriptor file found, built-in dispatch only");
        Ok(DescriptorMap::default())
    }
}

impl RuntimeOperation<MixerParams> for MixerRuntime {
    fn new(params: MixerParams, log_level: Option<LogLevel>) -> Result<Self, Error> {
        if let Some(level) = log_level {
            let fmt_level = match level {
                LogLevel::Debug => Level::DEBUG,
            };
            tracing_subscriber::fmt().with_max_level(fmt_level).init();
        }

        let descriptors = load_descriptors(&params)?;
        debug!(descriptors = descriptors.len(), "descriptor entries");

        let client = DbusControlClient::new().map_err(|err| ctl_err(&err))?;
        let manager = PanelManager::new(descriptors);

        // Use uni-directional channel for communication to child threads.
        let (tx, rx) = mpsc::sync_channel(32);

        let dispatchers = Vec::new();

        Ok(MixerRuntime {
            client,
            manager,
            params,
            rx,
            tx,
            dispatchers,
        })
    }

    fn listen(&mut self) -> Result<(), Error> {
        self.launch_system_event_dispatcher()?;
        self.launch_update_signal_forwarder();
        self.launch_interval_timers()?;

        let enter = debug_span!("populate").entered();
        self.manager.reconcile(&self.client);
        enter.exit();

        if let ManagerState::Terminal(reason) = self.manager.state() {
            Err(terminal_err(reason))?
        }

        info!(panels = self.manager.guids().len(), "initial population");

        Ok(())
    }

    fn run(&mut self) -> Result<(), Error> {
        if let Some(path) = self.params.export.clone() {
            return self.export_once(&path);
        }
        if let Some(path) = self.params.import.clone() {
            return self.import_once(&path);
        }

        let enter = debug_span!("event").entered();
        let mut outcome = Ok(());
        loop {
            let ev = match self.rx.recv() {
                Ok(ev) => ev,
                Err(_) => continue,
            };

            match ev {
                Event::Shutdown => break,
                Event::PreUpdate => {
                    let _enter = debug_span!("freeze").entered();
                    self.manager.freeze();
                }
                Event::PostUpdate => {
                    let _enter = debug_span!("reconcile").entered();
                    self.manager.reconcile(&self.client);
                }
                Event::Poll => {
                    let _enter = debug_span!("poll").entered();
                    self.manager.poll(&self.client);
                }
                Event::Liveness => {
                    let _enter = debug_span!("liveness").entered();
                    self.manager.check_liveness(&self.client);
                }
            }

            if let ManagerState::Terminal(reason) = self.manager.state() {
                outcome = Err(terminal_err(reason));
                break;
            }
        }

        enter.exit();

        outcome
    }
}

impl Drop for MixerRuntime {
    fn drop(&mut self) {
        // At first, stop event loop in all of dispatchers to avoid queueing new events.
        for dispatcher in &mut self.dispatchers {
            dispatcher.stop();
        }

        // Next, consume all events in queue to release blocked thread for sender.
        for _ in self.rx.try_iter() {}

        // Finally finish I/O threads.
        self.dispatchers.clear();
    }
}

impl MixerRuntime {
    const SYSTEM_DISPATCHER_NAME: &'static str = "system event dispatcher";
    const TIMER_DISPATCHER_NAME: &'static str = "interval timer dispatcher";

    const POLL_INTERVAL: std::time::Duration = std::time::Duration::from_secs(1);
    const LIVENESS_INTERVAL: std::time::Duration = std::time::Duration::from_millis(500);

    fn launch_system_event_dispatcher(&mut self) -> Result<(), Error> {
        let name = Self::SYSTEM_DISPATCHER_NAME.to_string();
        let mut dispatcher = Dispatcher::run(name)?;

        let tx = self.tx.clone();
        dispatcher.attach_signal_handler(signal::Signal::SIGINT, move || {
            let _ = tx.send(Event::Shutdown);
            ControlFlow::Break
        });

        let tx = self.tx.clone();
        dispatcher.attach_signal_handler(signal::Signal::SIGTERM, move || {
            let _ = tx.send(Event::Shutdown);
            ControlFlow::Break
        });

        self.dispatchers.push(dispatcher);

        Ok(())
    }

    // The change notifications of the device manager arrive on their own connection; the
    // stream ends when either side of the connection goes away, and the liveness probe
    // covers the rest.
    fn launch_update_signal_forwarder(&mut self) {
        let client = self.client.clone();
        let tx = self.tx.clone();
        thread::spawn(move || {
            let res = client.dispatch_update_signals(|signal| {
                let ev = match signal {
                    UpdateSignal::PreUpdate => Event::PreUpdate,
                    UpdateSignal::PostUpdate => Event::PostUpdate,
                    UpdateSignal::Updated => Event::PostUpdate,
                    UpdateSignal::Destroyed => Event::Liveness,
                };
                let _ = tx.send(ev);
            });
            if let Err(err) = res {
                debug!(%err, "update signal stream closed");
            }
            let _ = tx.send(Event::Liveness);
        });
    }

    fn launch_interval_timers(&mut self) -> Result<(), Error> {
        let name = Self::TIMER_DISPATCHER_NAME.to_string();
        let mut dispatcher = Dispatcher::run(name)?;

        let tx = self.tx.clone();
        dispatcher.attach_interval_handler(Self::POLL_INTERVAL, move || {
            let _ = tx.send(Event::Poll);
            ControlFlow::Continue
        });

        let tx = self.tx.clone();
        dispatcher.attach_interval_handler(Self::LIVENESS_INTERVAL, move || {
            let _ = tx.send(Event::Liveness);
            ControlFlow::Continue
        });

        self.dispatchers.push(dispatcher);

        Ok(())
    }

    fn export_once(&mut self, path: &std::path::Path) -> Result<(), Error> {
        let _enter = debug_span!("export").entered();

        let content = settings::export(&self.manager);
        std::fs::write(path, content)
            .map_err(|err| Error::new(FileError::Failed, &err.to_string()))?;

        info!(path = %path.display(), "settings exported");
        Ok(())
    }

    fn import_once(&mut self, path: &std::path::Path) -> Result<(), Error> {
        let _enter = debug_span!("import").entered();

        let content = std::fs::read_to_string(path)
            .map_err(|err| Error::new(FileError::Failed, &err.to_string()))?;
        let file = settings::import(&content)
            .map_err(|err| Error::new(FileError::Inval, &err.to_string()))?;

        let applied = settings::apply(&file, &self.client, &mut self.manager)
            .map_err(|err| ctl_err(&err))?;

        info!(path = %path.display(), applied, "settings imported");
        Ok(())
    }
}

struct MixerServiceCmd;

#[derive(Parser, Default)]
#[clap(name = "snd-firewire-mixer-ctl")]
struct Arguments {
    /// The path to the system-wide device descriptor file.
    #[clap(long)]
    system_file: Option<PathBuf>,

    /// The path to the user-specific device descriptor file.
    #[clap(long)]
    user_file: Option<PathBuf>,

    /// Export current mixer settings to the file, then exit.
    #[clap(long)]
    export: Option<PathBuf>,

    /// Import mixer settings from the file, then exit.
    #[clap(long)]
    import: Option<PathBuf>,

    /// The level to debug runtime, disabled as a default.
    #[clap(long, short, value_enum)]
    log_level: Option<LogLevel>,
}

impl ServiceCmd<Arguments, MixerParams, MixerRuntime> for MixerServiceCmd {
    fn params(args: &Arguments) -> (MixerParams, Option<LogLevel>) {
        (
            MixerParams {
                system_file: args.system_file.clone(),
                user_file: args.user_file.clone(),
                export: args.export.clone(),
                import: args.import.clone(),
            },
            args.log_level,
        )
    }
}

fn main() {
    MixerServiceCmd::run()
}
