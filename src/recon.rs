//! The `wlan.recon` module: owns the capture lifecycle, the filters and the
//! target directory, and answers the console commands.
//!
//! One thread runs the blocking read-and-classify loop. Everything else runs on
//! the caller's thread through `&mut ReconModule`.

use std::fmt::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use strum::Display;

use crate::address::HardwareAddress;
use crate::attack::{send_deauth, FrameInjector};
use crate::capture::{CaptureBackend, CaptureCloser, FrameSource};
use crate::commands::{Command, SortKey, HELP};
use crate::config::ReconConfig;
use crate::error::{ReconError, Result};
use crate::frame::decode;
use crate::oui::OuiDatabase;
use crate::processing::{classify, Detection};
use crate::status::MessageLog;
use crate::targets::{AttackTarget, TargetDirectory};
use crate::ui::{render_report, RECENT_EVENTS};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
pub enum LifecycleState {
    Stopped,
    Configuring,
    Running,
}

struct Session {
    running: Arc<AtomicBool>,
    injector: Box<dyn FrameInjector>,
    closer: Box<dyn CaptureCloser>,
    thread: Option<JoinHandle<()>>,
}

impl Session {
    fn is_alive(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Cancel the capture and wait until the loop has released the device.
    fn close(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        self.closer.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

enum Lifecycle {
    Stopped,
    Configuring,
    Running(Session),
}

/// What the console should do with a handled command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    Silent,
    Text(String),
    Quit,
}

pub struct ReconModule {
    config: ReconConfig,
    backend: Arc<dyn CaptureBackend>,
    vendors: Option<Arc<OuiDatabase>>,
    vendors_loaded: bool,
    lifecycle: Lifecycle,
    filters: Arc<RwLock<AttackTarget>>,
    directory: Option<Arc<TargetDirectory>>,
    log: Arc<MessageLog>,
    started_at: DateTime<Utc>,
}

impl ReconModule {
    pub fn new(config: ReconConfig, backend: Arc<dyn CaptureBackend>) -> Self {
        let log = Arc::new(MessageLog::new(Some(config.event_capacity)));
        ReconModule {
            config,
            backend,
            vendors: None,
            vendors_loaded: false,
            lifecycle: Lifecycle::Stopped,
            filters: Arc::new(RwLock::new(AttackTarget::default())),
            directory: None,
            log,
            started_at: Utc::now(),
        }
    }

    pub fn log(&self) -> Arc<MessageLog> {
        self.log.clone()
    }

    /// The live directory, once a session has been started.
    pub fn directory(&self) -> Option<Arc<TargetDirectory>> {
        self.directory.clone()
    }

    pub fn filters(&self) -> AttackTarget {
        *self.read_filters()
    }

    /// A loop that ended on its own reads as `Stopped`.
    pub fn state(&self) -> LifecycleState {
        match &self.lifecycle {
            Lifecycle::Stopped => LifecycleState::Stopped,
            Lifecycle::Configuring => LifecycleState::Configuring,
            Lifecycle::Running(session) if session.is_alive() => LifecycleState::Running,
            Lifecycle::Running(_) => LifecycleState::Stopped,
        }
    }

    fn read_filters(&self) -> RwLockReadGuard<'_, AttackTarget> {
        self.filters.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_filters(&self) -> RwLockWriteGuard<'_, AttackTarget> {
        self.filters.write().unwrap_or_else(|e| e.into_inner())
    }

    fn vendor_database(&mut self) -> Option<Arc<OuiDatabase>> {
        if self.config.vendor_lookup && !self.vendors_loaded {
            self.vendors_loaded = true;
            match OuiDatabase::new() {
                Ok(db) => self.vendors = Some(Arc::new(db)),
                Err(e) => self
                    .log
                    .warning(format!("Vendor database unavailable: {e}")),
            }
        }
        self.vendors.clone()
    }

    /// Drop a session whose loop already ended by itself.
    fn reap(&mut self) {
        if let Lifecycle::Running(session) = &mut self.lifecycle {
            if !session.is_alive() {
                if let Some(thread) = session.thread.take() {
                    let _ = thread.join();
                }
                self.lifecycle = Lifecycle::Stopped;
            }
        }
    }

    /// `wlan.recon on`
    pub fn start(&mut self) -> Result<()> {
        self.reap();
        if !matches!(self.lifecycle, Lifecycle::Stopped) {
            return Err(ReconError::AlreadyRunning);
        }
        self.lifecycle = Lifecycle::Configuring;

        let device = match self.backend.activate(&self.config.interface) {
            Ok(device) => device,
            Err(e) => {
                self.lifecycle = Lifecycle::Stopped;
                self.log.error(format!(
                    "Could not activate {}: {e}",
                    self.config.interface
                ));
                return Err(e);
            }
        };

        let mut directory = TargetDirectory::new().with_aliases(self.config.aliases.clone());
        if let Some(vendors) = self.vendor_database() {
            directory = directory.with_vendors(vendors);
        }
        let directory = Arc::new(directory);
        self.directory = Some(directory.clone());
        self.started_at = Utc::now();

        let running = Arc::new(AtomicBool::new(true));
        let context = LoopContext {
            running: running.clone(),
            filters: self.filters.clone(),
            directory,
            log: self.log.clone(),
            sweep_interval: self.config.sweep_interval,
        };
        let source = device.source;
        let spawned = thread::Builder::new()
            .name("wlan.recon".to_string())
            .spawn(move || capture_loop(source, context));

        let thread = match spawned {
            Ok(thread) => thread,
            Err(e) => {
                self.lifecycle = Lifecycle::Stopped;
                return Err(ReconError::DeviceConfigurationFailure(e.to_string()));
            }
        };

        self.lifecycle = Lifecycle::Running(Session {
            running,
            injector: device.injector,
            closer: device.closer,
            thread: Some(thread),
        });
        self.log
            .info(format!("wlan.recon started on {}", self.config.interface));
        Ok(())
    }

    /// `wlan.recon off`
    ///
    /// Wakes a read blocked on a quiet channel and returns once the device
    /// is released.
    pub fn stop(&mut self) -> Result<()> {
        self.reap();
        match std::mem::replace(&mut self.lifecycle, Lifecycle::Stopped) {
            Lifecycle::Running(mut session) => {
                session.close();
                self.log.info("wlan.recon stopped".to_string());
                Ok(())
            }
            other => {
                self.lifecycle = other;
                Err(ReconError::NotRunning)
            }
        }
    }

    /// `wlan.recon set client`
    pub fn set_client(&mut self, client: HardwareAddress) {
        self.write_filters().client = Some(client);
        self.log.info(format!("Client set to {client}"));
    }

    /// `wlan.recon clear client`
    pub fn clear_client(&mut self) {
        self.write_filters().client = None;
        self.log.info("Client cleared".to_string());
    }

    /// `wlan.recon set bs`. Empties the directory, even for the same address.
    pub fn set_base_station(&mut self, base_station: HardwareAddress) {
        self.replace_base_station(Some(base_station));
        self.log.info(format!("Base station set to {base_station}"));
    }

    /// `wlan.recon clear bs`. Empties the directory.
    pub fn clear_base_station(&mut self) {
        self.replace_base_station(None);
        self.log.info("Base station cleared".to_string());
    }

    // Under the write lock so no frame classified against the old filter
    // lands after the clear.
    fn replace_base_station(&self, base_station: Option<HardwareAddress>) {
        let mut filters = self.write_filters();
        if let Some(directory) = &self.directory {
            directory.clear_all();
        }
        filters.base_station = base_station;
    }

    /// `wlan.deauth`. Returns the number of frames injected.
    pub fn deauth(&mut self) -> Result<usize> {
        self.reap();
        let target = self.filters();
        if target.base_station.is_none() {
            return Err(ReconError::NoBaseStationConfigured);
        }
        let directory = self.directory.clone().ok_or(ReconError::NotInitialized)?;
        let session = match &mut self.lifecycle {
            Lifecycle::Running(session) => session,
            _ => return Err(ReconError::NotRunning),
        };

        let summary = send_deauth(session.injector.as_mut(), &target, &directory)?;
        for (bs, client) in &summary.pairs {
            self.log.priority(format!("Deauth {bs} <-> {client}"));
        }
        if summary.aborted() {
            self.log.warning(format!(
                "Deauth cut short, {} frames sent",
                summary.frames
            ));
        } else {
            self.log.info(format!(
                "Deauth done, {} frames sent to {} target(s)",
                summary.frames,
                summary.pairs.len()
            ));
        }
        Ok(summary.frames)
    }

    /// `wlan.show`
    pub fn show(&self, key: SortKey) -> Result<String> {
        let directory = self.directory.as_ref().ok_or(ReconError::NotInitialized)?;
        Ok(render_report(
            directory.list(),
            key,
            &self.log.get_recent_messages(RECENT_EVENTS),
            self.started_at,
            Utc::now(),
        ))
    }

    pub fn handle(&mut self, command: Command) -> Result<Reply> {
        match command {
            Command::ReconOn => self.start()?,
            Command::ReconOff => self.stop()?,
            Command::Deauth => {
                let frames = self.deauth()?;
                return Ok(Reply::Text(format!("{frames} deauth frames sent.")));
            }
            Command::SetClient(client) => self.set_client(client),
            Command::ClearClient => self.clear_client(),
            Command::SetBaseStation(bs) => self.set_base_station(bs),
            Command::ClearBaseStation => self.clear_base_station(),
            Command::Show(key) => return self.show(key).map(Reply::Text),
            Command::Help => return Ok(Reply::Text(help_text())),
            Command::Quit => return Ok(Reply::Quit),
        }
        Ok(Reply::Silent)
    }

    /// Stop if running. Used on the way out.
    pub fn shutdown(&mut self) {
        if self.state() == LifecycleState::Running {
            let _ = self.stop();
        }
    }
}

impl Drop for ReconModule {
    fn drop(&mut self) {
        if let Lifecycle::Running(session) = &mut self.lifecycle {
            session.close();
        }
    }
}

pub fn help_text() -> String {
    let mut output = String::new();
    for (command, description) in HELP {
        writeln!(output, "  {:<26} : {}", command, description).ok();
    }
    output
}

struct LoopContext {
    running: Arc<AtomicBool>,
    filters: Arc<RwLock<AttackTarget>>,
    directory: Arc<TargetDirectory>,
    log: Arc<MessageLog>,
    sweep_interval: Duration,
}

/// Releases the device and marks the session dead however the loop exits.
struct CaptureGuard {
    source: Box<dyn FrameSource>,
    running: Arc<AtomicBool>,
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        self.source.close();
        self.running.store(false, Ordering::SeqCst);
    }
}

fn capture_loop(source: Box<dyn FrameSource>, context: LoopContext) {
    let mut guard = CaptureGuard {
        source,
        running: context.running.clone(),
    };
    let link_type = guard.source.link_type();
    let mut sweep_started = Instant::now();

    while context.running.load(Ordering::SeqCst) {
        let read = guard.source.next_frame();
        // Stopped while blocked: nothing read now belongs to this session.
        if !context.running.load(Ordering::SeqCst) {
            break;
        }
        let packet = match read {
            Ok(Some(packet)) => packet,
            Ok(None) => {
                context
                    .log
                    .warning("Capture ended: no more frames".to_string());
                break;
            }
            Err(e) => {
                context.log.error(format!("Capture ended: {e}"));
                break;
            }
        };

        if sweep_started.elapsed() >= context.sweep_interval {
            let missed = context.directory.end_sweep();
            tracing::debug!(missed, "sweep closed");
            sweep_started = Instant::now();
        }

        let frame = match decode(link_type, &packet) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::trace!("dropped frame: {e}");
                continue;
            }
        };

        let detection = {
            let filters = context.filters.read().unwrap_or_else(|e| e.into_inner());
            classify(&frame, filters.base_station.as_ref(), &context.directory)
        };

        match detection {
            Some(Detection::BaseStation {
                address,
                ssid,
                channel,
                is_new: true,
            }) => context.log.info(format!(
                "New base station {address} \"{ssid}\" on channel {channel}"
            )),
            Some(Detection::Client {
                address,
                base_station,
                is_new: true,
                ..
            }) => context
                .log
                .info(format!("New client {address} of {base_station}")),
            _ => {}
        }
    }
}
