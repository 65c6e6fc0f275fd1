use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use crate::address::HardwareAddress;
use crate::devices::{WirelessEndpoint, WlanEndpoint};
use crate::oui::OuiDatabase;

/// What `wlan.deauth` aims at. Both halves are optional.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AttackTarget {
    pub base_station: Option<HardwareAddress>,
    pub client: Option<HardwareAddress>,
}

impl AttackTarget {
    pub fn new(base_station: Option<HardwareAddress>, client: Option<HardwareAddress>) -> Self {
        AttackTarget {
            base_station,
            client,
        }
    }
}

struct DirectoryState {
    entries: HashMap<HardwareAddress, WlanEndpoint>,
    sweep_started: DateTime<Utc>,
}

/// Registry of every base station and client discovered so far.
///
/// One entry per address. Entries are only ever removed all at once by
/// [`TargetDirectory::clear_all`]. Every operation holds the internal lock, so
/// the capture thread and the command thread can share one `Arc<TargetDirectory>`.
pub struct TargetDirectory {
    state: Mutex<DirectoryState>,
    vendors: Option<Arc<OuiDatabase>>,
    aliases: HashMap<HardwareAddress, String>,
}

impl Default for TargetDirectory {
    fn default() -> Self {
        TargetDirectory::new()
    }
}

impl TargetDirectory {
    pub fn new() -> Self {
        TargetDirectory {
            state: Mutex::new(DirectoryState {
                entries: HashMap::new(),
                sweep_started: Utc::now(),
            }),
            vendors: None,
            aliases: HashMap::new(),
        }
    }

    pub fn with_vendors(mut self, vendors: Arc<OuiDatabase>) -> Self {
        self.vendors = Some(vendors);
        self
    }

    pub fn with_aliases(mut self, aliases: HashMap<HardwareAddress, String>) -> Self {
        self.aliases = aliases;
        self
    }

    fn lock(&self) -> MutexGuard<'_, DirectoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record a detection now. Returns `true` when the address was new.
    pub fn add_if_new(
        &self,
        ssid: &str,
        address: HardwareAddress,
        is_base_station: bool,
        channel: i32,
    ) -> bool {
        self.add_if_new_at(ssid, address, is_base_station, channel, Utc::now())
    }

    /// Record a detection at `seen`. Returns `true` when the address was new.
    pub fn add_if_new_at(
        &self,
        ssid: &str,
        address: HardwareAddress,
        is_base_station: bool,
        channel: i32,
        seen: DateTime<Utc>,
    ) -> bool {
        let mut state = self.lock();
        if let Some(entry) = state.entries.get_mut(&address) {
            entry.refresh(ssid, is_base_station, channel, seen);
            return false;
        }

        // Vendor lookup walks the registry, so it only happens once per address.
        let vendor = self.vendors.as_ref().and_then(|db| db.search(&address));
        let alias = self.aliases.get(&address).cloned();
        let endpoint = WirelessEndpoint::new(address, alias, vendor, seen);
        let entry = if is_base_station {
            WlanEndpoint::new_base_station(endpoint, ssid, channel)
        } else {
            WlanEndpoint::new_client(endpoint, channel)
        };
        state.entries.insert(address, entry);
        true
    }

    /// Whether `address` was absent from the last completed sweep.
    pub fn was_missed(&self, address: &HardwareAddress) -> bool {
        self.lock()
            .entries
            .get(address)
            .map_or(false, |entry| entry.was_missed())
    }

    pub fn get(&self, address: &HardwareAddress) -> Option<WlanEndpoint> {
        self.lock().entries.get(address).cloned()
    }

    /// Snapshot of every entry, in no particular order.
    pub fn list(&self) -> Vec<WlanEndpoint> {
        self.lock().entries.values().cloned().collect()
    }

    /// Snapshot of the entries a base-station sweep attack goes after.
    ///
    /// Once a base-station filter is set the directory only holds that
    /// station's clients, so this is every entry.
    pub fn targets(&self) -> Vec<WlanEndpoint> {
        self.list()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Drop every entry.
    pub fn clear_all(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.sweep_started = Utc::now();
    }

    /// Close the current sweep window now.
    pub fn end_sweep(&self) -> usize {
        self.end_sweep_at(Utc::now())
    }

    /// Close the current sweep window at `now`.
    ///
    /// Entries not detected since the previous boundary are flagged missed,
    /// the rest are cleared. Returns how many entries are flagged.
    pub fn end_sweep_at(&self, now: DateTime<Utc>) -> usize {
        let mut state = self.lock();
        let boundary = state.sweep_started;
        let mut missed = 0;
        for entry in state.entries.values_mut() {
            let absent = entry.endpoint.last_seen() < boundary;
            entry.set_missed(absent);
            if absent {
                missed += 1;
            }
        }
        state.sweep_started = now;
        missed
    }
}
