use chrono::{DateTime, Utc};

use crate::address::HardwareAddress;

/// Identity record for one radio seen on the air.
#[derive(Clone, Debug, PartialEq)]
pub struct WirelessEndpoint {
    pub hw_address: HardwareAddress,
    pub alias: Option<String>,
    pub vendor: String,
    first_seen: DateTime<Utc>,
    last_seen: DateTime<Utc>,
}

impl WirelessEndpoint {
    pub fn new(
        hw_address: HardwareAddress,
        alias: Option<String>,
        vendor: Option<String>,
        seen: DateTime<Utc>,
    ) -> Self {
        WirelessEndpoint {
            hw_address,
            alias,
            vendor: vendor.unwrap_or_default(),
            first_seen: seen,
            last_seen: seen,
        }
    }

    pub fn first_seen(&self) -> DateTime<Utc> {
        self.first_seen
    }

    pub fn last_seen(&self) -> DateTime<Utc> {
        self.last_seen
    }

    /// Move last-seen forward. A clock that stepped backwards never moves it back.
    pub fn touch(&mut self, seen: DateTime<Utc>) {
        if seen > self.last_seen {
            self.last_seen = seen;
        }
    }

    /// Name shown in reports, empty when nothing is known.
    pub fn display_name(&self) -> &str {
        self.alias.as_deref().unwrap_or("")
    }
}

/// A [`WirelessEndpoint`] as the recon sees it: base station or client.
#[derive(Clone, Debug, PartialEq)]
pub struct WlanEndpoint {
    pub endpoint: WirelessEndpoint,
    ssid: String,
    pub channel: i32,
    is_base_station: bool,
    missed: bool,
}

impl WlanEndpoint {
    pub fn new_base_station(endpoint: WirelessEndpoint, ssid: &str, channel: i32) -> Self {
        WlanEndpoint {
            endpoint,
            ssid: ssid.to_string(),
            channel,
            is_base_station: true,
            missed: false,
        }
    }

    pub fn new_client(endpoint: WirelessEndpoint, channel: i32) -> Self {
        WlanEndpoint {
            endpoint,
            ssid: String::new(),
            channel,
            is_base_station: false,
            missed: false,
        }
    }

    pub fn address(&self) -> HardwareAddress {
        self.endpoint.hw_address
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    pub fn is_base_station(&self) -> bool {
        self.is_base_station
    }

    pub fn was_missed(&self) -> bool {
        self.missed
    }

    pub fn set_missed(&mut self, missed: bool) {
        self.missed = missed;
    }

    /// Record a repeat detection.
    ///
    /// A client that turns out to advertise a network becomes a base station.
    /// A base station keeps the SSID it was first seen with.
    pub fn refresh(&mut self, ssid: &str, is_base_station: bool, channel: i32, seen: DateTime<Utc>) {
        self.endpoint.touch(seen);
        self.channel = channel;
        self.missed = false;
        if is_base_station && !self.is_base_station && !ssid.is_empty() {
            self.is_base_station = true;
            self.ssid = ssid.to_string();
        }
    }
}
