use std::str::FromStr;

use strum::{Display, EnumString};

use crate::address::HardwareAddress;
use crate::error::ReconError;

/// Column `wlan.show` orders the table by.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum SortKey {
    #[default]
    Ssid,
    Seen,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    ReconOn,
    ReconOff,
    Deauth,
    SetClient(HardwareAddress),
    ClearClient,
    SetBaseStation(HardwareAddress),
    ClearBaseStation,
    Show(SortKey),
    Help,
    Quit,
}

pub const HELP: &[(&str, &str)] = &[
    ("wlan.recon on", "Start 802.11 wireless base stations discovery."),
    ("wlan.recon off", "Stop 802.11 wireless base stations discovery."),
    (
        "wlan.deauth",
        "Start a 802.11 deauth attack (client and base station, or every client of the base station).",
    ),
    ("wlan.recon set client MAC", "Set client to deauth (single client)."),
    ("wlan.recon clear client", "Remove client to deauth."),
    (
        "wlan.recon set bs MAC",
        "Set 802.11 base station address to filter for (empties the target list).",
    ),
    (
        "wlan.recon clear bs",
        "Remove the 802.11 base station filter (empties the target list).",
    ),
    (
        "wlan.show [ssid|seen]",
        "Show current hosts list and recent events (default sorting by ssid).",
    ),
    ("help", "Show this list."),
    ("quit", "Stop everything and leave."),
];

impl FromStr for Command {
    type Err = ReconError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let unknown = || ReconError::UnknownCommand(line.trim().to_string());
        let words: Vec<&str> = line.split_whitespace().collect();

        let command = match words.as_slice() {
            ["wlan.recon", "on"] => Command::ReconOn,
            ["wlan.recon", "off"] => Command::ReconOff,
            ["wlan.deauth"] => Command::Deauth,
            ["wlan.recon", "set", "client", mac] => Command::SetClient(mac.parse()?),
            ["wlan.recon", "clear", "client"] => Command::ClearClient,
            ["wlan.recon", "set", "bs", mac] => Command::SetBaseStation(mac.parse()?),
            ["wlan.recon", "clear", "bs"] => Command::ClearBaseStation,
            ["wlan.show"] => Command::Show(SortKey::default()),
            ["wlan.show", key] => Command::Show(key.parse().map_err(|_| unknown())?),
            ["help"] => Command::Help,
            ["quit"] | ["exit"] => Command::Quit,
            _ => return Err(unknown()),
        };
        Ok(command)
    }
}

/// Split an `--eval` script into command lines.
pub fn split_script(script: &str) -> impl Iterator<Item = &str> {
    script.split(';').map(str::trim).filter(|line| !line.is_empty())
}
