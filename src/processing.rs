use crate::address::HardwareAddress;
use crate::channels::frequency_to_channel;
use crate::frame::{DecodedFrame, Dot11Frame, RadioInfo};
use crate::targets::TargetDirectory;

/// What a classified frame added to (or refreshed in) the directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Detection {
    BaseStation {
        address: HardwareAddress,
        ssid: String,
        channel: i32,
        is_new: bool,
    },
    Client {
        address: HardwareAddress,
        base_station: HardwareAddress,
        channel: i32,
        is_new: bool,
    },
}

impl Detection {
    pub fn is_new(&self) -> bool {
        match self {
            Detection::BaseStation { is_new, .. } | Detection::Client { is_new, .. } => *is_new,
        }
    }
}

fn channel_of(radio: &RadioInfo) -> i32 {
    radio
        .frequency
        .map_or(0, |freq| frequency_to_channel(i32::from(freq)))
}

/// Route a frame to the scan matching the current base-station filter.
pub fn classify(
    frame: &DecodedFrame,
    base_station: Option<&HardwareAddress>,
    directory: &TargetDirectory,
) -> Option<Detection> {
    match base_station {
        Some(bs) => client_scan(bs, frame, directory),
        None => bs_scan(frame, directory),
    }
}

/// Look for base stations advertising an SSID to broadcast.
///
/// The base station is taken from the third address (BSSID).
pub fn bs_scan(frame: &DecodedFrame, directory: &TargetDirectory) -> Option<Detection> {
    let radio = frame.radio.as_ref()?;
    let management = match &frame.frame {
        Dot11Frame::Management(management) => management,
        _ => return None,
    };
    let ssid = management.ssid.as_deref()?;
    let header = &management.header;

    if !header.address_1.is_broadcast() || ssid.is_empty() {
        return None;
    }
    let bssid = header.address_3;
    if !bssid.is_real_device() {
        return None;
    }

    let channel = channel_of(radio);
    let is_new = directory.add_if_new(ssid, bssid, true, channel);
    Some(Detection::BaseStation {
        address: bssid,
        ssid: ssid.to_string(),
        channel,
        is_new,
    })
}

/// Look for clients sending uplink data through `bs`.
///
/// In a to-DS frame the first address is the BSSID and the second is the
/// transmitting station.
pub fn client_scan(
    bs: &HardwareAddress,
    frame: &DecodedFrame,
    directory: &TargetDirectory,
) -> Option<Detection> {
    let radio = frame.radio.as_ref()?;
    let data = match &frame.frame {
        Dot11Frame::Data(data) => data,
        _ => return None,
    };

    let to_ds = data.frame_control.to_ds();
    let from_ds = data.frame_control.from_ds();
    if !to_ds || from_ds {
        return None;
    }
    if data.address_1 != *bs {
        return None;
    }

    let client = data.address_2;
    let channel = channel_of(radio);
    let is_new = directory.add_if_new("", client, false, channel);
    Some(Detection::Client {
        address: client,
        base_station: *bs,
        channel,
        is_new,
    })
}
