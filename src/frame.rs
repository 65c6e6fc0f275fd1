//! Decoding of captured frames into one tagged representation.
//!
//! A captured buffer is a radiotap header (on radiotap links) followed by an
//! 802.11 frame. [`decode`] turns it into a [`DecodedFrame`] whose
//! [`Dot11Frame`] variant tells the classifier what kind of frame it has.

use byteorder::{LittleEndian, WriteBytesExt};
use nom::bytes::complete::take;
use nom::combinator::map;
use nom::number::complete::{le_u16, le_u8};
use nom::sequence::tuple;
use nom::{IResult, Needed};
use radiotap::Radiotap;
use strum::Display;
use thiserror::Error;

use crate::address::HardwareAddress;

/// Link-layer type reported by the capture device (pcap DLT values).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinkType(pub i32);

impl LinkType {
    pub const IEEE802_11: LinkType = LinkType(105);
    pub const IEEE802_11_RADIOTAP: LinkType = LinkType(127);
}

/// Element ID of the SSID information element.
pub const ELEMENT_ID_SSID: u8 = 0;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Couldn't read radiotap header: {0}")]
    Radiotap(String),
    #[error("There wasn't enough data. {0}")]
    Incomplete(String),
    #[error("A parsing failure occurred: {0}")]
    Failure(String),
    #[error("(FCS) mismatch {computed:08x} {expected:08x}")]
    FcsMismatch { computed: u32, expected: u32 },
    #[error("Link type {0} carries no 802.11 frames")]
    UnsupportedLink(i32),
}

impl From<nom::Err<nom::error::Error<&[u8]>>> for DecodeError {
    fn from(error: nom::Err<nom::error::Error<&[u8]>>) -> Self {
        match error {
            nom::Err::Incomplete(Needed::Size(size)) => {
                DecodeError::Incomplete(format!("At least {size} bytes are missing"))
            }
            nom::Err::Incomplete(Needed::Unknown) => DecodeError::Incomplete(String::new()),
            nom::Err::Failure(error) | nom::Err::Error(error) => DecodeError::Failure(format!(
                "nom::ErrorKind is {:?} with {} bytes left",
                error.code,
                error.input.len()
            )),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
pub enum FrameType {
    Management,
    Control,
    Data,
    Extension,
}

impl FrameType {
    fn from_bits(bits: u8) -> FrameType {
        match bits & 0x03 {
            0 => FrameType::Management,
            1 => FrameType::Control,
            2 => FrameType::Data,
            _ => FrameType::Extension,
        }
    }

    fn bits(&self) -> u8 {
        match self {
            FrameType::Management => 0,
            FrameType::Control => 1,
            FrameType::Data => 2,
            FrameType::Extension => 3,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
pub enum ManagementSubtype {
    AssociationRequest,
    AssociationResponse,
    ReassociationRequest,
    ReassociationResponse,
    ProbeRequest,
    ProbeResponse,
    Beacon,
    Disassociation,
    Authentication,
    Deauthentication,
    Action,
    Reserved(u8),
}

impl ManagementSubtype {
    pub fn from_bits(bits: u8) -> ManagementSubtype {
        match bits {
            0 => ManagementSubtype::AssociationRequest,
            1 => ManagementSubtype::AssociationResponse,
            2 => ManagementSubtype::ReassociationRequest,
            3 => ManagementSubtype::ReassociationResponse,
            4 => ManagementSubtype::ProbeRequest,
            5 => ManagementSubtype::ProbeResponse,
            8 => ManagementSubtype::Beacon,
            10 => ManagementSubtype::Disassociation,
            11 => ManagementSubtype::Authentication,
            12 => ManagementSubtype::Deauthentication,
            13 => ManagementSubtype::Action,
            other => ManagementSubtype::Reserved(other),
        }
    }

    pub fn bits(&self) -> u8 {
        match self {
            ManagementSubtype::AssociationRequest => 0,
            ManagementSubtype::AssociationResponse => 1,
            ManagementSubtype::ReassociationRequest => 2,
            ManagementSubtype::ReassociationResponse => 3,
            ManagementSubtype::ProbeRequest => 4,
            ManagementSubtype::ProbeResponse => 5,
            ManagementSubtype::Beacon => 8,
            ManagementSubtype::Disassociation => 10,
            ManagementSubtype::Authentication => 11,
            ManagementSubtype::Deauthentication => 12,
            ManagementSubtype::Action => 13,
            ManagementSubtype::Reserved(other) => *other & 0x0f,
        }
    }

    /// Length of the fixed fields between the header and the first
    /// information element, for subtypes that carry elements at all.
    fn fixed_parameters_len(&self) -> Option<usize> {
        match self {
            ManagementSubtype::Beacon | ManagementSubtype::ProbeResponse => Some(12),
            ManagementSubtype::ProbeRequest => Some(0),
            ManagementSubtype::AssociationRequest => Some(4),
            ManagementSubtype::ReassociationRequest => Some(10),
            ManagementSubtype::AssociationResponse | ManagementSubtype::ReassociationResponse => {
                Some(6)
            }
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameControl {
    pub protocol_version: u8,
    pub frame_type: FrameType,
    pub frame_subtype: u8,
    pub flags: u8,
}

impl FrameControl {
    pub fn management(subtype: ManagementSubtype) -> Self {
        FrameControl {
            protocol_version: 0,
            frame_type: FrameType::Management,
            frame_subtype: subtype.bits(),
            flags: 0,
        }
    }

    fn from_bytes(first: u8, flags: u8) -> Self {
        FrameControl {
            protocol_version: first & 0x03,
            frame_type: FrameType::from_bits(first >> 2),
            frame_subtype: (first >> 4) & 0x0f,
            flags,
        }
    }

    /// Headed for the distribution system (station to base station).
    pub fn to_ds(&self) -> bool {
        self.flags & 0b0000_0001 != 0
    }

    /// Coming out of the distribution system (base station to station).
    pub fn from_ds(&self) -> bool {
        self.flags & 0b0000_0010 != 0
    }

    pub fn protected(&self) -> bool {
        self.flags & 0b0100_0000 != 0
    }

    pub fn encode(&self) -> [u8; 2] {
        [
            (self.frame_subtype & 0x0f) << 4
                | (self.frame_type.bits() << 2)
                | (self.protocol_version & 0x03),
            self.flags,
        ]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct SequenceControl {
    pub fragment_number: u8,
    pub sequence_number: u16,
}

impl SequenceControl {
    fn from_u16(raw: u16) -> Self {
        SequenceControl {
            fragment_number: (raw & 0x000f) as u8,
            sequence_number: raw >> 4,
        }
    }

    /// Sequence numbers are 12 bits wide and wrap.
    pub fn encode(&self) -> u16 {
        ((self.sequence_number & 0x0fff) << 4) | u16::from(self.fragment_number & 0x0f)
    }
}

/// The 24 byte header shared by every management frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManagementHeader {
    pub frame_control: FrameControl,
    pub duration: u16,
    /// Receiver / destination.
    pub address_1: HardwareAddress,
    /// Transmitter / source.
    pub address_2: HardwareAddress,
    /// BSSID.
    pub address_3: HardwareAddress,
    pub sequence_control: SequenceControl,
}

impl ManagementHeader {
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(24);
        bytes.extend_from_slice(&self.frame_control.encode());
        // Writing into a Vec cannot fail.
        let _ = bytes.write_u16::<LittleEndian>(self.duration);
        bytes.extend_from_slice(&self.address_1.octets());
        bytes.extend_from_slice(&self.address_2.octets());
        bytes.extend_from_slice(&self.address_3.octets());
        let _ = bytes.write_u16::<LittleEndian>(self.sequence_control.encode());
        bytes
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManagementFrame {
    pub subtype: ManagementSubtype,
    pub header: ManagementHeader,
    /// Set when the first information element is the SSID element.
    pub ssid: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataFrame {
    pub frame_control: FrameControl,
    pub address_1: HardwareAddress,
    pub address_2: HardwareAddress,
    pub address_3: HardwareAddress,
    pub address_4: Option<HardwareAddress>,
    pub sequence_control: SequenceControl,
}

/// The frame categories the recon tells apart.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Dot11Frame {
    Management(ManagementFrame),
    Data(DataFrame),
    Control { subtype: u8 },
    Other(FrameControl),
}

/// Radio metadata taken from the radiotap header.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RadioInfo {
    /// Channel frequency in MHz.
    pub frequency: Option<u16>,
    /// Antenna signal in dBm.
    pub signal: Option<i8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedFrame {
    /// `None` when the link carries no radiotap header.
    pub radio: Option<RadioInfo>,
    pub frame: Dot11Frame,
}

/// Decode one captured buffer from a device with the given link type.
pub fn decode(link_type: LinkType, packet: &[u8]) -> Result<DecodedFrame, DecodeError> {
    let (radio, payload, fcs_included) = match link_type {
        LinkType::IEEE802_11_RADIOTAP => {
            let radiotap = Radiotap::from_bytes(packet)
                .map_err(|error| DecodeError::Radiotap(error.to_string()))?;
            let payload = packet.get(radiotap.header.length..).ok_or_else(|| {
                DecodeError::Incomplete("Radiotap header longer than the frame".to_string())
            })?;
            let fcs = radiotap.flags.as_ref().map_or(false, |flags| flags.fcs);
            let radio = RadioInfo {
                frequency: radiotap.channel.as_ref().map(|channel| channel.freq),
                signal: radiotap.antenna_signal.as_ref().map(|signal| signal.value),
            };
            (Some(radio), payload, fcs)
        }
        LinkType::IEEE802_11 => (None, packet, false),
        LinkType(other) => return Err(DecodeError::UnsupportedLink(other)),
    };

    let payload = if fcs_included {
        strip_fcs(payload)?
    } else {
        payload
    };

    Ok(DecodedFrame {
        radio,
        frame: parse_dot11(payload)?,
    })
}

/// Verify and remove the trailing frame check sequence.
fn strip_fcs(input: &[u8]) -> Result<&[u8], DecodeError> {
    if input.len() < 4 {
        return Err(DecodeError::Incomplete("Frame shorter than its FCS".to_string()));
    }
    let (frame, fcs) = input.split_at(input.len() - 4);
    let computed = crc32fast::hash(frame);
    let expected = u32::from_le_bytes([fcs[0], fcs[1], fcs[2], fcs[3]]);
    if computed != expected {
        return Err(DecodeError::FcsMismatch { computed, expected });
    }
    Ok(frame)
}

/// Parse a bare 802.11 frame (no radiotap, no FCS).
pub fn parse_dot11(input: &[u8]) -> Result<Dot11Frame, DecodeError> {
    let (input, frame_control) = parse_frame_control(input)?;

    match frame_control.frame_type {
        FrameType::Management => parse_management(frame_control, input),
        FrameType::Data => parse_data(frame_control, input),
        FrameType::Control => Ok(Dot11Frame::Control {
            subtype: frame_control.frame_subtype,
        }),
        FrameType::Extension => Ok(Dot11Frame::Other(frame_control)),
    }
}

fn parse_frame_control(input: &[u8]) -> IResult<&[u8], FrameControl> {
    map(tuple((le_u8, le_u8)), |(first, flags)| {
        FrameControl::from_bytes(first, flags)
    })(input)
}

fn parse_mac(input: &[u8]) -> IResult<&[u8], HardwareAddress> {
    map(take(6usize), |bytes: &[u8]| {
        let mut octets = [0u8; 6];
        octets.copy_from_slice(bytes);
        HardwareAddress(octets)
    })(input)
}

fn parse_sequence_control(input: &[u8]) -> IResult<&[u8], SequenceControl> {
    map(le_u16, SequenceControl::from_u16)(input)
}

/// First information element as (id, body), if any bytes are left.
fn parse_first_element(input: &[u8]) -> IResult<&[u8], Option<(u8, &[u8])>> {
    if input.is_empty() {
        return Ok((input, None));
    }
    let (input, (id, length)) = tuple((le_u8, le_u8))(input)?;
    let (input, body) = take::<_, _, nom::error::Error<&[u8]>>(length)(input)?;
    Ok((input, Some((id, body))))
}

fn parse_management(frame_control: FrameControl, input: &[u8]) -> Result<Dot11Frame, DecodeError> {
    let (remaining, (duration, address_1, address_2, address_3, sequence_control)) = tuple((
        le_u16,
        parse_mac,
        parse_mac,
        parse_mac,
        parse_sequence_control,
    ))(input)?;

    let subtype = ManagementSubtype::from_bits(frame_control.frame_subtype);
    let header = ManagementHeader {
        frame_control,
        duration,
        address_1,
        address_2,
        address_3,
        sequence_control,
    };

    let mut ssid = None;
    if let Some(fixed) = subtype.fixed_parameters_len() {
        let (elements, _) = take::<_, _, nom::error::Error<&[u8]>>(fixed)(remaining)?;
        if let (_, Some((ELEMENT_ID_SSID, body))) = parse_first_element(elements)? {
            ssid = Some(String::from_utf8_lossy(body).replace('\0', ""));
        }
    }

    Ok(Dot11Frame::Management(ManagementFrame {
        subtype,
        header,
        ssid,
    }))
}

fn parse_data(frame_control: FrameControl, input: &[u8]) -> Result<Dot11Frame, DecodeError> {
    let (remaining, (_duration, address_1, address_2, address_3, sequence_control)) = tuple((
        le_u16,
        parse_mac,
        parse_mac,
        parse_mac,
        parse_sequence_control,
    ))(input)?;

    // The fourth address only exists if both `from_ds` and `to_ds` are set.
    let address_4 = if frame_control.to_ds() && frame_control.from_ds() {
        let (_, address_4) = parse_mac(remaining)?;
        Some(address_4)
    } else {
        None
    };

    Ok(Dot11Frame::Data(DataFrame {
        frame_control,
        address_1,
        address_2,
        address_3,
        address_4,
        sequence_control,
    }))
}
