use std::fmt;
use std::str::FromStr;

use crate::error::ReconError;

/// A 48-bit link-layer address.
///
/// ```
/// use recon_oxide::address::HardwareAddress;
///
/// let address: HardwareAddress = "FF-ff-ff-ff-ff-FF".parse().unwrap();
/// assert!(address.is_broadcast());
/// assert_eq!(address.to_string(), "ff:ff:ff:ff:ff:ff");
/// ```
///
/// Ordering is byte-lexicographic, which is also the ordering of the rendered
/// lowercase string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HardwareAddress(pub [u8; 6]);

impl HardwareAddress {
    pub fn broadcast() -> Self {
        HardwareAddress([255, 255, 255, 255, 255, 255])
    }

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// Check whether this MAC addresses the whole network.
    pub fn is_broadcast(&self) -> bool {
        self.0 == [255, 255, 255, 255, 255, 255]
    }

    /// Group bit set (covers ipv4/ipv6 multicast and spanning tree ranges).
    pub fn is_multicast(&self) -> bool {
        self.0[0] & 0x01 == 0x01
    }

    /// Whether the address can belong to a single radio rather than a group.
    pub fn is_real_device(&self) -> bool {
        !(self.is_broadcast() || self.is_multicast() || self.0 == [0u8; 6])
    }

    /// Upper-case, colon separated. Used for vendor prefix lookups.
    pub fn to_long_string(&self) -> String {
        format!(
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5],
        )
    }
}

impl fmt::Display for HardwareAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5],
        )
    }
}

impl FromStr for HardwareAddress {
    type Err = ReconError;

    /// Accepts six hex pairs separated by ':' or '-' and nothing else.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let malformed = || ReconError::MalformedAddress(input.to_string());
        let bytes = input.as_bytes();
        if bytes.len() != 17 {
            return Err(malformed());
        }

        let mut array = [0u8; 6];
        for (count, octet) in array.iter_mut().enumerate() {
            let start = count * 3;
            if count > 0 && !matches!(bytes[start - 1], b':' | b'-') {
                return Err(malformed());
            }
            let pair = &bytes[start..start + 2];
            if !pair.iter().all(u8::is_ascii_hexdigit) {
                return Err(malformed());
            }
            let pair = std::str::from_utf8(pair).map_err(|_| malformed())?;
            *octet = u8::from_str_radix(pair, 16).map_err(|_| malformed())?;
        }

        Ok(HardwareAddress(array))
    }
}
