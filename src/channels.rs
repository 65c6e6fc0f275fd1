/// Highest frequency (MHz) the 2.4GHz mapping covers.
pub const MAX_2GHZ_FREQUENCY: i32 = 2484;

/// Channel reported for anything above the 2.4GHz band.
pub const UNSUPPORTED_CHANNEL: i32 = 0;

/// Map a radio frequency in MHz to its 802.11 channel number.
///
/// Only the 2.4GHz band is mapped, with a fixed 5MHz spacing from channel 1
/// at 2412MHz. 2484MHz comes out as 15, not the regulatory 14.
/// Higher bands yield [`UNSUPPORTED_CHANNEL`].
pub fn frequency_to_channel(freq_mhz: i32) -> i32 {
    if freq_mhz <= MAX_2GHZ_FREQUENCY {
        ((freq_mhz - 2412) / 5) + 1
    } else {
        UNSUPPORTED_CHANNEL
    }
}
