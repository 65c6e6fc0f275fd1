//! Capture device contract and the libpcap implementation.
//!
//! A backend activates an interface in monitor mode and hands back three
//! parts: a [`FrameSource`] owned by the capture thread, a [`FrameInjector`]
//! owned by the command side, and a [`CaptureCloser`] the command side uses to
//! cancel the capture. Reading and injecting use separate handles so an
//! injection never waits behind a blocking read.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use pcap::{Active, BreakLoop, Capture};

use crate::attack::FrameInjector;
use crate::error::{ReconError, Result};
use crate::frame::LinkType;

pub const SNAPLEN: i32 = 65536;
/// Zero means block until a frame arrives.
pub const READ_TIMEOUT_MS: i32 = 0;

/// Blocking sequence of raw frames.
pub trait FrameSource: Send {
    fn link_type(&self) -> LinkType;

    /// Next raw frame. `Ok(None)` is end of stream.
    fn next_frame(&mut self) -> Result<Option<Vec<u8>>>;

    /// Release the device. Reads after a close return end of stream.
    fn close(&mut self);
}

/// Cancels a capture from outside the capture thread.
pub trait CaptureCloser: Send {
    /// Wake a blocked `next_frame`, which then returns end of stream.
    fn close(&self);
}

pub struct CaptureDevice {
    pub source: Box<dyn FrameSource>,
    pub injector: Box<dyn FrameInjector>,
    pub closer: Box<dyn CaptureCloser>,
}

/// Opens capture devices by interface name.
pub trait CaptureBackend: Send + Sync {
    fn activate(&self, interface: &str) -> Result<CaptureDevice>;
}

fn open_monitor(interface: &str) -> Result<Capture<Active>> {
    Capture::from_device(interface)
        .and_then(|inactive| {
            inactive
                .rfmon(true)
                .snaplen(SNAPLEN)
                .timeout(READ_TIMEOUT_MS)
                .open()
        })
        .map_err(|e| ReconError::DeviceConfigurationFailure(e.to_string()))
}

/// libpcap in rfmon mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct PcapBackend;

impl CaptureBackend for PcapBackend {
    fn activate(&self, interface: &str) -> Result<CaptureDevice> {
        let mut rx = open_monitor(interface)?;
        let tx = open_monitor(interface)?;
        let link_type = LinkType(rx.get_datalink().0);
        let closed = Arc::new(AtomicBool::new(false));
        let breaker = rx.breakloop_handle();
        tracing::debug!(interface, link_type = link_type.0, "capture device active");

        Ok(CaptureDevice {
            source: Box::new(PcapSource {
                capture: Some(rx),
                link_type,
                closed: closed.clone(),
            }),
            injector: Box::new(PcapInjector { capture: tx }),
            closer: Box::new(PcapCloser { closed, breaker }),
        })
    }
}

pub struct PcapSource {
    capture: Option<Capture<Active>>,
    link_type: LinkType,
    closed: Arc<AtomicBool>,
}

impl PcapSource {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl FrameSource for PcapSource {
    fn link_type(&self) -> LinkType {
        self.link_type
    }

    fn next_frame(&mut self) -> Result<Option<Vec<u8>>> {
        if self.is_closed() {
            self.close();
        }
        let closed = self.closed.clone();
        let capture = match self.capture.as_mut() {
            Some(capture) => capture,
            None => return Ok(None),
        };
        loop {
            let packet = match capture.next_packet() {
                Ok(packet) => packet.data.to_vec(),
                Err(pcap::Error::TimeoutExpired) if !closed.load(Ordering::SeqCst) => continue,
                // A break-loop wakes the read as end of stream.
                Err(pcap::Error::TimeoutExpired) | Err(pcap::Error::NoMorePackets) => {
                    return Ok(None)
                }
                Err(e) => return Err(ReconError::Capture(e.to_string())),
            };
            if closed.load(Ordering::SeqCst) {
                return Ok(None);
            }
            return Ok(Some(packet));
        }
    }

    fn close(&mut self) {
        self.capture = None;
    }
}

/// Breaks a blocked `pcap_next_ex` on the rx handle.
pub struct PcapCloser {
    closed: Arc<AtomicBool>,
    breaker: BreakLoop,
}

impl CaptureCloser for PcapCloser {
    fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.breaker.breakloop();
        }
    }
}

pub struct PcapInjector {
    capture: Capture<Active>,
}

impl FrameInjector for PcapInjector {
    fn inject(&mut self, frame: &[u8]) -> Result<()> {
        self.capture
            .sendpacket(frame)
            .map_err(|e| ReconError::Injection(e.to_string()))
    }
}
