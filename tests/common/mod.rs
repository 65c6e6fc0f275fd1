#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use recon_oxide::attack::FrameInjector;
use recon_oxide::capture::{CaptureBackend, CaptureCloser, CaptureDevice, FrameSource};
use recon_oxide::frame::LinkType;
use recon_oxide::{HardwareAddress, ReconError, Result};

pub fn mac(text: &str) -> HardwareAddress {
    text.parse().expect("test address")
}

/// Radiotap header carrying only the channel field.
pub fn radiotap(frequency: u16) -> Vec<u8> {
    let mut header = vec![
        0x00, 0x00, // version, pad
        0x0c, 0x00, // length 12
        0x08, 0x00, 0x00, 0x00, // present: channel
    ];
    header.extend_from_slice(&frequency.to_le_bytes());
    header.extend_from_slice(&[0xa0, 0x00]); // 2 GHz, CCK
    header
}

pub fn beacon(bssid: &HardwareAddress, ssid: &str, frequency: u16) -> Vec<u8> {
    beacon_to(&HardwareAddress::broadcast(), bssid, ssid, frequency)
}

pub fn beacon_to(
    destination: &HardwareAddress,
    bssid: &HardwareAddress,
    ssid: &str,
    frequency: u16,
) -> Vec<u8> {
    let mut frame = radiotap(frequency);
    frame.extend_from_slice(&[0x80, 0x00]); // FrameControl: beacon
    frame.extend_from_slice(&[0x00, 0x00]); // Duration
    frame.extend_from_slice(&destination.octets());
    frame.extend_from_slice(&bssid.octets());
    frame.extend_from_slice(&bssid.octets());
    frame.extend_from_slice(&[0x10, 0x00]); // SequenceControl
    frame.extend_from_slice(&[0u8; 8]); // Timestamp
    frame.extend_from_slice(&[0x64, 0x00]); // Beacon interval
    frame.extend_from_slice(&[0x11, 0x04]); // Capability info
    frame.push(0x00); // SSID element
    frame.push(ssid.len() as u8);
    frame.extend_from_slice(ssid.as_bytes());
    frame.extend_from_slice(&[0x01, 0x02, 0x82, 0x84]); // Supported rates
    frame
}

/// Data frame with the given DS flags: `receiver`, `transmitter`, `third`.
pub fn data(
    flags: u8,
    receiver: &HardwareAddress,
    transmitter: &HardwareAddress,
    third: &HardwareAddress,
    frequency: u16,
) -> Vec<u8> {
    let mut frame = radiotap(frequency);
    frame.extend_from_slice(&[0x08, flags]); // FrameControl: data
    frame.extend_from_slice(&[0x2c, 0x00]); // Duration
    frame.extend_from_slice(&receiver.octets());
    frame.extend_from_slice(&transmitter.octets());
    frame.extend_from_slice(&third.octets());
    frame.extend_from_slice(&[0x40, 0x77]); // SequenceControl
    frame.extend_from_slice(&[0xaa, 0xaa, 0x03, 0x00, 0x00, 0x00, 0x08, 0x00]);
    frame
}

pub fn uplink(bssid: &HardwareAddress, client: &HardwareAddress, frequency: u16) -> Vec<u8> {
    data(0x01, bssid, client, &mac("ff:ff:ff:ff:ff:ff"), frequency)
}

pub fn downlink(bssid: &HardwareAddress, client: &HardwareAddress, frequency: u16) -> Vec<u8> {
    data(0x02, client, bssid, bssid, frequency)
}

/// Poll until `check` holds or two seconds pass.
pub fn wait_for(mut check: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    check()
}

pub type Injected = Arc<Mutex<Vec<(Instant, Vec<u8>)>>>;

/// Records every injected frame with the time it went out.
pub struct RecordingInjector {
    pub frames: Injected,
}

impl RecordingInjector {
    pub fn new() -> Self {
        RecordingInjector {
            frames: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl FrameInjector for RecordingInjector {
    fn inject(&mut self, frame: &[u8]) -> Result<()> {
        self.frames
            .lock()
            .unwrap()
            .push((Instant::now(), frame.to_vec()));
        Ok(())
    }
}

type Feeder = Arc<Mutex<Option<Sender<Vec<u8>>>>>;

struct ChannelSource {
    frames: Option<Receiver<Vec<u8>>>,
    released: Arc<AtomicUsize>,
}

impl FrameSource for ChannelSource {
    fn link_type(&self) -> LinkType {
        LinkType::IEEE802_11_RADIOTAP
    }

    fn next_frame(&mut self) -> Result<Option<Vec<u8>>> {
        match &self.frames {
            Some(frames) => Ok(frames.recv().ok()),
            None => Ok(None),
        }
    }

    fn close(&mut self) {
        if self.frames.take().is_some() {
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Hangs up the feeding side, which wakes a blocked `recv`.
struct ChannelCloser {
    feeder: Feeder,
}

impl CaptureCloser for ChannelCloser {
    fn close(&self) {
        self.feeder.lock().unwrap().take();
    }
}

/// In-memory capture device. Frames fed in come out of the capture loop,
/// injected frames are recorded.
pub struct StubBackend {
    feeder: Mutex<Feeder>,
    pub injected: Injected,
    pub activations: Mutex<usize>,
    released: Arc<AtomicUsize>,
}

impl StubBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(StubBackend {
            feeder: Mutex::new(Arc::new(Mutex::new(None))),
            injected: Arc::new(Mutex::new(Vec::new())),
            activations: Mutex::new(0),
            released: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Send a frame to the current capture. Dropped once it is closed.
    pub fn feed(&self, frame: Vec<u8>) {
        let feeder = self.feeder.lock().unwrap().clone();
        let sender = feeder.lock().unwrap();
        if let Some(sender) = sender.as_ref() {
            sender.send(frame).expect("capture loop gone");
        }
    }

    /// Make the current capture reach end of stream.
    pub fn end_stream(&self) {
        let feeder = self.feeder.lock().unwrap().clone();
        feeder.lock().unwrap().take();
    }

    /// How many sources the capture loop has closed.
    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub fn injected_count(&self) -> usize {
        self.injected.lock().unwrap().len()
    }
}

impl CaptureBackend for StubBackend {
    fn activate(&self, _interface: &str) -> Result<CaptureDevice> {
        let (tx, rx) = mpsc::channel();
        let feeder: Feeder = Arc::new(Mutex::new(Some(tx)));
        *self.feeder.lock().unwrap() = feeder.clone();
        *self.activations.lock().unwrap() += 1;
        Ok(CaptureDevice {
            source: Box::new(ChannelSource {
                frames: Some(rx),
                released: self.released.clone(),
            }),
            injector: Box::new(RecordingInjector {
                frames: self.injected.clone(),
            }),
            closer: Box::new(ChannelCloser { feeder }),
        })
    }
}

/// A device that refuses monitor mode.
pub struct RefusingBackend(pub &'static str);

impl CaptureBackend for RefusingBackend {
    fn activate(&self, _interface: &str) -> Result<CaptureDevice> {
        Err(ReconError::DeviceConfigurationFailure(self.0.to_string()))
    }
}
