//! ReconOxide library components
//!
//! 802.11 base station and client discovery with a deauthentication engine.
//! The binary is a thin console over [`recon::ReconModule`].

pub mod address;
pub mod attack;
pub mod capture;
pub mod channels;
pub mod commands;
pub mod config;
pub mod devices;
pub mod error;
pub mod frame;
pub mod logging;
pub mod oui;
pub mod processing;
pub mod recon;
pub mod status;
pub mod targets;
pub mod tx;
pub mod ui;

pub use address::HardwareAddress;
pub use error::{ReconError, Result};
