use std::collections::HashMap;
use std::time::Duration;

use clap::Parser;
use derive_setters::Setters;

use crate::address::HardwareAddress;
use crate::error::{ReconError, Result};

#[derive(Parser, Debug)]
#[command(name = "recon-oxide")]
#[command(about = "Finds access points and their clients... and kicks them off.", long_about = None)]
#[command(version)]
pub struct Arguments {
    #[arg(short, long)]
    /// Interface to use.
    pub interface: String,

    #[arg(long, default_value_t = 10)]
    /// Seconds per detection sweep. Devices absent for a full sweep are dimmed.
    pub sweep: u64,

    #[arg(long, value_name = "MAC=NAME")]
    /// Optional - Display name for a device. Repeatable.
    pub alias: Vec<String>,

    #[arg(short, long, value_name = "CMDS")]
    /// Optional - Semicolon separated commands to run before the console opens.
    pub eval: Option<String>,

    #[arg(long, default_value = "info")]
    /// Log level, overridden by RUST_LOG.
    pub log_level: String,

    #[arg(long)]
    /// Do not load the vendor (OUI) database.
    pub no_vendor: bool,
}

/// Everything the recon module needs to run a session.
#[derive(Clone, Debug, Setters)]
pub struct ReconConfig {
    #[setters(into)]
    pub interface: String,
    pub sweep_interval: Duration,
    pub aliases: HashMap<HardwareAddress, String>,
    pub vendor_lookup: bool,
    pub event_capacity: usize,
}

impl Default for ReconConfig {
    fn default() -> Self {
        ReconConfig {
            interface: String::new(),
            sweep_interval: Duration::from_secs(10),
            aliases: HashMap::new(),
            vendor_lookup: true,
            event_capacity: 500,
        }
    }
}

impl TryFrom<&Arguments> for ReconConfig {
    type Error = ReconError;

    fn try_from(args: &Arguments) -> Result<Self> {
        let aliases = args
            .alias
            .iter()
            .map(|alias| parse_alias(alias))
            .collect::<Result<HashMap<_, _>>>()?;

        Ok(ReconConfig::default()
            .interface(args.interface.as_str())
            .sweep_interval(Duration::from_secs(args.sweep.max(1)))
            .aliases(aliases)
            .vendor_lookup(!args.no_vendor))
    }
}

/// `MAC=NAME`. The name may be empty, which just clears it.
pub fn parse_alias(input: &str) -> Result<(HardwareAddress, String)> {
    let (mac, name) = input
        .split_once('=')
        .ok_or_else(|| ReconError::MalformedAddress(input.to_string()))?;
    let address = mac.trim().parse::<HardwareAddress>()?;
    Ok((address, name.trim().to_string()))
}
