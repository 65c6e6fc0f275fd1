use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReconError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconError {
    #[error("wlan.recon already started")]
    AlreadyRunning,

    #[error("wlan.recon is not running")]
    NotRunning,

    #[error("Targets are not yet initialized")]
    NotInitialized,

    #[error("Base station is not set.")]
    NoBaseStationConfigured,

    /// Text reported by the capture facility, passed through untouched.
    #[error("{0}")]
    DeviceConfigurationFailure(String),

    #[error("Malformed hardware address: {0:?}")]
    MalformedAddress(String),

    #[error("Unknown command: {0:?} (try 'help')")]
    UnknownCommand(String),

    #[error("Frame injection failed: {0}")]
    Injection(String),

    #[error("Capture read failed: {0}")]
    Capture(String),
}
