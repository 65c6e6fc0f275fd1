use mac_oui::Oui;

use crate::address::HardwareAddress;

/// Vendor names by address prefix, backed by the embedded IEEE registry.
pub struct OuiDatabase {
    db: Oui,
}

impl OuiDatabase {
    pub fn new() -> Result<OuiDatabase, String> {
        let db = Oui::default().map_err(|e| e.to_string())?;
        Ok(OuiDatabase { db })
    }

    /// Company name for the prefix of `mac_address`, if registered.
    pub fn search(&self, mac_address: &HardwareAddress) -> Option<String> {
        match self.db.lookup_by_mac(&mac_address.to_long_string()) {
            Ok(Some(record)) => Some(record.company_name.clone()),
            _ => None,
        }
    }
}

impl std::fmt::Debug for OuiDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OuiDatabase").finish_non_exhaustive()
    }
}
