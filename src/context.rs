//! Handler Context
//!
//! Owned by the process entry point and passed to every handler; there is
//! no global state.

use crate::config::Config;
use crate::store::Store;

/// Account id used when none is configured
pub const DEFAULT_ACCOUNT_ID: &str = "123456789012";

/// Region used when none is configured
pub const DEFAULT_REGION: &str = "us-east-1";

/// State shared by every request of one emulator process
#[derive(Debug)]
pub struct Context {
    pub store: Store,
    pub account_id: String,
    pub region: String,
}

impl Context {
    pub fn new(account_id: &str, region: &str) -> Self {
        Self {
            store: Store::new(),
            account_id: account_id.to_string(),
            region: region.to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.effective_account_id(), &config.effective_region())
    }

    /// First availability zone of the region
    pub fn default_availability_zone(&self) -> String {
        format!("{}a", self.region)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new(DEFAULT_ACCOUNT_ID, DEFAULT_REGION)
    }
}
