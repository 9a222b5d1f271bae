//! Per-installation device identity.
//!
//! The identifier is an anti-duplicate-vote token only. It carries no
//! authentication weight and is reset by wiping local storage.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::RngExt;
use tracing::{debug, warn};

use crate::store::KeyValueStore;

/// Store key holding the persisted identifier.
pub const DEVICE_ID_KEY: &str = "plenary:device_id";

const SUFFIX_LEN: usize = 9;
const SUFFIX_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Issues and persists the installation's device identifier.
#[derive(Clone)]
pub struct DeviceIdentity {
    store: Arc<dyn KeyValueStore>,
}

impl DeviceIdentity {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Return the installation's identifier, creating it on first use.
    ///
    /// Storage failures are not surfaced: the caller gets a fresh identifier
    /// that is valid for this call only, so a degraded session can still vote.
    pub fn device_id(&self) -> String {
        match self.store.get(DEVICE_ID_KEY) {
            Ok(Some(id)) if !id.is_empty() => return id,
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "Device id lookup failed, using unpersisted id");
                return generate_device_id();
            }
        }

        let id = generate_device_id();
        if let Err(e) = self.store.set(DEVICE_ID_KEY, &id) {
            warn!(error = %e, "Failed to persist device id, using it for this call only");
        } else {
            debug!(device_id = %id, "Generated new device id");
        }
        id
    }
}

/// Synthesise `device-<epoch millis>-<9 base-36 chars>`.
pub fn generate_device_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let mut rng = rand::rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| {
            let idx = rng.random_range(0..SUFFIX_CHARSET.len());
            SUFFIX_CHARSET[idx] as char
        })
        .collect();
    format!("device-{millis}-{suffix}")
}
