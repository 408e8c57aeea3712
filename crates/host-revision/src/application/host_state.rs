//! # Host State
//!
//! Settings, signing key and chain height shared by every session. Sessions
//! never hold the lock across network I/O; they copy what they need into a
//! [`RoundSnapshot`].

use std::sync::Arc;

use ed25519_dalek::SigningKey;
use parking_lot::RwLock;
use shared_types::{public_key, BlockHeight, PublicKey};
use tracing::warn;

use crate::algorithms::sign_settings;
use crate::domain::{HostSettings, SignedSettings, SigningError};

/// Process-wide host state.
pub struct HostState {
    /// Advertised settings.
    pub settings: HostSettings,
    /// Sector size every stored contract was built with. Fixed for the
    /// life of the host.
    sector_size: u64,
    /// Key the host signs revisions and settings with.
    secret_key: SigningKey,
    /// Current consensus height.
    pub block_height: BlockHeight,
}

/// Immutable copy of [`HostState`] taken at the start of a round.
#[derive(Clone)]
pub struct RoundSnapshot {
    /// Settings in force for the round.
    pub settings: HostSettings,
    /// Signing key.
    pub secret_key: SigningKey,
    /// Height at round start.
    pub block_height: BlockHeight,
}

/// Shared handle to [`HostState`].
#[derive(Clone)]
pub struct SharedHostState {
    inner: Arc<RwLock<HostState>>,
}

impl SharedHostState {
    /// Create host state.
    pub fn new(settings: HostSettings, secret_key: SigningKey, block_height: BlockHeight) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HostState {
                sector_size: settings.sector_size,
                settings,
                secret_key,
                block_height,
            })),
        }
    }

    /// Copy the state under the read lock.
    pub fn snapshot(&self) -> RoundSnapshot {
        let state = self.inner.read();
        RoundSnapshot {
            settings: state.settings.clone(),
            secret_key: state.secret_key.clone(),
            block_height: state.block_height,
        }
    }

    /// Current settings, signed with the host key.
    pub fn signed_settings(&self) -> Result<SignedSettings, SigningError> {
        let snapshot = self.snapshot();
        sign_settings(snapshot.settings, &snapshot.secret_key)
    }

    /// Host public key.
    pub fn public_key(&self) -> PublicKey {
        public_key(&self.inner.read().secret_key)
    }

    /// Current height.
    pub fn block_height(&self) -> BlockHeight {
        self.inner.read().block_height
    }

    /// Fixed sector size.
    pub fn sector_size(&self) -> u64 {
        self.inner.read().sector_size
    }

    /// Record a new consensus height.
    pub fn set_block_height(&self, height: BlockHeight) {
        self.inner.write().block_height = height;
    }

    /// Replace the settings, bumping their version. The sector size is not
    /// negotiable and keeps its original value.
    pub fn update_settings(&self, mut settings: HostSettings) {
        let mut state = self.inner.write();
        if settings.sector_size != state.sector_size {
            warn!(
                requested = settings.sector_size,
                fixed = state.sector_size,
                "[revise] ignoring sector size change in settings update"
            );
            settings.sector_size = state.sector_size;
        }
        settings.revision_number = state.settings.revision_number + 1;
        state.settings = settings;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::verify_settings;
    use shared_types::Currency;

    fn create_state() -> SharedHostState {
        SharedHostState::new(
            HostSettings::for_testing(),
            SigningKey::from_bytes(&[4u8; 32]),
            7,
        )
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let state = create_state();
        let snapshot = state.snapshot();
        state.set_block_height(8);

        assert_eq!(snapshot.block_height, 7);
        assert_eq!(state.block_height(), 8);
    }

    #[test]
    fn test_update_settings_bumps_version() {
        let state = create_state();
        let settings = HostSettings {
            storage_price: Currency::from(9u64),
            ..HostSettings::for_testing()
        };
        state.update_settings(settings);

        let snapshot = state.snapshot();
        assert_eq!(snapshot.settings.revision_number, 1);
        assert_eq!(snapshot.settings.storage_price, Currency::from(9u64));
    }

    #[test]
    fn test_update_settings_keeps_sector_size() {
        let state = create_state();
        let fixed = state.sector_size();
        state.update_settings(HostSettings {
            sector_size: fixed * 2,
            storage_price: Currency::from(3u64),
            ..HostSettings::for_testing()
        });

        let snapshot = state.snapshot();
        assert_eq!(state.sector_size(), fixed);
        assert_eq!(snapshot.settings.sector_size, fixed);
        assert_eq!(snapshot.settings.storage_price, Currency::from(3u64));
        assert_eq!(snapshot.settings.revision_number, 1);
    }

    #[test]
    fn test_signed_settings_verify() {
        let state = create_state();
        let signed = state.signed_settings().unwrap();
        assert!(verify_settings(&signed, &state.public_key()));
    }
}
