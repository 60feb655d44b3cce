use zeroize::Zeroizing;

/// Source of the passphrase used to derive the store key when the OS
/// keyring is unavailable.
#[async_trait::async_trait]
pub trait PassphraseProvider: Send + Sync {
    /// None means the user declined; the store cannot be opened then. The
    /// returned string is zeroized on drop.
    async fn passphrase(&self, reason: &str) -> Option<Zeroizing<String>>;
}

/// Declines every passphrase request; keyring-only deployments.
#[derive(Debug, Clone, Default)]
pub struct NoPassphrase;

#[async_trait::async_trait]
impl PassphraseProvider for NoPassphrase {
    async fn passphrase(&self, _reason: &str) -> Option<Zeroizing<String>> {
        None
    }
}

/// Fixed passphrase, for tests and headless setups.
#[derive(Clone)]
pub struct StaticPassphrase {
    secret: String,
}

impl StaticPassphrase {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }
}

impl std::fmt::Debug for StaticPassphrase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StaticPassphrase([REDACTED])")
    }
}

#[async_trait::async_trait]
impl PassphraseProvider for StaticPassphrase {
    async fn passphrase(&self, _reason: &str) -> Option<Zeroizing<String>> {
        Some(Zeroizing::new(self.secret.clone()))
    }
}
