//! Transport collaborator and the outbound persistence filter.
//!
//! DESIGN
//! ======
//! The transport polls an endpoint, pushes the local snapshot, and hands
//! remote property changes back to the host, which feeds them to
//! [`crate::Session::on_update`]. Delivery and ordering guarantees are the
//! transport's business.
//!
//! [`OutboundFilter`] implements the persistence contract a transport is
//! started with: persistent properties go out on every send, the rest only
//! when their value changed.

#[cfg(test)]
#[path = "transport_test.rs"]
mod tests;

use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc;

/// Outbound property map.
pub type Props = serde_json::Map<String, Value>;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("transport not started")]
    NotStarted,
    #[error("transport channel closed")]
    Closed,
    #[error("transport failure: {0}")]
    Other(String),
}

/// Which properties are resent on every poll (`true`) or only on change
/// (`false`). Properties not listed count as change-only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PersistenceSpec(BTreeMap<String, bool>);

impl PersistenceSpec {
    #[must_use]
    pub fn new(entries: impl IntoIterator<Item = (String, bool)>) -> Self {
        Self(entries.into_iter().collect())
    }

    #[must_use]
    pub fn is_persistent(&self, name: &str) -> bool {
        self.0.get(name).copied().unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl Default for PersistenceSpec {
    fn default() -> Self {
        Self::new(
            [("x", true), ("y", true), ("view", true), ("loop", true), ("cel", true), ("say", false)]
                .into_iter()
                .map(|(k, v)| (k.to_owned(), v)),
        )
    }
}

/// Parameters a transport is started with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportConfig {
    pub endpoint: String,
    pub poll_interval: Duration,
    pub persistence: PersistenceSpec,
}

/// Outbound half of the transport collaborator.
pub trait Transport {
    /// Begin polling. Called once from [`crate::Session::init`].
    fn start(&mut self, config: &TransportConfig) -> Result<(), TransportError>;

    /// Queue properties for the next poll. `force_full` asks for every
    /// property to go out regardless of persistence.
    fn send(&mut self, props: &Props, force_full: bool) -> Result<(), TransportError>;
}

// =============================================================================
// OUTBOUND FILTER
// =============================================================================

/// Applies a [`PersistenceSpec`] to successive sends.
#[derive(Clone, Debug, Default)]
pub struct OutboundFilter {
    spec: PersistenceSpec,
    last_sent: Props,
}

impl OutboundFilter {
    #[must_use]
    pub fn new(spec: PersistenceSpec) -> Self {
        Self { spec, last_sent: Props::new() }
    }

    /// The subset of `props` that should go on the wire now.
    pub fn select(&mut self, props: &Props, force_full: bool) -> Props {
        let mut out = Props::new();
        for (name, value) in props {
            let changed = self.last_sent.get(name) != Some(value);
            if force_full || changed || self.spec.is_persistent(name) {
                out.insert(name.clone(), value.clone());
                self.last_sent.insert(name.clone(), value.clone());
            }
        }
        out
    }
}

// =============================================================================
// CHANNEL TRANSPORT
// =============================================================================

/// Transport that forwards filtered outbound props over an mpsc channel.
///
/// The receiving end stands in for the network poller.
#[derive(Debug)]
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<Props>,
    filter: Option<OutboundFilter>,
    config: Option<TransportConfig>,
}

impl ChannelTransport {
    #[must_use]
    pub fn new(tx: mpsc::UnboundedSender<Props>) -> Self {
        Self { tx, filter: None, config: None }
    }

    #[must_use]
    pub fn config(&self) -> Option<&TransportConfig> {
        self.config.as_ref()
    }
}

impl Transport for ChannelTransport {
    fn start(&mut self, config: &TransportConfig) -> Result<(), TransportError> {
        self.filter = Some(OutboundFilter::new(config.persistence.clone()));
        self.config = Some(config.clone());
        tracing::info!(endpoint = %config.endpoint, interval_ms = config.poll_interval.as_millis(), "transport: started");
        Ok(())
    }

    fn send(&mut self, props: &Props, force_full: bool) -> Result<(), TransportError> {
        let filter = self.filter.as_mut().ok_or(TransportError::NotStarted)?;
        let out = filter.select(props, force_full);
        if out.is_empty() {
            return Ok(());
        }
        self.tx.send(out).map_err(|_| TransportError::Closed)
    }
}
