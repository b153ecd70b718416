//! Telemetry connection over both multicast groups.

use std::path::Path;
use std::sync::Arc;

use futures::{Stream, StreamExt};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::TelemetryConfig;
use crate::driver::Driver;
use crate::protocol::{ContactBatch, PlatformStatus};
use crate::source::DatagramSource;
use crate::sources::{LogReplaySource, MulticastSource};
use crate::Result;

/// Connection to the inbound telemetry link.
///
/// Owns the receive task (through its cancellation token) and exposes the
/// decoded records as streams and as latest-value snapshots. Dropping the
/// connection cancels the task.
pub struct TelemetryConnection {
    /// Platform-status watch receiver
    status: watch::Receiver<Option<Arc<PlatformStatus>>>,

    /// Contact-batch watch receiver
    contacts: watch::Receiver<Option<Arc<ContactBatch>>>,

    /// Cancellation token for stopping the receive task
    cancel: CancellationToken,
}

impl TelemetryConnection {
    /// Join both telemetry multicast groups and start receiving.
    pub async fn join(config: &TelemetryConfig) -> Result<Self> {
        let source = MulticastSource::join(config)?;
        Ok(Self::from_source(source))
    }

    /// Replay a recorded datagram log through the same receive path.
    pub async fn replay<P: AsRef<Path>>(path: P) -> Result<Self> {
        let source = LogReplaySource::open(path)?;
        Ok(Self::from_source(source))
    }

    /// Start the driver on any datagram source.
    ///
    /// Public seam for custom transports and tests; the live and replay
    /// constructors both go through here.
    pub fn from_source<S: DatagramSource>(source: S) -> Self {
        info!("Telemetry connection opened ({})", source.describe());
        let channels = Driver::spawn(source);
        Self { status: channels.status, contacts: channels.contacts, cancel: channels.cancel }
    }

    /// Platform-status updates as a stream, latest-value semantics.
    ///
    /// A slow consumer observes the newest status, not a backlog: stale
    /// snapshots have no value once a newer one arrived.
    pub fn status_updates(&self) -> impl Stream<Item = Arc<PlatformStatus>> + Unpin + 'static {
        WatchStream::new(self.status.clone()).filter_map(|opt| async move { opt }).boxed()
    }

    /// Surface-contact updates as a stream, latest-value semantics.
    pub fn contact_updates(&self) -> impl Stream<Item = Arc<ContactBatch>> + Unpin + 'static {
        WatchStream::new(self.contacts.clone()).filter_map(|opt| async move { opt }).boxed()
    }

    /// Latest decoded platform status, if any arrived yet.
    pub fn latest_status(&self) -> Option<Arc<PlatformStatus>> {
        self.status.borrow().clone()
    }

    /// Latest decoded contact batch, if any arrived yet.
    pub fn latest_contacts(&self) -> Option<Arc<ContactBatch>> {
        self.contacts.borrow().clone()
    }
}

impl Drop for TelemetryConnection {
    fn drop(&mut self) {
        debug!("Dropping telemetry connection");
        // Cancel the receive task on drop for clean shutdown
        self.cancel.cancel();
    }
}
