//! Driver spawns and manages the telemetry receive task.

use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::protocol::{ContactBatch, PlatformStatus};
use crate::source::{DatagramSource, TelemetryChannel};

/// Result of spawning the driver task.
pub struct DriverChannels {
    /// Receiver for the latest decoded platform status.
    pub status: watch::Receiver<Option<Arc<PlatformStatus>>>,
    /// Receiver for the latest decoded contact batch.
    pub contacts: watch::Receiver<Option<Arc<ContactBatch>>>,
    /// Cancellation token for graceful shutdown.
    pub cancel: CancellationToken,
}

/// Driver spawns and manages the telemetry receive task.
///
/// One task owns the [`DatagramSource`] and decodes each datagram
/// independently. Decode failures are isolated per datagram: a malformed
/// packet is logged and dropped, and never terminates the receive loop.
/// Only repeated *transport* errors shut the task down.
pub struct Driver;

impl Driver {
    /// Spawn the receive task for the given source.
    ///
    /// Returns watch receivers carrying the latest record per channel
    /// (telemetry is snapshot-semantics: a stale status has no value once
    /// a newer one arrived), plus a cancellation token for shutdown.
    pub fn spawn<S>(source: S) -> DriverChannels
    where
        S: DatagramSource,
    {
        let (status_tx, status_rx) = watch::channel(None);
        let (contacts_tx, contacts_rx) = watch::channel(None);

        let cancel = CancellationToken::new();
        let cancel_task = cancel.clone();

        tokio::spawn(async move {
            Self::receive_task(source, status_tx, contacts_tx, cancel_task).await;
        });

        DriverChannels { status: status_rx, contacts: contacts_rx, cancel }
    }

    /// Receive task - reads datagrams and publishes decoded records.
    async fn receive_task<S>(
        mut source: S,
        status_tx: watch::Sender<Option<Arc<PlatformStatus>>>,
        contacts_tx: watch::Sender<Option<Arc<ContactBatch>>>,
        cancel: CancellationToken,
    ) where
        S: DatagramSource,
    {
        info!("Telemetry receive task started ({})", source.describe());
        let mut datagram_count = 0u64;
        let mut malformed_count = 0u64;
        let mut error_count = 0u32;
        const MAX_ERRORS: u32 = 10;

        loop {
            // Check for cancellation between datagrams
            if cancel.is_cancelled() {
                info!("Receive task cancelled");
                break;
            }

            // Use select to allow cancellation during a blocking receive
            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Receive task cancelled during receive");
                    break;
                }
                result = source.next_datagram() => result,
            };

            match result {
                Ok(Some(datagram)) => {
                    datagram_count += 1;
                    error_count = 0; // Reset error count on success

                    trace!(
                        "Datagram {}: {:?}, {} bytes",
                        datagram_count,
                        datagram.channel,
                        datagram.payload.len()
                    );

                    // Decode failures are a property of the datagram, not
                    // the loop: log, count, move on.
                    match datagram.channel {
                        TelemetryChannel::PlatformStatus => {
                            match PlatformStatus::decode(&datagram.payload) {
                                Ok(status) => {
                                    let _ = status_tx.send(Some(Arc::new(status)));
                                }
                                Err(e) => {
                                    malformed_count += 1;
                                    warn!(
                                        "Dropping malformed status datagram ({} bytes): {}",
                                        datagram.payload.len(),
                                        e
                                    );
                                }
                            }
                        }
                        TelemetryChannel::SurfaceContacts => {
                            match ContactBatch::decode(&datagram.payload) {
                                Ok(batch) => {
                                    let _ = contacts_tx.send(Some(Arc::new(batch)));
                                }
                                Err(e) => {
                                    malformed_count += 1;
                                    warn!(
                                        "Dropping malformed contact datagram ({} bytes): {}",
                                        datagram.payload.len(),
                                        e
                                    );
                                }
                            }
                        }
                    }

                    // Either channel may be dropped independently; shut
                    // down only once nobody is listening at all.
                    if status_tx.is_closed() && contacts_tx.is_closed() {
                        debug!("All receivers dropped, shutting down");
                        break;
                    }
                }
                Ok(None) => {
                    info!("Source ended after {} datagrams", datagram_count);
                    let _ = status_tx.send(None);
                    let _ = contacts_tx.send(None);
                    break;
                }
                Err(e) => {
                    // Transport error - don't crash on transient failures
                    error_count += 1;
                    error!("Source error ({}/{}): {}", error_count, MAX_ERRORS, e);

                    if error_count >= MAX_ERRORS || !e.is_retryable() {
                        error!("Giving up on source, shutting down");
                        let _ = status_tx.send(None);
                        let _ = contacts_tx.send(None);
                        break;
                    }

                    // Exponential backoff: 50ms, 100ms, 200ms, ...
                    let backoff = std::time::Duration::from_millis(50 * (1 << error_count.min(5)));
                    tokio::time::sleep(backoff).await;
                }
            }
        }

        info!(
            "Telemetry receive task ended ({} datagrams, {} malformed)",
            datagram_count, malformed_count
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{
        DATA_SOURCE_VESSEL, SECONDARY_CONTACTS, SECONDARY_MOTION, UNIT_TYPE_TELEMETRY, UnitCode,
        UnitHeader,
    };
    use crate::source::Datagram;
    use crate::{LinkError, Result};
    use std::time::Duration;

    /// Source that plays a fixed script of results, then blocks forever.
    ///
    /// Blocking (rather than ending) keeps the watch channels on their
    /// last published value, so tests never race the end-of-stream None.
    struct ScriptedSource {
        script: std::vec::IntoIter<Result<Option<Datagram>>>,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<Option<Datagram>>>) -> Self {
            Self { script: script.into_iter() }
        }
    }

    #[async_trait::async_trait]
    impl DatagramSource for ScriptedSource {
        async fn next_datagram(&mut self) -> Result<Option<Datagram>> {
            match self.script.next() {
                Some(result) => result,
                None => std::future::pending().await,
            }
        }

        fn describe(&self) -> String {
            "scripted".to_string()
        }
    }

    fn status_datagram(seq: u8) -> Datagram {
        let status = PlatformStatus {
            header: UnitHeader {
                seq,
                unit_type: UNIT_TYPE_TELEMETRY,
                length: PlatformStatus::LEN as u16,
                timestamp: 1000,
                sender: UnitCode(0x5001),
                secondary: SECONDARY_MOTION,
                receiver: UnitCode::SHORE_STATION,
                data_source: DATA_SOURCE_VESSEL,
                param: 0,
            },
            longitude_deg: 120.0,
            latitude_deg: 30.0,
            altitude_m: 0,
            speed_knots: 5.0,
            heading_deg: 180.0,
            course_deg: 180.0,
            course_rate: 0,
            operating_mode: 1,
            simulated: false,
            gimbal_deg: 0.0,
            ammunition: 0,
            energy_pct: 100,
            body_angle_deg: 0.0,
            reserved: 0,
        };
        Datagram {
            channel: TelemetryChannel::PlatformStatus,
            payload: status.encode().to_vec(),
            source: None,
        }
    }

    fn contacts_datagram() -> Datagram {
        let batch = ContactBatch {
            header: UnitHeader {
                seq: 1,
                unit_type: UNIT_TYPE_TELEMETRY,
                length: 0,
                timestamp: 2000,
                sender: UnitCode(0x5002),
                secondary: SECONDARY_CONTACTS,
                receiver: UnitCode::SHORE_STATION,
                data_source: DATA_SOURCE_VESSEL,
                param: 0,
            },
            contacts: Vec::new(),
        };
        Datagram {
            channel: TelemetryChannel::SurfaceContacts,
            payload: batch.encode().unwrap(),
            source: None,
        }
    }

    /// Wait until the driver publishes its end-of-stream None.
    async fn wait_for_end<T>(rx: &mut watch::Receiver<Option<T>>) {
        loop {
            tokio::time::timeout(Duration::from_secs(5), rx.changed())
                .await
                .expect("driver should settle")
                .expect("sender kept alive by driver task");
            if rx.borrow().is_none() {
                break;
            }
        }
    }

    /// Wait until the channel carries a value, and return it.
    async fn wait_for_value<T: Clone>(rx: &mut watch::Receiver<Option<T>>) -> T {
        loop {
            if let Some(value) = rx.borrow_and_update().clone() {
                return value;
            }
            tokio::time::timeout(Duration::from_secs(5), rx.changed())
                .await
                .expect("driver should publish in time")
                .expect("sender kept alive by driver task");
        }
    }

    #[tokio::test]
    async fn driver_publishes_decoded_records() {
        let source = ScriptedSource::new(vec![
            Ok(Some(status_datagram(1))),
            Ok(Some(contacts_datagram())),
        ]);
        let mut channels = Driver::spawn(source);

        let status = wait_for_value(&mut channels.status).await;
        assert_eq!(status.header.seq, 1);
        assert_eq!(status.speed_knots, 5.0);
        assert_eq!(status.heading_deg, 180.0);

        let contacts = wait_for_value(&mut channels.contacts).await;
        assert!(contacts.contacts.is_empty());
        assert_eq!(contacts.header.sender, UnitCode(0x5002));

        channels.cancel.cancel();
    }

    #[tokio::test]
    async fn malformed_datagram_does_not_stop_the_loop() {
        let bad = Datagram {
            channel: TelemetryChannel::PlatformStatus,
            payload: vec![0xEE; 10], // far too short
            source: None,
        };
        let source = ScriptedSource::new(vec![Ok(Some(bad)), Ok(Some(status_datagram(42)))]);
        let mut channels = Driver::spawn(source);

        // The good datagram behind the malformed one still decodes
        let status = wait_for_value(&mut channels.status).await;
        assert_eq!(status.header.seq, 42);

        channels.cancel.cancel();
    }

    #[tokio::test]
    async fn non_retryable_source_error_ends_the_task() {
        let source = ScriptedSource::new(vec![
            Err(LinkError::config_error("broken source")),
            // Never reached: the driver gives up on non-retryable errors
            Ok(Some(status_datagram(7))),
        ]);
        let mut channels = Driver::spawn(source);

        wait_for_end(&mut channels.status).await;
        assert!(channels.status.borrow().is_none());
    }

    #[tokio::test]
    async fn cancellation_stops_the_task() {
        // A source that never produces anything
        struct PendingSource;

        #[async_trait::async_trait]
        impl DatagramSource for PendingSource {
            async fn next_datagram(&mut self) -> Result<Option<Datagram>> {
                std::future::pending().await
            }

            fn describe(&self) -> String {
                "pending".to_string()
            }
        }

        let channels = Driver::spawn(PendingSource);
        let cancel = channels.cancel.clone();
        cancel.cancel();

        // The task observes the token and exits; the watch senders drop.
        let mut status = channels.status.clone();
        let ended = tokio::time::timeout(Duration::from_secs(5), async move {
            // changed() errors once the sender side is gone
            while status.changed().await.is_ok() {}
        })
        .await;
        assert!(ended.is_ok(), "cancelled driver task must terminate");
    }
}
