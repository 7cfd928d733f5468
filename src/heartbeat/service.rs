//! Heartbeat service implementation.
//!
//! A background loop that periodically flushes the activity aggregator:
//! snapshot-and-reset under the aggregator's lock, then build and dispatch
//! the POST outside it. Requests are fire-and-forget; the spawned send task
//! classifies and logs the response, and a new flush may run before the
//! previous response arrives.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::activity::ActivityAggregator;
use crate::config::Config;
use crate::error::Result;

use super::{HeartbeatRequest, HeartbeatSink};

/// Background service that periodically flushes accumulated activity.
pub struct HeartbeatService {
    aggregator: Arc<ActivityAggregator>,
    sink: Arc<dyn HeartbeatSink>,
    config: Config,
    interval: Duration,
    running: Arc<RwLock<bool>>,
}

impl HeartbeatService {
    /// Create a new heartbeat service. `interval_secs` is expected to be
    /// pre-clamped by config loading.
    pub fn new(
        aggregator: Arc<ActivityAggregator>,
        sink: Arc<dyn HeartbeatSink>,
        config: Config,
    ) -> Self {
        let interval = Duration::from_secs(config.interval_secs);
        Self {
            aggregator,
            sink,
            config,
            interval,
            running: Arc::new(RwLock::new(false)),
        }
    }

    /// Start the flush loop in the background.
    pub async fn start(&self) -> Result<()> {
        {
            let mut running = self.running.write().await;
            if *running {
                warn!("Heartbeat service already running");
                return Ok(());
            }
            *running = true;
        }

        let aggregator = Arc::clone(&self.aggregator);
        let sink = Arc::clone(&self.sink);
        let config = self.config.clone();
        let interval_duration = self.interval;
        let running = Arc::clone(&self.running);

        info!(
            "Heartbeat service started (interval={}s, endpoint={})",
            interval_duration.as_secs(),
            if config.endpoint.is_empty() {
                crate::config::DEFAULT_ENDPOINT
            } else {
                &config.endpoint
            }
        );

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval_duration);
            ticker.tick().await;

            loop {
                ticker.tick().await;

                if !*running.read().await {
                    info!("Heartbeat service stopped");
                    break;
                }

                // The send handle is detached: ticks never wait on I/O.
                let _ = Self::flush_once(&aggregator, &sink, &config);
            }
        });

        Ok(())
    }

    /// Stop the flush loop. In-flight sends are abandoned, not drained.
    pub async fn stop(&self) {
        let mut running = self.running.write().await;
        *running = false;
    }

    /// Force a flush immediately, returning the send task's handle (if a
    /// request went out) so callers can await delivery.
    pub fn trigger_now(&self) -> Option<JoinHandle<()>> {
        Self::flush_once(&self.aggregator, &self.sink, &self.config)
    }

    /// Returns whether the service is running.
    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    /// One flush: snapshot-and-reset, then dispatch outside the lock.
    ///
    /// Returns `None` when nothing was sent (clean aggregator or no token
    /// yet). An empty token is "not configured yet", not an error; the
    /// snapshot is deferred so no events are lost while the user is still
    /// filling in settings.
    fn flush_once(
        aggregator: &Arc<ActivityAggregator>,
        sink: &Arc<dyn HeartbeatSink>,
        config: &Config,
    ) -> Option<JoinHandle<()>> {
        if config.trimmed_token().is_empty() {
            debug!("No API token configured, skipping flush");
            return None;
        }

        let snapshot = aggregator.take_snapshot()?;

        let request = HeartbeatRequest::build(&snapshot, config, chrono::Utc::now().timestamp());
        debug!(
            adds = snapshot.add_count,
            deletes = snapshot.delete_count,
            renames = snapshot.rename_count,
            saves = snapshot.save_count,
            "Dispatching heartbeat"
        );

        let sink = Arc::clone(sink);
        Some(tokio::spawn(async move {
            sink.send(request).await.report();
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::EventKind;
    use crate::heartbeat::DeliveryOutcome;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Sink that records every request it receives.
    struct RecordingSink {
        requests: Mutex<Vec<HeartbeatRequest>>,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
            }
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl HeartbeatSink for RecordingSink {
        async fn send(&self, request: HeartbeatRequest) -> DeliveryOutcome {
            self.requests.lock().unwrap().push(request);
            DeliveryOutcome::Accepted(201)
        }
    }

    fn configured() -> Config {
        Config {
            api_token: "waka_test".to_string(),
            project: "MyGame".to_string(),
            ..Config::default()
        }
    }

    fn service_with_sink(config: Config) -> (HeartbeatService, Arc<RecordingSink>) {
        let aggregator = Arc::new(ActivityAggregator::new());
        let sink = Arc::new(RecordingSink::new());
        let service =
            HeartbeatService::new(aggregator, Arc::clone(&sink) as Arc<dyn HeartbeatSink>, config);
        (service, sink)
    }

    #[tokio::test]
    async fn test_flush_on_clean_sends_nothing() {
        let (service, sink) = service_with_sink(configured());
        assert!(service.trigger_now().is_none());
        assert_eq!(sink.request_count(), 0);
    }

    #[tokio::test]
    async fn test_flush_on_dirty_sends_exactly_one_request() {
        let (service, sink) = service_with_sink(configured());
        service
            .aggregator
            .record(EventKind::Save, 1_700_000_000, Some("Foo"));

        let handle = service.trigger_now().expect("dirty flush dispatches");
        handle.await.unwrap();

        assert_eq!(sink.request_count(), 1);
        {
            let requests = sink.requests.lock().unwrap();
            assert_eq!(requests[0].body["entity"], "Foo");
            assert_eq!(requests[0].body["is_write"], true);
        }

        // Aggregator reset: a second flush is a no-op.
        assert!(service.trigger_now().is_none());
        assert_eq!(sink.request_count(), 1);
    }

    #[tokio::test]
    async fn test_flush_without_token_skips_and_keeps_events() {
        let (service, sink) = service_with_sink(Config::default());
        service
            .aggregator
            .record(EventKind::Add, 1_700_000_000, None);

        assert!(service.trigger_now().is_none());
        assert_eq!(sink.request_count(), 0);
        // Events survive until a token is configured.
        assert!(service.aggregator.is_dirty());
    }

    #[tokio::test]
    async fn test_whitespace_only_token_counts_as_unconfigured() {
        let config = Config {
            api_token: "   ".to_string(),
            ..Config::default()
        };
        let (service, sink) = service_with_sink(config);
        service
            .aggregator
            .record(EventKind::Add, 1_700_000_000, None);
        assert!(service.trigger_now().is_none());
        assert_eq!(sink.request_count(), 0);
    }

    #[tokio::test]
    async fn test_start_stop_lifecycle() {
        let (service, _sink) = service_with_sink(configured());
        assert!(!service.is_running().await);
        service.start().await.unwrap();
        assert!(service.is_running().await);
        // Second start is a warned no-op.
        service.start().await.unwrap();
        service.stop().await;
        assert!(!service.is_running().await);
    }

    #[tokio::test]
    async fn test_events_between_flushes_land_in_next_request() {
        let (service, sink) = service_with_sink(configured());
        service
            .aggregator
            .record(EventKind::Add, 1_700_000_000, None);
        service.trigger_now().unwrap().await.unwrap();

        service
            .aggregator
            .record(EventKind::Remove, 1_700_000_010, None);
        service.trigger_now().unwrap().await.unwrap();

        let requests = sink.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].body["lines"], 1);
        assert_eq!(requests[1].body["lines"], 0);
    }
}
