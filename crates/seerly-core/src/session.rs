// ── Controller session ──
//
// Owns the connection lifecycle: a supervisor loop that walks the
// Connecting → Syncing → Live → Draining → Disconnected state machine,
// spawning a reader, a keepalive prober, and a dispatcher per
// connection attempt.
//
// Generation counters fence stale signals: every connection attempt
// gets a fresh generation number, failure signals are stamped with it,
// and signals from a previous generation are ignored. Draining is a
// join barrier -- all three per-connection tasks are awaited before the
// state reaches Disconnected, so no task from generation N outlives the
// start of generation N+1.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use seerly_api::{
    AsciiChannel, AsciiMessage, EventChannelFactory, EventReader, EventWriter, JsonClient,
    QueryChannel, TransportConfig,
};
use tokio::sync::{broadcast, mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::{KeepaliveConfig, ReconnectConfig, SessionConfig};
use crate::dispatch::{Dispatcher, SequencedChange};
use crate::error::CoreError;
use crate::model::{AutomationEvent, ClientEvent, Device, DeviceRef, Operation};
use crate::registry::Registry;

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No connection, and no attempt in progress.
    Disconnected,
    /// Opening the event channel and authenticating.
    Connecting,
    /// Connected; fetching the full inventory.
    Syncing,
    /// Inventory loaded, notifications flowing.
    Live,
    /// Tearing down a failed or stopping connection.
    Draining,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Syncing => "syncing",
            Self::Live => "live",
            Self::Draining => "draining",
        };
        f.write_str(name)
    }
}

const EVENT_CHANNEL_SIZE: usize = 256;
const CHANGE_QUEUE_SIZE: usize = 64;

/// Why a live connection died. Stamped with the generation it belongs to.
#[derive(Debug)]
enum SessionFailure {
    ChannelClosed,
    ChannelError(String),
    KeepaliveTimeout,
}

impl fmt::Display for SessionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChannelClosed => f.write_str("event channel closed by peer"),
            Self::ChannelError(msg) => write!(f, "event channel error: {msg}"),
            Self::KeepaliveTimeout => f.write_str("keepalive timed out"),
        }
    }
}

/// A client session against one controller.
///
/// Cheaply cloneable; all clones share the same connection and registry.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    config: SessionConfig,
    query: Arc<dyn QueryChannel>,
    events_factory: Arc<dyn EventChannelFactory>,
    registry: Arc<Registry>,
    state: watch::Sender<SessionState>,
    event_tx: broadcast::Sender<Arc<ClientEvent>>,
    automation_events: RwLock<Arc<Vec<AutomationEvent>>>,
    generation: AtomicU64,
    cancel: CancellationToken,
    supervisor: Mutex<Option<JoinHandle<()>>>,
}

impl Session {
    /// Build a session over explicit channel implementations. Production
    /// code goes through [`Session::from_config`]; tests inject doubles.
    pub fn new(
        config: SessionConfig,
        query: Arc<dyn QueryChannel>,
        events_factory: Arc<dyn EventChannelFactory>,
    ) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                config,
                query,
                events_factory,
                registry: Arc::new(Registry::new()),
                state: watch::Sender::new(SessionState::Disconnected),
                event_tx: broadcast::Sender::new(EVENT_CHANNEL_SIZE),
                automation_events: RwLock::new(Arc::new(Vec::new())),
                generation: AtomicU64::new(0),
                cancel: CancellationToken::new(),
                supervisor: Mutex::new(None),
            }),
        }
    }

    /// Build a session with the standard JSON + line-channel transports.
    pub fn from_config(config: SessionConfig) -> Result<Self, CoreError> {
        let transport = TransportConfig {
            timeout: config.request_timeout,
        };
        let query = JsonClient::new(
            &config.host,
            config.http_port,
            &config.username,
            &config.password,
            &transport,
        )?;
        let events = AsciiChannel::new(
            &config.host,
            config.ascii_port,
            &config.username,
            &config.password,
        );
        Ok(Self::new(config, Arc::new(query), Arc::new(events)))
    }

    /// Start the supervisor. Idempotent while running.
    pub async fn start(&self) {
        let mut guard = self.inner.supervisor.lock().await;
        if guard.as_ref().is_some_and(|h| !h.is_finished()) {
            debug!("session already running");
            return;
        }
        let inner = Arc::clone(&self.inner);
        *guard = Some(tokio::spawn(async move {
            inner.supervisor_loop().await;
        }));
    }

    /// Stop the session and wait for every task to finish.
    pub async fn stop(&self) {
        self.inner.cancel.cancel();
        let handle = self.inner.supervisor.lock().await.take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                error!(%err, "supervisor task panicked");
            }
        }
    }

    pub fn state(&self) -> SessionState {
        *self.inner.state.borrow()
    }

    /// Watch of session state transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// Broadcast stream of connectivity and device events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<ClientEvent>> {
        self.inner.event_tx.subscribe()
    }

    pub fn devices(&self) -> Arc<Vec<Arc<Device>>> {
        self.inner.registry.snapshot()
    }

    pub fn device(&self, device_ref: DeviceRef) -> Option<Arc<Device>> {
        self.inner.registry.get(device_ref)
    }

    pub fn device_count(&self) -> usize {
        self.inner.registry.len()
    }

    /// Current connection generation. Bumps on every connect attempt.
    pub fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }

    /// Automation events cached from the last sync.
    pub fn automation_events(&self) -> Arc<Vec<AutomationEvent>> {
        self.inner
            .automation_events
            .read()
            .expect("events lock poisoned")
            .clone()
    }

    // ── Device operations ────────────────────────────────────────────

    pub async fn turn_on(&self, device_ref: DeviceRef) -> Result<(), CoreError> {
        let value = self.control_value_for(device_ref, Operation::TurnOn)?;
        self.inner.query.control_by_value(device_ref.0, value).await?;
        Ok(())
    }

    pub async fn turn_off(&self, device_ref: DeviceRef) -> Result<(), CoreError> {
        let value = self.control_value_for(device_ref, Operation::TurnOff)?;
        self.inner.query.control_by_value(device_ref.0, value).await?;
        Ok(())
    }

    /// Set a dimmable device to `percent` of its on value (0 turns it off).
    pub async fn set_dim_level(
        &self,
        device_ref: DeviceRef,
        percent: u8,
    ) -> Result<(), CoreError> {
        if percent > 100 {
            return Err(CoreError::ValidationFailed {
                message: format!("dim level {percent}% is out of range (0-100)"),
            });
        }
        let device = self.require_device(device_ref)?;
        let crate::model::Capabilities::Dimmable { on_value, .. } = &device.capabilities else {
            return Err(CoreError::CapabilityMismatch {
                operation: Operation::SetDimLevel,
                variant: device.capabilities.variant(),
            });
        };
        // Controllers expect an integer wire value, so fractional
        // percentages truncate rather than round.
        let value = (*on_value * f64::from(percent) / 100.0).trunc();
        self.inner.query.control_by_value(device_ref.0, value).await?;
        Ok(())
    }

    pub async fn lock(&self, device_ref: DeviceRef) -> Result<(), CoreError> {
        let value = self.control_value_for(device_ref, Operation::Lock)?;
        self.inner.query.control_by_value(device_ref.0, value).await?;
        Ok(())
    }

    pub async fn unlock(&self, device_ref: DeviceRef) -> Result<(), CoreError> {
        let value = self.control_value_for(device_ref, Operation::Unlock)?;
        self.inner.query.control_by_value(device_ref.0, value).await?;
        Ok(())
    }

    /// Escape hatch: send a raw value with no capability checking.
    pub async fn control_by_value(
        &self,
        device_ref: DeviceRef,
        value: f64,
    ) -> Result<(), CoreError> {
        self.inner.query.control_by_value(device_ref.0, value).await?;
        Ok(())
    }

    /// Trigger a named automation event, validated against the cache.
    pub async fn run_event(&self, group: &str, name: &str) -> Result<(), CoreError> {
        let known = self
            .automation_events()
            .iter()
            .any(|e| e.group.eq_ignore_ascii_case(group) && e.name.eq_ignore_ascii_case(name));
        if !known {
            return Err(CoreError::EventNotFound {
                group: group.into(),
                name: name.into(),
            });
        }
        self.inner.query.run_event(group, name).await?;
        Ok(())
    }

    fn require_device(&self, device_ref: DeviceRef) -> Result<Arc<Device>, CoreError> {
        self.inner
            .registry
            .get(device_ref)
            .ok_or(CoreError::DeviceNotFound { device_ref })
    }

    /// Resolve the raw control value for an operation, enforcing the
    /// device's capability variant.
    fn control_value_for(
        &self,
        device_ref: DeviceRef,
        operation: Operation,
    ) -> Result<f64, CoreError> {
        use crate::model::Capabilities;

        let device = self.require_device(device_ref)?;
        let caps = &device.capabilities;
        if !caps.supports(operation) {
            return Err(CoreError::CapabilityMismatch {
                operation,
                variant: caps.variant(),
            });
        }
        let value = match (caps, operation) {
            (
                Capabilities::Switchable { on_value, .. }
                | Capabilities::Dimmable { on_value, .. },
                Operation::TurnOn,
            ) => *on_value,
            (
                Capabilities::Switchable { off_value, .. }
                | Capabilities::Dimmable { off_value, .. },
                Operation::TurnOff,
            ) => *off_value,
            (Capabilities::Lockable { lock_value, .. }, Operation::Lock) => *lock_value,
            (Capabilities::Lockable { unlock_value, .. }, Operation::Unlock) => *unlock_value,
            _ => {
                return Err(CoreError::CapabilityMismatch {
                    operation,
                    variant: caps.variant(),
                })
            }
        };
        Ok(value)
    }
}

impl SessionInner {
    async fn supervisor_loop(self: Arc<Self>) {
        let mut attempt: u32 = 0;

        loop {
            if self.cancel.is_cancelled() {
                break;
            }
            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            self.set_state(SessionState::Connecting);
            info!(generation, "connecting to controller");

            let opened = tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                opened = self.events_factory.open() => opened,
            };
            let (reader, writer) = match opened {
                Ok(halves) => halves,
                Err(err) => {
                    warn!(generation, %err, "connect failed");
                    self.set_state(SessionState::Disconnected);
                    if !self.backoff_sleep(&mut attempt).await {
                        break;
                    }
                    continue;
                }
            };

            self.set_state(SessionState::Syncing);
            let dispatcher = Arc::new(Dispatcher::new(
                Arc::clone(&self.query),
                Arc::clone(&self.registry),
                self.event_tx.clone(),
            ));
            let synced = tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                synced = dispatcher.resync_full() => synced,
            };
            if let Err(err) = synced {
                warn!(generation, %err, "initial sync failed");
                self.set_state(SessionState::Disconnected);
                if !self.backoff_sleep(&mut attempt).await {
                    break;
                }
                continue;
            }
            self.refresh_automation_events().await;

            attempt = 0;
            self.set_state(SessionState::Live);
            info!(
                generation,
                devices = self.registry.len(),
                "session live"
            );

            // Per-connection plumbing: child token, failure lane, change
            // queue, keepalive ack counter.
            let child = self.cancel.child_token();
            let (fail_tx, mut fail_rx) = mpsc::channel::<(u64, SessionFailure)>(4);
            let (change_tx, change_rx) = mpsc::channel::<SequencedChange>(CHANGE_QUEUE_SIZE);
            let (ack_tx, ack_rx) = watch::channel(0u64);

            let reader_handle = tokio::spawn(reader_task(
                reader,
                generation,
                change_tx,
                ack_tx,
                fail_tx.clone(),
                child.clone(),
            ));
            let keepalive_handle = tokio::spawn(keepalive_task(
                writer,
                generation,
                self.config.keepalive.clone(),
                ack_rx,
                fail_tx,
                child.clone(),
            ));
            let dispatcher_handle = {
                let dispatcher = Arc::clone(&dispatcher);
                let child = child.clone();
                tokio::spawn(async move { dispatcher.run(change_rx, child).await })
            };

            // Wait for shutdown or a failure from this generation.
            loop {
                tokio::select! {
                    biased;
                    () = self.cancel.cancelled() => break,
                    signal = fail_rx.recv() => {
                        match signal {
                            Some((signal_gen, failure)) if signal_gen == generation => {
                                warn!(generation, %failure, "connection failed");
                                break;
                            }
                            Some((signal_gen, failure)) => {
                                debug!(signal_gen, %failure, "ignoring stale failure signal");
                            }
                            None => break,
                        }
                    }
                }
            }

            self.set_state(SessionState::Draining);
            child.cancel();
            for handle in [reader_handle, keepalive_handle, dispatcher_handle] {
                if let Err(err) = handle.await {
                    error!(generation, %err, "connection task panicked");
                }
            }
            self.set_state(SessionState::Disconnected);

            if self.cancel.is_cancelled() {
                break;
            }
            if !self.backoff_sleep(&mut attempt).await {
                break;
            }
        }

        self.set_state(SessionState::Disconnected);
        info!("session stopped");
    }

    /// Fetch the automation event list. Failure is non-fatal: the cache
    /// keeps its previous contents and run_event validation uses those.
    async fn refresh_automation_events(&self) {
        match self.query.get_events().await {
            Ok(records) => {
                let events: Vec<AutomationEvent> = records
                    .into_iter()
                    .map(|r| AutomationEvent {
                        group: r.group,
                        name: r.name,
                    })
                    .collect();
                debug!(count = events.len(), "automation events cached");
                *self
                    .automation_events
                    .write()
                    .expect("events lock poisoned") = Arc::new(events);
            }
            Err(err) => warn!(%err, "automation event fetch failed, keeping cache"),
        }
    }

    /// Sleep the backoff delay for `attempt`, honoring cancellation and
    /// the retry cap. Returns false when the loop should stop.
    async fn backoff_sleep(&self, attempt: &mut u32) -> bool {
        if let Some(max) = self.config.reconnect.max_retries {
            if *attempt >= max {
                error!(attempts = *attempt, "retry limit reached, giving up");
                return false;
            }
        }
        let delay = calculate_backoff(*attempt, &self.config.reconnect);
        *attempt += 1;
        debug!(attempt = *attempt, ?delay, "backing off before reconnect");
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => false,
            () = tokio::time::sleep(delay) => true,
        }
    }

    fn set_state(&self, next: SessionState) {
        let changed = self.state.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
        if changed {
            debug!(state = %next, "session state changed");
            let _ = self.event_tx.send(Arc::new(ClientEvent::Connectivity(next)));
        }
    }
}

/// Reads the event channel until cancelled. Every inbound line bumps
/// the ack counter (the controller answers pings with plain text, and
/// any traffic proves the peer is alive); change notifications are
/// stamped with a monotonic per-connection sequence and queued.
async fn reader_task(
    mut reader: Box<dyn EventReader>,
    generation: u64,
    change_tx: mpsc::Sender<SequencedChange>,
    ack_tx: watch::Sender<u64>,
    fail_tx: mpsc::Sender<(u64, SessionFailure)>,
    cancel: CancellationToken,
) {
    let mut seq: u64 = 0;

    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            next = reader.next_message() => next,
        };
        match next {
            Ok(Some(message)) => {
                ack_tx.send_modify(|n| *n += 1);
                match message {
                    AsciiMessage::DeviceChange(change) => {
                        seq += 1;
                        let queued = change_tx
                            .send(SequencedChange {
                                seq,
                                device_ref: DeviceRef(change.device_ref),
                            })
                            .await;
                        if queued.is_err() {
                            return; // dispatcher gone, connection is draining
                        }
                    }
                    AsciiMessage::Other(line) => {
                        debug!(generation, line, "unhandled channel line");
                    }
                }
            }
            Ok(None) => {
                let _ = fail_tx.send((generation, SessionFailure::ChannelClosed)).await;
                return;
            }
            Err(err) => {
                let _ = fail_tx
                    .send((generation, SessionFailure::ChannelError(err.to_string())))
                    .await;
                return;
            }
        }
    }
}

/// Pings the controller on an interval and counts unanswered probes.
/// Any inbound traffic between pings counts as an answer.
async fn keepalive_task(
    mut writer: Box<dyn EventWriter>,
    generation: u64,
    config: KeepaliveConfig,
    mut ack_rx: watch::Receiver<u64>,
    fail_tx: mpsc::Sender<(u64, SessionFailure)>,
    cancel: CancellationToken,
) {
    let mut misses: u32 = 0;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            () = tokio::time::sleep(config.interval) => {}
        }

        // Clear anything that arrived during the idle interval so the
        // ack wait below only sees traffic after this ping.
        ack_rx.borrow_and_update();

        if let Err(err) = writer.ping().await {
            let _ = fail_tx
                .send((generation, SessionFailure::ChannelError(err.to_string())))
                .await;
            return;
        }

        let acked = tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            acked = tokio::time::timeout(config.ack_timeout, ack_rx.changed()) => acked,
        };
        match acked {
            Ok(Ok(())) => misses = 0,
            Ok(Err(_)) => return, // reader gone, it reported the failure
            Err(_) => {
                misses += 1;
                warn!(
                    generation,
                    misses,
                    threshold = config.miss_threshold,
                    "keepalive probe unanswered"
                );
                if misses >= config.miss_threshold {
                    let _ = fail_tx
                        .send((generation, SessionFailure::KeepaliveTimeout))
                        .await;
                    return;
                }
            }
        }
    }
}

fn calculate_backoff(attempt: u32, config: &ReconnectConfig) -> Duration {
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(attempt as i32);
    let capped = base.min(config.max_delay.as_secs_f64());

    // Deterministic "jitter" seeded from the attempt number.
    // Not cryptographically random, but good enough for backoff spread.
    let jitter_factor = 1.0 + 0.25 * ((attempt as f64 * 7.3).sin());
    let with_jitter = (capped * jitter_factor).max(0.0);

    Duration::from_secs_f64(with_jitter)
}

// ── Tests ────────────────────────────────────────────────────────────
