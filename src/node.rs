//! Dht node.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

use bytes::Bytes;
use flume::Receiver;
use tracing::{debug, error, info};

use crate::closing::Shutdown;
use crate::common::{PeerId, ProtocolId};
use crate::config::Config;
use crate::membership::{
    Host, Membership, MembershipContext, Mode, ModeController, ModeHandler, RoutingTable,
    SharedState,
};
use crate::record::RecordStore;
use crate::reducer::{NamespacedReducer, RecordError, Reduced, Reducer};
use crate::Result;

#[derive(Debug)]
/// A DHT node keeping its routing table in sync with the network and resolving
/// conflicting records.
///
/// Membership maintenance runs on its own thread from [Node::new] until
/// [Node::shutdown] or drop.
pub struct Node {
    host: Host,
    state: Arc<SharedState>,
    mode: Arc<ModeController>,
    reducer: Arc<NamespacedReducer>,
    records: Mutex<RecordStore>,
    stream_protocols: Vec<ProtocolId>,
    self_lookups: Receiver<()>,
    shutdown: Shutdown,
    handle: Option<JoinHandle<()>>,
}

impl Node {
    /// Create a node on top of `host`, seed `routing_table` with the currently
    /// connected peers and start processing membership events.
    ///
    /// Fails if the event bus refuses the subscription.
    pub fn new(
        config: Config,
        host: Host,
        routing_table: Box<dyn RoutingTable>,
        mode_handler: Box<dyn ModeHandler>,
    ) -> Result<Self> {
        let stream_protocols = config.stream_protocols();

        let reducer = Arc::new(config.reducer.unwrap_or_default());
        let records = RecordStore::new(reducer.clone(), config.max_records);

        let state = Arc::new(SharedState::new(routing_table));
        let mode = Arc::new(ModeController::new(
            config.mode.initial_mode(),
            mode_handler,
        ));

        // A pending self lookup covers any number of address changes.
        let (self_lookup, self_lookups) = flume::bounded(1);

        let shutdown = Shutdown::new();

        let context = Arc::new(MembershipContext {
            host: host.clone(),
            state: state.clone(),
            mode: mode.clone(),
            protocols: config.protocols,
            auto: config.mode.is_auto(),
            self_lookup,
            closing: shutdown.closing(),
        });

        let membership = Membership::new(context, config.event_buffer_size)?;
        let handle = membership.spawn()?;

        info!(mode = ?mode.mode(), "Dht node started");

        Ok(Node {
            host,
            state,
            mode,
            reducer,
            records: Mutex::new(records),
            stream_protocols,
            self_lookups,
            shutdown,
            handle: Some(handle),
        })
    }

    // === Getters ===

    /// Returns the current [Mode].
    pub fn mode(&self) -> Mode {
        self.mode.mode()
    }

    pub fn reducer(&self) -> &NamespacedReducer {
        &self.reducer
    }

    /// Returns a receiver that yields whenever our addresses changed and we should
    /// look ourselves up, so our closest peers learn the new addresses.
    pub fn self_lookup_requests(&self) -> Receiver<()> {
        self.self_lookups.clone()
    }

    pub fn routing_table_size(&self) -> usize {
        self.state.routing_table().size()
    }

    pub fn routing_table_contains(&self, peer: &PeerId) -> bool {
        self.state.routing_table().contains(peer)
    }

    // === Public Methods ===

    /// Send a message to `peer` over its message stream, opening it if needed.
    pub fn send_message(&self, peer: &PeerId, message: &[u8]) -> Result<()> {
        let stream = self.state.message_stream(peer);

        let mut guard = stream.lock(&self.shutdown.closing())?;

        if let Err(error) = guard.open(self.host.network.as_ref(), &self.stream_protocols) {
            drop(guard);

            debug!(?peer, ?error, "Failed to open message stream");
            self.state.forget_message_stream(peer, &stream);

            return Err(error);
        }

        guard.send(
            self.host.network.as_ref(),
            &self.stream_protocols,
            message,
        )
    }

    /// Validate a single record with the reducer of its key's namespace.
    pub fn validate(&self, key: &str, value: &[u8]) -> Result<(), RecordError> {
        self.reducer.validate(key, value)
    }

    /// Pick the authoritative record out of `candidates` fetched for `key`.
    pub fn reconcile(&self, key: &str, candidates: &[Bytes]) -> Result<Reduced, RecordError> {
        self.reducer.reduce(key, candidates)
    }

    /// Store a record locally, see [RecordStore::put].
    pub fn put_record(&self, key: &str, value: Bytes) -> Result<bool> {
        Ok(self.records().put(key, value)?)
    }

    /// Returns the locally stored record of `key`, if it is still valid.
    pub fn get_record(&self, key: &str) -> Option<Bytes> {
        self.records().get(key)
    }

    /// Stop membership maintenance and wait for it to finish. Idempotent.
    pub fn shutdown(&mut self) {
        self.shutdown.close();

        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("Membership thread panicked");
            }

            debug!("Dht node shut down");
        }
    }

    // === Private Methods ===

    fn records(&self) -> MutexGuard<'_, RecordStore> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        self.shutdown();
    }
}
