use crate::common::{ProtocolId, DEFAULT_PROTOCOL};
use crate::membership::{ModeOption, DEFAULT_EVENT_BUFFER};
use crate::record::MAX_RECORDS;
use crate::reducer::NamespacedReducer;

#[derive(Debug)]
/// Node configurations
pub struct Config {
    /// How the node chooses between client and server mode.
    ///
    /// Defaults to [ModeOption::Auto], starting as a client and following
    /// local reachability changes.
    pub mode: ModeOption,
    /// Protocols a peer has to support (at least one of) to enter the routing table,
    /// in order of preference when opening message streams.
    ///
    /// Defaults to [DEFAULT_PROTOCOL]
    pub protocols: Vec<ProtocolId>,
    /// Protocols we also speak, which do not qualify a peer for the routing table.
    ///
    /// Defaults to empty.
    pub secondary_protocols: Vec<ProtocolId>,
    /// Number of lifecycle events buffered before the event bus blocks on us.
    ///
    /// Defaults to [DEFAULT_EVENT_BUFFER]
    pub event_buffer_size: usize,
    /// Capacity of the local record store.
    ///
    /// Defaults to [MAX_RECORDS], which is also used when set to `0`.
    pub max_records: usize,
    /// Record validation and selection per namespace.
    ///
    /// Defaults to None, where [NamespacedReducer::default] is used,
    /// handling `pk` and `ipns` records.
    pub reducer: Option<NamespacedReducer>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: ModeOption::default(),
            protocols: vec![ProtocolId::from(DEFAULT_PROTOCOL)],
            secondary_protocols: Vec::new(),
            event_buffer_size: DEFAULT_EVENT_BUFFER,
            max_records: MAX_RECORDS,
            reducer: None,
        }
    }
}

impl Config {
    /// Primary then secondary protocols, the ones message streams may speak.
    pub fn stream_protocols(&self) -> Vec<ProtocolId> {
        self.protocols
            .iter()
            .chain(self.secondary_protocols.iter())
            .cloned()
            .collect()
    }
}
