//! In-memory collaborators for tests.

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::common::{PeerId, ProtocolId};
use crate::{Error, Result};

use flume::{Receiver, Sender};

use super::{
    Conn, Connectedness, Event, EventBus, EventKind, Mode, ModeHandler, Network, Notifee,
    Peerstore, RoutingTable, Stream, Subscription,
};

#[derive(Default)]
struct NetworkState {
    connected: HashSet<PeerId>,
    notifees: Vec<Arc<dyn Notifee>>,
    opened: HashMap<PeerId, usize>,
    reset: HashMap<PeerId, usize>,
    written: HashMap<PeerId, Vec<Vec<u8>>>,
}

#[derive(Clone, Default)]
pub(crate) struct MemoryNetwork {
    state: Arc<Mutex<NetworkState>>,
    fail_writes: Arc<AtomicBool>,
    fail_dials: Arc<AtomicBool>,
}

impl MemoryNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    fn conn(peer: PeerId) -> Conn {
        Conn::new(peer, SocketAddr::from(([127, 0, 0, 1], 4001)))
    }

    /// Mark `peer` connected, then notify.
    pub fn connect(&self, peer: PeerId) {
        let notifees = {
            let mut state = self.state.lock().unwrap();
            state.connected.insert(peer);
            state.notifees.clone()
        };

        for notifee in notifees {
            notifee.connected(&Self::conn(peer));
        }
    }

    /// Mark `peer` disconnected, then notify.
    pub fn disconnect(&self, peer: PeerId) {
        let notifees = {
            let mut state = self.state.lock().unwrap();
            state.connected.remove(&peer);
            state.notifees.clone()
        };

        for notifee in notifees {
            notifee.disconnected(&Self::conn(peer));
        }
    }

    /// Notify a disconnect without changing connectedness, as if a reconnect raced it.
    pub fn notify_disconnected(&self, peer: PeerId) {
        let notifees = self.state.lock().unwrap().notifees.clone();

        for notifee in notifees {
            notifee.disconnected(&Self::conn(peer));
        }
    }

    pub fn notifee_count(&self) -> usize {
        self.state.lock().unwrap().notifees.len()
    }

    pub fn opened_streams(&self, peer: &PeerId) -> usize {
        *self.state.lock().unwrap().opened.get(peer).unwrap_or(&0)
    }

    pub fn reset_streams(&self, peer: &PeerId) -> usize {
        *self.state.lock().unwrap().reset.get(peer).unwrap_or(&0)
    }

    pub fn written(&self, peer: &PeerId) -> Vec<Vec<u8>> {
        self.state
            .lock()
            .unwrap()
            .written
            .get(peer)
            .cloned()
            .unwrap_or_default()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_dials(&self, fail: bool) {
        self.fail_dials.store(fail, Ordering::SeqCst);
    }
}

impl Network for MemoryNetwork {
    fn connectedness(&self, peer: &PeerId) -> Connectedness {
        if self.state.lock().unwrap().connected.contains(peer) {
            Connectedness::Connected
        } else {
            Connectedness::NotConnected
        }
    }

    fn peers(&self) -> Vec<PeerId> {
        self.state.lock().unwrap().connected.iter().copied().collect()
    }

    fn notify(&self, notifee: Arc<dyn Notifee>) {
        self.state.lock().unwrap().notifees.push(notifee);
    }

    fn stop_notify(&self, notifee: &Arc<dyn Notifee>) {
        self.state
            .lock()
            .unwrap()
            .notifees
            .retain(|n| !Arc::ptr_eq(n, notifee));
    }

    fn new_stream(&self, peer: &PeerId, _protocols: &[ProtocolId]) -> Result<Box<dyn Stream>> {
        if self.fail_dials.load(Ordering::SeqCst) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "dial refused",
            )
            .into());
        }

        *self.state.lock().unwrap().opened.entry(*peer).or_default() += 1;

        Ok(Box::new(MemoryStream {
            peer: *peer,
            network: self.clone(),
        }))
    }
}

struct MemoryStream {
    peer: PeerId,
    network: MemoryNetwork,
}

impl Stream for MemoryStream {
    fn write(&mut self, message: &[u8]) -> std::io::Result<()> {
        if self.network.fail_writes.load(Ordering::SeqCst) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "stream reset by peer",
            ));
        }

        self.network
            .state
            .lock()
            .unwrap()
            .written
            .entry(self.peer)
            .or_default()
            .push(message.to_vec());

        Ok(())
    }

    fn reset(&mut self) {
        *self
            .network
            .state
            .lock()
            .unwrap()
            .reset
            .entry(self.peer)
            .or_default() += 1;
    }
}

#[derive(Clone, Default)]
pub(crate) struct MemoryPeerstore {
    protocols: Arc<Mutex<HashMap<PeerId, Vec<ProtocolId>>>>,
    failing: Arc<AtomicBool>,
}

impl MemoryPeerstore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_protocols(&self, peer: PeerId, protocols: &[&str]) {
        self.protocols
            .lock()
            .unwrap()
            .insert(peer, protocols.iter().map(|p| ProtocolId::from(*p)).collect());
    }

    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl Peerstore for MemoryPeerstore {
    fn supports_protocols(&self, peer: &PeerId, protocols: &[ProtocolId]) -> Result<Vec<ProtocolId>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Peerstore("peerstore is unavailable".to_string()));
        }

        let supported = self.protocols.lock().unwrap();

        Ok(supported
            .get(peer)
            .map(|supported| {
                protocols
                    .iter()
                    .filter(|p| supported.contains(p))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[derive(Default)]
struct TableState {
    peers: HashSet<PeerId>,
    fixes: usize,
    /// Admissions of peers the network reported as disconnected at that moment.
    stale_admissions: usize,
}

/// Routing table that records what happened to it.
///
/// When built with a network, every admission is checked against the network's
/// connectedness at that very moment.
#[derive(Clone, Default)]
pub(crate) struct MemoryRoutingTable {
    state: Arc<Mutex<TableState>>,
    network: Option<MemoryNetwork>,
}

impl MemoryRoutingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn checked_against(network: MemoryNetwork) -> Self {
        MemoryRoutingTable {
            state: Arc::default(),
            network: Some(network),
        }
    }

    pub fn has(&self, peer: &PeerId) -> bool {
        self.state.lock().unwrap().peers.contains(peer)
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap().peers.len()
    }

    pub fn fixes(&self) -> usize {
        self.state.lock().unwrap().fixes
    }

    pub fn stale_admissions(&self) -> usize {
        self.state.lock().unwrap().stale_admissions
    }
}

impl RoutingTable for MemoryRoutingTable {
    fn peer_found(&mut self, peer: PeerId, _query_peer: bool) -> bool {
        let stale = self
            .network
            .as_ref()
            .map(|network| network.connectedness(&peer) != Connectedness::Connected)
            .unwrap_or(false);

        let mut state = self.state.lock().unwrap();

        if stale {
            state.stale_admissions += 1;
        }

        state.peers.insert(peer)
    }

    fn fix_if_needed(&mut self) {
        self.state.lock().unwrap().fixes += 1;
    }

    fn remove_peer(&mut self, peer: &PeerId) {
        self.state.lock().unwrap().peers.remove(peer);
    }

    fn contains(&self, peer: &PeerId) -> bool {
        self.has(peer)
    }

    fn size(&self) -> usize {
        self.len()
    }
}

#[derive(Clone, Default)]
pub(crate) struct RecordingModeHandler {
    switches: Arc<Mutex<Vec<Mode>>>,
    fail: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
}

impl RecordingModeHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn switches(&self) -> Vec<Mode> {
        self.switches.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl ModeHandler for RecordingModeHandler {
    fn switch_mode(&self, _from: Mode, to: Mode) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::ModeSwitch {
                target: to,
                reason: "handler refused".to_string(),
            });
        }

        self.switches.lock().unwrap().push(to);

        Ok(())
    }
}

/// Event bus delivering everything pushed into it, whatever the subscription asked for.
#[derive(Clone)]
pub(crate) struct ScriptedEventBus {
    sender: Sender<Event>,
    receiver: Receiver<Event>,
}

impl ScriptedEventBus {
    pub fn new() -> Self {
        let (sender, receiver) = flume::unbounded();

        ScriptedEventBus { sender, receiver }
    }

    pub fn push(&self, event: Event) {
        let _ = self.sender.send(event);
    }
}

impl EventBus for ScriptedEventBus {
    fn subscribe(&self, kinds: &[EventKind], _buffer: usize) -> Result<Subscription> {
        Ok(Subscription::new(kinds.to_vec(), self.receiver.clone()))
    }
}
