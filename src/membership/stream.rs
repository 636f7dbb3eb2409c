//! Per peer message streams.
//!
//! The lock of a [MessageStream] is a single slot channel holding the stream state:
//! locking takes the state out, dropping the guard puts it back. This lets lock
//! acquisition race the node's [Closing] signal.

use std::ops::{Deref, DerefMut};

use flume::{Receiver, Selector, Sender};
use tracing::debug;

use crate::closing::Closing;
use crate::common::{PeerId, ProtocolId};
use crate::{Error, Result};

use super::Network;

/// State behind the lock of a [MessageStream].
pub struct StreamState {
    peer: PeerId,
    stream: Option<Box<dyn super::Stream>>,
    invalid: bool,
}

/// The one logical message stream to a peer, opened lazily on first use.
pub struct MessageStream {
    peer: PeerId,
    slot: Sender<StreamState>,
    state: Receiver<StreamState>,
}

/// Exclusive access to a [MessageStream].
pub struct StreamGuard<'a> {
    slot: &'a Sender<StreamState>,
    state: Option<StreamState>,
}

impl MessageStream {
    pub fn new(peer: PeerId) -> Self {
        let (slot, state) = flume::bounded(1);

        // The channel is empty and we hold both ends.
        let _ = slot.send(StreamState {
            peer,
            stream: None,
            invalid: false,
        });

        MessageStream { peer, slot, state }
    }

    pub fn peer(&self) -> &PeerId {
        &self.peer
    }

    /// Wait for exclusive access, giving up with [Error::Closing] once `closing` is closed.
    pub fn lock(&self, closing: &Closing) -> Result<StreamGuard<'_>> {
        if closing.is_closed() {
            return Err(Error::Closing);
        }

        let state = Selector::new()
            .recv(&self.state, |state| state.ok())
            .recv(closing.receiver(), |_| None)
            .wait();

        match state {
            Some(state) => Ok(StreamGuard {
                slot: &self.slot,
                state: Some(state),
            }),
            None => Err(Error::Closing),
        }
    }

    /// Returns `true` if nobody holds the lock right now.
    pub fn is_unlocked(&self) -> bool {
        !self.state.is_empty()
    }
}

impl StreamState {
    /// Returns the open stream, opening it first if needed.
    fn prep(&mut self, network: &dyn Network, protocols: &[ProtocolId]) -> Result<&mut Box<dyn super::Stream>> {
        if self.invalid {
            return Err(Error::StreamInvalidated(self.peer));
        }

        if self.stream.is_none() {
            let stream = network.new_stream(&self.peer, protocols)?;
            self.stream = Some(stream);
        }

        match self.stream.as_mut() {
            Some(stream) => Ok(stream),
            None => Err(Error::StreamInvalidated(self.peer)),
        }
    }

    /// Open the stream if it is not open yet.
    pub fn open(&mut self, network: &dyn Network, protocols: &[ProtocolId]) -> Result<()> {
        self.prep(network, protocols).map(|_| ())
    }

    /// Send a message, resetting the stream if the write fails so the next send reopens it.
    pub fn send(&mut self, network: &dyn Network, protocols: &[ProtocolId], message: &[u8]) -> Result<()> {
        let stream = self.prep(network, protocols)?;

        if let Err(error) = stream.write(message) {
            debug!(peer = ?self.peer, ?error, "Message stream write failed, resetting");

            if let Some(mut stream) = self.stream.take() {
                stream.reset();
            }

            return Err(error.into());
        }

        Ok(())
    }

    /// Tear down the stream. It can never be used again.
    pub fn invalidate(&mut self) {
        self.invalid = true;

        if let Some(mut stream) = self.stream.take() {
            stream.reset();
        }
    }

    pub fn is_invalid(&self) -> bool {
        self.invalid
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }
}

impl Deref for StreamGuard<'_> {
    type Target = StreamState;

    fn deref(&self) -> &Self::Target {
        match self.state.as_ref() {
            Some(state) => state,
            None => unreachable!("state is only taken on drop"),
        }
    }
}

impl DerefMut for StreamGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match self.state.as_mut() {
            Some(state) => state,
            None => unreachable!("state is only taken on drop"),
        }
    }
}

impl Drop for StreamGuard<'_> {
    fn drop(&mut self) {
        if let Some(state) = self.state.take() {
            let _ = self.slot.send(state);
        }
    }
}

impl std::fmt::Debug for MessageStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageStream")
            .field("peer", &self.peer)
            .field("unlocked", &self.is_unlocked())
            .finish()
    }
}
