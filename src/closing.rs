//! Process wide shutdown signal.
//!
//! Nothing is ever sent over the channel, dropping the [Shutdown] sender disconnects
//! every [Closing] receiver at once, which wakes any `flume::Selector` waiting on it.

use flume::{Receiver, Sender};

#[derive(Debug)]
/// Owning side of the signal, held by the component that decides when to stop.
pub struct Shutdown {
    sender: Option<Sender<()>>,
    closing: Closing,
}

#[derive(Debug, Clone)]
/// Observing side of the signal, cloned into every thread that has to stop with the node.
pub struct Closing(Receiver<()>);

impl Shutdown {
    pub fn new() -> Self {
        let (sender, receiver) = flume::bounded(0);

        Shutdown {
            sender: Some(sender),
            closing: Closing(receiver),
        }
    }

    pub fn closing(&self) -> Closing {
        self.closing.clone()
    }

    /// Close the signal. Idempotent.
    pub fn close(&mut self) {
        self.sender.take();
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Closing {
    /// Returns `true` once [Shutdown::close] was called or the [Shutdown] was dropped.
    pub fn is_closed(&self) -> bool {
        self.0.is_disconnected()
    }

    pub(crate) fn receiver(&self) -> &Receiver<()> {
        &self.0
    }
}
