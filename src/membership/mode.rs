//! Client/server mode of the node.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Mutex, PoisonError};

use tracing::{debug, info};

use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Whether the node answers DHT queries.
pub enum Mode {
    /// Only issues queries.
    Client,
    /// Serves queries from other peers.
    Server,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// How the [Mode] is chosen.
pub enum ModeOption {
    /// Follow local reachability, starting as a [Mode::Client].
    #[default]
    Auto,
    /// Pinned to [Mode::Client].
    Client,
    /// Pinned to [Mode::Server].
    Server,
}

impl ModeOption {
    pub fn initial_mode(&self) -> Mode {
        match self {
            ModeOption::Auto | ModeOption::Client => Mode::Client,
            ModeOption::Server => Mode::Server,
        }
    }

    pub fn is_auto(&self) -> bool {
        matches!(self, ModeOption::Auto)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Local reachability as observed by the network layer.
pub enum Reachability {
    Unknown,
    Public,
    Private,
}

impl Reachability {
    /// The mode a node with this reachability should run in.
    pub fn target_mode(&self) -> Mode {
        match self {
            Reachability::Private | Reachability::Unknown => Mode::Client,
            Reachability::Public => Mode::Server,
        }
    }
}

/// Performs the actual switch, e.g. registering or removing the DHT protocol handlers.
pub trait ModeHandler: Send + Sync {
    fn switch_mode(&self, from: Mode, to: Mode) -> Result<()>;
}

const CLIENT: u8 = 0;
const SERVER: u8 = 1;

impl Mode {
    fn to_u8(self) -> u8 {
        match self {
            Mode::Client => CLIENT,
            Mode::Server => SERVER,
        }
    }

    fn from_u8(value: u8) -> Mode {
        if value == SERVER {
            Mode::Server
        } else {
            Mode::Client
        }
    }
}

/// Owns the current [Mode] and serializes transitions between modes.
pub struct ModeController {
    mode: AtomicU8,
    transition: Mutex<()>,
    handler: Box<dyn ModeHandler>,
}

impl ModeController {
    pub fn new(initial: Mode, handler: Box<dyn ModeHandler>) -> Self {
        ModeController {
            mode: AtomicU8::new(initial.to_u8()),
            transition: Mutex::new(()),
            handler,
        }
    }

    pub fn mode(&self) -> Mode {
        Mode::from_u8(self.mode.load(Ordering::Acquire))
    }

    /// Switch to `target`. On failure the previous mode is kept.
    pub fn set_mode(&self, target: Mode) -> Result<()> {
        let _transition = self
            .transition
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let current = self.mode();

        if current == target {
            debug!(?target, "Already in the requested dht mode");
            return Ok(());
        }

        self.handler.switch_mode(current, target)?;
        self.mode.store(target.to_u8(), Ordering::Release);

        info!(from = ?current, to = ?target, "Switched dht mode");

        Ok(())
    }
}

impl std::fmt::Debug for ModeController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModeController")
            .field("mode", &self.mode())
            .finish()
    }
}
