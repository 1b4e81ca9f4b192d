//! Navigation control bus.
//!
//! Fire-and-forget broadcast of [`NavCommand`]s. Every reconciler holds a
//! subscription and drains it on the owner loop; only the active one acts.

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;
use tracing::{debug, warn};

use crate::types::navigation::NavCommand;

const BUS_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub struct NavigationBus {
    sender: broadcast::Sender<NavCommand>,
}

impl NavigationBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(BUS_CAPACITY);
        Self { sender }
    }

    /// Publishes `command` to every current subscriber. Nothing is returned
    /// and nothing is queued when nobody listens.
    pub fn publish(&self, command: NavCommand) {
        match self.sender.send(command) {
            Ok(receivers) => debug!(receivers, "nav command published"),
            Err(broadcast::error::SendError(command)) => {
                debug!(?command, "nav command dropped, no subscribers")
            }
        }
    }

    pub fn subscribe(&self) -> BusSubscription {
        BusSubscription {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for NavigationBus {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct BusSubscription {
    receiver: broadcast::Receiver<NavCommand>,
}

impl BusSubscription {
    /// Takes every command published since the last drain.
    pub fn drain(&mut self) -> Vec<NavCommand> {
        let mut commands = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(command) => commands.push(command),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "nav bus subscriber lagged");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        commands
    }
}
