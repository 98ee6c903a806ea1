use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::oneshot;

/// Tracks in-flight commands waiting for responses
///
/// Maps wire-level correlation ids to oneshot channels. When a response
/// arrives, the channel delivers it to the waiting `send_command` call.
pub(super) struct PendingCommands {
    // ---
    commands: HashMap<u64, oneshot::Sender<Value>>,
}

impl PendingCommands {
    // ---

    /// Create a new empty pending commands tracker
    pub fn new() -> Self {
        // ---
        Self {
            commands: HashMap::new(),
        }
    }

    /// Register a new in-flight command
    ///
    /// Returns a receiver that resolves when the response arrives.
    pub fn register(&mut self, id: u64) -> oneshot::Receiver<Value> {
        // ---
        let (tx, rx) = oneshot::channel();
        self.commands.insert(id, tx);
        rx
    }

    /// Complete an in-flight command with its response body
    ///
    /// Returns true if the id was found and the response was delivered.
    pub fn complete(&mut self, id: u64, response: Value) -> bool {
        // ---
        if let Some(tx) = self.commands.remove(&id) {
            // Send response (ignore if receiver dropped due to timeout)
            let _ = tx.send(response);
            true
        } else {
            false
        }
    }

    /// Remove an in-flight command without delivering a response
    ///
    /// Used for timeout and send-failure cleanup.
    pub fn remove(&mut self, id: u64) -> bool {
        // ---
        self.commands.remove(&id).is_some()
    }

    /// Drop every in-flight command.
    ///
    /// Their receivers observe the closed channel; used when the
    /// connection goes away.
    pub fn clear(&mut self) {
        // ---
        self.commands.clear();
    }

    /// Number of in-flight commands
    pub fn len(&self) -> usize {
        // ---
        self.commands.len()
    }
}
