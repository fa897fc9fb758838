//! Per-client session
//!
//! Holds everything a transport needs for one connected client: its
//! principal, its sinks and the handles of every subscription it opened.
//! Closing or dropping the session releases them all.

use std::sync::Arc;

use parking_lot::Mutex;
use shared_bus::DetachHandle;
use shared_types::{ClientCommand, ConfigWarning, Principal, SubscriptionCommand, UnsubscribeCommand};
use tracing::{debug, warn};

use crate::ports::{RecordSink, SubscriptionApi, WarnSink};

/// Subscriptions of one client.
pub struct ClientSession {
    api: Arc<dyn SubscriptionApi>,
    principal: Principal,
    on_warn: WarnSink,
    on_record: RecordSink,
    handles: Mutex<Vec<DetachHandle>>,
}

impl ClientSession {
    pub fn new(
        api: Arc<dyn SubscriptionApi>,
        principal: Principal,
        on_warn: WarnSink,
        on_record: RecordSink,
    ) -> Self {
        Self {
            api,
            principal,
            on_warn,
            on_record,
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Open a subscription for this client.
    pub fn handle_subscribe(&self, command: SubscriptionCommand) {
        let handle = self.api.subscribe(
            command,
            Arc::clone(&self.on_warn),
            Arc::clone(&self.on_record),
            self.principal.clone(),
        );
        self.handles.lock().push(handle);
    }

    /// Release subscriptions. Only "unsubscribe from everything" is
    /// supported; any other shape is reported and changes nothing.
    pub fn handle_unsubscribe(&self, command: &UnsubscribeCommand) {
        if !command.is_unsubscribe_all() {
            self.report(&ConfigWarning::UnsupportedUnsubscribe);
            return;
        }
        let released = self.release_all();
        debug!(client = %self.principal.id, released, "Unsubscribed from everything");
    }

    /// Parse and dispatch a JSON client message.
    pub fn handle_message(&self, text: &str) {
        match ClientCommand::from_json(text) {
            Ok(ClientCommand::Subscribe(command)) => self.handle_subscribe(command),
            Ok(ClientCommand::Unsubscribe(command)) => self.handle_unsubscribe(&command),
            Err(warning) => self.report(&warning),
        }
    }

    /// Number of subscriptions currently held.
    pub fn active_subscriptions(&self) -> usize {
        self.handles.lock().len()
    }

    /// Release every subscription of this client.
    pub fn close(&self) {
        self.release_all();
    }

    fn release_all(&self) -> usize {
        let handles = std::mem::take(&mut *self.handles.lock());
        let count = handles.len();
        for handle in handles {
            handle.release();
        }
        count
    }

    fn report(&self, warning: &ConfigWarning) {
        warn!(client = %self.principal.id, warning = %warning, "Client message rejected");
        (self.on_warn)(warning);
    }
}

impl Drop for ClientSession {
    fn drop(&mut self) {
        self.release_all();
    }
}
