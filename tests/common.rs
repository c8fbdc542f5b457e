//! Common test utilities
//!
//! Shared functionality used across all test modules.
// Common test utilities - all must be public

use parking_lot::Mutex;
use provider_worker::prelude::*;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver};

#[allow(dead_code)]
pub const PROVIDER_NAME: &str = "SteamGridDB";

/// Everything the recording providers observed, shared with the test body.
#[derive(Default)]
pub struct Calls {
    pub retrieved: Vec<String>,
    pub stopped: Vec<String>,
    pub proxies: HashMap<String, ProviderProxy>,
}

pub type CallLog = Arc<Mutex<Calls>>;

/// Provider that only records lifecycle calls; tests drive its proxy directly.
pub struct RecordingProvider {
    proxy: ProviderProxy,
    log: CallLog,
}

impl RecordingProvider {
    pub fn new(proxy: ProviderProxy, log: CallLog) -> Self {
        log.lock()
            .proxies
            .insert(proxy.id().to_string(), proxy.clone());
        Self { proxy, log }
    }
}

impl Provider for RecordingProvider {
    fn retrieve_urls(&mut self) {
        self.log.lock().retrieved.push(self.proxy.id().to_string());
    }

    fn stop_url_download(&mut self) {
        self.log.lock().stopped.push(self.proxy.id().to_string());
    }
}

/// Returns the most recent proxy built for `id`.
#[allow(dead_code)]
pub fn proxy(log: &CallLog, id: &str) -> ProviderProxy {
    log.lock()
        .proxies
        .get(id)
        .cloned()
        .unwrap_or_else(|| panic!("no proxy recorded for id {}", id))
}

/// Builds a manager backed by [`RecordingProvider`].
#[allow(dead_code)]
pub fn recording_manager() -> (ProviderManager, CallLog, UnboundedReceiver<OutboundMessage>) {
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let log = CallLog::default();
    let factory_log = log.clone();
    let manager = ProviderManager::new(
        PROVIDER_NAME,
        move |proxy| RecordingProvider::new(proxy, factory_log.clone()),
        outbound_tx,
    );
    (manager, log, outbound_rx)
}

/// Inbound `retrieveUrls` envelope for `id` and `title`.
#[allow(dead_code)]
pub fn retrieve_urls(id: &str, title: &str) -> Value {
    json!({
        "event": "retrieveUrls",
        "data": {
            "id": id,
            "title": title,
            "path": format!("/games/{}", id),
            "imageType": "poster",
            "imageProviderAPIs": {}
        }
    })
}

/// Request parameters for `id` and `title`.
#[allow(dead_code)]
pub fn request(id: &str, title: &str) -> RetrieveRequest {
    RetrieveRequest {
        id: id.to_string(),
        title: title.to_string(),
        path: format!("/games/{}", id),
        image_type: "poster".to_string(),
        image_provider_apis: ImageProviderApis::default(),
    }
}

/// Collects every outbound message currently queued.
#[allow(dead_code)]
pub fn drain(rx: &mut UnboundedReceiver<OutboundMessage>) -> Vec<OutboundMessage> {
    let mut messages = Vec::new();
    while let Ok(message) = rx.try_recv() {
        messages.push(message);
    }
    messages
}

/// Collects every queued outbound message as its JSON envelope.
#[allow(dead_code)]
pub fn drain_json(rx: &mut UnboundedReceiver<OutboundMessage>) -> Vec<Value> {
    drain(rx)
        .iter()
        .map(|message| message.to_json().unwrap())
        .collect()
}
