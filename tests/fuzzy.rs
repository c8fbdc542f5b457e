//! Fuzzy matcher delegation through the manager.

use parking_lot::Mutex;
use provider_worker::prelude::*;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::mpsc;

mod common;
use common::{CallLog, RecordingProvider, drain, drain_json, proxy, recording_manager, retrieve_urls};

/// Matcher that records every list it receives and echoes a custom event.
struct ListRecorder {
    lists: Arc<Mutex<Vec<Option<Vec<String>>>>>,
    callback: FuzzyCallback,
}

impl FuzzyMatcher for ListRecorder {
    fn set_fuzzy_list(&self, list: Option<Vec<String>>) {
        let total = list.as_ref().map_or(0, Vec::len);
        self.lists.lock().push(list);
        (self.callback)(FuzzyEvent::new("newList", json!({ "total": total })));
    }

    fn match_title(&self, title: &str) -> String {
        title.to_uppercase()
    }
}

#[cfg(test)]
mod fuzzy_tests {
    use super::*;

    #[test]
    fn test_fuzzy_list_updates_default_matcher() {
        let (manager, log, mut rx) = recording_manager();
        manager.handle_value(&retrieve_urls("1", "hollow knight"));

        manager.handle_value(&json!({
            "event": "fuzzyList",
            "data": { "list": ["Hollow Knight", "Celeste"] }
        }));

        assert_eq!(
            drain_json(&mut rx),
            vec![json!({
                "event": "fuzzyEvent",
                "data": { "event": "info", "data": { "message": "fuzzy list updated", "total": 2 } }
            })]
        );

        let proxy = proxy(&log, "1");
        assert_eq!(proxy.fuzzy_matcher().match_title(proxy.title()), "Hollow Knight");
    }

    #[test]
    fn test_all_proxies_share_one_matcher() {
        let (manager, log, _rx) = recording_manager();
        manager.handle_value(&retrieve_urls("1", "One"));
        manager.handle_value(&retrieve_urls("2", "Two"));

        let first = proxy(&log, "1").fuzzy_matcher();
        let second = proxy(&log, "2").fuzzy_matcher();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&first, &manager.fuzzy_matcher()));
    }

    #[test]
    fn test_custom_matcher_receives_lists_and_relays_events() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let lists = Arc::new(Mutex::new(Vec::new()));
        let matcher_lists = lists.clone();
        let log = CallLog::default();
        let factory_log = log.clone();

        let manager = ProviderManager::with_config(
            ManagerConfig::from("Custom"),
            move |proxy| RecordingProvider::new(proxy, factory_log.clone()),
            move |callback| ListRecorder {
                lists: matcher_lists,
                callback,
            },
            tx,
        );

        manager.handle_value(&json!({ "event": "fuzzyList", "data": { "list": ["A", "B", "C"] } }));
        manager.handle_value(&json!({ "event": "fuzzyList", "data": {} }));
        manager.handle_value(&json!({ "event": "fuzzyList", "data": { "list": null } }));

        assert_eq!(
            *lists.lock(),
            vec![
                Some(vec!["A".to_string(), "B".to_string(), "C".to_string()]),
                None,
                None,
            ]
        );

        let events: Vec<_> = drain(&mut rx)
            .into_iter()
            .map(|message| match message {
                OutboundMessage::FuzzyEvent(event) => event,
                other => panic!("unexpected outbound message: {:?}", other),
            })
            .collect();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], FuzzyEvent::new("newList", json!({ "total": 3 })));
        assert_eq!(events[1].data["total"], 0);

        manager.handle_value(&retrieve_urls("1", "celeste"));
        assert_eq!(proxy(&log, "1").fuzzy_matcher().match_title("celeste"), "CELESTE");
    }
}
