//! Shared rate-limit cooldown as seen through provider proxies.

use serde_json::json;
use std::time::Duration;

mod common;
use common::{PROVIDER_NAME, drain, drain_json, proxy, recording_manager, retrieve_urls};

#[cfg(test)]
mod cooldown_tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_reported_once_per_cooldown() {
        let (manager, log, mut rx) = recording_manager();
        manager.handle_value(&retrieve_urls("42", "Foo"));
        let proxy = proxy(&log, "42");

        proxy.timeout(5);
        proxy.timeout(5);

        assert!(manager.is_rate_limited());
        assert!(proxy.is_rate_limited());
        assert_eq!(
            drain_json(&mut rx),
            vec![json!({ "event": "timeout", "data": { "provider": PROVIDER_NAME, "time": 5, "id": "42" } })]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_available_again_after_cooldown() {
        let (manager, log, mut rx) = recording_manager();
        manager.handle_value(&retrieve_urls("1", "One"));
        let proxy = proxy(&log, "1");

        proxy.timeout(5);
        assert_eq!(drain(&mut rx).len(), 1);

        tokio::time::sleep(Duration::from_secs(4)).await;
        proxy.timeout(5);
        assert!(drain(&mut rx).is_empty());

        tokio::time::sleep(Duration::from_millis(1_001)).await;
        assert!(!manager.is_rate_limited());

        proxy.timeout(3);
        assert_eq!(
            drain_json(&mut rx),
            vec![json!({ "event": "timeout", "data": { "provider": PROVIDER_NAME, "time": 3, "id": "1" } })]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_is_shared_between_instances() {
        let (manager, log, mut rx) = recording_manager();
        manager.handle_value(&retrieve_urls("a", "Alpha"));
        manager.handle_value(&retrieve_urls("b", "Beta"));

        proxy(&log, "a").timeout(10);
        proxy(&log, "b").timeout(10);

        let messages = drain(&mut rx);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id(), Some("a"));
        assert!(proxy(&log, "b").is_rate_limited());
    }

    #[tokio::test(start_paused = true)]
    async fn test_manager_timeout_blocks_proxy_timeout() {
        let (manager, log, mut rx) = recording_manager();
        manager.handle_value(&retrieve_urls("1", "One"));

        assert!(manager.timeout(Duration::from_millis(1_500)));
        assert!(!manager.timeout(Duration::from_millis(1_500)));

        proxy(&log, "1").timeout(1);
        assert!(drain(&mut rx).is_empty());

        tokio::time::sleep(Duration::from_millis(1_501)).await;
        assert!(!manager.is_rate_limited());
        assert!(manager.timeout(Duration::from_millis(100)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_does_not_touch_registry() {
        let (manager, log, _rx) = recording_manager();
        manager.handle_value(&retrieve_urls("1", "One"));

        proxy(&log, "1").timeout(2);
        tokio::time::sleep(Duration::from_secs(3)).await;

        assert!(manager.contains("1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_timeout_keeps_gate_consistent() {
        let (manager, log, mut rx) = recording_manager();
        manager.handle_value(&retrieve_urls("1", "One"));
        let proxy = proxy(&log, "1");

        proxy.timeout(u64::MAX);
        assert_eq!(
            drain_json(&mut rx),
            vec![json!({ "event": "timeout", "data": { "provider": PROVIDER_NAME, "time": u64::MAX, "id": "1" } })]
        );
        assert!(proxy.is_rate_limited());

        tokio::time::sleep(Duration::from_secs(60)).await;
        proxy.timeout(1);
        assert!(drain(&mut rx).is_empty());
        assert!(manager.is_rate_limited());
    }
}
