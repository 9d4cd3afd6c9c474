use std::sync::{Arc, Mutex};

use beacon_telemetry::{
    Disposable, EventKind, EventOptions, PanicErrorSource, Subscription, TelemetryClient,
    TelemetryConfig, TelemetryEvent, TracingSink,
};
use serde_json::json;

fn collector(client: &TelemetryClient) -> (Arc<Mutex<Vec<TelemetryEvent>>>, Subscription) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let sub = client.on_did_track_event(move |e| sink.lock().unwrap().push(e.clone()));
    (seen, sub)
}

#[test]
fn sibling_modules_report_through_a_shared_root() {
    let root = TelemetryClient::new(TelemetryConfig::with_scope("app"));
    let cart = TelemetryClient::new(TelemetryConfig::with_scope("cart"));
    let search = TelemetryClient::new(TelemetryConfig::default());
    search.set_scope("search");

    let (seen, _sub) = collector(&root);
    let _log = root.on_did_track_event(TracingSink::listener());
    let _cart_link = root.mount(&cart);
    let search_link = root.mount(&search);

    cart.track_metric("items", 3);
    search.track_event(EventOptions::new("query").with_scope(["box", "suggest"]));
    search_link.dispose();
    search.track_trace("not forwarded");
    root.track_trace("root only");

    let seen = seen.lock().unwrap();
    let summary: Vec<(String, Vec<String>)> =
        seen.iter().map(|e| (e.name.clone(), e.scope.clone())).collect();
    assert_eq!(
        summary,
        vec![
            ("Metric".to_string(), vec!["app".to_string(), "cart".to_string()]),
            (
                "query".to_string(),
                vec!["app", "search", "box", "suggest"].into_iter().map(String::from).collect()
            ),
            ("Trace".to_string(), vec!["app".to_string()]),
        ]
    );
    assert_eq!(seen[0].property("value"), Some(&json!(3)));
}

#[test]
fn panics_are_collected_as_exceptions() {
    let client = TelemetryClient::new(TelemetryConfig::with_scope("worker"));
    let (seen, _sub) = collector(&client);
    client.collect_exceptions(&PanicErrorSource::global());

    let _ = std::panic::catch_unwind(|| panic!("queue corrupted"));
    client.dispose();
    let _ = std::panic::catch_unwind(|| panic!("queue corrupted again"));

    let seen = seen.lock().unwrap();
    let ours: Vec<_> = seen
        .iter()
        .filter(|e| {
            e.property("message")
                .and_then(|m| m.as_str())
                .is_some_and(|m| m.starts_with("queue corrupted"))
        })
        .collect();
    assert_eq!(ours.len(), 1);
    assert_eq!(ours[0].kind(), Some(EventKind::Exception));
    assert_eq!(ours[0].property("name"), Some(&json!("Panic")));
    assert_eq!(ours[0].scope, ["worker"]);
}
