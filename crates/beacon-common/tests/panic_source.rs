use beacon_common::{Disposable, ErrorSignal, ErrorSource, PanicErrorSource};
use std::sync::{Arc, Mutex};

#[test]
fn panics_are_reported_to_listeners() {
    let source = PanicErrorSource::global();
    let seen: Arc<Mutex<Vec<ErrorSignal>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let sub = source.subscribe(Arc::new(move |s: &ErrorSignal| {
        sink.lock().unwrap().push(s.clone())
    }));

    let result = std::panic::catch_unwind(|| panic!("kaboom {}", 7));
    assert!(result.is_err());

    sub.dispose();
    let _ = std::panic::catch_unwind(|| panic!("after dispose"));

    let seen = seen.lock().unwrap();
    let ours: Vec<_> = seen
        .iter()
        .filter(|s| s.message.starts_with("kaboom") || s.message == "after dispose")
        .collect();
    assert_eq!(ours.len(), 1, "only the panic raised while subscribed is seen");

    let error = ours[0].error.as_ref().expect("panic signals carry an error");
    assert_eq!(error.name, "Panic");
    assert_eq!(error.message, "kaboom 7");
    assert!(error
        .stack
        .as_deref()
        .is_some_and(|s| s.contains("panic_source.rs")));
}

#[test]
fn global_is_idempotent() {
    let a = PanicErrorSource::global();
    let b = PanicErrorSource::global();
    let sub = a.subscribe(Arc::new(|_: &ErrorSignal| {}));
    assert!(b.listener_count() >= 1);
    sub.dispose();
}
