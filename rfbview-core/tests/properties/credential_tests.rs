//! Property tests for the credential rendezvous

use proptest::prelude::*;
use rfbview_core::{CredentialBroker, UserCredential};
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

fn arb_credential() -> impl Strategy<Value = (String, String)> {
    ("[a-z]{1,12}", "[ -~]{1,24}")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// The waiting thread receives exactly the credential the UI provided
    #[test]
    fn obtain_returns_provided_credential(
        (username, password) in arb_credential(),
        username_required in any::<bool>(),
    ) {
        let broker = Arc::new(CredentialBroker::new());
        let (notified_tx, notified_rx) = mpsc::channel();

        let waiter = {
            let broker = Arc::clone(&broker);
            thread::spawn(move || {
                broker.obtain(username_required, |required| {
                    let _ = notified_tx.send(required);
                })
            })
        };

        let required = notified_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("No credential request");
        prop_assert_eq!(required, username_required);
        prop_assert!(broker.provide(UserCredential::new(username.clone(), password.clone())));

        let received = waiter.join().expect("Waiter panicked");
        prop_assert_eq!(received, UserCredential::new(username, password));
    }

    /// A value left over from an abandoned request never answers a new one
    #[test]
    fn stale_credential_discarded((username, password) in arb_credential()) {
        let broker = Arc::new(CredentialBroker::new());
        prop_assert!(broker.provide(UserCredential::new("stale", "value")));

        let (notified_tx, notified_rx) = mpsc::channel();
        let waiter = {
            let broker = Arc::clone(&broker);
            thread::spawn(move || {
                broker.obtain(true, |_| {
                    let _ = notified_tx.send(());
                })
            })
        };

        notified_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("No credential request");
        prop_assert!(broker.provide(UserCredential::new(username.clone(), password.clone())));

        let received = waiter.join().expect("Waiter panicked");
        prop_assert_eq!(received, UserCredential::new(username, password));
    }
}

#[test]
fn shutdown_unblocks_waiter() {
    let broker = Arc::new(CredentialBroker::new());
    let (notified_tx, notified_rx) = mpsc::channel();

    let waiter = {
        let broker = Arc::clone(&broker);
        thread::spawn(move || {
            broker.obtain(false, |_| {
                let _ = notified_tx.send(());
            })
        })
    };

    notified_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("No credential request");
    broker.shutdown();

    let received = waiter.join().expect("Waiter panicked");
    assert!(received.is_empty());
    assert!(broker.obtain(false, |_| panic!("closed broker must not prompt")).is_empty());
}
