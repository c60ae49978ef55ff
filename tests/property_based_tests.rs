mod common;

use std::any::TypeId;

use arbiter_core::registry::{handler_entry, RequestHandlerBase};
use arbiter_core::{MediatorConfig, MediatorRegistry, Request, ServiceCollection};
use common::strategies::*;
use common::*;
use proptest::prelude::*;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const LABELS: [&str; 12] = [
    "B0", "B1", "B2", "B3", "B4", "B5", "B6", "B7", "B8", "B9", "B10", "B11",
];

struct Key<const N: u8>;

impl<const N: u8> Request for Key<N> {
    type Response = ();
}

fn entry_for(key: u8) -> (TypeId, Arc<dyn RequestHandlerBase>) {
    match key {
        0 => handler_entry::<Key<0>>(),
        1 => handler_entry::<Key<1>>(),
        2 => handler_entry::<Key<2>>(),
        _ => handler_entry::<Key<3>>(),
    }
}

proptest! {
    /// Property: N behaviors produce N nested before/after pairs around one handler call
    #[test]
    fn behaviors_nest_in_registration_order(count in behavior_count_strategy(), message in message_strategy()) {
        let log = EventLog::new();
        let labels = &LABELS[..count];

        let mut services = ServiceCollection::new();
        for label in labels {
            services.add_pipeline_behavior::<Ping, _>(NamedBehavior { label: *label, log: log.clone() });
        }
        services.add_request_handler::<Ping, _>(PingHandler { log: log.clone() });
        let mediator = build_mediator(services, MediatorConfig::default());

        let pong = tokio_test::block_on(
            mediator.send(Ping::new(message.clone()), CancellationToken::new()),
        )
        .unwrap();
        prop_assert_eq!(pong.message, format!("{message} Pong"));

        let mut expected: Vec<String> = labels.iter().map(|l| format!("{l} before")).collect();
        expected.push("handler".to_string());
        expected.extend(labels.iter().rev().map(|l| format!("{l} after")));
        prop_assert_eq!(log.entries(), expected);
    }

    /// Property: for any registration sequence, each key resolves to its first registration
    #[test]
    fn first_registration_wins_for_any_sequence(sequence in registration_sequence_strategy()) {
        let registry = MediatorRegistry::new();
        let mut first_seen: Vec<(TypeId, Arc<dyn RequestHandlerBase>)> = Vec::new();

        for key in &sequence {
            let entry = entry_for(*key);
            if !first_seen.iter().any(|(id, _)| *id == entry.0) {
                first_seen.push(entry.clone());
            }
            registry.register([entry]);
        }

        prop_assert_eq!(registry.count(), first_seen.len());
        let frozen = registry.get_frozen_cache();
        for (id, handler) in &first_seen {
            let resolved = frozen.get(id).expect("registered key resolves");
            prop_assert!(std::ptr::eq(
                Arc::as_ptr(resolved).cast::<()>(),
                Arc::as_ptr(handler).cast::<()>()
            ));
        }
    }
}
