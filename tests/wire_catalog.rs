//! JSON dispatch by request type name.

mod common;

use std::sync::Arc;

use arbiter_core::{MediatorConfig, MediatorError, RequestCatalog, ServiceCollection};
use common::*;
use serde_json::json;
use tokio_util::sync::CancellationToken;

fn setup() -> (arbiter_core::Mediator, RequestCatalog, EventLog) {
    let log = EventLog::new();
    let mut services = ServiceCollection::new();
    services
        .add_pipeline_behavior::<Ping, _>(NamedBehavior {
            label: "Outer",
            log: log.clone(),
        })
        .add_request_handler::<Ping, _>(PingHandler { log: log.clone() });

    let catalog = RequestCatalog::new();
    catalog.register::<Ping>("ping");

    (
        build_mediator(services, MediatorConfig::default()),
        catalog,
        log,
    )
}

#[tokio::test]
async fn payload_is_dispatched_through_the_full_pipeline() {
    let (mediator, catalog, log) = setup();

    let response = catalog
        .dispatch(
            &mediator,
            "ping",
            json!({"message": "hi"}),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(response, json!({"message": "hi Pong"}));
    assert_eq!(log.entries(), vec!["Outer before", "handler", "Outer after"]);
}

#[tokio::test]
async fn unknown_type_name_is_rejected_without_dispatch() {
    let (mediator, catalog, log) = setup();

    let error = catalog
        .dispatch(
            &mediator,
            "pong",
            json!({"message": "hi"}),
            CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(error, MediatorError::UnknownRequestType { .. }));
    assert!(log.entries().is_empty());
}

#[tokio::test]
async fn undecodable_payload_is_a_serialization_error() {
    let (mediator, catalog, log) = setup();

    let error = catalog
        .dispatch(&mediator, "ping", json!({"msg": 1}), CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(error, MediatorError::Serialization(_)));
    assert!(log.entries().is_empty());
}

#[tokio::test]
async fn registered_name_without_handler_reports_missing_service() {
    let catalog = RequestCatalog::new();
    catalog.register::<Ping>("ping");
    let mediator = build_mediator(ServiceCollection::new(), MediatorConfig::default());

    let error = catalog
        .dispatch(
            &mediator,
            "ping",
            json!({"message": "hi"}),
            CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(error, MediatorError::ServiceNotFound { .. }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_dispatch_shares_one_catalog() {
    let (mediator, catalog, log) = setup();
    let catalog = Arc::new(catalog);

    let tasks: Vec<_> = (0..32)
        .map(|i| {
            let catalog = Arc::clone(&catalog);
            let mediator = mediator.clone();
            tokio::spawn(async move {
                catalog
                    .dispatch(
                        &mediator,
                        "ping",
                        json!({ "message": format!("m{i}") }),
                        CancellationToken::new(),
                    )
                    .await
            })
        })
        .collect();

    for (i, task) in tasks.into_iter().enumerate() {
        let response = task.await.unwrap().unwrap();
        assert_eq!(response, json!({ "message": format!("m{i} Pong") }));
    }

    assert_eq!(log.len(), 32 * 3);
    assert_eq!(catalog.type_names(), vec!["ping".to_string()]);
}
