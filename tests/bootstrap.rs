//! End-to-end bootstrap: the real application graph served over HTTP.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use common::{client, test_config, url, wait_for_slot};
use di_bootstrap::container::{Container, Error, Invoke, Provide, Slot};
use di_bootstrap::http::{
    new_route_table, Controller, HttpServer, OrderController, RouteTable, UserController,
};
use di_bootstrap::observability::logging::{Logger, StdLogger};
use di_bootstrap::lifecycle::startup::{container_builder, serve};
use di_bootstrap::lifecycle::Shutdown;

#[tokio::test]
async fn test_serves_routes_until_shutdown() {
    let shutdown = Shutdown::new();
    let token = shutdown.clone();
    let server = Slot::<HttpServer>::new();
    let routes = Slot::<RouteTable>::new();

    let builder = container_builder(test_config())
        .provide(Provide::new(move || token.clone()))
        .resolve(&server)
        .resolve(&routes);
    let handle = tokio::spawn(serve(builder));

    let server = wait_for_slot(&server).await;
    let addr = server.local_addr().expect("server should be bound");
    assert_eq!(wait_for_slot(&routes).await.paths(), ["/orders", "/users"]);

    let client = client();
    let orders = client.get(url(addr, "/orders")).send().await.unwrap();
    assert_eq!(orders.status(), 200);
    assert_eq!(orders.text().await.unwrap(), "Orders");

    let users = client.get(url(addr, "/users")).send().await.unwrap();
    assert_eq!(users.status(), 200);
    assert_eq!(users.text().await.unwrap(), "Users");

    let missing = client.get(url(addr, "/missing")).send().await.unwrap();
    assert_eq!(missing.status(), 404);

    shutdown.trigger();
    let report = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("serve should return after shutdown")
        .unwrap()
        .unwrap();

    assert_eq!(report.released, 1);
    assert!(report.is_clean());
    assert!(!server.is_running());

    // Listener is gone once the graceful shutdown completes.
    tokio::time::sleep(Duration::from_millis(100)).await;
    let fresh = reqwest::Client::new();
    assert!(fresh.get(url(addr, "/orders")).send().await.is_err());
}

#[tokio::test]
async fn test_bind_failure_aborts_startup() {
    let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let mut config = test_config();
    config.listener.bind_address = taken.local_addr().unwrap().to_string();

    let shutdown = Shutdown::new();
    let builder = container_builder(config).provide(Provide::new(move || shutdown.clone()));

    match serve(builder).await {
        Err(Error::InvokeFailed { action, source }) => {
            assert_eq!(action, "start_server");
            assert!(source.to_string().contains("failed to bind"));
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("startup should fail"),
    }
}

#[tokio::test]
async fn test_missing_shutdown_provider_is_unresolved() {
    match serve(container_builder(test_config())).await {
        Err(Error::UnresolvedType { key, .. }) => assert_eq!(key, "Shutdown"),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("startup should fail"),
    }
}

#[tokio::test]
async fn test_route_table_collects_every_controller() {
    let routes = Slot::<RouteTable>::new();
    let shutdown = Shutdown::new();
    let token = shutdown.clone();

    let builder = container_builder(test_config())
        .provide(Provide::new(move || token.clone()))
        .resolve(&routes);
    let handle = tokio::spawn(serve(builder));

    let routes: Arc<RouteTable> = wait_for_slot(&routes).await;
    assert_eq!(routes.paths().len(), 2);

    shutdown.trigger();
    let report = handle.await.unwrap().unwrap();
    assert_eq!(report.released, 1);
}

/// Second consumer of the controller collection, next to the route table.
struct ControllerAudit(usize);

#[test]
fn test_controllers_constructed_once_across_consumers() {
    let orders = Arc::new(AtomicUsize::new(0));
    let users = Arc::new(AtomicUsize::new(0));
    let invoked = Arc::new(AtomicUsize::new(0));
    let (order_count, user_count, invoke_count) = (orders.clone(), users.clone(), invoked.clone());
    let routes = Slot::<RouteTable>::new();

    let mut container = Container::builder()
        .provide(Provide::new(StdLogger::new).as_capability(|l| l as Arc<dyn Logger>))
        .provide(Provide::new(new_route_table))
        .provide(Provide::new(|controllers: Vec<Arc<dyn Controller>>| {
            ControllerAudit(controllers.len())
        }))
        .provide(
            Provide::new(move |logger: Arc<dyn Logger>| {
                order_count.fetch_add(1, Ordering::SeqCst);
                OrderController::new(logger)
            })
            .as_capability(|c| c as Arc<dyn Controller>),
        )
        .provide(
            Provide::new(move |logger: Arc<dyn Logger>| {
                user_count.fetch_add(1, Ordering::SeqCst);
                UserController::new(logger)
            })
            .as_capability(|c| c as Arc<dyn Controller>),
        )
        .invoke(Invoke::new(
            move |routes: Arc<RouteTable>, audit: Arc<ControllerAudit>| {
                assert_eq!(routes.paths().len(), audit.0);
                invoke_count.fetch_add(1, Ordering::SeqCst);
            },
        ))
        .resolve(&routes)
        .build()
        .unwrap();

    assert_eq!(orders.load(Ordering::SeqCst), 1);
    assert_eq!(users.load(Ordering::SeqCst), 1);
    assert_eq!(invoked.load(Ordering::SeqCst), 1);
    assert_eq!(routes.get().unwrap().paths(), ["/orders", "/users"]);

    assert_eq!(container.resolve_all::<dyn Controller>().unwrap().len(), 2);
    assert_eq!(orders.load(Ordering::SeqCst), 1);
    assert_eq!(users.load(Ordering::SeqCst), 1);
    assert!(container.cleanup().is_clean());
}
