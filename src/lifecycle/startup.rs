//! Composition root.
//!
//! # Responsibilities
//! - Register every provider of the application graph
//! - Start the transport through a bootstrap action
//! - Block until the Shutdown token fires, then release in reverse order
//!
//! # Design Decisions
//! - Fail fast: a build error releases whatever was constructed and returns
//! - The Shutdown provider is supplied by the caller, so tests can fire it

use std::sync::Arc;

use crate::config::schema::ServiceConfig;
use crate::container::{CleanupReport, ContainerBuilder, Error, Invoke, Provide, Slot};
use crate::http::controllers::{OrderController, UserController};
use crate::http::routes::{new_route_table, Controller};
use crate::http::server::{new_server, start_server};
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::new_signal_shutdown;
use crate::observability::logging::{Logger, StdLogger};

/// The application graph, minus the Shutdown provider.
///
/// ```text
/// ServiceConfig ─┐
/// dyn Logger ────┼─▶ OrderController ─┐
///                │   UserController ──┴▶ RouteTable ─▶ HttpServer ─▶ start_server
///                └───────────────────────────────────────────┘
/// ```
pub fn container_builder(config: ServiceConfig) -> ContainerBuilder {
    ContainerBuilder::default()
        .provide(Provide::new(move || config.clone()))
        .provide(Provide::new(StdLogger::new).as_capability(|l| l as Arc<dyn Logger>))
        .provide(Provide::with_release(new_server))
        .provide(Provide::new(new_route_table))
        .provide(Provide::new(OrderController::new).as_capability(|c| c as Arc<dyn Controller>))
        .provide(Provide::new(UserController::new).as_capability(|c| c as Arc<dyn Controller>))
        .invoke(Invoke::fallible(start_server))
}

/// Run the service until a termination signal arrives.
pub async fn run(config: ServiceConfig) -> Result<CleanupReport, Error> {
    serve(container_builder(config).provide(Provide::new(new_signal_shutdown))).await
}

/// Build `builder`, wait for its `Shutdown` token, then tear down.
///
/// `builder` must provide `Shutdown`.
pub async fn serve(builder: ContainerBuilder) -> Result<CleanupReport, Error> {
    let shutdown = Slot::<Shutdown>::new();
    let mut container = match builder.resolve(&shutdown).build() {
        Ok(container) => container,
        Err(e) => {
            let (error, mut partial) = e.into_parts();
            tracing::error!(error = %error, "Startup failed");
            let report = partial.cleanup();
            if !report.is_clean() {
                tracing::warn!(
                    failures = report.failures.len(),
                    "Cleanup after failed startup was incomplete"
                );
            }
            return Err(error);
        }
    };

    tracing::info!(
        providers = container.provider_count(),
        constructed = container.constructed_count(),
        "Service started"
    );

    // A filled slot is guaranteed after a successful build.
    if let Some(token) = shutdown.get() {
        token.wait().await;
    }

    container.begin_shutdown()?;
    tracing::info!("Shutting down");
    Ok(container.cleanup())
}
