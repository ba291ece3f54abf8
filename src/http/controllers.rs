//! Leaf controllers serving the demo routes.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::routing::get;

use crate::http::routes::{Controller, RouteTable};
use crate::logf;
use crate::observability::logging::Logger;
use crate::observability::metrics;

/// HTTP controller for orders.
pub struct OrderController {
    logger: Arc<dyn Logger>,
}

impl OrderController {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self { logger }
    }
}

impl Controller for OrderController {
    fn register_routes(&self, routes: &mut RouteTable) {
        let logger = self.logger.clone();
        routes.handle(
            "/orders",
            get(move || {
                let logger = logger.clone();
                async move {
                    metrics::record_request("/orders");
                    logf!(logger, "retrieving orders");
                    (StatusCode::OK, "Orders")
                }
            }),
        );
    }
}

/// HTTP controller for users.
pub struct UserController {
    logger: Arc<dyn Logger>,
}

impl UserController {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self { logger }
    }
}

impl Controller for UserController {
    fn register_routes(&self, routes: &mut RouteTable) {
        let logger = self.logger.clone();
        routes.handle(
            "/users",
            get(move || {
                let logger = logger.clone();
                async move {
                    metrics::record_request("/users");
                    logf!(logger, "retrieving users");
                    (StatusCode::OK, "Users")
                }
            }),
        );
    }
}
