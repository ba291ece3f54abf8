//! Route table assembled from controllers.
//!
//! # Responsibilities
//! - Collect routes registered by every `Controller`
//! - Keep the order routes were registered in
//! - Hand the finished Axum router to the transport
//!
//! # Design Decisions
//! - Controllers register once, during route-table construction
//! - Immutable after construction; shared via Arc

use std::sync::Arc;

use axum::routing::MethodRouter;
use axum::Router;

/// A component that contributes routes.
pub trait Controller: Send + Sync {
    /// Register this controller's routes into `routes`.
    fn register_routes(&self, routes: &mut RouteTable);
}

/// Mutable handler table filled by controllers.
#[derive(Default)]
pub struct RouteTable {
    router: Router,
    paths: Vec<&'static str>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handler for `path`.
    ///
    /// Panics if `path` is already routed, matching Axum's own behaviour.
    pub fn handle(&mut self, path: &'static str, route: MethodRouter) -> &mut Self {
        let router = std::mem::take(&mut self.router);
        self.router = router.route(path, route);
        self.paths.push(path);
        self
    }

    /// Paths in registration order.
    pub fn paths(&self) -> &[&'static str] {
        &self.paths
    }

    /// A copy of the assembled router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

/// Route-table provider: every controller registers, in registration order.
pub fn new_route_table(controllers: Vec<Arc<dyn Controller>>) -> RouteTable {
    let mut routes = RouteTable::new();
    for controller in &controllers {
        controller.register_routes(&mut routes);
    }
    tracing::debug!(
        controllers = controllers.len(),
        routes = ?routes.paths(),
        "Route table built"
    );
    routes
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use tower::ServiceExt;

    struct Static(&'static str);

    impl Controller for Static {
        fn register_routes(&self, routes: &mut RouteTable) {
            let body = self.0;
            routes.handle(body, get(move || async move { body }));
        }
    }

    #[tokio::test]
    async fn test_controllers_register_in_order() {
        let controllers: Vec<Arc<dyn Controller>> =
            vec![Arc::new(Static("/b")), Arc::new(Static("/a"))];
        let routes = new_route_table(controllers);
        assert_eq!(routes.paths(), ["/b", "/a"]);

        let response = routes
            .router()
            .oneshot(Request::builder().uri("/a").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = routes
            .router()
            .oneshot(Request::builder().uri("/missing").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_empty_table() {
        assert!(new_route_table(Vec::new()).paths().is_empty());
    }
}
