//! Dependency-injected service bootstrap library

pub mod config;
pub mod container;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::schema::ServiceConfig;
pub use container::{Container, ContainerBuilder, Error, Invoke, Provide};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
