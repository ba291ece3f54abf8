//! HTTP surface: transport, route table and leaf controllers.
//!
//! # Data Flow
//! ```text
//! controllers.rs (OrderController, UserController)
//!     → routes.rs (every Controller registers into one RouteTable)
//!     → server.rs (HttpServer serves the table; ServerRelease closes it)
//! ```

pub mod controllers;
pub mod routes;
pub mod server;

pub use controllers::{OrderController, UserController};
pub use routes::{new_route_table, Controller, RouteTable};
pub use server::{new_server, start_server, HttpServer, ServerError, ServerRelease};
