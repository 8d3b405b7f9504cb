//! Command routes.
//!
//! # Adding New Routes
//!
//! 1. Create a module with a route struct implementing `CommandRoute`
//! 2. Register it in `CommandDispatcher::register_all_routes`

pub mod close_tabs;
pub mod rename_tab;

pub use crate::route_trait::CommandRoute;
