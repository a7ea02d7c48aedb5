//! Service plumbing shared by every route: errors, state, configuration,
//! database access, authorization and startup.

pub mod app_error;
pub mod app_state;
pub mod bootstrap;
pub mod config;
pub mod db;
pub mod middleware;
pub mod swagger;
