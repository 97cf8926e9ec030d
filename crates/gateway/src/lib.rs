//! The sara gateway: HTTP API, CLI and the metered orchestration that ties
//! quota, cache and history to the remote collaborators.

pub mod api;
pub mod bootstrap;
pub mod cli;
pub mod runtime;
pub mod state;
