//! Course custom pages: ordering, visibility and persistence of a course's
//! navigation tabs.
//!
//! This library crate exposes all modules for use by the RPC binary and the
//! integration tests.

pub mod app;
pub mod database;
pub mod managers;
pub mod rpc_handler;
pub mod services;
pub mod types;
