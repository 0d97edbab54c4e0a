//! Core modules: package stores, their catalog, the resolution cache and the
//! resolver, plus the shared primitives they are built on.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod naming;
pub mod resolver;
pub mod schemas;
pub mod store;
pub mod time;
pub mod workspace;
