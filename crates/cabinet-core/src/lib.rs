//! Core types and trait definitions for the client cabinet backend.
//!
//! This crate is free of HTTP and database dependencies. Storage backends
//! implement the capability traits in [`store`]; the services in
//! [`directory`] and [`dashboard`] are generic over them.

// Native `async fn` in traits; the store traits spell out `Send` futures
// explicitly where it matters.
#![allow(async_fn_in_trait)]

pub mod auth;
pub mod billing;
pub mod case;
pub mod dashboard;
pub mod directory;
pub mod document;
pub mod error;
pub mod lawyer;
pub mod plan;
pub mod profile;
pub mod request;
pub mod store;

pub use error::{Error, ErrorKind, Result};
