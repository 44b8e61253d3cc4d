//! Core types and utilities for jarvis
//!
//! This crate provides the foundational types shared by the other jarvis
//! components: the error type, configuration loading, logging setup and
//! the client-resident session store.

pub mod config;
pub mod error;
pub mod logging;
pub mod session;

pub use error::{Error, Result};
