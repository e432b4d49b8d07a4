//! Core domain + application logic for the link bot.
//!
//! This crate is intentionally framework-agnostic. The Telegram Bot API lives
//! behind the [`ports::TransportClient`] port, implemented in `lbot-telegram`.

pub mod commands;
pub mod config;
pub mod consumer;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod messages;
pub mod ports;
pub mod processor;
pub mod storage;

pub use errors::{Error, Result};
