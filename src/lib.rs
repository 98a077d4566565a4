//! tg-digest - daily Telegram conversation digest delivered by email.
//!
//! This crate provides the core functionality for the digest generator:
//! message collection and aggregation, read-state handling, and email
//! delivery with transport fallback.

pub mod config;
pub mod domain;
pub mod providers;
pub mod services;
