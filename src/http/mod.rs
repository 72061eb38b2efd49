//! HTTP adapters: handlers and middleware

pub mod auth;
pub mod chat;
pub mod rate_limit;
