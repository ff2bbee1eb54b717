//! HTTP networking module
//!
//! Provides pooled HTTP sessions, proxy rotation and browser-like headers
//! for requests to search engines.

mod client;
mod proxy;
mod user_agent;

pub use client::{Fetcher, HttpClient, Session};
pub use proxy::ProxyRotation;
pub use user_agent::{accept_html, generate_user_agent};
