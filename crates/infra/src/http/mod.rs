//! HTTP transport shared by network-backed adapters

mod client;

pub use client::{HttpClient, HttpClientBuilder};
