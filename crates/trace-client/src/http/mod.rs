mod client;

pub use client::{HttpBackend, HttpBackendBuilder};
