// Nova editor control API client

mod client;

pub use client::{NovaClient, RemoteResponse, DEFAULT_TIMEOUT, IMPORT_TIMEOUT};
