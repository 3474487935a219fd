//! authfetch-http - Bearer-token HTTP client with transparent refresh.
//!
//! Every request sent through [`ApiClient`] is stamped with the configured
//! `Content-Type` and the stored access token. A 401 triggers one refresh
//! exchange and a single replay of the original request; 400 and 500 are
//! answered locally with a [`Notice`](authfetch_core::Notice).

mod classify;
mod client;
mod refresh;
mod request;

pub use classify::{Classification, classify};
pub use client::{ApiClient, ApiClientBuilder, Outcome};
pub use request::{ApiRequest, ApiResponse};
pub use reqwest::Method;
