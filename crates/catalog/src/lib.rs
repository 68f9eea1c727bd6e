//! HTTP adapter for the external product catalog API.

pub mod http;

pub use http::HttpCatalogClient;
