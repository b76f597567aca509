pub mod aggregate;
pub mod cli;
pub mod error;
pub mod export;
pub mod filter;
pub mod fmt;
pub mod insights;
pub mod loader;
pub mod models;
#[cfg(feature = "pdf")]
pub mod pdf;
pub mod pipeline;
pub mod settings;
pub mod sort;
pub mod store;
