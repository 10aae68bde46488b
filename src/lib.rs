pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod genbank;
pub mod ncbi;
pub mod output;
pub mod plot;
pub mod prompt;
pub mod report;
pub mod store;
