pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod console;
pub mod dashboard;
pub mod endpoints;
pub mod error;
pub mod fetcher;
pub mod gateway;
pub mod logging;
pub mod output;
pub mod paginator;
pub mod query;
pub mod record;
pub mod store;
pub mod transport;
pub mod view;

#[cfg(test)]
mod tests;
