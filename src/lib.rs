#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub(crate) mod api;
pub mod analyzer;
pub mod app;
pub mod clients;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod ingest;
pub mod model;
pub mod observability;
pub mod parser;
pub mod preprocess;
pub mod prompts;
pub mod session;
pub mod trends;
