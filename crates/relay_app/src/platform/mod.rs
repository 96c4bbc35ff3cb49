pub mod app;
pub mod cli;
mod commands;
mod config;
mod logging;
