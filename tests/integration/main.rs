mod common;

mod cli_bundle;
mod cli_config;
mod cli_connection;
mod cli_export;
mod cli_share;
