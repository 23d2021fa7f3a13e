pub mod cli;
pub mod server_config;

pub use server_config::Config;
