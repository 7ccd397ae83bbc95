//! Configuration schema and file discovery for the parley server.

pub mod loader;
pub mod schema;

pub use {
    loader::{discover_and_load, load_config, set_config_dir},
    schema::ParleyConfig,
};
