//! # deppin-config
//!
//! Option decoding for the deppin analyzer: the recognized option table,
//! strategy selection, build-constraint world expansion and the module
//! record handed over by an outer CLI.

pub mod discovery;
pub mod error;
pub mod module;
pub mod options;
pub mod strategy;
pub mod world;

pub use discovery::{CONFIG_FILE, ConfigDiscovery, ENV_PREFIX};
pub use error::{ConfigError, Result};
pub use module::Module;
pub use options::{OPTION_KEYS, Options};
pub use strategy::{LockfileFormat, Strategy};
pub use world::{ARCH_TAGS, OS_TAGS, World, expand_worlds};
