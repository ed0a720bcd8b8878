//! Configuration file management and provider settings.

mod manager;

pub use manager::{
    BUILTIN_PROVIDER, ConfigFile, ConfigManager, ConvoConfig, DEFAULT_MODEL, KeySource,
    ProviderConfig, ResolveOptions, ResolvedConfig, resolve_config,
};
