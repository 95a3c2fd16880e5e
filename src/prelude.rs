pub use {
    crate::channels::Channels,
    crate::config::Config,
    crate::error::FetchError,
    crate::options::Options,
    anyhow::{anyhow, bail, Error, Result},
    log::{debug, error, info, trace, warn},
    tokio::sync::broadcast,
};
