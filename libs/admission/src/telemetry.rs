use crate::error::{Error, Result};

use std::fmt;

use clap::ValueEnum;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt as subscriber_fmt};

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

/// Install the global tracing subscriber. Called once from `main`.
pub fn init(log_filter: &str, log_format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_new(log_filter).map_err(Error::LogFilter)?;
    match log_format {
        LogFormat::Text => Registry::default()
            .with(filter)
            .with(subscriber_fmt::layer())
            .try_init(),
        LogFormat::Json => Registry::default()
            .with(filter)
            .with(subscriber_fmt::layer().json().flatten_event(true))
            .try_init(),
    }
    .map_err(Error::SubscriberInit)
}
