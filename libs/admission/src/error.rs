use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("decode error: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("synthesis error: {0}")]
    Synthesis(#[source] serde_json::Error),

    #[error("invalid log filter: {0}")]
    LogFilter(#[source] tracing_subscriber::filter::ParseError),

    #[error("failed to install tracing subscriber: {0}")]
    SubscriberInit(#[source] tracing_subscriber::util::TryInitError),
}
pub type Result<T, E = Error> = std::result::Result<T, E>;
