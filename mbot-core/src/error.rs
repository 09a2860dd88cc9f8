use thiserror::Error;

#[derive(Error, Debug)]
pub enum MbotError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Handler error: {0}")]
    Handler(#[from] HandlerError),

    #[error("Session store error: {0}")]
    Store(String),

    #[error("Webhook error: {0}")]
    Webhook(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("No text in message")]
    NoText,

    #[error("Unknown scene: {0}")]
    UnknownScene(String),

    #[error("State error: {0}")]
    State(String),

    #[error("Empty content")]
    EmptyContent,
}

pub type Result<T> = std::result::Result<T, MbotError>;
