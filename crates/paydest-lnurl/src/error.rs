#[derive(Debug, thiserror::Error)]
pub enum LnurlError {
    #[error("http client error: {0}")]
    Client(String),
    #[error("encode error: {0}")]
    Encode(String),
}
