use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiscoverError {
    #[error("invalid registration: {0}")]
    InvalidRegistration(String),

    #[error("invalid directory endpoint: {0}")]
    Endpoint(String),

    #[error("failed to create discovery client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("http request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    #[error("directory rejected {op} (status {status}): {body}")]
    Rejected {
        op: &'static str,
        status: u16,
        body: String,
    },
}

impl DiscoverError {
    /// `true` for errors caused by the node's own configuration rather than the directory.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            DiscoverError::InvalidRegistration(_) | DiscoverError::Endpoint(_)
        )
    }
}
