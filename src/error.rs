use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("http {status} from {url}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("invalid json from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("gave up on {path} after {pages} full pages")]
    PageLimit { path: String, pages: usize },
}

impl FetchError {
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type FetchResult<T> = Result<T, FetchError>;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("invalid upstream base {0:?}")]
    InvalidUpstream(String),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("proxy server stopped: {0}")]
    Serve(#[source] std::io::Error),

    #[error(transparent)]
    Client(#[from] anyhow::Error),
}
