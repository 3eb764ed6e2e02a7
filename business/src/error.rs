use crate::auth::AuthError;
use crate::data::DataError;
use crate::http::HttpError;
use crate::images::ImageError;
use crate::proxy_client::ProxyClientError;
use crate::storage::FileStorageError;

/// Failure of one user action. Display is the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("A generation is already in progress")]
    Busy,

    #[error("Upload a pic of yourself first")]
    MissingUserPhoto,

    #[error("Nothing to save yet. Generate an outfit first")]
    NothingToSave,

    #[error("Rating must be between 1 and 5")]
    InvalidRating,

    #[error("{0} not found")]
    NotFound(String),

    #[error("Failed to download image: {0}")]
    Download(String),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error(transparent)]
    Proxy(#[from] ProxyClientError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Storage request failed: {0}")]
    Storage(#[from] FileStorageError),

    #[error("Database request failed: {0}")]
    Data(#[from] DataError),

    #[error(transparent)]
    Http(#[from] HttpError),
}

pub type ActionResult<T> = Result<T, ActionError>;
