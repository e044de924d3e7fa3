pub type StorypathResult<T> = Result<T, StorypathError>;

#[derive(thiserror::Error, Debug)]
pub enum StorypathError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("geometry error: {0}")]
    Geometry(String),

    #[error("path contains no valid point")]
    NoValidPoint,

    #[error("playback error: {0}")]
    Playback(String),

    #[error("sync error: {0}")]
    Sync(String),

    #[error("render surface is not ready")]
    SurfaceNotReady,

    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StorypathError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn geometry(msg: impl Into<String>) -> Self {
        Self::Geometry(msg.into())
    }

    pub fn playback(msg: impl Into<String>) -> Self {
        Self::Playback(msg.into())
    }

    pub fn sync(msg: impl Into<String>) -> Self {
        Self::Sync(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}
