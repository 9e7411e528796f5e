use std::io;

/// Internal persistence error. The public store surface never propagates
/// these: load failures degrade to empty collections and save failures are
/// logged and swallowed, with in-memory state staying authoritative.
#[derive(Debug)]
pub enum StoreError {
    Io(io::Error),
    Snapshot { artifact: &'static str, source: io::Error },
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "I/O error: {e}"),
            StoreError::Snapshot { artifact, source } => {
                write!(f, "snapshot {artifact}: {source}")
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(e) => Some(e),
            StoreError::Snapshot { source, .. } => Some(source),
        }
    }
}

impl From<io::Error> for StoreError {
    fn from(e: io::Error) -> Self {
        StoreError::Io(e)
    }
}
