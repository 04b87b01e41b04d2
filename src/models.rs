//! Response models

use std::fmt;

use serde::{Deserialize, Serialize};

/// Result of `file_requests/count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FileRequestCount {
    /// Number of file requests owned by the user.
    pub file_request_count: i64,
}

impl fmt::Display for FileRequestCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileRequestCount(file_request_count = {})", self.file_request_count)
    }
}
