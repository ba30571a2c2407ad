//! Blob upload shim for MedVision.
//!
//! Emulates an object-storage bucket without keeping any bytes: uploads
//! succeed after a simulated transfer delay, and public URLs resolve to a
//! fixed placeholder image. There are no error paths.

use std::time::Duration;

use tracing::debug;

/// Default artificial latency for uploads.
const DEFAULT_UPLOAD_DELAY: Duration = Duration::from_millis(500);

/// Placeholder returned for every public URL request.
const PLACEHOLDER_URL: &str =
    "https://images.unsplash.com/photo-1516549655169-df83a0774514?w=800&q=80";

/// Result of a (simulated) upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedObject {
    /// Path the object would live under within its bucket.
    pub path: String,
}

/// Object storage shim.
pub struct BlobStore {
    delay: Duration,
}

impl BlobStore {
    /// Creates a shim with the default upload latency.
    pub fn new() -> Self {
        Self {
            delay: DEFAULT_UPLOAD_DELAY,
        }
    }

    /// Overrides the artificial latency; `Duration::ZERO` disables it.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Accepts `bytes` and discards them after a simulated transfer delay.
    pub async fn upload(&self, bucket: &str, path: &str, bytes: &[u8]) -> UploadedObject {
        debug!(bucket, path, size = bytes.len(), "simulated upload");
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        UploadedObject {
            path: path.to_string(),
        }
    }

    /// Returns a stable placeholder URL regardless of arguments.
    pub fn public_url(&self, _bucket: &str, _path: &str) -> String {
        PLACEHOLDER_URL.to_string()
    }
}

impl Default for BlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_echoes_the_path() {
        let store = BlobStore::new().with_delay(Duration::ZERO);
        let object = store.upload("scans", "patient-1/wrist.png", &[1, 2, 3]).await;
        assert_eq!(object.path, "patient-1/wrist.png");
    }

    #[test]
    fn test_public_url_is_fixed() {
        let store = BlobStore::new();
        let a = store.public_url("scans", "one.png");
        let b = store.public_url("other", "two.png");
        assert_eq!(a, b);
        assert!(a.starts_with("https://"));
    }
}
