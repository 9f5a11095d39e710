//! Public URLs for objects stored in media buckets.
//!
//! Uploads happen client-side against the bucket directly; the back-office
//! only needs to turn stored object paths into links for detail views.

#[derive(Debug, Clone)]
pub struct StorageUrls {
    public_url: String,
}

impl StorageUrls {
    pub fn new(public_url: impl Into<String>) -> Self {
        Self {
            public_url: public_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// `{public_url}/{bucket}/{path}`, or `None` for an empty path.
    pub fn public_url(&self, bucket: &str, path: &str) -> Option<String> {
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            return None;
        }
        Some(format!("{}/{}/{}", self.public_url, bucket.trim_matches('/'), path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_without_double_slashes() {
        let urls = StorageUrls::new("https://cdn.example.org/storage/v1/object/public/");
        assert_eq!(
            urls.public_url("item-images", "/abc/photo.jpg").as_deref(),
            Some("https://cdn.example.org/storage/v1/object/public/item-images/abc/photo.jpg")
        );
    }

    #[test]
    fn empty_path_has_no_url() {
        let urls = StorageUrls::new("http://localhost:9000");
        assert_eq!(urls.public_url("avatars", ""), None);
        assert_eq!(urls.public_url("avatars", "/"), None);
    }
}
