use anyhow::Context;
use async_trait::async_trait;
use aws_config::{defaults, BehaviorVersion};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Region},
    Client,
};

#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn delete_object(&self, key: &str) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct Media {
    client: Client,
    bucket: String,
}

impl Media {
    pub async fn new(
        endpoint: &str,
        bucket: &str,
        access_key: &str,
        secret_key: &str,
        region: &str,
    ) -> anyhow::Result<Self> {
        let shared = defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(Credentials::new(
                access_key, secret_key, None, None, "static",
            ))
            .endpoint_url(endpoint)
            .load()
            .await;

        let conf = S3ConfigBuilder::from(&shared)
            .endpoint_url(endpoint)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(conf),
            bucket: bucket.to_string(),
        })
    }
}

#[async_trait]
impl MediaStore for Media {
    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .context("media delete_object")?;
        Ok(())
    }
}

/// Derive the hosted object key from the public URL stored on a record.
/// Returns `None` when the URL has no path component to key on.
pub fn object_key_from_url(url: &str) -> Option<String> {
    let rest = match url.split_once("://") {
        Some((_, rest)) => rest,
        None => return Some(url.trim_start_matches('/').to_string()).filter(|k| !k.is_empty()),
    };
    let (_, path) = rest.split_once('/')?;
    let key = path.split(|c| c == '?' || c == '#').next().unwrap_or("");
    if key.is_empty() {
        None
    } else {
        Some(key.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::object_key_from_url;

    #[test]
    fn derives_key_from_full_url() {
        assert_eq!(
            object_key_from_url("https://cdn.learnhub.io/courses/rust-101.jpg"),
            Some("courses/rust-101.jpg".to_string())
        );
    }

    #[test]
    fn strips_query_and_fragment() {
        assert_eq!(
            object_key_from_url("https://cdn.learnhub.io/courses/a.png?v=3#top"),
            Some("courses/a.png".to_string())
        );
    }

    #[test]
    fn bare_key_passes_through() {
        assert_eq!(
            object_key_from_url("courses/a.png"),
            Some("courses/a.png".to_string())
        );
    }

    #[test]
    fn url_without_path_is_none() {
        assert_eq!(object_key_from_url("https://cdn.learnhub.io"), None);
        assert_eq!(object_key_from_url("https://cdn.learnhub.io/"), None);
        assert_eq!(object_key_from_url(""), None);
    }
}
