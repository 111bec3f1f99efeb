use std::path::Path;

use async_trait::async_trait;
use aws_sdk_s3::config::Builder;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::{Client, config::BehaviorVersion, config::Credentials, config::Region};
use tracing::info;
use url::Url;

use super::{ObjectStore, StorageError};
use crate::config::settings::AppConfig;

/// `https://<bucket>.<host>/`, the prefix every published key hangs off.
pub fn public_base(bucket: &str, host: &str) -> Result<Url, url::ParseError> {
    Url::parse(&format!("https://{}.{}/", bucket, host.trim_matches('/')))
}

#[derive(Clone)]
pub struct StorageService {
    pub client: Client,
    pub bucket: String,
    public_base: Url,
}

impl StorageService {
    pub async fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let credentials = Credentials::new(
            &config.s3_access_key,
            &config.s3_secret_key,
            None,
            None,
            "static",
        );

        let mut builder = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.s3_region.clone()))
            .credentials_provider(credentials);

        if let Some(endpoint) = &config.s3_endpoint {
            // MinIO and friends only speak path-style addressing
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        let client = Client::from_conf(builder.build());
        let public_base = public_base(&config.s3_bucket, &config.s3_public_host)?;

        info!("✅ S3 client ready for bucket {}", config.s3_bucket);

        Ok(Self {
            client,
            bucket: config.s3_bucket.clone(),
            public_base,
        })
    }
}

#[async_trait]
impl ObjectStore for StorageService {
    async fn put_file(&self, key: &str, content_type: &str, path: &Path) -> Result<(), StorageError> {
        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| StorageError::Source {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(body)
            .send()
            .await
            .map_err(|e| StorageError::Put {
                key: key.to_string(),
                reason: DisplayErrorContext(e).to_string(),
            })?;

        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}{}", self.public_base, key)
    }
}
