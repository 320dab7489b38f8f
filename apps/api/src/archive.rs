use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use tracing::info;
use uuid::Uuid;

use crate::config::ArchiveConfig;

/// Stores original resume uploads in S3-compatible object storage.
#[derive(Clone)]
pub struct ResumeArchive {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl ResumeArchive {
    /// Constructs an S3 client configured for MinIO (local) or AWS (production).
    pub async fn connect(config: &ArchiveConfig) -> Self {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "recruiter-static",
        );

        let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(credentials)
            .endpoint_url(&config.endpoint)
            .load()
            .await;

        Self {
            client: aws_sdk_s3::Client::new(&s3_config),
            bucket: config.bucket.clone(),
        }
    }

    /// Uploads one file and returns its object key.
    pub async fn store(
        &self,
        run_id: Uuid,
        candidate_id: Uuid,
        file_name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> anyhow::Result<String> {
        let key = object_key(run_id, candidate_id, file_name);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("S3 upload failed: {e}"))?;

        info!("Archived resume to s3://{}/{}", self.bucket, key);
        Ok(key)
    }
}

fn object_key(run_id: Uuid, candidate_id: Uuid, file_name: &str) -> String {
    let safe_name: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("runs/{run_id}/{candidate_id}/{safe_name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key_sanitises_file_name() {
        let run = Uuid::nil();
        let candidate = Uuid::nil();
        let key = object_key(run, candidate, "../Jane Doe (CV).pdf");
        assert!(key.ends_with("/.._Jane_Doe__CV_.pdf"));
        assert!(key.starts_with("runs/00000000-0000-0000-0000-000000000000/"));
        assert_eq!(key.matches('/').count(), 3);
    }
}
