use super::protocol::StageInfo;
use crate::error::{Result, SnowdashError};
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use base64::Engine;
use sha2::{Digest, Sha256};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ObjectLocation {
    pub(crate) bucket: String,
    pub(crate) key: String,
}

impl ObjectLocation {
    /// Splits a stage location of the form `bucket/prefix/` and appends the
    /// file name to the prefix.
    pub(crate) fn from_stage(location: &str, file_name: &str) -> Self {
        let (bucket, prefix) = location.split_once('/').unwrap_or((location, ""));
        let key = if prefix.is_empty() || prefix.ends_with('/') {
            format!("{}{}", prefix, file_name)
        } else {
            format!("{}/{}", prefix, file_name)
        };
        Self {
            bucket: bucket.to_string(),
            key,
        }
    }

    pub(crate) fn encoded_key(&self) -> String {
        self.key
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }
}

pub(crate) struct StageUploader<'a> {
    http: &'a reqwest::Client,
}

impl<'a> StageUploader<'a> {
    pub(crate) fn new(http: &'a reqwest::Client) -> Self {
        Self { http }
    }

    pub(crate) async fn upload(&self, stage: &StageInfo, file_name: &str, body: Vec<u8>) -> Result<()> {
        let object = ObjectLocation::from_stage(&stage.location, file_name);
        debug!(
            location_type = %stage.location_type,
            bucket = %object.bucket,
            key = %object.key,
            bytes = body.len(),
            "Uploading file to stage"
        );

        match stage.location_type.to_ascii_uppercase().as_str() {
            "S3" => self.upload_s3(stage, &object, body).await,
            "GCS" => self.upload_gcs(stage, &object, body).await,
            "AZURE" => self.upload_azure(stage, &object, body).await,
            other => Err(SnowdashError::StageUpload(format!(
                "unsupported stage location type '{}'",
                other
            ))),
        }
    }

    async fn upload_s3(&self, stage: &StageInfo, object: &ObjectLocation, body: Vec<u8>) -> Result<()> {
        let region = stage.region.clone().unwrap_or_else(|| "us-east-1".to_string());
        let credentials = Credentials::new(
            required_cred(stage, "AWS_KEY_ID")?,
            required_cred(stage, "AWS_SECRET_KEY")?,
            stage.creds.get("AWS_TOKEN").cloned(),
            None,
            "snowflake-stage",
        );
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region))
            .credentials_provider(credentials)
            .load()
            .await;

        let mut s3_config = aws_sdk_s3::config::Builder::from(&config);
        if let Some(end_point) = stage.end_point.as_deref().filter(|e| !e.is_empty()) {
            // Endpoints given with a scheme point at S3-compatible storage.
            if end_point.contains("://") {
                s3_config = s3_config.endpoint_url(end_point).force_path_style(true);
            } else {
                s3_config = s3_config.endpoint_url(format!("https://{}", end_point));
            }
        }
        let client = S3Client::from_conf(s3_config.build());

        client
            .put_object()
            .bucket(&object.bucket)
            .key(&object.key)
            .metadata("sfc-digest", sfc_digest(&body))
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| {
                SnowdashError::StageUpload(format!(
                    "S3 upload of {} failed: {}",
                    object.key,
                    DisplayErrorContext(e)
                ))
            })?;
        Ok(())
    }

    async fn upload_gcs(&self, stage: &StageInfo, object: &ObjectLocation, body: Vec<u8>) -> Result<()> {
        let request = match stage.presigned_url.as_deref().filter(|u| !u.is_empty()) {
            Some(url) => self.http.put(url),
            None => {
                let token = required_cred(stage, "GCS_ACCESS_TOKEN")?;
                let url = format!(
                    "https://storage.googleapis.com/{}/{}",
                    object.bucket,
                    object.encoded_key()
                );
                self.http.put(url).bearer_auth(token)
            }
        };

        let response = request
            .header("Content-Type", "application/octet-stream")
            .body(body)
            .send()
            .await?;
        check_status("GCS", response).await
    }

    async fn upload_azure(&self, stage: &StageInfo, object: &ObjectLocation, body: Vec<u8>) -> Result<()> {
        let account = stage
            .storage_account
            .as_deref()
            .ok_or_else(|| SnowdashError::StageUpload("Azure stage without storage account".to_string()))?;
        let end_point = stage.end_point.as_deref().unwrap_or("blob.core.windows.net");
        let sas = required_cred(stage, "AZURE_SAS_TOKEN")?.trim_start_matches('?');

        let url = format!(
            "https://{}.{}/{}/{}?{}",
            account,
            end_point,
            object.bucket,
            object.encoded_key(),
            sas
        );
        let response = self
            .http
            .put(url)
            .header("x-ms-blob-type", "BlockBlob")
            .body(body)
            .send()
            .await?;
        check_status("Azure", response).await
    }
}

fn required_cred<'s>(stage: &'s StageInfo, key: &str) -> Result<&'s str> {
    stage
        .creds
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| SnowdashError::StageUpload(format!("stage credentials lack {}", key)))
}

async fn check_status(kind: &str, response: reqwest::Response) -> Result<()> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(SnowdashError::StageUpload(format!(
        "{} upload failed with status {}: {}",
        kind, status, body
    )))
}

/// Base64 SHA-256 of the uploaded bytes, stored as `sfc-digest` object
/// metadata so later PUTs can skip unchanged files.
pub(crate) fn sfc_digest(body: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(Sha256::digest(body))
}
