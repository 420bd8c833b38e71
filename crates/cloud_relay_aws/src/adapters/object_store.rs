use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::{ByteStream, DateTimeFormat};
use aws_sdk_s3::types::Object;
use cloud_relay_core::documents::{copy_source, DocumentUpload, JSON_CONTENT_TYPE};
use cloud_relay_core::expiry::LinkExpiry;
use cloud_relay_core::paging::{collect_all, Page, PageSource};
use cloud_relay_core::transport::{BoxError, OverflowReader, OverflowStore};

use crate::error::AwsError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub bucket: String,
    pub key: String,
    pub e_tag: Option<String>,
    pub version_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedObject {
    pub body: Vec<u8>,
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    pub key: String,
    pub size: Option<i64>,
    pub e_tag: Option<String>,
    pub last_modified: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedUrl {
    pub url: String,
    pub expiry_message: String,
}

#[derive(Debug, Clone)]
pub struct ObjectStorage {
    client: aws_sdk_s3::Client,
}

impl ObjectStorage {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self::from_client(aws_sdk_s3::Client::new(sdk_config))
    }

    pub fn from_client(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }

    pub fn bucket(&self, bucket: impl Into<String>) -> BucketStore {
        BucketStore {
            client: self.client.clone(),
            bucket: bucket.into(),
        }
    }

    pub async fn upload_document(&self, upload: &DocumentUpload) -> Result<UploadReceipt, AwsError> {
        let mut request = self
            .client
            .put_object()
            .bucket(&upload.bucket)
            .key(&upload.key)
            .content_type(&upload.content_type)
            .body(ByteStream::from(upload.body.clone()));
        for (name, value) in &upload.metadata {
            request = request.metadata(name, value);
        }

        let output = request.send().await.map_err(aws_sdk_s3::Error::from)?;
        Ok(UploadReceipt {
            bucket: upload.bucket.clone(),
            key: upload.key.clone(),
            e_tag: output.e_tag().map(str::to_string),
            version_id: output.version_id().map(str::to_string),
        })
    }

    /// A missing key is `Ok(None)`; every other failure is returned.
    pub async fn download(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Option<DownloadedObject>, AwsError> {
        let output = match self.client.get_object().bucket(bucket).key(key).send().await {
            Ok(output) => output,
            Err(error) if is_no_such_key(&error) => return Ok(None),
            Err(error) => return Err(aws_sdk_s3::Error::from(error).into()),
        };

        let content_type = output.content_type().map(str::to_string);
        let body = output.body.collect().await?.into_bytes().to_vec();
        Ok(Some(DownloadedObject { body, content_type }))
    }

    /// Server-side copy into `to_bucket`, then delete from `from_bucket`.
    pub async fn move_object(
        &self,
        from_bucket: &str,
        to_bucket: &str,
        key: &str,
    ) -> Result<(), AwsError> {
        tracing::info!(
            component = "object_store",
            event = "copy_started",
            key,
            from_bucket,
            to_bucket,
        );
        let copied = self
            .client
            .copy_object()
            .bucket(to_bucket)
            .copy_source(copy_source(from_bucket, key))
            .key(key)
            .send()
            .await
            .map_err(aws_sdk_s3::Error::from)?;
        tracing::info!(
            component = "object_store",
            event = "copy_completed",
            key,
            version_id = copied.version_id().unwrap_or_default(),
        );

        tracing::info!(
            component = "object_store",
            event = "delete_started",
            key,
            bucket = from_bucket,
        );
        self.client
            .delete_object()
            .bucket(from_bucket)
            .key(key)
            .send()
            .await
            .map_err(aws_sdk_s3::Error::from)?;
        tracing::info!(component = "object_store", event = "delete_completed", key);

        Ok(())
    }

    /// Page-at-a-time view of a bucket, for use with
    /// [`cloud_relay_core::paging::Pager`].
    pub fn listing<'a>(&'a self, bucket: &'a str) -> ObjectListing<'a> {
        ObjectListing {
            client: &self.client,
            bucket,
        }
    }

    pub async fn list_objects(&self, bucket: &str) -> Result<Vec<ObjectSummary>, AwsError> {
        collect_all(&self.listing(bucket))
            .await
            .map_err(AwsError::Listing)
    }

    pub async fn signed_url(
        &self,
        bucket: &str,
        key: &str,
        expiry: &LinkExpiry,
    ) -> Result<SignedUrl, AwsError> {
        let resolved = expiry.resolve();
        let presigning = PresigningConfig::expires_in(resolved.duration)?;
        let request = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(aws_sdk_s3::Error::from)?;

        Ok(SignedUrl {
            url: request.uri().to_string(),
            expiry_message: resolved.message,
        })
    }
}

fn is_no_such_key<R>(error: &SdkError<GetObjectError, R>) -> bool {
    error
        .as_service_error()
        .is_some_and(GetObjectError::is_no_such_key)
}

pub struct ObjectListing<'a> {
    client: &'a aws_sdk_s3::Client,
    bucket: &'a str,
}

#[async_trait]
impl PageSource for ObjectListing<'_> {
    type Item = ObjectSummary;

    async fn fetch_page(&self, token: Option<String>) -> Result<Page<ObjectSummary>, BoxError> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(self.bucket)
            .set_continuation_token(token)
            .send()
            .await
            .map_err(aws_sdk_s3::Error::from)?;

        Ok(Page {
            items: output.contents().iter().map(summarize_object).collect(),
            next_token: next_continuation_token(
                output.is_truncated(),
                output.next_continuation_token(),
            ),
        })
    }
}

fn summarize_object(object: &Object) -> ObjectSummary {
    ObjectSummary {
        key: object.key().unwrap_or_default().to_string(),
        size: object.size(),
        e_tag: object.e_tag().map(str::to_string),
        last_modified: object
            .last_modified()
            .and_then(|value| value.fmt(DateTimeFormat::DateTime).ok()),
    }
}

fn next_continuation_token(is_truncated: Option<bool>, token: Option<&str>) -> Option<String> {
    if is_truncated.unwrap_or(false) {
        token.map(str::to_string)
    } else {
        None
    }
}

/// One bucket seen through the overflow store seams.
#[derive(Debug, Clone)]
pub struct BucketStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl BucketStore {
    pub fn name(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl OverflowStore for BucketStore {
    async fn put_object(&self, key: &str, body: Vec<u8>) -> Result<(), BoxError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(JSON_CONTENT_TYPE)
            .body(ByteStream::from(body))
            .send()
            .await
            .map(|_| ())
            .map_err(|error| aws_sdk_s3::Error::from(error).into())
    }
}

#[async_trait]
impl OverflowReader for BucketStore {
    async fn get_object(&self, key: &str) -> Result<Vec<u8>, BoxError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(aws_sdk_s3::Error::from)?;
        Ok(output.body.collect().await?.into_bytes().to_vec())
    }
}
