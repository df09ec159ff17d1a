//! S3-compatible backend built on `aws-sdk-s3`.
//!
//! Works against AWS S3 and any service speaking the S3 protocol. When a
//! custom endpoint is configured, path-style addressing is forced so bucket
//! names need not resolve as DNS labels (R2, MinIO, local emulators).

use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::Client;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::types::Object;
use chrono::{DateTime, Utc};
use reconcile_core::StoreConfig;
use tracing::{debug, trace};

use crate::client::StorageClient;
use crate::error::{StoreError, StoreResult};
use crate::types::{CountPage, ObjectContent, ObjectHead, ObjectPage, ObjectRecord};

/// Provider name attached to static credentials.
const CREDENTIALS_PROVIDER: &str = "bucket-reconcile";

/// An object store reached through the S3 API.
#[derive(Debug, Clone)]
pub struct S3Store {
    client: Client,
    page_size: Option<i32>,
}

impl S3Store {
    /// Build a client from store settings.
    ///
    /// Static credentials are used when both halves are configured; otherwise
    /// the default AWS credential chain applies.
    pub async fn connect(config: &StoreConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .retry_config(RetryConfig::standard().with_max_attempts(config.max_attempts.max(1)));

        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }

        if let (Some(access_key), Some(secret_key)) =
            (&config.access_key_id, &config.secret_access_key)
        {
            let credentials =
                Credentials::new(access_key, secret_key, None, None, CREDENTIALS_PROVIDER);
            loader = loader.credentials_provider(credentials);
        }

        let shared = loader.load().await;
        let builder = aws_sdk_s3::config::Builder::from(&shared);
        let s3_config = if config.endpoint_url.is_some() {
            builder.force_path_style(true).build()
        } else {
            builder.build()
        };

        debug!(
            endpoint = ?config.endpoint_url,
            region = %config.region,
            bucket = %config.bucket_name,
            "created S3 client"
        );

        Self::from_client(Client::from_conf(s3_config), config.page_size)
    }

    /// Wrap an existing SDK client.
    #[must_use]
    pub fn from_client(client: Client, page_size: Option<i32>) -> Self {
        Self { client, page_size }
    }

    /// The underlying SDK client.
    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl StorageClient for S3Store {
    async fn list_buckets(&self) -> StoreResult<Vec<String>> {
        let mut names = Vec::new();
        let mut continuation: Option<String> = None;
        loop {
            let resp = self
                .client
                .list_buckets()
                .set_continuation_token(continuation.take())
                .send()
                .await
                .map_err(|e| request_error("ListBuckets", &e))?;

            names.extend(
                resp.buckets()
                    .iter()
                    .filter_map(|b| b.name().map(ToOwned::to_owned)),
            );

            match resp.continuation_token() {
                Some(token) if !token.is_empty() => continuation = Some(token.to_owned()),
                _ => break,
            }
        }
        Ok(names)
    }

    async fn list_objects_page(
        &self,
        bucket: &str,
        continuation: Option<&str>,
    ) -> StoreResult<ObjectPage> {
        let resp = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .set_continuation_token(continuation.map(ToOwned::to_owned))
            .set_max_keys(self.page_size)
            .send()
            .await
            .map_err(|e| request_error("ListObjectsV2", &e))?;

        let records: Vec<ObjectRecord> = resp.contents().iter().filter_map(to_record).collect();
        let next_token = next_token(resp.is_truncated(), resp.next_continuation_token())?;

        trace!(bucket, count = records.len(), more = next_token.is_some(), "listed page");

        Ok(ObjectPage {
            records,
            next_token,
        })
    }

    async fn count_objects_page(
        &self,
        bucket: &str,
        continuation: Option<&str>,
    ) -> StoreResult<CountPage> {
        let resp = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .set_continuation_token(continuation.map(ToOwned::to_owned))
            .set_max_keys(self.page_size)
            .send()
            .await
            .map_err(|e| request_error("ListObjectsV2", &e))?;

        let count = resp
            .key_count()
            .and_then(|n| u64::try_from(n).ok())
            .unwrap_or(resp.contents().len() as u64);

        Ok(CountPage {
            count,
            next_token: next_token(resp.is_truncated(), resp.next_continuation_token())?,
        })
    }

    async fn head_object(&self, bucket: &str, key: &str) -> StoreResult<ObjectHead> {
        let out = self
            .client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| object_error("HeadObject", bucket, key, &e, HeadObjectError::is_not_found))?;

        Ok(ObjectHead {
            size: out
                .content_length()
                .and_then(|n| u64::try_from(n).ok())
                .unwrap_or(0),
            content_type: out.content_type().map(ToOwned::to_owned),
        })
    }

    async fn get_object(&self, bucket: &str, key: &str) -> StoreResult<ObjectContent> {
        let out = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| object_error("GetObject", bucket, key, &e, GetObjectError::is_no_such_key))?;

        let content_type = out.content_type().map(ToOwned::to_owned);
        let content_length = out.content_length().and_then(|n| u64::try_from(n).ok());

        Ok(ObjectContent {
            body: out.body,
            content_type,
            content_length,
        })
    }

    async fn put_object(&self, bucket: &str, key: &str, content: ObjectContent) -> StoreResult<()> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(content.body)
            .set_content_type(content.content_type)
            .set_content_length(content.content_length.and_then(|n| i64::try_from(n).ok()))
            .send()
            .await
            .map_err(|e| request_error("PutObject", &e))?;

        debug!(bucket, key, "uploaded object");
        Ok(())
    }
}

/// Convert a listed SDK object into a record; objects without a key are dropped.
fn to_record(object: &Object) -> Option<ObjectRecord> {
    let key = object.key()?;
    let size = object
        .size()
        .and_then(|n| u64::try_from(n).ok())
        .unwrap_or(0);
    let last_modified = object
        .last_modified()
        .and_then(|t| DateTime::from_timestamp(t.secs(), t.subsec_nanos()))
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    Some(ObjectRecord::new(key, size, last_modified))
}

/// Continuation token of a listing page.
///
/// A truncated page without a usable token is an error, so a listing can
/// never end early without notice.
fn next_token(is_truncated: Option<bool>, token: Option<&str>) -> StoreResult<Option<String>> {
    if is_truncated != Some(true) {
        return Ok(None);
    }
    match token {
        Some(token) if !token.is_empty() => Ok(Some(token.to_owned())),
        _ => Err(StoreError::request(
            "ListObjectsV2",
            "truncated page without continuation token",
        )),
    }
}

fn request_error<E>(operation: &'static str, err: &SdkError<E, HttpResponse>) -> StoreError
where
    E: std::error::Error + Send + Sync + 'static,
{
    StoreError::request(operation, DisplayErrorContext(err).to_string())
}

/// Map an object-level SDK error, recognising "not found" either from the
/// modeled error or from a bare 404 (HEAD responses carry no error body).
fn object_error<E>(
    operation: &'static str,
    bucket: &str,
    key: &str,
    err: &SdkError<E, HttpResponse>,
    is_not_found: fn(&E) -> bool,
) -> StoreError
where
    E: std::error::Error + Send + Sync + 'static,
{
    let modeled = err.as_service_error().is_some_and(is_not_found);
    let status_404 = err
        .raw_response()
        .is_some_and(|r| r.status().as_u16() == 404);

    if modeled || status_404 {
        StoreError::NotFound {
            bucket: bucket.to_owned(),
            key: key.to_owned(),
        }
    } else {
        request_error(operation, err)
    }
}
