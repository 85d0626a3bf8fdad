use std::collections::HashMap;
use std::future::Future;

use crate::config::Settings;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use aws_config::default_provider::region::default_provider;
use aws_config::meta::region::{ProvideRegion, RegionProviderChain};
use aws_config::SdkConfig;
use aws_sdk_s3::model::{Initiator, MultipartUpload, Owner};
use aws_sdk_s3::{Client, Credentials, Region};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use tokio::sync::Mutex;

/// Region of the global S3 endpoint, used when nothing else names one.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Who owns or started an upload, as reported by the provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Party {
    #[serde(rename = "ID", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "DisplayName", skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// A single in-progress multipart upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UploadRecord {
    #[serde(skip)]
    pub bucket: String,
    pub upload_id: String,
    pub key: String,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_millis"
    )]
    pub initiated: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<Party>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initiator: Option<Party>,
}

fn serialize_millis<S: Serializer>(ts: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error> {
    match ts {
        Some(ts) => s.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true)),
        None => s.serialize_none(),
    }
}

/// Uploads found in one bucket. `truncated` is set when the provider had
/// more uploads than it returned.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketUploads {
    pub bucket: String,
    pub uploads: Vec<UploadRecord>,
    pub truncated: bool,
}

#[async_trait]
pub trait Storage: Send + Sync {
    async fn list_buckets(&self) -> Result<Vec<String>>;

    async fn list_uploads(&self, bucket: &str, prefix: Option<&str>) -> Result<BucketUploads>;

    async fn abort_upload(&self, bucket: &str, key: &str, upload_id: &str) -> Result<()>;
}

/// Remembers which region each bucket lives in and keeps one handle per
/// region, created on first use.
pub struct Regional<T> {
    buckets: Mutex<HashMap<String, String>>,
    handles: Mutex<HashMap<String, T>>,
}

impl<T: Clone> Regional<T> {
    pub fn new() -> Self {
        Regional {
            buckets: Mutex::new(HashMap::new()),
            handles: Mutex::new(HashMap::new()),
        }
    }

    /// `locate` runs at most once per bucket.
    pub async fn route<L, F, M>(&self, bucket: &str, locate: L, make: M) -> T
    where
        L: FnOnce() -> F,
        F: Future<Output = String>,
        M: FnOnce(&str) -> T,
    {
        let cached = self.buckets.lock().await.get(bucket).cloned();

        let region = match cached {
            Some(region) => region,
            None => {
                let region = locate().await;
                self.buckets
                    .lock()
                    .await
                    .insert(bucket.to_string(), region.clone());
                region
            }
        };

        let mut handles = self.handles.lock().await;
        handles
            .entry(region.clone())
            .or_insert_with(|| make(&region))
            .clone()
    }
}

fn region_chain(explicit: Option<&str>, ambient: impl ProvideRegion + 'static) -> RegionProviderChain {
    RegionProviderChain::first_try(explicit.map(|region| Region::new(region.to_string())))
        .or_else(ambient)
        .or_else(Region::new(DEFAULT_REGION))
}

/// Maps a GetBucketLocation constraint to a region name. Buckets in
/// us-east-1 report no constraint and old eu-west-1 buckets report `EU`.
fn location_region(constraint: Option<&str>) -> String {
    match constraint {
        None | Some("") => DEFAULT_REGION.to_string(),
        Some("EU") => "eu-west-1".to_string(),
        Some(region) => region.to_string(),
    }
}

pub struct S3Client {
    cfg: SdkConfig,
    cl: Client,
    regions: Regional<Client>,
}

impl S3Client {
    pub async fn new(settings: &Settings) -> S3Client {
        let region = region_chain(settings.region.as_deref(), default_provider());
        let mut loader = aws_config::from_env().region(region);

        if let Some(profile) = &settings.profile {
            let creds = Credentials::new(
                &profile.access_key,
                &profile.secret_key,
                None,
                None,
                "abort-incomplete-multipart",
            );
            loader = loader.credentials_provider(creds);
        }

        let cfg = loader.load().await;
        let cl = Client::new(&cfg);

        S3Client {
            cfg,
            cl,
            regions: Regional::new(),
        }
    }

    fn home_region(&self) -> String {
        self.cfg
            .region()
            .map(|region| region.as_ref().to_string())
            .unwrap_or_else(|| DEFAULT_REGION.to_string())
    }

    /// Buckets whose location can't be read are served from the home region.
    async fn locate(&self, bucket: &str) -> String {
        match self.cl.get_bucket_location().bucket(bucket).send().await {
            Ok(resp) => location_region(resp.location_constraint().map(|c| c.as_str())),
            Err(err) => {
                let home = self.home_region();
                log::warn!("failed to look up the region of {}, using {}: {}", bucket, home, err);
                home
            }
        }
    }

    fn regional_client(&self, region: &str) -> Client {
        log::debug!("creating client for {}", region);

        let conf = aws_sdk_s3::config::Builder::from(&self.cfg)
            .region(Region::new(region.to_string()))
            .build();

        Client::from_conf(conf)
    }

    async fn client_for(&self, bucket: &str) -> Client {
        self.regions
            .route(bucket, || self.locate(bucket), |region| self.regional_client(region))
            .await
    }
}

#[async_trait]
impl Storage for S3Client {
    async fn list_buckets(&self) -> Result<Vec<String>> {
        log::debug!("listing buckets");

        let resp = self.cl.list_buckets().send().await?;

        resp.buckets()
            .unwrap_or_default()
            .iter()
            .map(|bucket| {
                bucket
                    .name()
                    .map(str::to_string)
                    .ok_or_else(|| anyhow!("provider returned a bucket without a name"))
            })
            .collect()
    }

    async fn list_uploads(&self, bucket: &str, prefix: Option<&str>) -> Result<BucketUploads> {
        log::debug!("listing multipart uploads in {} (prefix {:?})", bucket, prefix);

        let resp = self
            .client_for(bucket)
            .await
            .list_multipart_uploads()
            .bucket(bucket)
            .set_prefix(prefix.map(str::to_string))
            .send()
            .await?;

        let uploads = resp
            .uploads()
            .unwrap_or_default()
            .iter()
            .map(|upload| upload_record(bucket, upload))
            .collect::<Result<Vec<_>>>()?;

        Ok(BucketUploads {
            bucket: bucket.to_string(),
            uploads,
            truncated: resp.is_truncated(),
        })
    }

    async fn abort_upload(&self, bucket: &str, key: &str, upload_id: &str) -> Result<()> {
        log::debug!("aborting upload {} of {} in {}", upload_id, key, bucket);

        self.client_for(bucket)
            .await
            .abort_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .send()
            .await?;

        Ok(())
    }
}

fn upload_record(bucket: &str, upload: &MultipartUpload) -> Result<UploadRecord> {
    let key = upload
        .key()
        .with_context(|| format!("provider returned an upload without a key in {}", bucket))?;
    let upload_id = upload
        .upload_id()
        .with_context(|| format!("provider returned upload {} without an id", key))?;

    let initiated = upload
        .initiated()
        .and_then(|ts| DateTime::<Utc>::from_timestamp(ts.secs(), ts.subsec_nanos()));

    Ok(UploadRecord {
        bucket: bucket.to_string(),
        upload_id: upload_id.to_string(),
        key: key.to_string(),
        initiated,
        storage_class: upload.storage_class().map(|class| class.as_str().to_string()),
        owner: upload.owner().map(owner_party),
        initiator: upload.initiator().map(initiator_party),
    })
}

fn owner_party(owner: &Owner) -> Party {
    Party {
        id: owner.id().map(str::to_string),
        display_name: owner.display_name().map(str::to_string),
    }
}

fn initiator_party(initiator: &Initiator) -> Party {
    Party {
        id: initiator.id().map(str::to_string),
        display_name: initiator.display_name().map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test]
    async fn falls_back_to_global_region() {
        let chain = region_chain(None, None::<Region>);
        assert_eq!(chain.region().await, Some(Region::new(DEFAULT_REGION)));
    }

    #[tokio::test]
    async fn explicit_region_wins() {
        let chain = region_chain(Some("eu-west-1"), Region::new("ap-south-1"));
        assert_eq!(chain.region().await, Some(Region::new("eu-west-1")));

        let chain = region_chain(None, Region::new("ap-south-1"));
        assert_eq!(chain.region().await, Some(Region::new("ap-south-1")));
    }

    #[test]
    fn bucket_location_constraints() {
        assert_eq!(location_region(None), "us-east-1");
        assert_eq!(location_region(Some("")), "us-east-1");
        assert_eq!(location_region(Some("EU")), "eu-west-1");
        assert_eq!(location_region(Some("eu-central-1")), "eu-central-1");
    }

    #[tokio::test]
    async fn buckets_are_routed_to_their_region() {
        let locations: HashMap<&str, &str> = [
            ("photos", "us-east-1"),
            ("logs", "eu-central-1"),
            ("backups", "eu-central-1"),
        ]
        .into_iter()
        .collect();
        let lookups = AtomicUsize::new(0);
        let made = AtomicUsize::new(0);
        let regions: Regional<String> = Regional::new();

        for bucket in ["photos", "logs", "backups", "logs", "photos"] {
            let handle = regions
                .route(
                    bucket,
                    || async {
                        lookups.fetch_add(1, Ordering::SeqCst);
                        locations[bucket].to_string()
                    },
                    |region| {
                        made.fetch_add(1, Ordering::SeqCst);
                        format!("client-{}", region)
                    },
                )
                .await;

            assert_eq!(handle, format!("client-{}", locations[bucket]));
        }

        assert_eq!(lookups.load(Ordering::SeqCst), 3);
        assert_eq!(made.load(Ordering::SeqCst), 2);
    }
}
