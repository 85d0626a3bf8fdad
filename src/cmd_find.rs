use crate::error::FindError;
use crate::s3::{BucketUploads, Storage};

/// Collects incomplete uploads from `bucket`, or from every bucket the
/// account can list. Buckets are queried one after another and the first
/// failure discards whatever was found before it.
pub async fn find_uploads<S: Storage + ?Sized>(
    cl: &S,
    bucket: Option<&str>,
    prefix: Option<&str>,
) -> Result<Vec<BucketUploads>, FindError> {
    let buckets = match bucket {
        Some(bucket) => vec![bucket.to_string()],
        None => cl.list_buckets().await.map_err(FindError::ListBuckets)?,
    };

    let mut found = Vec::with_capacity(buckets.len());

    for bucket in buckets {
        let result = cl
            .list_uploads(&bucket, prefix)
            .await
            .map_err(|source| FindError::ListUploads {
                bucket: bucket.clone(),
                source,
            })?;

        if result.truncated {
            log::warn!(
                "bucket {} has more uploads than were listed, only the first page is shown",
                bucket
            );
        }

        log::info!("found {} uploads in {}", result.uploads.len(), bucket);
        found.push(result);
    }

    Ok(found)
}
