use crate::error::AbortError;
use crate::s3::{BucketUploads, Storage};

/// Aborts every upload in discovery order, one call at a time. Stops at
/// the first failure; uploads aborted before it stay aborted.
pub async fn abort_uploads<S: Storage + ?Sized>(
    cl: &S,
    results: &[BucketUploads],
) -> Result<usize, AbortError> {
    let mut attempted = 0;

    for result in results {
        for upload in &result.uploads {
            attempted += 1;

            cl.abort_upload(&result.bucket, &upload.key, &upload.upload_id)
                .await
                .map_err(|source| AbortError {
                    attempted,
                    bucket: result.bucket.clone(),
                    key: upload.key.clone(),
                    upload_id: upload.upload_id.clone(),
                    source,
                })?;

            log::info!("aborted {} ({})", upload.key, upload.upload_id);
        }
    }

    Ok(attempted)
}
