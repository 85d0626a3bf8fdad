use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OptionsError {
    #[error("Option --{0} is required!")]
    Missing(&'static str),
    #[error("Option --{0} requires an argument!")]
    MissingArgument(&'static str),
}

#[derive(Debug, Error)]
pub enum FindError {
    #[error("failed to list buckets")]
    ListBuckets(#[source] anyhow::Error),
    #[error("failed to list multipart uploads in bucket \"{bucket}\"")]
    ListUploads {
        bucket: String,
        #[source]
        source: anyhow::Error,
    },
}

impl FindError {
    pub fn hint(&self) -> String {
        match self {
            FindError::ListBuckets(_) => "Failed to list buckets, do you have permission to do that \
                 for all regions? Perhaps supply --bucket <bucketname> instead."
                .to_string(),
            FindError::ListUploads { bucket, .. } => format!(
                "Failed to list multipart uploads in bucket \"{}\", do you have permissions for \
                 that bucket?",
                bucket
            ),
        }
    }
}

/// `attempted` counts calls issued, including the one that failed.
#[derive(Debug, Error)]
#[error("failed to abort upload {upload_id} of \"{key}\" in bucket \"{bucket}\"")]
pub struct AbortError {
    pub attempted: usize,
    pub bucket: String,
    pub key: String,
    pub upload_id: String,
    #[source]
    pub source: anyhow::Error,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Options(#[from] OptionsError),
    #[error(transparent)]
    Find(#[from] FindError),
    #[error(transparent)]
    Abort(#[from] AbortError),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl Error {
    /// Writes the operator-facing description of the failure to stderr.
    pub fn report(self) {
        eprintln!("{}", self.render());
    }

    fn render(self) -> String {
        match self {
            Error::Options(err) => err.to_string(),
            Error::Abort(err) => format!("Error! {:#}", anyhow::Error::new(err)),
            Error::Find(err) => {
                let hint = err.hint();
                format!("{}\n{}", hint, fatal(anyhow::Error::new(err)))
            }
            Error::Unexpected(err) => fatal(err),
        }
    }
}

fn fatal(err: anyhow::Error) -> String {
    format!("Error: {:?}\n\nTerminating due to fatal errors.", err)
}
