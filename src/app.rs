use std::future::Future;
use std::io::Write;

use anyhow::Context;
use tokio::io::AsyncBufRead;

use crate::cmd_abort::abort_uploads;
use crate::cmd_find::find_uploads;
use crate::confirm::{Gate, Prompt, QUESTION};
use crate::error::Error;
use crate::options::{OptionDef, Options};
use crate::report::print_uploads;
use crate::s3::{BucketUploads, Storage};

/// Validates `options` against `defs` and only then calls `connect` to
/// build the storage client.
pub async fn execute<S, C, F, R, W>(
    options: &Options,
    defs: &[OptionDef],
    connect: C,
    input: R,
    out: &mut W,
) -> Result<(), Error>
where
    S: Storage,
    C: FnOnce() -> F,
    F: Future<Output = Result<S, Error>>,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    options.validate(defs)?;

    let cl = connect().await?;

    run(&cl, options, input, out).await
}

/// Finds, reports and, when asked to, aborts incomplete uploads. `input`
/// is only read when the operator has to confirm.
pub async fn run<S, R, W>(cl: &S, options: &Options, input: R, out: &mut W) -> Result<(), Error>
where
    S: Storage + ?Sized,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let results = find_uploads(cl, options.bucket(), options.prefix()).await?;

    print_uploads(&results, out)?;

    match Gate::new(options.abort, options.force) {
        Gate::Skip => {
            writeln!(
                out,
                "To actually abort these incomplete uploads, pass the --abort flag"
            )
            .context("failed to write to stdout")?;
        }
        Gate::Forced => abort_and_report(cl, &results, out).await?,
        Gate::Prompt => {
            let mut prompt = Prompt::new(input);
            let confirmed = prompt.confirm(out, QUESTION).await;

            let res = match confirmed {
                Ok(true) => abort_and_report(cl, &results, out).await,
                Ok(false) => writeln!(out, "Okay, not aborting anything.")
                    .context("failed to write to stdout")
                    .map_err(Error::from),
                Err(err) => Err(err.into()),
            };

            prompt.close();
            res?;
        }
    }

    Ok(())
}

async fn abort_and_report<S, W>(cl: &S, results: &[BucketUploads], out: &mut W) -> Result<(), Error>
where
    S: Storage + ?Sized,
    W: Write,
{
    let count = abort_uploads(cl, results).await.map_err(|err| {
        log::error!("stopped after {} abort attempts", err.attempted);
        err
    })?;

    writeln!(out, "Aborted {} multipart uploads.", count).context("failed to write to stdout")?;

    Ok(())
}
