mod app;
mod cmd_abort;
mod cmd_find;
mod config;
mod confirm;
mod error;
mod options;
mod report;
mod s3;

use std::process::ExitCode;

use config::Settings;
use error::Error;
use options::{Options, OPTION_DEFS};
use s3::S3Client;

use clap::{ArgAction, Parser};
use tokio::io::BufReader;

#[derive(Parser)]
#[command(
    name = "abort-incomplete-multipart",
    about = "Find and abort incomplete S3 multipart uploads",
    version,
    disable_help_flag = true,
    args_override_self = true
)]
pub struct Cli {
    #[arg(long = "help", action = ArgAction::Help, help = "Show this page")]
    help: Option<bool>,

    #[arg(
        long = "bucket",
        value_name = "name",
        help = "Only find uploads in this bucket (optional)"
    )]
    bucket: Option<Option<String>>,

    #[arg(
        long = "prefix",
        value_name = "key",
        help = "Only find uploads with this key prefix (optional)"
    )]
    prefix: Option<Option<String>>,

    #[arg(long = "abort", help = "Abort the uploads that are found (after prompt)")]
    abort: bool,

    #[arg(long = "force", help = "Don't prompt to confirm abortion")]
    force: bool,

    #[arg(long = "profile", value_name = "name", help = "Credentials profile to use")]
    profile: Option<String>,

    #[arg(long = "region", value_name = "name", help = "Region to connect to")]
    region: Option<String>,
}

impl Cli {
    fn options(&self) -> Options {
        Options {
            bucket: self.bucket.clone().into(),
            prefix: self.prefix.clone().into(),
            abort: self.abort,
            force: self.force,
        }
    }
}

/// The SDK logs its provider chains at info level.
const DEFAULT_LOG_FILTER: &str = "info,aws_config=warn";

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init_from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, DEFAULT_LOG_FILTER),
    );

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match execute(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            err.report();
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: &Cli) -> Result<(), Error> {
    let options = cli.options();
    let connect = move || async move {
        let settings = Settings::resolve(cli.profile.as_deref(), cli.region.as_deref())?;
        Ok::<_, Error>(S3Client::new(&settings).await)
    };

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();

    app::execute(&options, OPTION_DEFS, connect, stdin, &mut stdout).await
}
