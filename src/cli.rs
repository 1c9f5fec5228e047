use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use garmin_strava_sync::common::types::{AccessToken, ClientCredentials, Credentials};
use garmin_strava_sync::config::{
    self, AppConfig, ConfigOverrides, StravaAccess, apply_overrides, load_config,
};
use garmin_strava_sync::garmin::{GarminEndpoints, GarminSession};
use garmin_strava_sync::strava::{AuthorizeWait, StravaAuthorizer, StravaClient, StravaEndpoints};
use garmin_strava_sync::sync::{SyncJob, TerminalPrompt, UploadErrorPolicy};

use crate::shutdown::Interrupts;

#[derive(Parser, Debug)]
#[command(
    name = "garmin-strava-sync",
    about = "Syncs activities from Garmin Connect to Strava, one at a time with prompts"
)]
pub(crate) struct Cli {
    /// Garmin Connect username (when not set in config)
    #[arg(value_name = "USERNAME")]
    username_arg: Option<String>,

    /// Garmin Connect password (when not set in config)
    #[arg(value_name = "PASSWORD")]
    password_arg: Option<String>,

    /// Config file (default: the platform config dir, garmin-strava-sync/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Garmin Connect username, takes precedence over the positional argument
    #[arg(long)]
    username: Option<String>,

    /// Garmin Connect password, takes precedence over the positional argument.
    /// Visible in process listings; prefer the config file or GSYNC_GARMIN__PASSWORD.
    #[arg(long)]
    password: Option<String>,

    /// Upload activities as private
    #[arg(long)]
    private: bool,

    /// Keep going when an export or upload fails instead of stopping the run
    #[arg(long)]
    continue_on_error: bool,

    /// Give up waiting for the Strava browser authorization after this many seconds
    #[arg(long, value_name = "SECS")]
    authorize_timeout: Option<u64>,

    /// Print the most recent Strava activity and exit
    #[arg(long)]
    latest: bool,

    /// Debug-level logging
    #[arg(short, long)]
    pub(crate) verbose: bool,

    /// Log as JSON lines
    #[arg(long)]
    pub(crate) json_logs: bool,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            username: self.username.clone().or_else(|| self.username_arg.clone()),
            password: self.password.clone().or_else(|| self.password_arg.clone()),
            private: self.private.then_some(true),
            on_upload_error: self.continue_on_error.then_some(UploadErrorPolicy::Continue),
            authorize_timeout_secs: self.authorize_timeout,
        }
    }
}

async fn strava_token(
    config: &AppConfig,
    config_file: &std::path::Path,
    interrupts: &Interrupts,
) -> Result<AccessToken> {
    let (client_id, client_secret) = match config.strava_access()? {
        StravaAccess::Token(token) => return Ok(AccessToken::new(token)),
        StravaAccess::Authorize {
            client_id,
            client_secret,
        } => (client_id, client_secret),
    };

    let callback_addr = SocketAddr::from((Ipv4Addr::LOCALHOST, config.strava.callback_port));
    let authorizer = StravaAuthorizer::new(
        StravaEndpoints::default(),
        callback_addr,
        config.strava.scope.clone(),
        config.http_timeout(),
    )?;

    let mut wait = AuthorizeWait::default().with_cancel(interrupts.token());
    if let Some(timeout) = config.authorize_timeout() {
        wait = wait.with_timeout(timeout);
    }

    let credentials = ClientCredentials {
        client_id: client_id.to_string(),
        client_secret: client_secret.to_string(),
    };
    let token = {
        let _guard = interrupts.cancellable_wait();
        authorizer
            .authorize(&credentials, &wait, |url| {
                println!("Visit this URL in a browser: {url}");
            })
            .await
            .context("Strava authorization failed")?
    };

    println!(
        "Set strava.access_token = \"{}\" in {} to skip this step next time",
        token.as_str(),
        config_file.display()
    );
    Ok(token)
}

pub(crate) async fn cli_main(args: Cli, interrupts: Interrupts) -> Result<()> {
    let config_file = args.config.clone().unwrap_or_else(config::config_path);
    let config = load_config(Some(&config_file))?;
    let config = apply_overrides(config, &args.overrides());
    tracing::debug!("Configuration: {:?}", config);

    let token = strava_token(&config, &config_file, &interrupts).await?;
    let strava = StravaClient::new(StravaEndpoints::default(), token, config.http_timeout())?;

    if args.latest {
        match strava.latest_activity().await? {
            Some(activity) => println!("{activity}"),
            None => println!("No activities found on Strava"),
        }
        return Ok(());
    }

    let (username, password) = config.garmin_credentials()?;
    let credentials = Credentials {
        username: username.to_string(),
        password: password.to_string(),
    };
    let garmin = GarminSession::establish(
        GarminEndpoints::default(),
        &credentials,
        config.http_timeout(),
    )
    .await
    .context("Garmin Connect login failed")?;

    let stdin = io::stdin();
    let mut prompt = TerminalPrompt::new(stdin.lock(), io::stdout());
    let mut job = SyncJob::new(&garmin, &strava, config.sync_options());
    let report = job.run(&mut prompt).await?;

    println!(
        "Uploaded {}, skipped {}, failed {}",
        report.uploaded, report.skipped, report.failed
    );
    Ok(())
}
