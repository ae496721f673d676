use anyhow::{Context, bail};
use bookgen::{
    BookApiClient, ClientConfig, DownloadHandler, FileDownloader, GenerationSession, StatusPoller,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::{EnvFilter, fmt};

const USAGE: &str = "usage:
  bookgen title=<title> [author=<name>] [genre=<genre>] [chapters=<1-20>] [length=<short|medium|long>]
  bookgen jobs

genres: fiction, non-fiction, mystery, romance, sci-fi, fantasy";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = ClientConfig::from_env().context("invalid BOOKGEN_* configuration")?;
    let api = BookApiClient::from_config(&config);
    let args: Vec<String> = std::env::args().skip(1).collect();

    match args.first().map(String::as_str) {
        None | Some("-h") | Some("--help") => {
            println!("{}", USAGE);
            Ok(())
        }
        Some("jobs") => list_jobs(&api).await,
        Some(_) => generate(&api, &config, &args).await,
    }
}

async fn list_jobs(api: &BookApiClient) -> anyhow::Result<()> {
    let jobs = api.list_jobs().await?;
    if jobs.is_empty() {
        println!("No jobs");
    }
    for (job_id, status) in jobs {
        println!(
            "{}  {:?}  {:>3}%  {}",
            job_id, status.status, status.progress, status.message
        );
    }
    Ok(())
}

async fn generate(api: &BookApiClient, config: &ClientConfig, args: &[String]) -> anyhow::Result<()> {
    let mut session = GenerationSession::new();
    for arg in args {
        let Some((name, value)) = arg.split_once('=') else {
            bail!("expected field=value, got '{}'\n\n{}", arg, USAGE);
        };
        session.set_field(name, value)?;
    }
    if !session.can_submit() {
        bail!("a book title is required\n\n{}", USAGE);
    }

    let cancel = Arc::new(AtomicBool::new(false));
    let poller = StatusPoller::from_config(config).with_cancellation(cancel.clone());
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.store(true, Ordering::Relaxed);
        }
    });

    let job_id = match session.submit(api).await {
        Ok(id) => id,
        Err(e) => bail!("{} ({})", session.error().unwrap_or_default(), e),
    };
    println!("Job {}: {}", job_id, session.status_message());

    let outcome = poller
        .watch(api, &job_id, |status| {
            session.record_status(status);
            println!("[{:>3}%] {}", session.progress(), session.status_message());
        })
        .await;

    let downloader = FileDownloader::new(api.clone(), &config.output_dir);
    match session.finish(api, outcome) {
        Some(request) => {
            let path = downloader.handle(&request).await?;
            println!("Saved {}", path.display());
            Ok(())
        }
        None => match session.error() {
            Some(message) => bail!("{}", message),
            None => {
                println!("Cancelled");
                Ok(())
            }
        },
    }
}
