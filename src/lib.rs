//! # bookgen
//!
//! Async client for a book generation backend: fill in a [`BookConfig`],
//! submit it, poll the job until it finishes, and save the resulting
//! `.docx`.
//!
//! ```no_run
//! use bookgen::{BookApiClient, ClientConfig, FileDownloader, GenerationSession, StatusPoller};
//!
//! # async fn example() -> bookgen::Result<()> {
//! let config = ClientConfig::from_env()?;
//! let api = BookApiClient::from_config(&config);
//! let poller = StatusPoller::from_config(&config);
//! let downloader = FileDownloader::new(api.clone(), &config.output_dir);
//!
//! let mut session = GenerationSession::new();
//! session.set_field("title", "The Lighthouse Keeper")?;
//! session.set_field("genre", "mystery")?;
//! let outcome = session.generate(&api, &poller, &downloader).await?;
//! println!("{:?}", outcome);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{BookError, Result};
pub use models::{
    BookConfig, BookLength, DownloadRequest, GenerateResponse, Genre, JobStatus, StatusResponse,
};
pub use services::api::BookApiClient;
pub use services::download::{DownloadHandler, FileDownloader};
pub use services::poller::{PollOutcome, StatusPoller};
pub use services::session::{GenerationSession, Phase, SessionOutcome};
