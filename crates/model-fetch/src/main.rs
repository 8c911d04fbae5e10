//! model-fetch: materialize every repository the service needs into the
//! local artifact cache.
//!
//! Takes no arguments. Exits 1 on the first failed repository.

use std::process::ExitCode;

use model_fetch::{
    download_headline, write_failure, Fetcher, ModelCache, HF_ENDPOINT, REPOS_TO_DOWNLOAD,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "model_fetch=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let fetcher = match ModelCache::default_location()
        .and_then(|cache| Fetcher::new(cache, HF_ENDPOINT).map_err(anyhow::Error::from))
    {
        Ok(fetcher) => fetcher,
        Err(e) => return fail(format!("Error preparing download: {:#}", e)),
    };

    println!("--- Starting download of all required repositories ---");

    if let Err(e) = fetcher.download_all(REPOS_TO_DOWNLOAD).await {
        return fail(download_headline(&e));
    }

    println!("\n--- All repositories downloaded successfully ---");
    println!("Local artifact cache: {}", fetcher.cache().root().display());
    ExitCode::SUCCESS
}

fn fail(headline: String) -> ExitCode {
    let _ = write_failure(&mut std::io::stderr(), headline);
    ExitCode::FAILURE
}
