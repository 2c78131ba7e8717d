// region:    --- Imports
use auction_platform::config::Options;
use auction_platform::server;
use clap::Parser;
use tracing::error;
// endregion: --- Imports

// region:    --- Main
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 로드 (없으면 무시)
    let _ = dotenvy::dotenv();

    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    let result = match Options::parse() {
        Options::Auction(opts) => server::run_auction(opts).await,
        Options::Search(opts) => server::run_search(opts).await,
    };

    if let Err(e) = &result {
        error!("{:<12} --> 서비스 종료: {:?}", "Main", e);
    }
    result
}
// endregion: --- Main
