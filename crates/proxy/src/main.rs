use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use rate_gateway::BinanceP2pClient;
use rate_proxy::{router, AppState, BinanceRateFeed};
use tokio::net::TcpListener;
use tracing::info;
use usdt_bob_common::config::Platform;

/// Self-hosted stand-in for the deployed proxy functions.
#[derive(Parser, Debug)]
#[command(name = "rate-proxy", about = "USDT/BOB rate proxy with permissive CORS")]
struct Args {
    /// Address to listen on. Port 3000 is the one local clients probe first.
    #[arg(long, default_value = "127.0.0.1:3000")]
    bind: SocketAddr,

    /// Alternate exchange endpoint (stubs, mirrors).
    #[arg(long)]
    upstream_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let gateway = match &args.upstream_url {
        Some(url) => BinanceP2pClient::with_base_url(url),
        None => BinanceP2pClient::new(),
    };
    let state = AppState::new(Arc::new(BinanceRateFeed::with_gateway(gateway)));

    let listener = TcpListener::bind(args.bind).await?;

    info!("Rate proxy starting on http://{}", args.bind);
    info!("Available endpoints:");
    info!("  POST {} - aggregated USDT/BOB rates", Platform::Vercel.route());
    info!("  POST {} - same handler, netlify path", Platform::Netlify.route());
    info!("  GET  /api/test - service check");
    info!("  GET  /api/index - endpoint directory");

    axum::serve(listener, router(state)).await?;

    Ok(())
}
