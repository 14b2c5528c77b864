use anyhow::{Context, Result};

use gplus_dashboard::config::{AppConfig, load_dotenv};
use gplus_dashboard::observe::{init_tracing, tracing_observer};
use gplus_dashboard::proxy;

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    init_tracing("info");

    let mut config = AppConfig::from_env();
    if let Some(bind) = arg_value("--bind") {
        config.proxy_bind = bind
            .parse()
            .with_context(|| format!("invalid --bind address {bind}"))?;
    }
    if let Some(upstream) = arg_value("--upstream") {
        config.upstream_base = upstream.trim_end_matches('/').to_string();
    }

    proxy::serve(&config, tracing_observer())
        .await
        .context("proxy failed")
}

fn arg_value(flag: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == flag {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}
