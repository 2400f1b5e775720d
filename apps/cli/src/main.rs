#![deny(warnings)]

//! Headless CLI: opens the local save, replays scripted actions and prints
//! the resulting statistics and upgrade listing.

mod config;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use config::AppConfig;
use persistence::{ensure_sqlite_dir, SqliteStore};
use session::{GameEvent, PurchaseOutcome, Session, UpgradeTier};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default, PartialEq)]
struct Args {
    config: Option<PathBuf>,
    db: Option<String>,
    clicks: u32,
    buys: Vec<UpgradeTier>,
    avatar: Option<String>,
    clear_avatar: bool,
}

fn parse_args(raw: impl IntoIterator<Item = String>) -> Result<Args> {
    let mut args = Args::default();
    let mut it = raw.into_iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => {
                args.config = Some(it.next().context("--config needs a path")?.into());
            }
            "--db" => args.db = Some(it.next().context("--db needs a URL")?),
            "--clicks" => {
                let n = it.next().context("--clicks needs a count")?;
                args.clicks = n.parse().with_context(|| format!("invalid click count: {n}"))?;
            }
            "--buy" => {
                let tier = it.next().context("--buy needs small, medium or large")?;
                args.buys.push(tier.parse()?);
            }
            "--avatar" => args.avatar = Some(it.next().context("--avatar needs a URI")?),
            "--clear-avatar" => args.clear_avatar = true,
            other => bail!("unknown argument: {other}"),
        }
    }
    Ok(args)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args(std::env::args().skip(1))?;
    let mut cfg = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(db) = &args.db {
        cfg.database_url = db.clone();
    }

    // Logging setup
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!(db = %cfg.database_url, clicks = args.clicks, buys = args.buys.len(), "starting CLI");
    ensure_sqlite_dir(&cfg.database_url)?;
    let store = SqliteStore::connect(&cfg.database_url).await?;
    let mut session = Session::new(store, &cfg.session);

    // Stand-in for sound playback.
    let mut events = session.subscribe_events();
    let listener = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(GameEvent::CoinEarned) => debug!("cue: coin"),
                Ok(GameEvent::UpgradePurchased) => info!("cue: upgrade"),
                Err(RecvError::Lagged(skipped)) => debug!(skipped, "feedback cues skipped"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let state = session.start().await;
    info!(coins = state.coins, coins_per_click = state.coins_per_click, "session ready");

    for _ in 0..args.clicks {
        session.dispatch_click()?;
    }
    for tier in &args.buys {
        match session.dispatch_tier(*tier)? {
            PurchaseOutcome::Purchased => println!(
                "Bought {} | income now {} per click",
                tier.label(),
                session.state().coins_per_click
            ),
            PurchaseOutcome::InsufficientFunds { cost, coins } => println!(
                "Cannot afford {} | costs {} | have {}",
                tier.label(),
                cost,
                coins
            ),
        }
    }
    if args.clear_avatar {
        session.set_avatar_reference(None)?;
    } else if let Some(uri) = args.avatar {
        session.set_avatar_reference(Some(uri))?;
    }

    let stats = session.stats();
    println!(
        "Stats | coins: {} | per click: {} | clicks: {} | earned: {} | avatar: {}",
        stats.coins,
        stats.coins_per_click,
        stats.total_clicks,
        stats.total_earned,
        session.state().avatar_reference.as_deref().unwrap_or("none")
    );
    for offer in session.pricing().offers() {
        println!(
            "Upgrade | {:<14} | cost: {:>8} | bonus: +{} per click | {}",
            offer.tier.label(),
            offer.cost,
            offer.bonus,
            if offer.is_affordable(stats.coins) { "available" } else { "too expensive" }
        );
    }

    session.shutdown().await;
    listener.await.context("event listener")?;
    Ok(())
}
