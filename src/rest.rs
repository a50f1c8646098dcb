//! Market catalog discovery.
//!
//! One REST round trip per refresh, entirely outside the streaming path:
//! Hyperliquid's `/info` endpoint returns the listed universe together with
//! per-asset context (mark price, previous-day price, volume, open
//! interest, funding). Lighter publishes no keyless metadata endpoint, so
//! its catalog is the static set of markets the stream supports; live
//! prices for those come from [`crate::ticker::TickerState`].

use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::config::Config;
use crate::types::{Exchange, Market, Symbol};
use crate::{Error, Result};

#[derive(Debug, Deserialize)]
struct HlMeta {
    universe: Vec<HlAsset>,
}

#[derive(Debug, Deserialize)]
struct HlAsset {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HlAssetCtx {
    day_ntl_vlm: String,
    funding: String,
    mark_px: String,
    open_interest: String,
    prev_day_px: String,
}

/// Fetch the catalog of markets across all supported exchanges
pub async fn fetch_markets(config: &Config) -> Result<Vec<Market>> {
    let client = Client::builder().timeout(config.http_timeout()).build()?;

    let (meta, ctxs): (HlMeta, Vec<HlAssetCtx>) = client
        .post(config.hyperliquid_info_url())
        .json(&serde_json::json!({ "type": "metaAndAssetCtxs" }))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    if meta.universe.len() != ctxs.len() {
        return Err(Error::Catalog(format!(
            "universe has {} assets but {} contexts",
            meta.universe.len(),
            ctxs.len()
        )));
    }

    let mut markets = build_hyperliquid_markets(meta, ctxs);
    markets.extend(lighter_markets());
    Ok(markets)
}

fn build_hyperliquid_markets(meta: HlMeta, ctxs: Vec<HlAssetCtx>) -> Vec<Market> {
    let hundred = Decimal::from(100);
    meta.universe
        .into_iter()
        .zip(ctxs)
        .filter_map(|(asset, ctx)| {
            // an asset with no parseable mark price is not displayable
            let mark: Decimal = ctx.mark_px.parse().ok()?;
            let prev: Option<Decimal> = ctx.prev_day_px.parse().ok();
            let change_24h = prev
                .filter(|p| !p.is_zero())
                .map(|p| (mark - p) / p * hundred);
            let open_interest = ctx
                .open_interest
                .parse::<Decimal>()
                .ok()
                .map(|oi| oi * mark);
            // hourly funding rate -> daily percentage
            let funding_rate = ctx
                .funding
                .parse::<Decimal>()
                .ok()
                .map(|f| f * Decimal::from(24) * hundred);

            Some(Market {
                symbol: Symbol::new(Exchange::Hyperliquid, asset.name, "USD"),
                price: mark,
                change_24h,
                volume_24h: ctx.day_ntl_vlm.parse().ok(),
                open_interest,
                funding_rate,
            })
        })
        .collect()
}

/// Markets reachable over the Lighter stream; statistics are filled in at
/// runtime by the ticker table
fn lighter_markets() -> Vec<Market> {
    ["WETH", "WBTC"]
        .into_iter()
        .map(|base| Market {
            symbol: Symbol::new(Exchange::Lighter, base, "USDC"),
            price: Decimal::ZERO,
            change_24h: None,
            volume_24h: None,
            open_interest: None,
            funding_rate: None,
        })
        .collect()
}
