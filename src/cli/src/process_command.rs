use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Parser;
use rust_decimal::Decimal;
use volprice_aws::{
    resolve_sdk_config, DynamoListingSink, DynamoSavingsSink, EbsFilterBuilder, OfferClient,
    PricingQueryClient, PricingSource,
};
use volprice_common::pricing::{
    listings, store_listings, volume_price_table, InMemoryListingSink, PriceListing,
};
use volprice_common::savings::{monthly_savings, InMemorySink, SavingsSink, SavingsTracker};
use volprice_common::{Catalog, PriceQuery, PriceUnit};

use crate::commands::{Cli, Command, SourceKind};
use crate::config::{Config, ConfigLoader};
use crate::logging::setup_logging;

pub fn process_cli() -> Result<()> {
    let cli = Cli::parse();
    // Use the --config flag, if provided, when loading the configuration
    let config = ConfigLoader::load_config(cli.config.as_deref())?;
    setup_logging(&config)?;

    let runtime = tokio::runtime::Runtime::new()?;
    let stdout = std::io::stdout();
    runtime.block_on(run_command(cli.command, &config, &mut stdout.lock()))
}

pub async fn run_command<W: Write>(command: Command, config: &Config, out: &mut W) -> Result<()> {
    match command {
        Command::Lookup {
            volume_type,
            region,
            source,
            catalog_file,
            unit,
        } => {
            let source = pricing_source(config, source, catalog_file.as_deref()).await?;
            let mut query = PriceQuery::new(region, volume_type);
            if let Some(unit) = unit {
                query = query.with_unit(unit);
            }

            match source.lookup_price(&query, &config.service_code).await? {
                Some(price) => writeln!(
                    out,
                    "{} in {}: {} USD per {}",
                    query.resource_type,
                    query.region,
                    price,
                    query.expected_unit()
                )?,
                None => writeln!(
                    out,
                    "No pricing found for {} in {}",
                    query.resource_type, query.region
                )?,
            }
        }

        Command::Prices {
            region,
            family,
            catalog_file,
        } => {
            let catalog = match catalog_file {
                Some(path) => read_catalog(&path)?,
                None => offer_client(config)?
                    .fetch(&region, &config.service_code)
                    .await
                    .with_context(|| format!("failed to fetch offer file for {region}"))?,
            };

            let table = volume_price_table(&catalog, &region, &family);
            if table.prices.is_empty() {
                writeln!(out, "No {family} pricing found in {region}")?;
            }
            for (name, price) in &table.prices {
                let marker = if table.umbrella_variants.contains(name) {
                    " (General Purpose)"
                } else {
                    ""
                };
                writeln!(out, "{name}: {price} USD per GB-Mo{marker}")?;
            }
            for name in table
                .umbrella_variants
                .iter()
                .filter(|name| !table.prices.contains_key(*name))
            {
                writeln!(
                    out,
                    "Note: {name} is listed under General Purpose but has no GB-Mo price"
                )?;
            }
        }

        Command::Listings {
            volume_type,
            location_contains,
            catalog_file,
            store,
            table,
            store_region,
            dry_run,
        } => {
            let catalog = match catalog_file {
                Some(path) => read_catalog(&path)?,
                None => {
                    let client = query_client(config).await?;
                    client
                        .fetch_catalog(
                            &config.service_code,
                            &EbsFilterBuilder::for_volume_api_name(&volume_type),
                        )
                        .await
                        .with_context(|| format!("failed to query pricing for {volume_type}"))?
                }
            };

            let entries: Vec<_> = listings(&catalog, location_contains.as_deref())
                .into_iter()
                .filter(|entry| entry.volume_api_name.as_deref() == Some(volume_type.as_str()))
                .collect();
            if entries.is_empty() {
                writeln!(out, "No listings found for {volume_type}")?;
            }
            for entry in &entries {
                writeln!(
                    out,
                    "{}\t{}\t{}\t{} USD per {}",
                    entry.location.as_deref().unwrap_or("N/A"),
                    entry.volume_api_name.as_deref().unwrap_or("N/A"),
                    entry.storage_media.as_deref().unwrap_or("N/A"),
                    entry
                        .price_usd
                        .map(|price| price.to_string())
                        .unwrap_or_else(|| "N/A".to_string()),
                    entry.unit.as_deref().unwrap_or("N/A"),
                )?;
            }

            if store {
                let table = table.unwrap_or_else(|| config.listings_table.clone());
                let region = store_region.unwrap_or_else(|| config.listings_region.clone());
                persist_listings(config, &entries, &table, &region, dry_run, out).await?;
            }
        }

        Command::TrackSavings {
            account,
            region,
            volume_type,
            size_gib,
            dry_run,
            catalog_file,
        } => {
            let source = pricing_source(config, SourceKind::Offers, catalog_file.as_deref()).await?;
            let query = PriceQuery::new(&region, &volume_type).with_unit(PriceUnit::GbMonth);

            let Some(price) = source.lookup_price(&query, &config.service_code).await? else {
                bail!("No GB-month price for {volume_type} in {region}, nothing recorded");
            };

            if dry_run {
                let tracker = SavingsTracker::new(InMemorySink::new())
                    .with_max_attempts(config.savings_max_attempts);
                record_savings(&tracker, &account, &region, size_gib, price, out).await?;
            } else {
                let sdk_config = resolve_sdk_config(
                    config.aws_credentials.clone(),
                    &region,
                    config.request_timeout(),
                )
                .await
                .context("No AWS credentials available for the savings table")?;
                let tracker =
                    SavingsTracker::new(DynamoSavingsSink::new(&sdk_config, &config.savings_table))
                        .with_max_attempts(config.savings_max_attempts);
                record_savings(&tracker, &account, &region, size_gib, price, out).await?;
            }
        }
    }

    Ok(())
}

async fn record_savings<S: SavingsSink, W: Write>(
    tracker: &SavingsTracker<S>,
    account: &str,
    region: &str,
    size_gib: u64,
    price: Decimal,
    out: &mut W,
) -> Result<()> {
    let saved = monthly_savings(size_gib, price)
        .with_context(|| format!("savings for {size_gib} GiB at {price} USD per GB-Mo overflow"))?;
    let record = tracker
        .record(account, region, size_gib, price)
        .await
        .with_context(|| format!("failed to record savings for {account} in {region}"))?;

    writeln!(
        out,
        "Monthly savings: {} USD ({} GiB at {} USD per GB-Mo)",
        saved.normalize(),
        size_gib,
        price
    )?;
    writeln!(
        out,
        "Total for {} in {}: {} GiB, {} USD",
        record.account_id,
        record.region,
        record.total_size_gib,
        record.total_cost.normalize()
    )?;
    Ok(())
}

async fn persist_listings<W: Write>(
    config: &Config,
    entries: &[PriceListing],
    table: &str,
    region: &str,
    dry_run: bool,
    out: &mut W,
) -> Result<()> {
    if dry_run {
        let stored = store_listings(&InMemoryListingSink::new(), entries).await?;
        writeln!(out, "Would store {stored} listings in {table} (dry run)")?;
        return Ok(());
    }

    let sdk_config = resolve_sdk_config(
        config.aws_credentials.clone(),
        region,
        config.request_timeout(),
    )
    .await
    .context("No AWS credentials available for the listings table")?;
    let stored = store_listings(&DynamoListingSink::new(&sdk_config, table), entries)
        .await
        .with_context(|| format!("failed to store listings in {table}"))?;
    writeln!(out, "Stored {stored} listings in {table}")?;
    Ok(())
}

fn read_catalog(path: &Path) -> Result<Catalog> {
    let raw = std::fs::read(path)
        .with_context(|| format!("failed to read catalog file {}", path.display()))?;
    Catalog::from_json_slice(&raw)
        .with_context(|| format!("catalog file {} is not valid JSON", path.display()))
}

fn offer_client(config: &Config) -> Result<OfferClient> {
    Ok(OfferClient::new(&config.offers_base_url, config.request_timeout())?
        .with_retry_attempts(config.retry_attempts))
}

async fn query_client(config: &Config) -> Result<PricingQueryClient> {
    let sdk_config = resolve_sdk_config(
        config.aws_credentials.clone(),
        &config.pricing_api_region,
        config.request_timeout(),
    )
    .await
    .context("No AWS credentials available for the pricing query service")?;
    Ok(PricingQueryClient::new(&sdk_config).with_retry_attempts(config.retry_attempts))
}

async fn pricing_source(
    config: &Config,
    kind: SourceKind,
    catalog_file: Option<&Path>,
) -> Result<PricingSource> {
    if let Some(path) = catalog_file {
        return Ok(PricingSource::Static(read_catalog(path)?));
    }

    Ok(match kind {
        SourceKind::Offers => PricingSource::Offers(offer_client(config)?),
        SourceKind::Query => PricingSource::Query(query_client(config).await?),
    })
}
