use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use volprice_common::PriceUnit;

fn about_message() -> String {
    format!(
        "Looks up EBS volume prices and tracks savings from removed volumes\nVersion: {}",
        env!("CARGO_PKG_VERSION")
    )
}

#[derive(Parser, Clone, Debug)]
#[clap(name = "volprice", about = about_message(), version)]
pub struct Cli {
    /// TOML file layered over the built-in defaults
    #[clap(long, global = true)]
    pub config: Option<String>,
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SourceKind {
    /// Regional bulk offer file over HTTPS
    #[default]
    Offers,
    /// Pricing query service (needs AWS credentials)
    Query,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the unit price of one volume type in a region
    Lookup {
        /// Volume API name (gp3, io2, ...), category label or "Provisioned IOPS"
        volume_type: String,
        #[clap(long)]
        region: String,
        #[clap(long, value_enum, default_value_t = SourceKind::Offers)]
        source: SourceKind,
        /// Read the catalog from a local offer file instead of fetching it
        #[clap(long)]
        catalog_file: Option<PathBuf>,
        /// Force the price unit (GB-Mo or IOPS-Mo)
        #[clap(long)]
        unit: Option<PriceUnit>,
    },

    /// Print the GB-month price of every volume type in a region
    Prices {
        #[clap(long)]
        region: String,
        #[clap(long, default_value = "Storage")]
        family: String,
        #[clap(long)]
        catalog_file: Option<PathBuf>,
    },

    /// List every location's price for one volume API name
    Listings {
        volume_type: String,
        /// Only keep locations containing this text, e.g. "GovCloud"
        #[clap(long)]
        location_contains: Option<String>,
        #[clap(long)]
        catalog_file: Option<PathBuf>,
        /// Also write each listing to the DynamoDB listings table
        #[clap(long)]
        store: bool,
        /// Listings table, defaults to `listings_table` from the config
        #[clap(long, requires = "store")]
        table: Option<String>,
        /// Region of the listings table, defaults to `listings_region`
        #[clap(long, requires = "store")]
        store_region: Option<String>,
        /// Keep the listings in memory instead of writing to DynamoDB
        #[clap(long, requires = "store")]
        dry_run: bool,
    },

    /// Add the monthly cost of a removed volume to the account's savings
    TrackSavings {
        #[clap(long)]
        account: String,
        #[clap(long)]
        region: String,
        #[clap(long)]
        volume_type: String,
        #[clap(long)]
        size_gib: u64,
        /// Keep the record in memory instead of writing to DynamoDB
        #[clap(long)]
        dry_run: bool,
        #[clap(long)]
        catalog_file: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_lookup_with_unit() {
        let cli = Cli::parse_from([
            "volprice",
            "lookup",
            "Provisioned IOPS",
            "--region",
            "us-east-1",
            "--unit",
            "iops-mo",
        ]);

        match cli.command {
            Command::Lookup {
                volume_type,
                region,
                source,
                unit,
                catalog_file,
            } => {
                assert_eq!(volume_type, "Provisioned IOPS");
                assert_eq!(region, "us-east-1");
                assert_eq!(source, SourceKind::Offers);
                assert_eq!(unit, Some(PriceUnit::IopsMonth));
                assert!(catalog_file.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let cli = Cli::parse_from([
            "volprice",
            "track-savings",
            "--account",
            "123456789012",
            "--region",
            "us-gov-west-1",
            "--volume-type",
            "gp2",
            "--size-gib",
            "100",
            "--dry-run",
            "--config",
            "volprice.toml",
        ]);

        assert_eq!(cli.config.as_deref(), Some("volprice.toml"));
        assert!(matches!(
            cli.command,
            Command::TrackSavings { size_gib: 100, dry_run: true, .. }
        ));
    }

    #[test]
    fn test_parse_listings_store() {
        let cli = Cli::parse_from([
            "volprice",
            "listings",
            "gp2",
            "--location-contains",
            "GovCloud",
            "--store",
            "--table",
            "VolumePricing",
            "--dry-run",
        ]);

        match cli.command {
            Command::Listings {
                volume_type,
                store,
                table,
                store_region,
                dry_run,
                ..
            } => {
                assert_eq!(volume_type, "gp2");
                assert!(store);
                assert_eq!(table.as_deref(), Some("VolumePricing"));
                assert!(store_region.is_none());
                assert!(dry_run);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_listings_table_requires_store() {
        let result = Cli::try_parse_from(["volprice", "listings", "gp2", "--table", "VolumePricing"]);
        assert!(result.is_err());

        let result = Cli::try_parse_from(["volprice", "listings", "gp2", "--dry-run"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_unit_is_rejected() {
        let result = Cli::try_parse_from([
            "volprice", "lookup", "gp3", "--region", "us-east-1", "--unit", "hours",
        ]);
        assert!(result.is_err());
    }
}
