use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;

const CATALOG: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/us-gov-west-1.json");

fn volprice() -> Command {
    let mut cmd = Command::cargo_bin("volprice").unwrap();
    // Nothing listens on port 1, so any accidental network call fails fast.
    cmd.env("VOLPRICE_OFFERS_BASE_URL", "http://127.0.0.1:1")
        .env("VOLPRICE_REQUEST_TIMEOUT_SECS", "2")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn lookup_prints_price() {
    volprice()
        .args(["lookup", "gp3", "--region", "us-gov-west-1", "--catalog-file", CATALOG])
        .assert()
        .success()
        .stdout("gp3 in us-gov-west-1: 0.096 USD per GB-Mo\n");
}

#[test]
fn lookup_provisioned_iops() {
    volprice()
        .args([
            "lookup",
            "Provisioned IOPS",
            "--region",
            "us-gov-west-1",
            "--catalog-file",
            CATALOG,
        ])
        .assert()
        .success()
        .stdout(contains("0.078 USD per IOPS-Mo"));
}

#[test]
fn lookup_prefers_api_name_over_category() {
    volprice()
        .args(["lookup", "Cold HDD", "--region", "us-gov-west-1", "--catalog-file", CATALOG])
        .assert()
        .success()
        .stdout(contains("No pricing found for Cold HDD in us-gov-west-1"));
}

#[test]
fn lookup_missing_price_exits_zero() {
    volprice()
        .args(["lookup", "gp3", "--region", "us-east-1", "--catalog-file", CATALOG])
        .assert()
        .success()
        .stdout(contains("No pricing found"));
}

#[test]
fn lookup_unreachable_endpoint_fails() {
    volprice()
        .args(["lookup", "gp3", "--region", "us-east-1"])
        .assert()
        .failure()
        .stderr(contains("Can't process CLI command"));
}

#[test]
fn lookup_rejects_unknown_unit() {
    volprice()
        .args(["lookup", "gp3", "--region", "us-east-1", "--unit", "hours"])
        .assert()
        .failure()
        .stderr(contains("unknown price unit"));
}

#[test]
fn prices_lists_every_volume_type() {
    volprice()
        .args(["prices", "--region", "us-gov-west-1", "--catalog-file", CATALOG])
        .assert()
        .success()
        .stdout(contains("gp2: 0.12 USD per GB-Mo (General Purpose)"))
        .stdout(contains("gp3: 0.096 USD per GB-Mo (General Purpose)"))
        .stdout(contains("sc1: 0.018 USD per GB-Mo\n"))
        .stdout(contains("io1").not());
}

#[test]
fn listings_filter_by_location() {
    volprice()
        .args([
            "listings",
            "gp2",
            "--location-contains",
            "GovCloud",
            "--catalog-file",
            CATALOG,
        ])
        .assert()
        .success()
        .stdout("AWS GovCloud (US-West)\tgp2\tSSD-backed\t0.12 USD per GB-Mo\n");
}

#[test]
fn listings_store_dry_run() {
    volprice()
        .args([
            "listings",
            "gp2",
            "--location-contains",
            "GovCloud",
            "--catalog-file",
            CATALOG,
            "--store",
            "--dry-run",
        ])
        .assert()
        .success()
        .stdout(contains("AWS GovCloud (US-West)\tgp2\tSSD-backed\t0.12 USD per GB-Mo\n"))
        .stdout(contains("Would store 1 listings in VolumePricing (dry run)"));
}

#[test]
fn listings_dry_run_requires_store() {
    volprice()
        .args(["listings", "gp2", "--catalog-file", CATALOG, "--dry-run"])
        .assert()
        .failure();
}

#[test]
fn track_savings_dry_run() {
    volprice()
        .args([
            "track-savings",
            "--account",
            "123456789012",
            "--region",
            "us-gov-west-1",
            "--volume-type",
            "gp2",
            "--size-gib",
            "250",
            "--dry-run",
            "--catalog-file",
            CATALOG,
        ])
        .assert()
        .success()
        .stdout(contains("Monthly savings: 30 USD (250 GiB at 0.12 USD per GB-Mo)"))
        .stdout(contains("Total for 123456789012 in us-gov-west-1: 250 GiB, 30 USD"));
}

#[test]
fn missing_config_file_fails() {
    volprice()
        .args(["--config", "/nonexistent/volprice.toml", "lookup", "gp3", "--region", "us-east-1"])
        .assert()
        .failure();
}

#[test]
fn log_file_receives_records() {
    let dir = tempfile::tempdir().unwrap();
    let log_file = dir.path().join("volprice.log");

    volprice()
        .env("VOLPRICE_LOG_FILE", &log_file)
        .env("VOLPRICE_LOG_LEVEL", "debug")
        .args(["lookup", "gp3", "--region", "us-gov-west-1", "--catalog-file", CATALOG])
        .assert()
        .success();

    let logs = std::fs::read_to_string(&log_file).unwrap();
    assert!(logs.contains("Resolved unit price"));
}
