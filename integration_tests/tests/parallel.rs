use std::sync::Arc;

use rust_decimal::Decimal;
use volprice_aws::PricingSource;
use volprice_common::savings::{InMemorySink, SavingsSink, SavingsTracker};
use volprice_common::PriceQuery;

mod common;

use common::{regional_offers, OfferServer, SERVICE};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_savings_updates_are_not_lost() {
    let server = OfferServer::launch(regional_offers()).await;
    let source = PricingSource::Offers(server.client());
    let price = source
        .lookup_price(&PriceQuery::new("us-east-1", "gp3"), SERVICE)
        .await
        .unwrap()
        .unwrap();

    let sink = Arc::new(InMemorySink::new());
    let workers = 32u64;
    let mut handles = Vec::new();

    for _ in 0..workers {
        let tracker = SavingsTracker::new(sink.clone()).with_max_attempts(1_000);
        handles.push(tokio::spawn(async move {
            tracker.record("123456789012", "us-east-1", 100, price).await
        }));
    }

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stored = sink.get("123456789012", "us-east-1").await.unwrap().unwrap();
    assert_eq!(stored.version, workers);
    assert_eq!(stored.total_size_gib, workers * 100);
    assert_eq!(stored.total_cost, Decimal::from(workers) * Decimal::from(8));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn accounts_and_regions_are_tracked_separately() {
    let sink = Arc::new(InMemorySink::new());
    let mut handles = Vec::new();

    for account in ["111111111111", "222222222222"] {
        for region in ["us-east-1", "us-gov-west-1"] {
            let tracker = SavingsTracker::new(sink.clone());
            handles.push(tokio::spawn(async move {
                tracker.record(account, region, 10, Decimal::ONE).await
            }));
        }
    }

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap().version, 1);
    }
    assert_eq!(sink.len().await, 4);
}
