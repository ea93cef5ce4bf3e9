use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use serde_json::{json, Value};
use volprice_aws::OfferClient;

pub const SERVICE: &str = "AmazonEC2";

/// Serves one offer document per region under the bulk offer file layout and
/// counts the requests it answers.
pub struct OfferServer {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
}

#[derive(Clone)]
struct ServerState {
    offers: Arc<HashMap<String, Value>>,
    hits: Arc<AtomicUsize>,
}

async fn offer_file(
    State(state): State<ServerState>,
    Path((service, region)): Path<(String, String)>,
) -> Result<String, StatusCode> {
    state.hits.fetch_add(1, Ordering::SeqCst);
    if service != SERVICE {
        return Err(StatusCode::NOT_FOUND);
    }
    state
        .offers
        .get(&region)
        .map(Value::to_string)
        .ok_or(StatusCode::NOT_FOUND)
}

impl OfferServer {
    pub async fn launch(offers: HashMap<String, Value>) -> Self {
        let hits = Arc::new(AtomicUsize::new(0));
        let state = ServerState {
            offers: Arc::new(offers),
            hits: hits.clone(),
        };
        let app = Router::new()
            .route(
                "/offers/v1.0/aws/{service}/current/{region}/index.json",
                get(offer_file),
            )
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move { axum::serve(listener, app).await.expect("serve offers") });

        Self { addr, hits }
    }

    pub fn client(&self) -> OfferClient {
        OfferClient::new(format!("http://{}", self.addr), Duration::from_secs(5))
            .expect("build offer client")
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

pub fn storage_product(sku: &str, region: &str, volume_type: &str, api_name: &str) -> Value {
    json!({
        "sku": sku,
        "productFamily": "Storage",
        "attributes": {
            "regionCode": region,
            "volumeType": volume_type,
            "volumeApiName": api_name
        }
    })
}

pub fn on_demand(sku: &str, unit: &str, usd: &str) -> Value {
    let term = format!("{sku}.JRTCKXETXF");
    let rate = format!("{term}.6YS6EN2CT7");
    json!({
        term: {
            "sku": sku,
            "priceDimensions": {
                rate: { "unit": unit, "pricePerUnit": { "USD": usd } }
            }
        }
    })
}

/// Two regions with different gp3 prices plus an IOPS product in us-east-1.
pub fn regional_offers() -> HashMap<String, Value> {
    HashMap::from([
        (
            "us-east-1".to_string(),
            json!({
                "products": {
                    "E1": storage_product("E1", "us-east-1", "General Purpose", "gp3"),
                    "E2": storage_product("E2", "us-east-1", "General Purpose", "gp2"),
                    "E3": { "sku": "E3", "productFamily": "System Operation",
                            "attributes": { "regionCode": "us-east-1", "volumeApiName": "io1" } }
                },
                "terms": { "OnDemand": {
                    "E1": on_demand("E1", "GB-Mo", "0.0800000000"),
                    "E2": on_demand("E2", "GB-Mo", "0.1000000000"),
                    "E3": on_demand("E3", "IOPS-Mo", "0.0650000000")
                } }
            }),
        ),
        (
            "us-gov-west-1".to_string(),
            json!({
                "products": {
                    "G1": storage_product("G1", "us-gov-west-1", "General Purpose", "gp3")
                },
                "terms": { "OnDemand": {
                    "G1": on_demand("G1", "GB-Mo", "0.0960000000")
                } }
            }),
        ),
    ])
}
