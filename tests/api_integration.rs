//! Live tests against a Canopy environment.
//!
//! All tests are `#[ignore]` because they need network access and real
//! credentials. Put `CANOPY_CLIENT_ID`, `CANOPY_CLIENT_SECRET` and optionally
//! `CANOPY_HOST` in the environment or a `.env` file, then run:
//!
//! ```bash
//! cargo test --test api_integration -- --ignored
//! ```

use canopy_sdk::client::CanopyClientBuilder;
use canopy_sdk::prelude::*;

fn live_client() -> CanopyClient {
    let _ = dotenvy::dotenv();
    CanopyClientBuilder::from_env()
        .build()
        .expect("CANOPY_CLIENT_ID and CANOPY_CLIENT_SECRET must be set")
}

#[tokio::test]
#[ignore]
async fn test_live_token_lifecycle() {
    let client = live_client();
    let auth = client.authentication();

    let first = auth.check_token().await.expect("should get an access token");
    assert!(!first.as_str().is_empty());
    assert!(auth.has_token().await, "token should be cached");

    let second = auth.reset_token().await.expect("should get a new access token");
    assert!(!second.as_str().is_empty());
    assert!(auth.has_token().await);
}

#[tokio::test]
#[ignore]
async fn test_live_bad_credentials() {
    let _ = dotenvy::dotenv();
    let client = CanopyClientBuilder::from_env()
        .client_id("not-a-real-client")
        .client_secret("not-a-real-secret")
        .build()
        .unwrap();

    let err = client.authentication().check_token().await.unwrap_err();
    let canopy = err.canopy_error().expect("rejection should carry a canopy error");
    assert_eq!(canopy.kind, ErrorKind::Canopy);
}

#[tokio::test]
#[ignore]
async fn test_live_list_products() {
    let client = live_client();
    let query = Query::new().with("limit", 2);

    let envelope = client
        .fire(Method::GET, "products", Some(&query), None)
        .await
        .expect("transport should succeed");

    assert!(envelope.is_success(), "unexpected error: {:?}", envelope.error());
    if let Some(paging) = envelope.paging() {
        println!("has more products: {}", paging.has_more);
    }
}
