//! Browser-only checks for the `localStorage` backend and the `fetch` transport. Run with `wasm-pack test --headless`.
#![cfg(target_arch = "wasm32")]

use gallery_frontend_rs::api::{HttpMethod, HttpRequest, Transport};
use gallery_frontend_rs::fallback::LocalFallback;
use gallery_frontend_rs::models::Favorite;
use gallery_frontend_rs::transport::FetchTransport;
use stash::{KeyValueStore, LocalStorage};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn fresh_fallback() -> LocalFallback<LocalStorage> {
    let storage = LocalStorage::open().unwrap();
    storage.remove_item("local_likes").unwrap();
    storage.remove_item("local_favorites").unwrap();
    LocalFallback::new(storage)
}

#[wasm_bindgen_test]
fn test_like_deltas_persist_in_local_storage() {
    let fallback = fresh_fallback();
    fallback.record_like_delta("a1").unwrap();
    fallback.record_like_delta("a1").unwrap();

    let reopened = LocalFallback::new(LocalStorage::open().unwrap());
    assert_eq!(reopened.read_like_delta("a1"), 2);
    assert_eq!(
        reopened.store().get_item("local_likes").unwrap().as_deref(),
        Some(r#"{"a1":2}"#)
    );
}

#[wasm_bindgen_test]
fn test_queued_favorites_persist_in_local_storage() {
    let fallback = fresh_fallback();
    let favorite = Favorite {
        item_id: "a1".into(),
        user_email: "ana@example.com".into(),
        ..Default::default()
    };
    assert!(fallback.record_favorite(&favorite).unwrap());
    assert!(!fallback.record_favorite(&favorite).unwrap());

    let reopened = LocalFallback::new(LocalStorage::open().unwrap());
    assert_eq!(reopened.favorites_for("ana@example.com").len(), 1);
}

#[wasm_bindgen_test]
async fn test_fetch_transport_reads_status_and_text() {
    let response = FetchTransport
        .send(HttpRequest {
            method: HttpMethod::Get,
            url: r#"data:application/json,{"data":{"likes":3}}"#.to_string(),
            body: None,
        })
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.text, r#"{"data":{"likes":3}}"#);
}
