use serde_json::json;
use uuid::Uuid;

use crate::helpers::TestApp;

async fn seed_product(test_app: &TestApp, slug: &str, price: f64) -> String {
    let response = test_app
        .create_product(json!({
            "name": format!("Product {}", slug),
            "slug": slug,
            "price": price,
        }))
        .await;
    assert_eq!(201, response.status().as_u16());

    let body: serde_json::Value = response.json().await.unwrap();
    body["product"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn adding_an_item_puts_it_in_the_session_cart() {
    let test_app = TestApp::spawn_app().await;
    let session_id = Uuid::new_v4().to_string();
    let product_id = seed_product(&test_app, "starter-kit", 89.0).await;

    let client = reqwest::Client::new();
    let added = client
        .post(format!("{}/cart/{}/items", test_app.address, session_id))
        .json(&json!({"product_id": product_id, "quantity": 2}))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, added.status().as_u16());

    let cart: serde_json::Value = client
        .get(format!("{}/cart/{}", test_app.address, session_id))
        .send()
        .await
        .expect("Failed to execute request.")
        .json()
        .await
        .unwrap();

    let items = cart["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], json!(2));
    assert_eq!(items[0]["price"], json!(89.0));
    assert_eq!(cart["total"], json!(178.0));
}

#[tokio::test]
async fn adding_the_same_product_twice_merges_quantities() {
    let test_app = TestApp::spawn_app().await;
    let session_id = Uuid::new_v4().to_string();
    let product_id = seed_product(&test_app, "starter-kit", 89.0).await;

    let client = reqwest::Client::new();
    for _ in 0..2 {
        client
            .post(format!("{}/cart/{}/items", test_app.address, session_id))
            .json(&json!({"product_id": product_id}))
            .send()
            .await
            .expect("Failed to execute request.");
    }

    let cart: serde_json::Value = client
        .get(format!("{}/cart/{}", test_app.address, session_id))
        .send()
        .await
        .expect("Failed to execute request.")
        .json()
        .await
        .unwrap();

    let items = cart["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], json!(2));
}

#[tokio::test]
async fn carts_are_scoped_to_their_session() {
    let test_app = TestApp::spawn_app().await;
    let product_id = seed_product(&test_app, "starter-kit", 89.0).await;
    let session_a = Uuid::new_v4().to_string();
    let session_b = Uuid::new_v4().to_string();

    let client = reqwest::Client::new();
    client
        .post(format!("{}/cart/{}/items", test_app.address, session_a))
        .json(&json!({"product_id": product_id}))
        .send()
        .await
        .expect("Failed to execute request.");

    let other_cart: serde_json::Value = client
        .get(format!("{}/cart/{}", test_app.address, session_b))
        .send()
        .await
        .expect("Failed to execute request.")
        .json()
        .await
        .unwrap();

    assert!(other_cart["items"].as_array().unwrap().is_empty());
    assert_eq!(other_cart["total"], json!(0.0));
}

#[tokio::test]
async fn adding_an_unknown_product_returns_404() {
    let test_app = TestApp::spawn_app().await;
    let session_id = Uuid::new_v4().to_string();

    let client = reqwest::Client::new();
    let response = client
        .post(format!("{}/cart/{}/items", test_app.address, session_id))
        .json(&json!({"product_id": Uuid::new_v4()}))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(404, response.status().as_u16());
}

#[tokio::test]
async fn adding_zero_quantity_returns_400() {
    let test_app = TestApp::spawn_app().await;
    let session_id = Uuid::new_v4().to_string();
    let product_id = seed_product(&test_app, "starter-kit", 89.0).await;

    let client = reqwest::Client::new();
    let response = client
        .post(format!("{}/cart/{}/items", test_app.address, session_id))
        .json(&json!({"product_id": product_id, "quantity": 0}))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn removing_an_item_empties_the_cart() {
    let test_app = TestApp::spawn_app().await;
    let session_id = Uuid::new_v4().to_string();
    let product_id = seed_product(&test_app, "starter-kit", 89.0).await;

    let client = reqwest::Client::new();
    client
        .post(format!("{}/cart/{}/items", test_app.address, session_id))
        .json(&json!({"product_id": product_id}))
        .send()
        .await
        .expect("Failed to execute request.");

    let removed = client
        .delete(format!(
            "{}/cart/{}/items/{}",
            test_app.address, session_id, product_id
        ))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, removed.status().as_u16());

    let again = client
        .delete(format!(
            "{}/cart/{}/items/{}",
            test_app.address, session_id, product_id
        ))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(404, again.status().as_u16());
}
