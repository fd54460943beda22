use serde_json::json;

use crate::helpers::TestApp;

fn starter_kit() -> serde_json::Value {
    json!({
        "name": "SaaS Starter Kit",
        "slug": "saas-starter-kit",
        "short_description": "Production-ready starter template",
        "price": 89.0,
        "compare_at_price": 129.0,
        "category": "Code Templates",
        "tags": ["saas", "starter"],
        "features": ["Authentication", "Admin Dashboard"],
        "is_featured": true,
    })
}

#[tokio::test]
async fn creating_a_product_requires_the_shared_secret() {
    let test_app = TestApp::spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/admin/products", test_app.address))
        .json(&starter_kit())
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn created_products_show_up_in_the_listing() {
    let test_app = TestApp::spawn_app().await;

    let created = test_app.create_product(starter_kit()).await;
    assert_eq!(201, created.status().as_u16());

    let body: serde_json::Value = created.json().await.unwrap();
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["product"]["slug"], json!("saas-starter-kit"));
    assert_eq!(body["product"]["status"], json!("published"));

    let listing = test_app
        .get_products("")
        .await
        .json::<serde_json::Value>()
        .await
        .unwrap();
    assert_eq!(listing["total"], json!(1));
    assert_eq!(listing["products"][0]["name"], json!("SaaS Starter Kit"));
    assert_eq!(listing["has_more"], json!(false));
}

#[tokio::test]
async fn listing_filters_by_category_and_featured() {
    let test_app = TestApp::spawn_app().await;

    test_app.create_product(starter_kit()).await;
    test_app
        .create_product(json!({
            "name": "Launch Guide",
            "slug": "launch-guide",
            "price": 27.0,
            "category": "Ebooks",
        }))
        .await;

    let by_category = test_app
        .get_products("?category=Ebooks")
        .await
        .json::<serde_json::Value>()
        .await
        .unwrap();
    assert_eq!(by_category["total"], json!(1));
    assert_eq!(by_category["products"][0]["slug"], json!("launch-guide"));

    let featured = test_app
        .get_products("?featured=true")
        .await
        .json::<serde_json::Value>()
        .await
        .unwrap();
    assert_eq!(featured["total"], json!(1));
    assert_eq!(featured["products"][0]["slug"], json!("saas-starter-kit"));
}

#[tokio::test]
async fn listing_paginates() {
    let test_app = TestApp::spawn_app().await;

    for n in 0..3 {
        test_app
            .create_product(json!({
                "name": format!("Product {}", n),
                "slug": format!("product-{}", n),
                "price": 10.0,
            }))
            .await;
    }

    let page = test_app
        .get_products("?limit=2&page=1")
        .await
        .json::<serde_json::Value>()
        .await
        .unwrap();
    assert_eq!(page["products"].as_array().unwrap().len(), 2);
    assert_eq!(page["total"], json!(3));
    assert_eq!(page["has_more"], json!(true));

    let last_page = test_app
        .get_products("?limit=2&page=2")
        .await
        .json::<serde_json::Value>()
        .await
        .unwrap();
    assert_eq!(last_page["products"].as_array().unwrap().len(), 1);
    assert_eq!(last_page["has_more"], json!(false));
}

#[tokio::test]
async fn listing_rejects_out_of_range_paging() {
    let test_app = TestApp::spawn_app().await;

    for query in ["?page=0", "?limit=0", "?limit=101"] {
        let response = test_app.get_products(query).await;

        assert_eq!(400, response.status().as_u16());
    }
}

#[tokio::test]
async fn product_detail_is_served_by_slug() {
    let test_app = TestApp::spawn_app().await;

    test_app.create_product(starter_kit()).await;

    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/products/saas-starter-kit", test_app.address))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["product"]["price"], json!(89.0));
    assert_eq!(
        body["product"]["features"],
        json!(["Authentication", "Admin Dashboard"])
    );

    let missing = client
        .get(format!("{}/products/no-such-slug", test_app.address))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(404, missing.status().as_u16());
}

#[tokio::test]
async fn creating_a_product_without_required_fields_returns_400() {
    let test_app = TestApp::spawn_app().await;

    let test_cases = vec![
        (json!({"slug": "kit", "price": 10.0}), "missing name"),
        (json!({"name": "Kit", "price": 10.0}), "missing slug"),
        (json!({"name": "Kit", "slug": "kit"}), "missing price"),
    ];

    for (invalid_body, error_message) in test_cases {
        let response = test_app.create_product(invalid_body).await;

        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 status when payload was {}",
            error_message
        );
    }
}

#[tokio::test]
async fn creating_a_product_with_a_duplicate_slug_returns_409() {
    let test_app = TestApp::spawn_app().await;

    let first = test_app.create_product(starter_kit()).await;
    assert_eq!(201, first.status().as_u16());

    let second = test_app.create_product(starter_kit()).await;
    assert_eq!(409, second.status().as_u16());
}
