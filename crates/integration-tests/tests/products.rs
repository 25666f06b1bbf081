//! Catalog endpoints: public reads, admin-only writes.

#![allow(clippy::unwrap_used)]

use axum::http::{StatusCode, header};
use serde_json::{Value, json};

use dscommerce_core::{OrderId, ProductId};
use dscommerce_integration_tests::{ALEX, ANA, MARIA, TestApp};

fn product_body() -> Value {
    json!({
        "name": "Console PlayStation 5",
        "description": "Lorem ipsum, dolor sit amet consectetur adipisicing elit.",
        "price": 3999.9,
        "imgUrl": "https://img.example.com/ps5.jpg",
        "categories": [{"id": 2}, {"id": 3}]
    })
}

#[tokio::test]
async fn test_find_all_returns_first_page_sorted_by_id() {
    let app = TestApp::seeded();

    let res = app.get("/products", None).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["totalElements"], 10);
    assert_eq!(res.body["size"], 12);
    assert_eq!(res.body["number"], 0);
    assert_eq!(res.body["first"], true);
    assert_eq!(res.body["last"], true);
    assert_eq!(res.body["content"][0]["name"], "The Lord of the Rings");
    assert_eq!(res.body["content"][0]["price"].as_f64(), Some(90.5));
    assert!(res.body["content"][0].get("description").is_none());
}

#[tokio::test]
async fn test_find_all_filters_by_name_ignoring_case() {
    let app = TestApp::seeded();

    let res = app.get("/products?name=pc%20gAMER", None).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["totalElements"], 6);
    let names: Vec<&str> = res.body["content"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert!(names.iter().all(|n| n.starts_with("PC Gamer")));
}

#[tokio::test]
async fn test_find_all_pages_and_sorts() {
    let app = TestApp::seeded();

    let res = app.get("/products?page=1&size=3&sort=price,desc", None).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["totalPages"], 4);
    assert_eq!(res.body["numberOfElements"], 3);
    assert_eq!(res.body["first"], false);
    // Second page of prices descending: 1700.0, then the two 1350.0 products by id
    assert_eq!(res.body["content"][0]["name"], "PC Gamer Y");
    assert_eq!(res.body["content"][1]["name"], "PC Gamer Ex");
    assert_eq!(res.body["content"][2]["name"], "PC Gamer X");
}

#[tokio::test]
async fn test_find_all_rejects_unknown_sort() {
    let app = TestApp::seeded();

    let res = app.get("/products?sort=description", None).await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_find_by_id_returns_product_with_categories() {
    let app = TestApp::seeded();

    let res = app.get("/products/2", None).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["name"], "Smart TV");
    assert_eq!(
        res.body["categories"],
        json!([{"id": 2, "name": "Eletrônicos"}, {"id": 3, "name": "Computadores"}])
    );
}

#[tokio::test]
async fn test_find_by_id_is_not_found_for_missing_product() {
    let app = TestApp::seeded();

    let res = app.get("/products/1000", None).await;

    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body["path"], "/products/1000");
}

#[tokio::test]
async fn test_insert_creates_product_for_admin() {
    let app = TestApp::seeded();
    let token = app.token(ANA);

    let res = app.post_json("/products", Some(&token), &product_body()).await;

    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.headers[header::LOCATION], "/products/11");
    assert_eq!(res.body["id"], 11);
    assert_eq!(res.body["categories"][0]["name"], "Eletrônicos");

    let read = app.get("/products/11", None).await;
    assert_eq!(read.body["name"], "Console PlayStation 5");
}

#[tokio::test]
async fn test_insert_is_forbidden_for_client() {
    let app = TestApp::seeded();
    let token = app.token(MARIA);

    let res = app.post_json("/products", Some(&token), &product_body()).await;

    assert_eq!(res.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_insert_requires_token() {
    let app = TestApp::seeded();

    let res = app.post_json("/products", None, &product_body()).await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_insert_reports_every_invalid_field() {
    let app = TestApp::seeded();
    let token = app.token(ANA);

    let mut body = product_body();
    body["name"] = json!("ab");
    body["price"] = json!(-50.0);
    body["categories"] = json!([]);

    let res = app.post_json("/products", Some(&token), &body).await;

    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    let fields: Vec<&str> = res.body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["fieldName"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["categories", "name", "price"]);
}

#[tokio::test]
async fn test_insert_rejects_missing_price() {
    let app = TestApp::seeded();
    let token = app.token(ANA);

    let mut body = product_body();
    body.as_object_mut().unwrap().remove("price");

    let res = app.post_json("/products", Some(&token), &body).await;

    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(res.body["errors"][0]["fieldName"], "price");
}

#[tokio::test]
async fn test_insert_rejects_price_that_does_not_fit_column() {
    let app = TestApp::seeded();
    let token = app.token(ANA);

    for price in [json!(0.001), json!(99_999_999_999.5_f64), json!(10_000_000_000_u64)] {
        let mut body = product_body();
        body["price"] = price.clone();

        let res = app.post_json("/products", Some(&token), &body).await;

        assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY, "price {price}");
        assert_eq!(res.body["errors"][0]["fieldName"], "price");
    }
}

#[tokio::test]
async fn test_update_rejects_price_with_extra_decimals() {
    let app = TestApp::seeded();
    let token = app.token(ANA);

    let mut body = product_body();
    body["price"] = json!(19.999);

    let res = app.put_json("/products/1", Some(&token), &body).await;

    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(res.body["errors"][0]["fieldName"], "price");
}

#[tokio::test]
async fn test_insert_is_not_found_for_unknown_category() {
    let app = TestApp::seeded();
    let token = app.token(ANA);

    let mut body = product_body();
    body["categories"] = json!([{"id": 99}]);

    let res = app.post_json("/products", Some(&token), &body).await;

    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_replaces_product_for_admin() {
    let app = TestApp::seeded();
    let token = app.token(ALEX);

    let res = app.put_json("/products/1", Some(&token), &product_body()).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["id"], 1);
    assert_eq!(res.body["name"], "Console PlayStation 5");
    assert_eq!(res.body["categories"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_update_is_not_found_for_missing_product() {
    let app = TestApp::seeded();
    let token = app.token(ANA);

    let res = app
        .put_json("/products/1000", Some(&token), &product_body())
        .await;

    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_removes_unreferenced_product() {
    let app = TestApp::seeded();
    let token = app.token(ANA);

    let res = app.delete("/products/10", Some(&token)).await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);
    assert!(res.body.is_null());

    let read = app.get("/products/10", None).await;
    assert_eq!(read.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_is_not_found_for_missing_product() {
    let app = TestApp::seeded();
    let token = app.token(ANA);

    let res = app.delete("/products/1000", Some(&token)).await;

    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_is_conflict_for_ordered_product() {
    let app = TestApp::seeded();
    let token = app.token(ANA);

    let seeded = app.delete("/products/3", Some(&token)).await;
    assert_eq!(seeded.status, StatusCode::CONFLICT);

    app.shop.add_order_item(OrderId::new(3), ProductId::new(9), 1);
    let linked = app.delete("/products/9", Some(&token)).await;
    assert_eq!(linked.status, StatusCode::CONFLICT);
    assert_eq!(linked.body["message"], "referential integrity failure");
}

#[tokio::test]
async fn test_delete_is_forbidden_for_client() {
    let app = TestApp::seeded();
    let token = app.token(MARIA);

    let res = app.delete("/products/10", Some(&token)).await;

    assert_eq!(res.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_categories_are_sorted_by_name() {
    let app = TestApp::seeded();

    let res = app.get("/categories", None).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(
        res.body,
        json!([
            {"id": 3, "name": "Computadores"},
            {"id": 2, "name": "Eletrônicos"},
            {"id": 1, "name": "Livros"}
        ])
    );
}
