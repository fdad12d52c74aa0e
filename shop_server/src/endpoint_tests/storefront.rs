use actix_web::{http::StatusCode, test::TestRequest};
use serde_json::json;

use super::{
    helpers::{issue_token, json, staff_claims, TestServer},
    mocks::MockGateway,
};

#[actix_web::test]
async fn health_check() {
    let server = TestServer::new(MockGateway::new()).await;
    let (status, body) = server.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "👍️\n");
    server.finish().await;
}

#[actix_web::test]
async fn browse_the_catalog() {
    let server = TestServer::new(MockGateway::new()).await;
    let (status, body) = server.get("/products", None).await;
    assert_eq!(status, StatusCode::OK, "was: {body}");
    let page = json(&body);
    assert_eq!(page["count"], 3);
    assert_eq!(page["page"], 1);

    let (status, body) = server.get("/products?is_available=true&ordering=-price", None).await;
    assert_eq!(status, StatusCode::OK, "was: {body}");
    let page = json(&body);
    assert_eq!(page["count"], 2);
    assert_eq!(page["results"][0]["name"], "Kente cloth");
    assert_eq!(page["results"][1]["name"], "Glass beads");

    let (status, body) = server.get("/products?min_price=20&max_price=150", None).await;
    assert_eq!(status, StatusCode::OK, "was: {body}");
    let page = json(&body);
    assert_eq!(page["count"], 1);
    assert_eq!(page["results"][0]["price"], 12_000);

    let (status, _) = server.get("/products?ordering=name", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = server.get("/products?min_price=cheap", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let path = format!("/products/{}", server.seed.beads.id);
    let (status, body) = server.get(&path, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["description"], "Krobo beads");
    let (status, body) = server.get("/products/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("Product 999 does not exist"), "was: {body}");

    let (status, body) = server.get("/collections", None).await;
    assert_eq!(status, StatusCode::OK);
    let collections = json(&body);
    assert_eq!(collections.as_array().map(Vec::len), Some(2));
    let path = format!("/collections/{}", server.seed.beads.collection_id);
    let (status, body) = server.get(&path, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["product_count"], 2);
    server.finish().await;
}

#[actix_web::test]
async fn fill_and_empty_a_cart() {
    let server = TestServer::new(MockGateway::new()).await;
    let (status, body) = server.call(TestRequest::post().uri("/carts")).await;
    assert_eq!(status, StatusCode::CREATED, "was: {body}");
    let cart_id = json(&body)["id"].as_str().unwrap().to_string();
    let items = format!("/carts/{cart_id}/items");

    let kente = json!({"product_id": server.seed.kente.id, "quantity": 2});
    let (status, body) = server.send(TestRequest::post().uri(&items), None, &kente).await;
    assert_eq!(status, StatusCode::CREATED, "was: {body}");
    let item_id = json(&body)["id"].as_i64().unwrap();
    let one_more = json!({"product_id": server.seed.kente.id});
    let (status, body) = server.send(TestRequest::post().uri(&items), None, &one_more).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json(&body)["quantity"], 3);
    let beads = json!({"product_id": server.seed.beads.id, "quantity": 4});
    let (status, _) = server.send(TestRequest::post().uri(&items), None, &beads).await;
    assert_eq!(status, StatusCode::CREATED);

    let drum = json!({"product_id": server.seed.drum.id});
    let (status, _) = server.send(TestRequest::post().uri(&items), None, &drum).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let nothing = json!({"product_id": server.seed.beads.id, "quantity": 0});
    let (status, _) = server.send(TestRequest::post().uri(&items), None, &nothing).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let bulk = json!({"product_id": server.seed.kente.id, "quantity": 9_998});
    let (status, body) = server.send(TestRequest::post().uri(&items), None, &bulk).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "was: {body}");
    let huge = json!({"product_id": server.seed.kente.id, "quantity": i64::MAX / 100});
    let (status, _) = server.send(TestRequest::post().uri(&items), None, &huge).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let missing = json!({"product_id": 999});
    let (status, _) = server.send(TestRequest::post().uri(&items), None, &missing).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = server.get(&format!("/carts/{cart_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let cart = json(&body);
    assert_eq!(cart["items"].as_array().map(Vec::len), Some(2));
    assert_eq!(cart["total_price"], 3 * 12_000 + 4 * 1_550);

    let item = format!("/carts/{cart_id}/items/{item_id}");
    let (status, body) = server.send(TestRequest::patch().uri(&item), None, &json!({"quantity": 1})).await;
    assert_eq!(status, StatusCode::OK, "was: {body}");
    assert_eq!(json(&body)["quantity"], 1);
    let (status, _) = server.call(TestRequest::delete().uri(&item)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = server.call(TestRequest::delete().uri(&item)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, body) = server.get(&format!("/carts/{cart_id}"), None).await;
    assert_eq!(json(&body)["total_price"], 4 * 1_550);

    let (status, _) = server.call(TestRequest::delete().uri(&format!("/carts/{cart_id}"))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = server.get(&format!("/carts/{cart_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = server.call(TestRequest::delete().uri(&format!("/carts/{cart_id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    server.finish().await;
}

#[actix_web::test]
async fn staff_maintain_the_catalog() {
    let server = TestServer::new(MockGateway::new()).await;
    let staff = issue_token(staff_claims(Some(server.seed.accra.id)));
    let body = json!({"name": "Pottery"});
    let (status, _) = server.send(TestRequest::post().uri("/api/collections"), None, &body).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, body) = server.send(TestRequest::post().uri("/api/collections"), Some(&staff), &body).await;
    assert_eq!(status, StatusCode::CREATED, "was: {body}");
    let collection_id = json(&body)["id"].as_i64().unwrap();

    let pot = json!({"name": "Clay pot", "price": 8_000, "collection_id": collection_id});
    let (status, body) = server.send(TestRequest::post().uri("/api/products"), Some(&staff), &pot).await;
    assert_eq!(status, StatusCode::CREATED, "was: {body}");
    let product_id = json(&body)["id"].as_i64().unwrap();
    let bad = json!({"name": "Gift", "price": -5, "collection_id": collection_id});
    let (status, _) = server.send(TestRequest::post().uri("/api/products"), Some(&staff), &bad).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let path = format!("/api/products/{product_id}");
    let update = json!({"price": 9_500});
    let (status, body) = server.send(TestRequest::patch().uri(&path), Some(&staff), &update).await;
    assert_eq!(status, StatusCode::OK, "was: {body}");
    assert_eq!(json(&body)["price"], 9_500);
    let (_, body) = server.get(&format!("/products/{product_id}"), None).await;
    assert_eq!(json(&body)["price"], 9_500);

    let images = format!("/api/products/{product_id}/images");
    let image = json!({"url": "https://cdn.example.com/pot.jpg", "size_bytes": 2_048});
    let (status, body) = server.send(TestRequest::post().uri(&images), Some(&staff), &image).await;
    assert_eq!(status, StatusCode::CREATED, "was: {body}");
    let (status, body) = server.get(&images, Some(&staff)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body).as_array().map(Vec::len), Some(1));
    let (status, _) = server.get("/api/products/999/images", Some(&staff)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    server.finish().await;
}
