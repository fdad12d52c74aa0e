use actix_web::{http::StatusCode, test::TestRequest};
use serde_json::json;
use shop_engine::traits::OrderFlowDatabase;

use super::{
    helpers::{authorize, fill_cart, issue_token, json, place_paid_order, staff_claims, superuser_claims, TestServer},
    mocks::MockGateway,
};

#[actix_web::test]
async fn staff_only_see_their_branch() {
    let _ = env_logger::try_init().ok();
    let server = TestServer::new(MockGateway::new()).await;
    let (accra, kumasi) = (server.seed.accra.id, server.seed.kumasi.id);
    let accra_order = place_paid_order(&server.db, accra, "ref-accra").await.order.id;
    let kumasi_order = place_paid_order(&server.db, kumasi, "ref-kumasi").await.order.id;
    // Unpaid orders are hidden unless asked for
    server.db.checkout(fill_cart(&server.db, accra, &[(server.seed.beads.id, 1)]).await).await.unwrap();

    let staff = issue_token(staff_claims(Some(accra)));
    let (status, body) = server.get("/api/orders", Some(&staff)).await;
    assert_eq!(status, StatusCode::OK, "was: {body}");
    let page = json(&body);
    assert_eq!(page["count"], 1);
    assert_eq!(page["results"][0]["id"], accra_order);
    let (_, body) = server.get("/api/orders?payment_status=Pending", Some(&staff)).await;
    assert_eq!(json(&body)["count"], 1);
    let (_, body) = server.get(&format!("/api/orders?branch_id={kumasi}"), Some(&staff)).await;
    assert_eq!(json(&body)["count"], 0);

    let (status, body) = server.get(&format!("/api/orders/{accra_order}"), Some(&staff)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["items"].as_array().map(Vec::len), Some(1));
    let (status, _) = server.get(&format!("/api/orders/{kumasi_order}"), Some(&staff)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let homeless = issue_token(staff_claims(None));
    let (_, body) = server.get("/api/orders", Some(&homeless)).await;
    assert_eq!(json(&body)["count"], 0);

    let admin = issue_token(superuser_claims());
    let (_, body) = server.get("/api/orders", Some(&admin)).await;
    assert_eq!(json(&body)["count"], 2);
    let (_, body) = server.get("/api/orders?search=ref-kumasi", Some(&admin)).await;
    assert_eq!(json(&body)["results"][0]["id"], kumasi_order);
    let (status, _) = server.get(&format!("/api/orders/{kumasi_order}"), Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    server.finish().await;
}

#[actix_web::test]
async fn order_status_changes() {
    let server = TestServer::new(MockGateway::new()).await;
    let accra = server.seed.accra.id;
    let order_id = place_paid_order(&server.db, accra, "ref-status").await.order.id;
    let staff = issue_token(staff_claims(Some(accra)));
    let path = format!("/api/orders/{order_id}/status");

    let shipped = json!({"status": "Shipped"});
    let (status, body) = server.send(TestRequest::patch().uri(&path), Some(&staff), &shipped).await;
    assert_eq!(status, StatusCode::OK, "was: {body}");
    assert_eq!(json(&body)["status"], "Shipped");
    let (status, _) = server.send(TestRequest::patch().uri(&path), Some(&staff), &shipped).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let pending = json!({"status": "Pending"});
    let (status, body) = server.send(TestRequest::patch().uri(&path), Some(&staff), &pending).await;
    assert_eq!(status, StatusCode::CONFLICT, "was: {body}");
    let bogus = json!({"status": "Lost"});
    let (status, _) = server.send(TestRequest::patch().uri(&path), Some(&staff), &bogus).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let other_branch = issue_token(staff_claims(Some(server.seed.kumasi.id)));
    let completed = json!({"status": "Completed"});
    let (status, _) = server.send(TestRequest::patch().uri(&path), Some(&other_branch), &completed).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, body) = server.send(TestRequest::patch().uri(&path), Some(&staff), &completed).await;
    assert_eq!(status, StatusCode::OK, "was: {body}");
    assert_eq!(json(&body)["status"], "Completed");
    let cancelled = json!({"status": "Cancelled"});
    let (status, _) = server.send(TestRequest::patch().uri(&path), Some(&staff), &cancelled).await;
    assert_eq!(status, StatusCode::CONFLICT);
    server.finish().await;
}

#[actix_web::test]
async fn editing_and_rerouting_orders() {
    let server = TestServer::new(MockGateway::new()).await;
    let (accra, kumasi) = (server.seed.accra.id, server.seed.kumasi.id);
    let order_id = place_paid_order(&server.db, accra, "ref-edit").await.order.id;
    let path = format!("/api/orders/{order_id}");
    let staff = issue_token(staff_claims(Some(accra)));

    let update = json!({"recipient_address": "7 Oxford Street, Osu"});
    let (status, body) = server.send(TestRequest::patch().uri(&path), Some(&staff), &update).await;
    assert_eq!(status, StatusCode::OK, "was: {body}");
    assert_eq!(json(&body)["recipient_address"], "7 Oxford Street, Osu");
    let (status, _) = server.send(TestRequest::patch().uri(&path), Some(&staff), &json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = server.send(TestRequest::patch().uri(&path), Some(&staff), &json!({"total_price": 1})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let reroute = json!({"branch_id": kumasi});
    let (status, _) = server.send(TestRequest::patch().uri(&path), Some(&staff), &reroute).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let admin = issue_token(superuser_claims());
    let (status, body) = server.send(TestRequest::patch().uri(&path), Some(&admin), &reroute).await;
    assert_eq!(status, StatusCode::OK, "was: {body}");
    assert_eq!(json(&body)["branch_id"], kumasi);
    let (status, _) = server.get(&path, Some(&staff)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    server.finish().await;
}

#[actix_web::test]
async fn only_unpaid_orders_can_be_deleted() {
    let server = TestServer::new(MockGateway::new()).await;
    let accra = server.seed.accra.id;
    let paid = place_paid_order(&server.db, accra, "ref-paid").await.order.id;
    let request = fill_cart(&server.db, accra, &[(server.seed.beads.id, 1)]).await;
    let unpaid = server.db.checkout(request).await.unwrap().order.id;

    let (paid_path, unpaid_path) = (format!("/api/orders/{paid}"), format!("/api/orders/{unpaid}"));
    let staff = issue_token(staff_claims(Some(accra)));
    let (status, _) = server.call(authorize(TestRequest::delete().uri(&unpaid_path), Some(&staff))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = issue_token(superuser_claims());
    let (status, body) = server.call(authorize(TestRequest::delete().uri(&paid_path), Some(&admin))).await;
    assert_eq!(status, StatusCode::CONFLICT, "was: {body}");
    let (status, body) = server.call(authorize(TestRequest::delete().uri(&unpaid_path), Some(&admin))).await;
    assert_eq!(status, StatusCode::OK, "was: {body}");
    assert_eq!(json(&body)["success"], true);
    let (status, _) = server.get(&unpaid_path, Some(&admin)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = server.get(&paid_path, Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    server.finish().await;
}

#[actix_web::test]
async fn branches_and_customers() {
    let server = TestServer::new(MockGateway::new()).await;
    let staff = issue_token(staff_claims(Some(server.seed.accra.id)));
    let (status, body) = server.get("/api/branches", Some(&staff)).await;
    assert_eq!(status, StatusCode::OK, "was: {body}");
    assert_eq!(json(&body).as_array().map(Vec::len), Some(3));
    let (_, body) = server.get("/api/branches?is_active=true", Some(&staff)).await;
    assert_eq!(json(&body).as_array().map(Vec::len), Some(2));

    let admin = issue_token(superuser_claims());
    let path = format!("/api/branches/{}", server.seed.closed.id);
    let (status, body) = server.send(TestRequest::patch().uri(&path), Some(&admin), &json!({"is_active": true})).await;
    assert_eq!(status, StatusCode::OK, "was: {body}");
    assert_eq!(json(&body)["is_active"], true);
    let (status, _) = server.send(TestRequest::patch().uri(&path), Some(&staff), &json!({"is_active": false})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let missing = TestRequest::patch().uri("/api/branches/999");
    let (status, _) = server.send(missing, Some(&admin), &json!({"is_active": true})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    place_paid_order(&server.db, server.seed.accra.id, "ref-customer").await;
    let (status, body) = server.get("/api/customers?search=mensah", Some(&staff)).await;
    assert_eq!(status, StatusCode::OK, "was: {body}");
    let page = json(&body);
    assert_eq!(page["count"], 1);
    assert_eq!(page["results"][0]["email"], "ama@example.com");
    let (_, body) = server.get("/api/customers?search=nobody", Some(&staff)).await;
    assert_eq!(json(&body)["count"], 0);
    server.finish().await;
}
