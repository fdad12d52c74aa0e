use actix_web::{http::StatusCode, test::TestRequest};
use paystack_tools::{InitializedTransaction, TransactionStatus, VerifiedTransaction, PAYSTACK_SIGNATURE_HEADER};
use serde_json::json;
use shop_engine::{
    db_types::{OrderStatusType, Pesewas},
    traits::{AdminManagement, OrderFlowDatabase},
};

use super::{
    helpers::{checkout_request, fill_cart, json, TestServer},
    mocks::MockGateway,
};

fn gateway() -> MockGateway {
    let mut gateway = MockGateway::new();
    gateway.expect_initialize_payment().returning(|req| {
        let reference = format!("ref-{}", req.metadata.order_id);
        Ok(InitializedTransaction {
            authorization_url: format!("https://checkout.paystack.com/{reference}"),
            access_code: format!("ac_{reference}"),
            reference,
        })
    });
    gateway
}

fn verified(reference: &str, amount: i64) -> VerifiedTransaction {
    VerifiedTransaction {
        status: TransactionStatus::Success,
        reference: reference.to_string(),
        amount: Pesewas::from(amount),
        currency: Some("GHS".into()),
        gateway_response: Some("Approved".into()),
        paid_at: None,
        metadata: json!({}),
    }
}

fn charge_success(reference: &str, amount: i64) -> String {
    json!({
        "event": "charge.success",
        "data": {"status": "success", "reference": reference, "amount": amount, "currency": "GHS"}
    })
    .to_string()
}

#[actix_web::test]
async fn checkout_and_verify_a_payment() {
    let _ = env_logger::try_init().ok();
    let mut gateway = gateway();
    gateway.expect_verify_payment().times(1).returning(|r| Ok(verified(r, 25_550)));
    let server = TestServer::new(gateway).await;
    let seed = &server.seed;
    let request = fill_cart(&server.db, seed.accra.id, &[(seed.kente.id, 2), (seed.beads.id, 1)]).await;
    let cart_id = request.cart_id.clone();

    let (status, body) = server.send(TestRequest::post().uri("/checkout"), None, &request).await;
    assert_eq!(status, StatusCode::CREATED, "was: {body}");
    let result = json(&body);
    let order_id = result["order"]["id"].as_i64().unwrap();
    assert_eq!(result["order"]["total_price"], 25_550);
    assert_eq!(result["order"]["payment_status"], "Pending");
    assert_eq!(result["order"]["items"].as_array().map(Vec::len), Some(2));
    let reference = result["payment"]["reference"].as_str().unwrap().to_string();
    assert_eq!(reference, format!("ref-{order_id}"));
    assert_eq!(result["order"]["paystack_ref"], reference.as_str());
    let (status, _) = server.get(&format!("/carts/{cart_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = server.get(&format!("/payments/verify/{reference}"), None).await;
    assert_eq!(status, StatusCode::OK, "was: {body}");
    let state = json(&body);
    assert_eq!(state["order_id"], order_id);
    assert_eq!(state["payment_status"], "Completed");
    assert_eq!(state["newly_confirmed"], true);

    let path = format!("/orders/{order_id}/payment");
    let (status, _) = server.call(TestRequest::post().uri(&path)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = server.get("/payments/verify/unknown-ref", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    server.finish().await;
}

#[actix_web::test]
async fn checkout_rejections() {
    let server = TestServer::new(gateway()).await;
    let seed = &server.seed;
    let (status, _) = server.send(TestRequest::post().uri("/checkout"), None, &checkout_request("nope", 1)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let empty = fill_cart(&server.db, seed.accra.id, &[]).await;
    let (status, _) = server.send(TestRequest::post().uri("/checkout"), None, &empty).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let closed = fill_cart(&server.db, seed.closed.id, &[(seed.beads.id, 1)]).await;
    let (status, body) = server.send(TestRequest::post().uri("/checkout"), None, &closed).await;
    assert_eq!(status, StatusCode::CONFLICT, "was: {body}");
    let (status, _) = server.get(&format!("/carts/{}", closed.cart_id), None).await;
    assert_eq!(status, StatusCode::OK);

    let mut unroutable = fill_cart(&server.db, seed.accra.id, &[(seed.beads.id, 1)]).await;
    unroutable.branch_id = 999;
    let (status, _) = server.send(TestRequest::post().uri("/checkout"), None, &unroutable).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let mut anonymous = fill_cart(&server.db, seed.accra.id, &[(seed.beads.id, 1)]).await;
    anonymous.customer.email = "not an email".into();
    let (status, _) = server.send(TestRequest::post().uri("/checkout"), None, &anonymous).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    server.finish().await;
}

#[actix_web::test]
async fn payments_can_be_restarted() {
    let mut gateway = MockGateway::new();
    let mut attempt = 0;
    gateway.expect_initialize_payment().times(2).returning(move |req| {
        attempt += 1;
        let reference = format!("ref-{}-{attempt}", req.metadata.order_id);
        Ok(InitializedTransaction {
            authorization_url: format!("https://checkout.paystack.com/{reference}"),
            access_code: format!("ac_{reference}"),
            reference,
        })
    });
    let server = TestServer::new(gateway).await;
    let request = fill_cart(&server.db, server.seed.kumasi.id, &[(server.seed.beads.id, 2)]).await;
    let (status, body) = server.send(TestRequest::post().uri("/checkout"), None, &request).await;
    assert_eq!(status, StatusCode::CREATED);
    let order_id = json(&body)["order"]["id"].as_i64().unwrap();

    let path = format!("/orders/{order_id}/payment");
    let callback = json!({"callback_url": "https://shop.example.com/retry"});
    let (status, body) = server.send(TestRequest::post().uri(&path), None, &callback).await;
    assert_eq!(status, StatusCode::OK, "was: {body}");
    assert_eq!(json(&body)["reference"], format!("ref-{order_id}-2"));
    let order = server.db.fetch_order_by_reference(&format!("ref-{order_id}-2")).await.unwrap();
    assert!(order.is_some());
    let old = server.db.fetch_order_by_reference(&format!("ref-{order_id}-1")).await.unwrap().unwrap();
    assert_eq!(old.id, order_id);
    assert_eq!(old.paystack_ref, Some(format!("ref-{order_id}-2")));

    // The shopper went back and paid on the first payment page
    let (status, body) = server.signed_webhook(&charge_success(&format!("ref-{order_id}-1"), 3_100)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["message"], format!("Payment for order #{order_id} confirmed"));
    let order = server.db.fetch_order_by_reference(&format!("ref-{order_id}-2")).await.unwrap().unwrap();
    assert!(order.is_paid());
    assert_eq!(order.paystack_ref, Some(format!("ref-{order_id}-1")));
    let (status, _) = server.call(TestRequest::post().uri(&path)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = server.call(TestRequest::post().uri("/orders/999/payment")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    server.finish().await;
}

#[actix_web::test]
async fn cancelled_orders_take_late_payments_only() {
    let server = TestServer::new(gateway()).await;
    let request = fill_cart(&server.db, server.seed.accra.id, &[(server.seed.kente.id, 1)]).await;
    let (_, body) = server.send(TestRequest::post().uri("/checkout"), None, &request).await;
    let order_id = json(&body)["order"]["id"].as_i64().unwrap();
    let reference = format!("ref-{order_id}");
    let cancelled = AdminManagement::update_order_status(
        &server.db,
        order_id,
        OrderStatusType::Pending,
        OrderStatusType::Cancelled,
    )
    .await
    .unwrap();
    assert!(cancelled.is_some());

    let (status, body) = server.call(TestRequest::post().uri(&format!("/orders/{order_id}/payment"))).await;
    assert_eq!(status, StatusCode::CONFLICT, "was: {body}");

    let (status, body) = server.signed_webhook(&charge_success(&reference, 12_000)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["message"], format!("Payment for order #{order_id} confirmed"));
    let order = server.db.fetch_order_by_reference(&reference).await.unwrap().unwrap();
    assert!(order.is_paid());
    assert_eq!(order.status, OrderStatusType::Pending);
    server.finish().await;
}

#[actix_web::test]
async fn webhooks_need_a_valid_signature() {
    let server = TestServer::new(gateway()).await;
    let request = fill_cart(&server.db, server.seed.accra.id, &[(server.seed.kente.id, 1)]).await;
    let (_, body) = server.send(TestRequest::post().uri("/checkout"), None, &request).await;
    let reference = json(&body)["payment"]["reference"].as_str().unwrap().to_string();
    let payload = charge_success(&reference, 12_000);

    let unsigned = TestRequest::post().uri("/paystack/webhook").set_payload(payload.clone());
    let (status, body) = server.call(unsigned).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("Missing or invalid webhook signature"), "was: {body}");
    let forged = TestRequest::post()
        .uri("/paystack/webhook")
        .insert_header((PAYSTACK_SIGNATURE_HEADER, "deadbeef"))
        .set_payload(payload);
    let (status, _) = server.call(forged).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let order = server.db.fetch_order_by_reference(&reference).await.unwrap().unwrap();
    assert!(!order.is_paid());
    server.finish().await;
}

#[actix_web::test]
async fn signed_webhooks_are_always_acknowledged() {
    let server = TestServer::new(gateway()).await;
    let request = fill_cart(&server.db, server.seed.accra.id, &[(server.seed.kente.id, 1)]).await;
    let (_, body) = server.send(TestRequest::post().uri("/checkout"), None, &request).await;
    let order_id = json(&body)["order"]["id"].as_i64().unwrap();
    let reference = format!("ref-{order_id}");

    let (status, body) = server.signed_webhook("this is not json").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["success"], false);

    let (status, body) = server.signed_webhook(&charge_success(&reference, 11_000)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json(&body)["message"].as_str().unwrap().starts_with("Event could not be processed"), "was: {body}");
    let order = server.db.fetch_order_by_reference(&reference).await.unwrap().unwrap();
    assert!(!order.is_paid());

    let (status, body) = server.signed_webhook(&charge_success(&reference, 12_000)).await;
    assert_eq!(status, StatusCode::OK);
    let ack = json(&body);
    assert_eq!(ack["success"], true);
    assert_eq!(ack["message"], format!("Payment for order #{order_id} confirmed"));
    let order = server.db.fetch_order_by_reference(&reference).await.unwrap().unwrap();
    assert!(order.is_paid());

    let (status, body) = server.signed_webhook(&charge_success(&reference, 12_000)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["message"], format!("Payment {reference} was already confirmed"));

    let transfer = json!({"event": "transfer.success", "data": {}}).to_string();
    let (status, body) = server.signed_webhook(&transfer).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json(&body)["message"].as_str().unwrap().starts_with("Event ignored"), "was: {body}");
    server.finish().await;
}
