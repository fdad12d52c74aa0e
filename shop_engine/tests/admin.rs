use shop_engine::{
    db_types::{OrderStatusType, PaymentStatus},
    events::EventProducers,
    order_objects::{BranchQueryFilter, OrderQueryFilter, OrderScope, OrderUpdate, Pagination},
    traits::{AdminError, OrderFlowDatabase},
    AdminApi,
};

mod support;
use support::*;

#[tokio::test]
async fn listings_are_scoped_by_branch() {
    let db = setup().await;
    let seed = seed(&db).await;
    let api = AdminApi::new(db.clone(), EventProducers::default());
    place_paid_order(&db, seed.accra.id, "ref-a1").await;
    place_paid_order(&db, seed.accra.id, "ref-a2").await;
    place_paid_order(&db, seed.kumasi.id, "ref-k1").await;
    // Unpaid orders are hidden by default
    place_order_awaiting_payment(&db, seed.kumasi.id, "ref-k2").await;

    let all = api.search_orders(OrderScope::All, OrderQueryFilter::default(), Pagination::default()).await.unwrap();
    assert_eq!(all.count, 3);
    assert!(all.results.iter().all(|o| o.payment_status == PaymentStatus::Completed));
    // Newest first
    assert!(all.results[0].id > all.results[2].id);

    let accra = api
        .search_orders(OrderScope::Branch(seed.accra.id), OrderQueryFilter::default(), Pagination::default())
        .await
        .unwrap();
    assert_eq!(accra.count, 2);
    assert!(accra.results.iter().all(|o| o.branch_id == seed.accra.id));

    // A branch filter cannot widen a staff member's scope
    let filter = OrderQueryFilter::default().with_branch_id(seed.kumasi.id);
    let sneaky = api.search_orders(OrderScope::Branch(seed.accra.id), filter, Pagination::default()).await.unwrap();
    assert_eq!(sneaky.count, 0);

    let nothing = api.search_orders(OrderScope::Nothing, OrderQueryFilter::default(), Pagination::default()).await;
    assert_eq!(nothing.unwrap().count, 0);

    let filter = OrderQueryFilter::default().with_payment_status(PaymentStatus::Pending);
    let unpaid = api.search_orders(OrderScope::All, filter, Pagination::default()).await.unwrap();
    assert_eq!(unpaid.count, 1);
    assert_eq!(unpaid.results[0].paystack_ref.as_deref(), Some("ref-k2"));

    let filter = OrderQueryFilter::default().with_search("ref-a2");
    let found = api.search_orders(OrderScope::All, filter, Pagination::default()).await.unwrap();
    assert_eq!(found.count, 1);
    let filter = OrderQueryFilter::default().with_search("Kofi");
    let found = api.search_orders(OrderScope::All, filter, Pagination::default()).await.unwrap();
    assert_eq!(found.count, 3);
    let filter = OrderQueryFilter::default().with_search("_ofi");
    let found = api.search_orders(OrderScope::All, filter, Pagination::default()).await.unwrap();
    assert_eq!(found.count, 0);
    tear_down(db).await;
}

#[tokio::test]
async fn order_pages() {
    let db = setup().await;
    let seed = seed(&db).await;
    let api = AdminApi::new(db.clone(), EventProducers::default());
    for i in 0..12 {
        place_paid_order(&db, seed.accra.id, &format!("ref-{i}")).await;
    }
    let page1 = api.search_orders(OrderScope::All, OrderQueryFilter::default(), Pagination::default()).await.unwrap();
    assert_eq!(page1.count, 12);
    assert_eq!(page1.results.len(), 10);
    assert!(page1.has_next());
    let page2 = api
        .search_orders(OrderScope::All, OrderQueryFilter::default(), Pagination::new(Some(2), None))
        .await
        .unwrap();
    assert_eq!(page2.results.len(), 2);
    assert!(!page2.has_next());
    let page9 = api
        .search_orders(OrderScope::All, OrderQueryFilter::default(), Pagination::new(Some(9), None))
        .await
        .unwrap();
    assert!(page9.results.is_empty());
    tear_down(db).await;
}

#[tokio::test]
async fn status_transitions() {
    let db = setup().await;
    let seed = seed(&db).await;
    let api = AdminApi::new(db.clone(), EventProducers::default());
    let scope = OrderScope::Branch(seed.accra.id);
    let id = place_paid_order(&db, seed.accra.id, "ref-1").await.order.id;

    let err = api.modify_status(scope, id, OrderStatusType::Pending).await.unwrap_err();
    assert!(matches!(err, AdminError::NoOp));
    let order = api.modify_status(scope, id, OrderStatusType::Shipped).await.unwrap();
    assert_eq!(order.status, OrderStatusType::Shipped);
    let err = api.modify_status(scope, id, OrderStatusType::Pending).await.unwrap_err();
    assert!(matches!(
        err,
        AdminError::IllegalTransition { from: OrderStatusType::Shipped, to: OrderStatusType::Pending }
    ));
    let order = api.modify_status(scope, id, OrderStatusType::Completed).await.unwrap();
    assert_eq!(order.status, OrderStatusType::Completed);
    let err = api.modify_status(scope, id, OrderStatusType::Cancelled).await.unwrap_err();
    assert!(matches!(err, AdminError::IllegalTransition { .. }));

    // Other branches cannot see the order at all
    let err = api.modify_status(OrderScope::Branch(seed.kumasi.id), id, OrderStatusType::Cancelled).await;
    assert!(matches!(err, Err(AdminError::OrderNotFound(_))));
    assert!(api.order_by_id(OrderScope::Branch(seed.kumasi.id), id).await.unwrap().is_none());
    let full = api.order_by_id(scope, id).await.unwrap().unwrap();
    assert_eq!(full.items.len(), 1);
    tear_down(db).await;
}

#[tokio::test]
async fn order_updates() {
    let db = setup().await;
    let seed = seed(&db).await;
    let api = AdminApi::new(db.clone(), EventProducers::default());
    let staff = OrderScope::Branch(seed.accra.id);
    let id = place_paid_order(&db, seed.accra.id, "ref-1").await.order.id;

    let err = api.update_order(staff, id, OrderUpdate::default()).await.unwrap_err();
    assert!(matches!(err, AdminError::NoOp));
    let update = OrderUpdate::default().with_recipient_name("Yaw Boateng").with_recipient_address("Osu, Accra");
    let order = api.update_order(staff, id, update).await.unwrap();
    assert_eq!(order.recipient_name, "Yaw Boateng");
    assert_eq!(order.recipient_address, "Osu, Accra");
    assert_eq!(order.payment_status, PaymentStatus::Completed);

    let move_it = OrderUpdate::default().with_branch_id(seed.kumasi.id);
    let err = api.update_order(staff, id, move_it.clone()).await.unwrap_err();
    assert!(matches!(err, AdminError::Forbidden(_)));
    let order = api.update_order(OrderScope::All, id, move_it).await.unwrap();
    assert_eq!(order.branch_id, seed.kumasi.id);
    let err = api.update_order(OrderScope::All, id, OrderUpdate::default().with_branch_id(999)).await.unwrap_err();
    assert!(matches!(err, AdminError::BranchNotFound(999)));
    tear_down(db).await;
}

#[tokio::test]
async fn only_superusers_delete_unpaid_orders() {
    let db = setup().await;
    let seed = seed(&db).await;
    let api = AdminApi::new(db.clone(), EventProducers::default());
    let paid = place_paid_order(&db, seed.accra.id, "ref-paid").await.order.id;
    let unpaid = place_order_awaiting_payment(&db, seed.accra.id, "ref-unpaid").await.order.id;

    let err = api.delete_order(OrderScope::Branch(seed.accra.id), unpaid).await.unwrap_err();
    assert!(matches!(err, AdminError::Forbidden(_)));
    let err = api.delete_order(OrderScope::All, paid).await.unwrap_err();
    assert!(matches!(err, AdminError::PaidOrderDeletion(id) if id == paid));
    api.delete_order(OrderScope::All, unpaid).await.unwrap();
    assert!(OrderFlowDatabase::fetch_order(&db, unpaid).await.unwrap().is_none());
    let err = api.delete_order(OrderScope::All, unpaid).await.unwrap_err();
    assert!(matches!(err, AdminError::OrderNotFound(_)));
    tear_down(db).await;
}

#[tokio::test]
async fn branches() {
    let db = setup().await;
    let _ = seed(&db).await;
    let api = AdminApi::new(db.clone(), EventProducers::default());
    let all = api.list_branches(BranchQueryFilter::default()).await.unwrap();
    let names = all.iter().map(|b| b.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, vec!["Accra", "Kumasi", "Takoradi"]);
    let active = api.list_branches(BranchQueryFilter { is_active: Some(true), search: None }).await.unwrap();
    assert_eq!(active.len(), 2);
    let k = api.list_branches(BranchQueryFilter { is_active: None, search: Some("Ku".into()) }).await.unwrap();
    assert_eq!(k.len(), 1);

    let tamale = api.create_branch(" Tamale ", false).await.unwrap();
    assert_eq!(tamale.name, "Tamale");
    let tamale = api.set_branch_active(tamale.id, true).await.unwrap();
    assert!(tamale.is_active);
    assert!(matches!(api.set_branch_active(999, true).await, Err(AdminError::BranchNotFound(999))));
    assert!(matches!(api.create_branch("  ", true).await, Err(AdminError::ValidationError(_))));
    tear_down(db).await;
}

#[tokio::test]
async fn customers_with_order_counts() {
    let db = setup().await;
    let seed = seed(&db).await;
    let api = AdminApi::new(db.clone(), EventProducers::default());
    place_order(&db, seed.accra.id, &[(1, 1)]).await;
    place_order(&db, seed.accra.id, &[(2, 1)]).await;
    let page = api.list_customers(None, Pagination::default()).await.unwrap();
    assert_eq!(page.count, 1);
    assert_eq!(page.results[0].orders_count, 2);
    assert_eq!(page.results[0].customer.email, "ama@example.com");
    let page = api.list_customers(Some("Mens".into()), Pagination::default()).await.unwrap();
    assert_eq!(page.count, 1);
    let page = api.list_customers(Some("Kwame".into()), Pagination::default()).await.unwrap();
    assert_eq!(page.count, 0);
    tear_down(db).await;
}
