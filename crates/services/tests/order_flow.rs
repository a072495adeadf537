//! End-to-end order flow tests over the in-memory store.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use common::{Identity, UserId};
use domain::{
    Address, BillingInfo, DeliveryAttemptStatus, Money, OrderStatus, PaymentStatus, Product,
    ShippingMethod,
};
use services::{
    CartService, DeliveryReport, NewReview, OrderService, PlaceOrder, RecordingNotifier,
    ReviewService, SentNotification, ServiceError,
};
use store::{DocumentStore, InMemoryStore};

struct Harness {
    store: Arc<InMemoryStore>,
    notifier: Arc<RecordingNotifier>,
    carts: CartService,
    orders: OrderService,
    reviews: ReviewService,
}

fn harness() -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let notifier = RecordingNotifier::new();
    let dyn_store: Arc<dyn DocumentStore> = store.clone();
    Harness {
        carts: CartService::new(dyn_store.clone()),
        orders: OrderService::new(dyn_store.clone(), notifier.clone()),
        reviews: ReviewService::new(dyn_store),
        store,
        notifier,
    }
}

async fn seed_product(h: &Harness, name: &str, rupees: i64, quantity: u32) -> Product {
    let product = Product::new(name, Money::from_rupees(rupees), quantity);
    h.store.insert_product(&product).await.unwrap();
    product
}

fn billing() -> BillingInfo {
    BillingInfo {
        address: Address {
            street: "12 MG Road".into(),
            city: "Bengaluru".into(),
            state: "KA".into(),
            country: "IN".into(),
            zip_code: "560001".into(),
        },
        name: "Asha Rao".into(),
        email: "asha@example.com".into(),
        phone: "9876543210".into(),
    }
}

fn place_input() -> PlaceOrder {
    PlaceOrder {
        billing: billing(),
        shipping_address: billing().address,
        shipping_method: ShippingMethod::Standard,
        notes: None,
        metadata: Default::default(),
    }
}

/// Spawned notification tasks need a moment to run.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

async fn place(h: &Harness, user: UserId, product: &Product, quantity: u32) -> domain::Order {
    h.carts
        .add_item(user, product.id, quantity, BTreeMap::new())
        .await
        .unwrap();
    h.orders
        .place_order(Identity::user(user), place_input())
        .await
        .unwrap()
}

/// Walks an order from pending to shipped through the admin transitions.
async fn ship(h: &Harness, order_id: common::OrderId) -> domain::Order {
    let admin = Identity::admin(UserId::new());
    for status in [OrderStatus::Confirmed, OrderStatus::Processing] {
        h.orders
            .update_status(order_id, admin, status, None, None)
            .await
            .unwrap();
    }
    h.orders
        .update_status(order_id, admin, OrderStatus::Shipped, Some("TRK-1".into()), None)
        .await
        .unwrap()
}

#[tokio::test]
async fn placement_decrements_stock_and_clears_cart() {
    let h = harness();
    let user = UserId::new();
    let product = seed_product(&h, "City Cruiser", 500, 10).await;

    let order = place(&h, user, &product, 2).await;

    // Worked example: 2 × ₹500, free shipping at ₹1,000, 10% tax.
    assert_eq!(order.summary.subtotal, Money::from_rupees(1_000));
    assert_eq!(order.summary.shipping, Money::zero());
    assert_eq!(order.summary.total, Money::from_rupees(1_100));
    assert_eq!(order.status, OrderStatus::Pending);

    let stocked = h.store.get_product(product.id).await.unwrap().unwrap();
    assert_eq!(stocked.inventory.quantity, 8);

    let cart = h.carts.get_or_create(user).await.unwrap();
    assert!(cart.is_empty());
    assert_eq!(cart.summary.total, Money::zero());

    settle().await;
    assert!(h
        .notifier
        .sent()
        .contains(&SentNotification::Confirmation(order.id)));
}

#[tokio::test]
async fn empty_cart_cannot_be_placed() {
    let h = harness();
    let err = h
        .orders
        .place_order(Identity::user(UserId::new()), place_input())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::EmptyCart));
}

#[tokio::test]
async fn ceiling_breach_leaves_stock_and_cart_untouched() {
    let h = harness();
    let user = UserId::new();
    let product = seed_product(&h, "Carbon Racer", 30_000, 5).await;

    h.carts
        .add_item(user, product.id, 2, BTreeMap::new())
        .await
        .unwrap();

    let err = h.orders.place_order(Identity::user(user), place_input()).await.unwrap_err();
    assert!(matches!(err, ServiceError::LimitExceeded { .. }));

    let stocked = h.store.get_product(product.id).await.unwrap().unwrap();
    assert_eq!(stocked.inventory.quantity, 5);
    assert_eq!(h.carts.get_or_create(user).await.unwrap().items.len(), 1);
}

#[tokio::test]
async fn stale_stock_placement_leaves_no_partial_decrement() {
    let h = harness();
    let user = UserId::new();
    let plenty = seed_product(&h, "Plenty", 100, 10).await;
    let scarce = seed_product(&h, "Scarce", 100, 5).await;

    h.carts.add_item(user, plenty.id, 2, BTreeMap::new()).await.unwrap();
    h.carts.add_item(user, scarce.id, 5, BTreeMap::new()).await.unwrap();

    // Stock drops after the items were carted.
    h.store.adjust_stock(scarce.id, -4).await.unwrap();

    let err = h.orders.place_order(Identity::user(user), place_input()).await.unwrap_err();
    assert!(matches!(err, ServiceError::StockUnavailable { .. }));

    let plenty_now = h.store.get_product(plenty.id).await.unwrap().unwrap();
    assert_eq!(plenty_now.inventory.quantity, 10);
    assert!(!h.carts.get_or_create(user).await.unwrap().is_empty());
}

#[tokio::test]
async fn cancellation_restores_quantities() {
    let h = harness();
    let user = UserId::new();
    let product = seed_product(&h, "City Cruiser", 500, 10).await;

    let order = place(&h, user, &product, 3).await;
    assert_eq!(
        h.store.get_product(product.id).await.unwrap().unwrap().inventory.quantity,
        7
    );

    let cancelled = h
        .orders
        .cancel_order(order.id, Identity::user(user))
        .await
        .unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(cancelled.payment.status, PaymentStatus::Cancelled);

    assert_eq!(
        h.store.get_product(product.id).await.unwrap().unwrap().inventory.quantity,
        10
    );

    settle().await;
    assert!(h
        .notifier
        .sent()
        .contains(&SentNotification::StatusUpdate(order.id, OrderStatus::Cancelled)));
}

#[tokio::test]
async fn customer_cannot_cancel_once_processing() {
    let h = harness();
    let user = UserId::new();
    let product = seed_product(&h, "City Cruiser", 500, 10).await;
    let order = place(&h, user, &product, 1).await;

    let admin = Identity::admin(UserId::new());
    for status in [OrderStatus::Confirmed, OrderStatus::Processing] {
        h.orders
            .update_status(order.id, admin, status, None, None)
            .await
            .unwrap();
    }

    let err = h
        .orders
        .cancel_order(order.id, Identity::user(user))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidTransition { .. }));
}

#[tokio::test]
async fn shipping_requires_tracking_number() {
    let h = harness();
    let user = UserId::new();
    let product = seed_product(&h, "City Cruiser", 500, 10).await;
    let order = place(&h, user, &product, 1).await;

    let admin = Identity::admin(UserId::new());
    h.orders
        .update_status(order.id, admin, OrderStatus::Confirmed, None, None)
        .await
        .unwrap();
    h.orders
        .update_status(order.id, admin, OrderStatus::Processing, None, None)
        .await
        .unwrap();

    let err = h
        .orders
        .update_status(order.id, admin, OrderStatus::Shipped, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[tokio::test]
async fn delivery_requires_matching_verification_code() {
    let h = harness();
    let user = UserId::new();
    let product = seed_product(&h, "City Cruiser", 500, 10).await;
    let order = place(&h, user, &product, 1).await;
    ship(&h, order.id).await;

    let agent = Identity::admin(UserId::new());
    let err = h
        .orders
        .record_delivery(
            order.id,
            agent,
            DeliveryReport {
                status: DeliveryAttemptStatus::Delivered,
                verification_code: Some("WRONG0".into()),
                notes: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidVerificationCode));

    // Still shipped, with the failure in both the collection and the
    // delivery-attempt histories.
    let stored = h.store.get_order(order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::Shipped);
    assert_eq!(stored.payment.cod.attempts.len(), 1);
    assert_eq!(stored.shipping.failed_attempts(), 1);

    let code = stored.payment.cod.verification_code.clone();
    let delivered = h
        .orders
        .record_delivery(
            order.id,
            agent,
            DeliveryReport {
                status: DeliveryAttemptStatus::Delivered,
                verification_code: Some(code),
                notes: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(delivered.status, OrderStatus::Delivered);
    assert_eq!(delivered.payment.status, PaymentStatus::CodCollected);
    assert!(delivered.payment.cod.collection_date.is_some());
}

#[tokio::test]
async fn third_failed_delivery_attempt_auto_cancels_and_restocks() {
    let h = harness();
    let user = UserId::new();
    let product = seed_product(&h, "City Cruiser", 500, 10).await;
    let order = place(&h, user, &product, 4).await;
    ship(&h, order.id).await;

    let agent = Identity::admin(UserId::new());
    for attempt in 1..=3 {
        let result = h
            .orders
            .record_delivery(
                order.id,
                agent,
                DeliveryReport {
                    status: DeliveryAttemptStatus::Failed,
                    verification_code: None,
                    notes: Some(format!("nobody home ({attempt})")),
                },
            )
            .await
            .unwrap();
        if attempt < 3 {
            assert_eq!(result.status, OrderStatus::Shipped);
        } else {
            assert_eq!(result.status, OrderStatus::Cancelled);
        }
    }

    assert_eq!(
        h.store.get_product(product.id).await.unwrap().unwrap().inventory.quantity,
        10
    );
}

#[tokio::test]
async fn repeated_code_mismatches_exhaust_delivery_attempts() {
    let h = harness();
    let user = UserId::new();
    let product = seed_product(&h, "City Cruiser", 500, 10).await;
    let order = place(&h, user, &product, 2).await;
    ship(&h, order.id).await;

    let agent = Identity::admin(UserId::new());
    for _ in 0..3 {
        let err = h
            .orders
            .record_delivery(
                order.id,
                agent,
                DeliveryReport {
                    status: DeliveryAttemptStatus::Delivered,
                    verification_code: Some("WRONG0".into()),
                    notes: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidVerificationCode));
    }

    let stored = h.store.get_order(order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::Cancelled);
    assert_eq!(stored.shipping.failed_attempts(), 3);
    assert_eq!(stored.payment.cod.attempts.len(), 3);
    assert_eq!(
        h.store.get_product(product.id).await.unwrap().unwrap().inventory.quantity,
        10
    );
}

#[tokio::test]
async fn verification_code_is_redacted_for_owners() {
    let h = harness();
    let user = UserId::new();
    let product = seed_product(&h, "City Cruiser", 500, 10).await;
    let order = place(&h, user, &product, 1).await;
    // The placement response is a customer read like any other.
    assert!(order.payment.cod.verification_code.is_empty());

    let seen = h
        .orders
        .get_order(order.id, Identity::user(user))
        .await
        .unwrap();
    assert!(seen.payment.cod.verification_code.is_empty());

    let seen_by_admin = h
        .orders
        .get_order(order.id, Identity::admin(UserId::new()))
        .await
        .unwrap();
    assert_eq!(seen_by_admin.payment.cod.verification_code.len(), 6);

    let err = h
        .orders
        .get_order(order.id, Identity::user(UserId::new()))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden));
}

#[tokio::test]
async fn address_update_recomputes_totals_and_locks_after_confirmation() {
    let h = harness();
    let user = UserId::new();
    let product = seed_product(&h, "Budget Bell", 200, 10).await;
    let order = place(&h, user, &product, 1).await;
    assert_eq!(order.summary.shipping, Money::from_rupees(50));

    let updated = h
        .orders
        .update_addresses(
            order.id,
            Identity::user(user),
            services::AddressUpdate {
                shipping_method: Some(ShippingMethod::Express),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.summary.shipping, Money::from_rupees(100));

    let admin = Identity::admin(UserId::new());
    for status in [OrderStatus::Confirmed, OrderStatus::Processing] {
        h.orders
            .update_status(order.id, admin, status, None, None)
            .await
            .unwrap();
    }

    let err = h
        .orders
        .update_addresses(order.id, Identity::user(user), Default::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[tokio::test]
async fn notification_failure_does_not_fail_placement() {
    let h = harness();
    let user = UserId::new();
    let product = seed_product(&h, "City Cruiser", 500, 10).await;
    h.notifier.set_failing(true);

    h.carts.add_item(user, product.id, 1, BTreeMap::new()).await.unwrap();
    let order = h.orders.place_order(Identity::user(user), place_input()).await.unwrap();
    assert_eq!(order.status, OrderStatus::Pending);

    settle().await;
    assert!(h.notifier.sent().is_empty());
}

fn review_input(rating: u8) -> NewReview {
    NewReview {
        rating,
        title: "Solid ride".into(),
        content: "Does everything it says.".into(),
        pros: vec!["comfortable".into()],
        cons: vec![],
        images: vec![],
        device_info: None,
    }
}

async fn deliver(h: &Harness, order_id: common::OrderId) {
    let shipped = ship(h, order_id).await;
    let agent = Identity::admin(UserId::new());
    h.orders
        .record_delivery(
            order_id,
            agent,
            DeliveryReport {
                status: DeliveryAttemptStatus::Delivered,
                verification_code: Some(shipped.payment.cod.verification_code),
                notes: None,
            },
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn review_requires_delivered_purchase() {
    let h = harness();
    let user = UserId::new();
    let product = seed_product(&h, "City Cruiser", 500, 10).await;

    let err = h
        .reviews
        .create_review(user, product.id, review_input(5))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotPurchased));

    let order = place(&h, user, &product, 1).await;
    // Pending orders are not proof of purchase either.
    let err = h
        .reviews
        .create_review(user, product.id, review_input(5))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotPurchased));

    deliver(&h, order.id).await;
    let review = h
        .reviews
        .create_review(user, product.id, review_input(5))
        .await
        .unwrap();
    assert!(review.verified);
    assert_eq!(review.status, domain::ReviewStatus::Pending);
}

#[tokio::test]
async fn duplicate_review_is_rejected() {
    let h = harness();
    let user = UserId::new();
    let product = seed_product(&h, "City Cruiser", 500, 10).await;
    let order = place(&h, user, &product, 1).await;
    deliver(&h, order.id).await;

    h.reviews
        .create_review(user, product.id, review_input(4))
        .await
        .unwrap();
    let err = h
        .reviews
        .create_review(user, product.id, review_input(2))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::DuplicateReview));
}

#[tokio::test]
async fn rating_follows_moderation_and_deletion() {
    let h = harness();
    let user = UserId::new();
    let product = seed_product(&h, "City Cruiser", 500, 10).await;
    let order = place(&h, user, &product, 1).await;
    deliver(&h, order.id).await;

    let review = h
        .reviews
        .create_review(user, product.id, review_input(4))
        .await
        .unwrap();

    // Pending reviews contribute nothing.
    let stored = h.store.get_product(product.id).await.unwrap().unwrap();
    assert_eq!(stored.rating.count, 0);

    let admin = Identity::admin(UserId::new());
    h.reviews
        .moderate_review(review.id, admin, domain::ReviewStatus::Approved, None)
        .await
        .unwrap();
    let stored = h.store.get_product(product.id).await.unwrap().unwrap();
    assert_eq!(stored.rating.count, 1);
    assert_eq!(stored.rating.average, 4.0);
    assert_eq!(stored.rating.distribution, [0, 0, 0, 1, 0]);

    // Deleting the only approved review zeroes the summary.
    h.reviews
        .delete_review(review.id, Identity::user(user))
        .await
        .unwrap();
    let stored = h.store.get_product(product.id).await.unwrap().unwrap();
    assert_eq!(stored.rating.count, 0);
    assert_eq!(stored.rating.average, 0.0);
}

#[tokio::test]
async fn edit_resets_review_to_pending_and_rating_follows() {
    let h = harness();
    let user = UserId::new();
    let product = seed_product(&h, "City Cruiser", 500, 10).await;
    let order = place(&h, user, &product, 1).await;
    deliver(&h, order.id).await;

    let review = h
        .reviews
        .create_review(user, product.id, review_input(5))
        .await
        .unwrap();
    let admin = Identity::admin(UserId::new());
    h.reviews
        .moderate_review(review.id, admin, domain::ReviewStatus::Approved, None)
        .await
        .unwrap();

    let edited = h
        .reviews
        .update_review(
            review.id,
            Identity::user(user),
            domain::ReviewEdit {
                rating: Some(3),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(edited.status, domain::ReviewStatus::Pending);
    assert!(edited.metadata.edited);

    // Back to pending, so it no longer counts toward the rating.
    let stored = h.store.get_product(product.id).await.unwrap().unwrap();
    assert_eq!(stored.rating.count, 0);
}
