//! Order workflow: placement, lifecycle transitions and delivery handling.

use std::sync::Arc;

use common::{Identity, OrderId};
use domain::{
    Address, BillingInfo, DeliveryAttemptStatus, Order, OrderError, OrderItem, OrderMetadata,
    OrderStatus, ShippingMethod,
};
use store::{DocumentStore, OrderFilter, Page, StockDecrement};

use crate::error::{Result, ServiceError};
use crate::inventory::InventoryLedger;
use crate::notify::Notifier;

/// Input for placing an order from the caller's cart.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub billing: BillingInfo,
    pub shipping_address: Address,
    pub shipping_method: ShippingMethod,
    pub notes: Option<String>,
    pub metadata: OrderMetadata,
}

/// Fields an address update may change while the order is still mutable.
#[derive(Debug, Clone, Default)]
pub struct AddressUpdate {
    pub billing: Option<BillingInfo>,
    pub shipping_address: Option<Address>,
    pub shipping_method: Option<ShippingMethod>,
}

/// One delivery agent report against an order.
#[derive(Debug, Clone)]
pub struct DeliveryReport {
    pub status: DeliveryAttemptStatus,
    pub verification_code: Option<String>,
    pub notes: Option<String>,
}

#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn DocumentStore>,
    ledger: InventoryLedger,
    notifier: Arc<dyn Notifier>,
}

impl OrderService {
    pub fn new(store: Arc<dyn DocumentStore>, notifier: Arc<dyn Notifier>) -> Self {
        let ledger = InventoryLedger::new(Arc::clone(&store));
        Self {
            store,
            ledger,
            notifier,
        }
    }

    /// Places an order from the user's cart.
    ///
    /// Validates availability per line, snapshots the items, then persists the
    /// order and every stock decrement as one store transaction. The cart is
    /// cleared best-effort afterwards and a confirmation notification is
    /// dispatched fire-and-forget. Like every other read, the returned order
    /// has the verification code redacted for non-admin callers.
    #[tracing::instrument(skip(self, input), fields(user_id = %identity.user))]
    pub async fn place_order(&self, identity: Identity, input: PlaceOrder) -> Result<Order> {
        let start = std::time::Instant::now();
        let user = identity.user;

        let mut cart = self
            .store
            .get_cart(user)
            .await?
            .ok_or(ServiceError::EmptyCart)?;
        if cart.is_empty() {
            return Err(ServiceError::EmptyCart);
        }

        // Advisory availability pass; the authoritative check is the
        // conditional decrement inside commit_order.
        let mut items = Vec::with_capacity(cart.items.len());
        let mut decrements = Vec::with_capacity(cart.items.len());
        for line in &cart.items {
            let product = self.store.get_product(line.product).await?;
            let available = product
                .as_ref()
                .is_some_and(|p| p.is_available(line.quantity));
            if !available {
                let name = product
                    .map(|p| p.name)
                    .unwrap_or_else(|| line.product.to_string());
                return Err(ServiceError::StockUnavailable { name });
            }

            items.push(OrderItem {
                product: line.product,
                quantity: line.quantity,
                price: line.price.clone(),
                specifications: line.selected_specs.clone(),
            });
            decrements.push(StockDecrement {
                product: line.product,
                quantity: line.quantity,
            });
        }

        let mut order = Order::place(
            user,
            items,
            input.billing,
            input.shipping_address,
            input.shipping_method,
            input.metadata,
        )?;
        order.notes = input.notes;

        self.store.commit_order(&order, &decrements).await?;

        // Outside the transaction boundary: a stale cart is annoying, a
        // missing order is not.
        cart.clear();
        if let Err(err) = self.store.save_cart(&cart).await {
            tracing::warn!(order_id = %order.id, error = %err, "failed to clear cart after placement");
        }

        metrics::counter!("orders_placed_total").increment(1);
        metrics::histogram!("order_placement_duration_seconds")
            .record(start.elapsed().as_secs_f64());
        tracing::info!(order_id = %order.id, total = %order.summary.total, "order placed");

        self.notify_confirmation(order.clone());
        Ok(redact_for(order, identity))
    }

    /// Owner-or-admin read. Non-admin callers get the verification code
    /// redacted.
    pub async fn get_order(&self, order_id: OrderId, identity: Identity) -> Result<Order> {
        let order = self.load(order_id).await?;
        if !identity.can_access(order.user) {
            return Err(ServiceError::Forbidden);
        }
        Ok(redact_for(order, identity))
    }

    /// Lists orders. Admins see all orders, users their own.
    pub async fn list_orders(
        &self,
        identity: Identity,
        status: Option<OrderStatus>,
        page: Page,
    ) -> Result<(Vec<Order>, u64)> {
        let filter = OrderFilter {
            user: (!identity.is_admin()).then_some(identity.user),
            status,
        };
        let orders = self.store.list_orders(&filter, page).await?;
        let total = self.store.count_orders(&filter).await?;
        let orders = orders
            .into_iter()
            .map(|o| redact_for(o, identity))
            .collect();
        Ok((orders, total))
    }

    /// Updates billing/shipping details. Permitted only while the order is
    /// `pending` or `confirmed`; stock, totals and the COD ceiling are
    /// re-checked because the shipping method can change.
    #[tracing::instrument(skip(self, update))]
    pub async fn update_addresses(
        &self,
        order_id: OrderId,
        identity: Identity,
        update: AddressUpdate,
    ) -> Result<Order> {
        let mut order = self.load(order_id).await?;
        if !identity.can_access(order.user) {
            return Err(ServiceError::Forbidden);
        }
        if !order.status.addresses_mutable() {
            return Err(ServiceError::Validation(format!(
                "addresses cannot change once the order is {}",
                order.status
            )));
        }

        for item in &order.items {
            let product = self.store.get_product(item.product).await?;
            if !product.as_ref().is_some_and(|p| p.inventory.in_stock) {
                let name = product
                    .map(|p| p.name)
                    .unwrap_or_else(|| item.product.to_string());
                return Err(ServiceError::StockUnavailable { name });
            }
        }

        if let Some(billing) = update.billing {
            order.billing = billing;
        }
        if let Some(address) = update.shipping_address {
            order.shipping.address = address;
        }
        if let Some(method) = update.shipping_method {
            order.shipping.method = method;
        }

        order.calculate_totals();
        order.enforce_cod_ceiling()?;
        self.store.update_order(&order).await?;

        self.notify_updated(order.clone());
        Ok(redact_for(order, identity))
    }

    /// Admin status change. Shipping requires a tracking number; cancellation
    /// restocks every line.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(
        &self,
        order_id: OrderId,
        identity: Identity,
        next: OrderStatus,
        tracking_number: Option<String>,
        estimated_delivery: Option<chrono::DateTime<chrono::Utc>>,
    ) -> Result<Order> {
        if !identity.is_admin() {
            return Err(ServiceError::Forbidden);
        }

        let mut order = self.load(order_id).await?;
        let previous = order.status;

        match next {
            OrderStatus::Shipped => order.mark_shipped(tracking_number, estimated_delivery)?,
            OrderStatus::Delivered => order.mark_delivered(Some(identity.user))?,
            OrderStatus::Cancelled => order.cancel()?,
            other => order.transition_to(other)?,
        }

        self.store.update_order(&order).await?;
        if order.status == OrderStatus::Cancelled {
            self.restock(&order).await?;
            metrics::counter!("orders_cancelled_total").increment(1);
        }

        self.notify_status(order.clone(), previous);
        Ok(order)
    }

    /// User-initiated cancellation, allowed only from `pending`/`confirmed`.
    /// Admins may cancel from any cancellable status.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_order(&self, order_id: OrderId, identity: Identity) -> Result<Order> {
        let mut order = self.load(order_id).await?;
        if !identity.can_access(order.user) {
            return Err(ServiceError::Forbidden);
        }
        if !identity.is_admin() && !order.status.cancellable_by_customer() {
            return Err(ServiceError::InvalidTransition {
                from: order.status,
                to: OrderStatus::Cancelled,
            });
        }

        let previous = order.status;
        order.cancel()?;
        self.store.update_order(&order).await?;
        self.restock(&order).await?;
        metrics::counter!("orders_cancelled_total").increment(1);

        self.notify_status(order.clone(), previous);
        Ok(redact_for(order, identity))
    }

    /// Processes a delivery agent report.
    ///
    /// A successful handoff requires the matching verification code; a
    /// mismatch records a failed collection attempt, counts as a failed
    /// delivery attempt, and fails the call. The third accumulated failed
    /// delivery attempt auto-cancels and restocks.
    #[tracing::instrument(skip(self, report))]
    pub async fn record_delivery(
        &self,
        order_id: OrderId,
        identity: Identity,
        report: DeliveryReport,
    ) -> Result<Order> {
        if !identity.is_admin() {
            return Err(ServiceError::Forbidden);
        }

        let mut order = self.load(order_id).await?;
        let previous = order.status;
        let notes = report.notes.unwrap_or_default();

        match report.status {
            DeliveryAttemptStatus::Delivered => {
                let code = report.verification_code.ok_or_else(|| {
                    ServiceError::Validation("verification code is required".to_string())
                })?;
                match order.confirm_delivery(&code, identity.user) {
                    Ok(()) => {
                        order.record_delivery_attempt(report.status, notes);
                        self.store.update_order(&order).await?;
                    }
                    Err(err @ OrderError::InvalidVerificationCode) => {
                        // The mismatch counts against the delivery-attempt
                        // budget like any other failed attempt, alongside the
                        // failed collection attempt the aggregate recorded.
                        order.record_delivery_attempt(DeliveryAttemptStatus::Failed, notes);
                        self.handle_abandonment(&mut order).await?;
                        if order.status != previous {
                            self.notify_status(order.clone(), previous);
                        }
                        return Err(err.into());
                    }
                    Err(err) => return Err(err.into()),
                }
            }
            DeliveryAttemptStatus::Failed => {
                order.record_delivery_attempt(report.status, notes);
                self.handle_abandonment(&mut order).await?;
            }
            DeliveryAttemptStatus::Pending | DeliveryAttemptStatus::Rescheduled => {
                order.record_delivery_attempt(report.status, notes);
                self.store.update_order(&order).await?;
            }
        }

        if order.status != previous {
            self.notify_status(order.clone(), previous);
        }
        Ok(order)
    }

    /// Cancels and restocks an order whose failed-attempt budget is spent,
    /// then persists it either way.
    async fn handle_abandonment(&self, order: &mut Order) -> Result<()> {
        if order.delivery_abandoned() && order.status != OrderStatus::Cancelled {
            tracing::info!(order_id = %order.id, "delivery abandoned, cancelling order");
            order.cancel()?;
        }
        self.store.update_order(order).await?;
        if order.status == OrderStatus::Cancelled {
            self.restock(order).await?;
            metrics::counter!("orders_cancelled_total").increment(1);
        }
        Ok(())
    }

    async fn load(&self, order_id: OrderId) -> Result<Order> {
        self.store
            .get_order(order_id)
            .await?
            .ok_or(ServiceError::NotFound { entity: "order" })
    }

    /// Returns every line's quantity to stock. A product deleted since
    /// placement is logged and skipped.
    async fn restock(&self, order: &Order) -> Result<()> {
        for item in &order.items {
            match self
                .ledger
                .adjust_stock(item.product, item.quantity as i64)
                .await
            {
                Ok(_) => {}
                Err(ServiceError::NotFound { .. }) => {
                    tracing::warn!(
                        order_id = %order.id,
                        product_id = %item.product,
                        "product missing during restock"
                    );
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    fn notify_confirmation(&self, order: Order) {
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            if let Err(err) = notifier.order_confirmation(&order).await {
                metrics::counter!("notifications_failed_total").increment(1);
                tracing::warn!(order_id = %order.id, error = %err, "notification failed");
            }
        });
    }

    fn notify_status(&self, order: Order, previous: OrderStatus) {
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            if let Err(err) = notifier.order_status_update(&order, previous).await {
                metrics::counter!("notifications_failed_total").increment(1);
                tracing::warn!(order_id = %order.id, error = %err, "notification failed");
            }
        });
    }

    fn notify_updated(&self, order: Order) {
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            if let Err(err) = notifier.order_updated(&order).await {
                metrics::counter!("notifications_failed_total").increment(1);
                tracing::warn!(order_id = %order.id, error = %err, "notification failed");
            }
        });
    }
}

/// Strips fields a non-admin caller must not see.
fn redact_for(mut order: Order, identity: Identity) -> Order {
    if !identity.is_admin() {
        order.payment.cod.verification_code.clear();
    }
    order
}
