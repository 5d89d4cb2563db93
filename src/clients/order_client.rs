use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, instrument, warn};

use crate::actor_framework::ResourceClient;
use crate::clients::{ProductClient, UserClient};
use crate::domain::{Order, OrderStatus, PaymentStatus, Requester};
use crate::notifications::{NotificationDispatcher, NotificationEvent, Recipient};
use crate::order_actor::{OrderAction, OrderChange, OrderCreate, OrderError, PlaceOrder};
use crate::product_actor::Reservation;

/// Client for interacting with the Order actor.
///
/// This client orchestrates the user and product actors around the order
/// lifecycle: stock is reserved before an order exists, and every
/// reservation is released again if the order cannot be placed.
#[derive(Clone)]
pub struct OrderClient {
    inner: ResourceClient<Order>,
    user_client: UserClient,
    product_client: ProductClient,
    notifier: Arc<dyn NotificationDispatcher>,
}

impl OrderClient {
    pub fn new(
        inner: ResourceClient<Order>,
        user_client: UserClient,
        product_client: ProductClient,
        notifier: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            inner,
            user_client,
            product_client,
            notifier,
        }
    }

    #[instrument(skip(self, request), fields(items = request.order_items.len()))]
    pub async fn create_order(&self, buyer_id: String, request: PlaceOrder) -> Result<Order, OrderError> {
        info!("Processing create_order request (Client Side)");
        if request.order_items.is_empty() {
            return Err(OrderError::EmptyOrder);
        }

        let mut reserved = Vec::with_capacity(request.order_items.len());
        let order = match self.place(buyer_id, request, &mut reserved).await {
            Ok(order) => order,
            Err(e) => {
                error!(error = %e, reserved = reserved.len(), "Order placement failed, releasing stock");
                self.release_all(&reserved).await;
                return Err(e);
            }
        };
        info!(order_id = %order.id, order_number = %order.order_number, "Order placed");

        if let Err(e) = self.user_client.increment_orders(order.seller.clone()).await {
            warn!(seller = %order.seller, error = %e, "Seller order counter not updated");
        }
        self.notifier.dispatch(
            Recipient::User(order.seller.clone()),
            NotificationEvent::order("New order received", &order.id),
        );
        Ok(order)
    }

    /// Reserve every line, then insert the order. Reservations taken so far
    /// are left in `reserved` for the caller to release on failure.
    async fn place(
        &self,
        buyer_id: String,
        request: PlaceOrder,
        reserved: &mut Vec<Reservation>,
    ) -> Result<Order, OrderError> {
        for line in &request.order_items {
            let reservation = self.product_client.reserve(line.product.clone(), line.quantity).await?;
            reserved.push(reservation);
        }

        let seller = match reserved.first() {
            Some(first) => first.seller.clone(),
            None => return Err(OrderError::EmptyOrder),
        };
        if reserved.iter().any(|r| r.seller != seller) {
            return Err(OrderError::MixedSellers);
        }

        let payload = OrderCreate {
            buyer: buyer_id,
            seller,
            items: reserved.iter().map(|r| r.item.clone()).collect(),
            shipping_address: request.shipping_address,
            payment_method: request.payment_info.method,
            transaction_id: request.payment_info.transaction_id,
            tax_price: request.tax_price,
            shipping_price: request.shipping_price,
            notes: request.notes,
        };
        self.inner.create(payload).await
    }

    async fn release_all(&self, reservations: &[Reservation]) {
        for reservation in reservations {
            let item = &reservation.item;
            if let Err(e) = self.product_client.release(item.product.clone(), item.quantity).await {
                error!(product_id = %item.product, quantity = item.quantity, error = %e, "Stock release failed");
            }
        }
    }

    /// Move an order along its lifecycle and apply the side effects of the
    /// new status.
    #[instrument(skip(self, note, requester), fields(requester = %requester.user_id))]
    pub async fn update_status(
        &self,
        order_id: String,
        status: OrderStatus,
        note: Option<String>,
        requester: Requester,
    ) -> Result<Order, OrderError> {
        let action = OrderAction::Transition { status, note, requester, at: Utc::now() };
        let OrderChange { order, previous } = self.inner.perform_action(order_id, action).await?;
        info!(from = %previous, to = %status, "Order status updated");

        match status {
            OrderStatus::Delivered => {
                if let Err(e) = self.user_client.credit_earnings(order.seller.clone(), order.total_price).await {
                    error!(seller = %order.seller, error = %e, "Seller earnings not credited");
                }
            }
            OrderStatus::Cancelled => {
                for item in &order.order_items {
                    if let Err(e) = self.product_client.release(item.product.clone(), item.quantity).await {
                        error!(product_id = %item.product, error = %e, "Stock not restored on cancel");
                    }
                }
            }
            _ => {}
        }

        self.notifier.dispatch(
            Recipient::User(order.buyer.clone()),
            NotificationEvent::order(
                format!("Order {} status updated to {}", order.order_number, status),
                &order.id,
            ),
        );
        Ok(order)
    }

    #[instrument(skip(self, transaction_id, requester), fields(requester = %requester.user_id))]
    pub async fn record_payment(
        &self,
        order_id: String,
        transaction_id: Option<String>,
        status: PaymentStatus,
        requester: Requester,
    ) -> Result<Order, OrderError> {
        let action = OrderAction::RecordPayment { transaction_id, status, requester, at: Utc::now() };
        let OrderChange { order, .. } = self.inner.perform_action(order_id, action).await?;

        self.notifier.dispatch(
            Recipient::User(order.seller.clone()),
            NotificationEvent::payment(
                format!("Payment {} for order {}", status.as_str(), order.order_number),
                &order.id,
            ),
        );
        Ok(order)
    }

    /// An order as seen by one of its parties or an admin.
    #[instrument(skip(self, requester), fields(requester = %requester.user_id))]
    pub async fn order_for(&self, order_id: String, requester: &Requester) -> Result<Order, OrderError> {
        let order = self.require_order(order_id).await?;
        if requester.is_admin() || order.buyer == requester.user_id || order.seller == requester.user_id {
            Ok(order)
        } else {
            Err(OrderError::Forbidden("view"))
        }
    }

    /// The buyer's orders, newest first.
    #[instrument(skip(self))]
    pub async fn buyer_orders(&self, buyer_id: String) -> Result<Vec<Order>, OrderError> {
        self.list_orders(move |o| o.buyer == buyer_id).await
    }

    /// The seller's orders, newest first.
    #[instrument(skip(self))]
    pub async fn seller_orders(&self, seller_id: String) -> Result<Vec<Order>, OrderError> {
        self.list_orders(move |o| o.seller == seller_id).await
    }

    /// Matching orders, newest first.
    pub async fn list_orders(
        &self,
        filter: impl Fn(&Order) -> bool + Send + Sync + 'static,
    ) -> Result<Vec<Order>, OrderError> {
        let mut orders = self.inner.query(filter).await?;
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.order_number.cmp(&a.order_number)));
        Ok(orders)
    }
}

impl_client_methods!(OrderClient, Order, OrderError, order);
