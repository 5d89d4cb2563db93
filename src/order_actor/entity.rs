use chrono::Utc;

use crate::actor_framework::Entity;
use crate::domain::{order_number, Order, OrderStatus, PaymentInfo, PaymentStatus, StatusEntry, TrackingInfo};
use super::actions::{OrderAction, OrderChange};
use super::dtos::OrderCreate;
use super::error::OrderError;

impl Entity for Order {
    type Id = String;
    type CreatePayload = OrderCreate;
    type Patch = (); // Orders change only through actions
    type Action = OrderAction;
    type ActionResult = OrderChange;
    type Error = OrderError;

    const COLLECTION: &'static str = "orders";

    fn id(&self) -> &String {
        &self.id
    }

    /// Creates a new Order from reserved line items.
    ///
    /// The order number is derived from the creation sequence and never
    /// changes afterwards.
    fn from_create(id: String, sequence: u64, params: OrderCreate) -> Result<Self, OrderError> {
        if params.items.is_empty() {
            return Err(OrderError::EmptyOrder);
        }
        if params.tax_price < 0.0 || params.shipping_price < 0.0 {
            return Err(OrderError::ValidationError("Prices cannot be negative".into()));
        }
        let now = Utc::now();
        let items_price: f64 = params.items.iter().map(|item| item.line_total()).sum();
        Ok(Self {
            id,
            order_number: order_number(now, sequence),
            buyer: params.buyer,
            seller: params.seller,
            order_items: params.items,
            shipping_address: params.shipping_address,
            payment_info: PaymentInfo {
                method: params.payment_method,
                transaction_id: params.transaction_id,
                status: PaymentStatus::Pending,
                paid_at: None,
            },
            items_price,
            tax_price: params.tax_price,
            shipping_price: params.shipping_price,
            total_price: items_price + params.tax_price + params.shipping_price,
            order_status: OrderStatus::Pending,
            status_history: vec![StatusEntry {
                status: OrderStatus::Pending,
                note: Some("Order placed".into()),
                updated_at: now,
            }],
            tracking_info: TrackingInfo::default(),
            delivered_at: None,
            cancelled_at: None,
            cancellation_reason: None,
            notes: params.notes,
            is_rated: false,
            created_at: now,
            updated_at: now,
        })
    }

    fn on_update(&mut self, _patch: ()) -> Result<(), OrderError> {
        Ok(())
    }

    fn handle_action(&mut self, action: OrderAction) -> Result<OrderChange, OrderError> {
        let previous = self.order_status;
        match action {
            OrderAction::Transition { status, note, requester, at } => {
                if !requester.may_manage(&self.seller) {
                    return Err(OrderError::Forbidden("update"));
                }
                if previous.is_terminal() {
                    return Err(OrderError::InvalidTransition { from: previous, to: status });
                }
                match status {
                    OrderStatus::Delivered => self.delivered_at = Some(at),
                    OrderStatus::Cancelled => {
                        self.cancelled_at = Some(at);
                        self.cancellation_reason = note.clone();
                    }
                    _ => {}
                }
                self.order_status = status;
                self.status_history.push(StatusEntry { status, note, updated_at: at });
                self.updated_at = at;
            }
            OrderAction::RecordPayment { transaction_id, status, requester, at } => {
                if !requester.may_manage(&self.buyer) {
                    return Err(OrderError::Forbidden("pay for"));
                }
                if transaction_id.is_some() {
                    self.payment_info.transaction_id = transaction_id;
                }
                self.payment_info.status = status;
                if status == PaymentStatus::Completed {
                    self.payment_info.paid_at = Some(at);
                    if self.order_status == OrderStatus::Pending {
                        self.order_status = OrderStatus::Confirmed;
                        self.status_history.push(StatusEntry {
                            status: OrderStatus::Confirmed,
                            note: Some("Payment completed".into()),
                            updated_at: at,
                        });
                    }
                }
                self.updated_at = at;
            }
        }
        Ok(OrderChange { order: self.clone(), previous })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MilletType, OrderItem, PaymentMethod, Requester, Role, ShippingAddress, Unit};

    fn create_payload() -> OrderCreate {
        OrderCreate {
            buyer: "customer_1".into(),
            seller: "farmer_1".into(),
            items: vec![OrderItem {
                product: "product_1".into(),
                name: "Organic Foxtail Millet".into(),
                quantity: 3,
                unit: Unit::Kg,
                price: 120.0,
                image: None,
                millet_type: MilletType::Foxtail,
            }],
            shipping_address: ShippingAddress {
                name: None,
                phone: None,
                street: "MG Road".into(),
                city: "Bangalore".into(),
                state: "Karnataka".into(),
                pincode: "560001".into(),
                country: "India".into(),
            },
            payment_method: PaymentMethod::Upi,
            transaction_id: None,
            tax_price: 18.0,
            shipping_price: 40.0,
            notes: None,
        }
    }

    fn order() -> Order {
        Order::from_create("order_1".into(), 7, create_payload()).unwrap()
    }

    fn seller() -> Requester {
        Requester { user_id: "farmer_1".into(), role: Role::Farmer }
    }

    fn transition(status: OrderStatus, requester: Requester) -> OrderAction {
        OrderAction::Transition { status, note: Some("note".into()), requester, at: Utc::now() }
    }

    #[test]
    fn test_create_computes_totals_and_number() {
        let order = order();
        assert_eq!(order.items_price, 360.0);
        assert_eq!(order.total_price, 418.0);
        assert!(order.order_number.starts_with("MIL"));
        assert!(order.order_number.ends_with("000007"));
        assert_eq!(order.order_status, OrderStatus::Pending);
        assert_eq!(order.status_history.len(), 1);
    }

    #[test]
    fn test_create_rejects_empty_items() {
        let mut payload = create_payload();
        payload.items.clear();
        assert_eq!(Order::from_create("o".into(), 1, payload).unwrap_err(), OrderError::EmptyOrder);
    }

    #[test]
    fn test_terminal_status_is_final() {
        let mut order = order();
        let change = order.handle_action(transition(OrderStatus::Delivered, seller())).unwrap();
        assert_eq!(change.previous, OrderStatus::Pending);
        assert!(order.delivered_at.is_some());

        let again = order.handle_action(transition(OrderStatus::Delivered, seller()));
        assert_eq!(
            again.unwrap_err(),
            OrderError::InvalidTransition { from: OrderStatus::Delivered, to: OrderStatus::Delivered }
        );
    }

    #[test]
    fn test_cancel_records_reason() {
        let mut order = order();
        order.handle_action(transition(OrderStatus::Cancelled, seller())).unwrap();
        assert_eq!(order.cancellation_reason.as_deref(), Some("note"));
        assert!(order.cancelled_at.is_some());
        assert_eq!(order.status_history.last().map(|e| e.status), Some(OrderStatus::Cancelled));
    }

    #[test]
    fn test_buyer_cannot_change_status() {
        let mut order = order();
        let buyer = Requester { user_id: "customer_1".into(), role: Role::Customer };
        let result = order.handle_action(transition(OrderStatus::Shipped, buyer));
        assert_eq!(result.unwrap_err(), OrderError::Forbidden("update"));
    }

    #[test]
    fn test_completed_payment_confirms_pending_order() {
        let mut order = order();
        let buyer = Requester { user_id: "customer_1".into(), role: Role::Customer };
        order
            .handle_action(OrderAction::RecordPayment {
                transaction_id: Some("UPI123".into()),
                status: PaymentStatus::Completed,
                requester: buyer,
                at: Utc::now(),
            })
            .unwrap();
        assert_eq!(order.order_status, OrderStatus::Confirmed);
        assert_eq!(order.payment_info.transaction_id.as_deref(), Some("UPI123"));
        assert!(order.payment_info.paid_at.is_some());
    }

    #[test]
    fn test_seller_cannot_record_payment() {
        let mut order = order();
        let result = order.handle_action(OrderAction::RecordPayment {
            transaction_id: None,
            status: PaymentStatus::Completed,
            requester: seller(),
            at: Utc::now(),
        });
        assert_eq!(result.unwrap_err(), OrderError::Forbidden("pay for"));
    }
}
