//! Order submission.
//!
//! An order is built from a [`ProceedTicket`], which the draft only issues
//! when the checkout gate is ready, so the submitted totals are always the
//! ones the shopper saw.

use segishop_core::UserId;
use tracing::{info, instrument, warn};

use super::types::{
    CreateOrderRequest, CreateOrderResponse, CreatedOrder, GuestContact, OrderItemPayload,
    OrderTotalsSubmission, PaymentInfo,
};
use super::{ApiClient, ApiError, rejected};
use crate::draft::ProceedTicket;

/// Who is placing the order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Buyer {
    Customer(UserId),
    Guest(GuestContact),
}

impl CreateOrderRequest {
    /// Assemble an order from a ready checkout and a confirmed payment.
    #[must_use]
    pub fn from_ticket(ticket: &ProceedTicket, buyer: Buyer, payment_info: PaymentInfo) -> Self {
        let (user_id, guest) = match buyer {
            Buyer::Customer(id) => (Some(id), None),
            Buyer::Guest(contact) => (None, Some(contact)),
        };
        let totals = ticket.totals;

        Self {
            user_id,
            guest_email: guest.as_ref().map(|g| g.email.clone()),
            guest_first_name: guest.as_ref().map(|g| g.first_name.clone()),
            guest_last_name: guest.as_ref().map(|g| g.last_name.clone()),
            guest_phone: guest.and_then(|g| g.phone),
            shipping_address: ticket.address.clone(),
            items: ticket.cart.lines.iter().map(OrderItemPayload::from).collect(),
            payment_info,
            totals: OrderTotalsSubmission {
                sub_total: totals.subtotal,
                tax_amount: totals.tax,
                shipping_amount: totals.shipping,
                discount_amount: totals.discount,
                total_amount: totals.total,
            },
            coupon_code: ticket.coupon.as_ref().map(|c| c.code.clone()),
            coupon_discount_amount: ticket.coupon.as_ref().map(|_| totals.discount),
            shipping_zone_method_id: Some(ticket.option.id),
            shipping_method_title: Some(ticket.option.title.clone()),
            notes: None,
        }
    }
}

impl ApiClient {
    /// Submit an order.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] with the backend's message (and any
    /// validation errors) when it refuses the order, or another error if the
    /// request fails.
    #[instrument(skip(self, request), fields(items = request.items.len(), total = %request.totals.total_amount))]
    pub async fn create_order(&self, request: &CreateOrderRequest) -> Result<CreatedOrder, ApiError> {
        let url = self.endpoint("orders")?;
        let response: CreateOrderResponse = self.post(url, request).await?;

        if !response.success {
            warn!(
                error_code = ?response.error_code,
                validation_errors = response.validation_errors.len(),
                "Order rejected"
            );
            let message = match (response.message, response.validation_errors.is_empty()) {
                (Some(message), false) => {
                    Some(format!("{message}: {}", response.validation_errors.join("; ")))
                }
                (None, false) => Some(response.validation_errors.join("; ")),
                (message, true) => message,
            };
            return Err(rejected(message, "Failed to create order"));
        }

        let order = response.order.ok_or(ApiError::EmptyBody("order"))?;
        info!(order_id = %order.id, order_number = ?order.order_number, "Order created");
        Ok(order)
    }
}
