//! Orders sub-client: place, cancel, query.

use crate::client::CexClient;
use crate::domain::order::{Order, PlaceOrderRequest};
use crate::error::SdkError;

pub struct Orders<'a> {
    pub(crate) client: &'a CexClient,
}

impl<'a> Orders<'a> {
    /// Validate and submit an order. Invalid requests never reach the network.
    pub async fn place(&self, request: &PlaceOrderRequest) -> Result<Order, SdkError> {
        request.validate()?;
        let order = self.client.http.place_order(request).await?;
        tracing::info!(
            order_id = order.id,
            symbol = %order.symbol,
            side = %order.side,
            status = %order.status,
            "Order placed"
        );
        Ok(order)
    }

    pub async fn cancel(&self, order_id: i64) -> Result<(), SdkError> {
        Ok(self.client.http.cancel_order(order_id).await?)
    }

    /// All orders of the current user, in server order.
    pub async fn my_orders(&self) -> Result<Vec<Order>, SdkError> {
        Ok(self.client.http.get_my_orders().await?)
    }

    /// Orders still resting on the book (`NEW` or `PARTIAL`).
    pub async fn open_orders(&self) -> Result<Vec<Order>, SdkError> {
        let orders = self.my_orders().await?;
        Ok(orders.into_iter().filter(|o| o.status.is_open()).collect())
    }
}
