use mockall::mock;

use crate::{
    db_types::{NewOrder, Order, OrderId, OrderNote, OrderStatusType, StatusUpdate},
    traits::{OrderStore, OrderStoreError, PaymentInitiated, PaymentProvider, PaymentRequest, ProviderError},
};

mock! {
    pub OrderStore {}
    impl OrderStore for OrderStore {
        async fn insert_order(&self, order: NewOrder) -> Result<(Order, bool), OrderStoreError>;
        async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, OrderStoreError>;
        async fn fetch_orders_by_meta(&self, key: &str, value: &str, statuses: &[OrderStatusType]) -> Result<Vec<Order>, OrderStoreError>;
        async fn fetch_meta(&self, order_id: &OrderId, key: &str) -> Result<Option<String>, OrderStoreError>;
        async fn add_meta(&self, order_id: &OrderId, key: &str, value: &str) -> Result<(), OrderStoreError>;
        async fn add_note(&self, order_id: &OrderId, note: &str) -> Result<(), OrderStoreError>;
        async fn fetch_notes(&self, order_id: &OrderId) -> Result<Vec<OrderNote>, OrderStoreError>;
        async fn transition_status(&self, order_id: &OrderId, expected: &[OrderStatusType], update: StatusUpdate) -> Result<Option<Order>, OrderStoreError>;
    }
}

mock! {
    pub PaymentProvider {}
    impl PaymentProvider for PaymentProvider {
        async fn initiate_payment(&self, request: PaymentRequest) -> Result<PaymentInitiated, ProviderError>;
    }
}
