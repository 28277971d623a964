use barterpay_engine::{PaymentInitiated, PaymentProvider, PaymentRequest, ProviderError};
use mockall::mock;

mock! {
    pub PaymentProvider {}
    impl PaymentProvider for PaymentProvider {
        async fn initiate_payment(&self, request: PaymentRequest) -> Result<PaymentInitiated, ProviderError>;
    }
}
