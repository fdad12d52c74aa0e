use mockall::mock;
use paystack_tools::{InitializeRequest, InitializedTransaction, PaymentGateway, PaystackApiError, VerifiedTransaction};

mock! {
    pub Gateway {}
    impl PaymentGateway for Gateway {
        async fn initialize_payment(
            &self,
            request: InitializeRequest,
        ) -> Result<InitializedTransaction, PaystackApiError>;
        async fn verify_payment(&self, reference: &str) -> Result<VerifiedTransaction, PaystackApiError>;
    }
}
