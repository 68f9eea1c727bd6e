use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Subscription not found: {0}")]
    SubscriptionNotFound(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}
