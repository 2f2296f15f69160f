pub mod sms;

pub use sms::SmsNotifier;

use crate::error::DeliveryError;

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one message to the configured recipient. No confirmation
    /// beyond the immediate acknowledgment.
    async fn deliver(&self, message: &str) -> Result<(), DeliveryError>;
    fn name(&self) -> &'static str;
}
