use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::Notifier;
use crate::error::DeliveryError;

/// SMS transport posting to a Twilio-style messages endpoint with HTTP
/// basic auth. Retries transiently with exponential backoff; each attempt
/// carries its own timeout.
pub struct SmsNotifier {
    endpoint: String,
    account_sid: String,
    auth_token: String,
    from_number: String,
    to_number: String,
    client: Client,
    timeout: Duration,
    max_retries: u8,
}

impl SmsNotifier {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        api_base: &str,
        account_sid: String,
        auth_token: String,
        from_number: String,
        to_number: String,
    ) -> Self {
        let endpoint = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            api_base.trim_end_matches('/'),
            account_sid
        );
        Self {
            endpoint,
            account_sid,
            auth_token,
            from_number,
            to_number,
            client: Client::new(),
            timeout: Duration::from_secs(10),
            max_retries: 3,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn with_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries.max(1);
        self
    }
}

#[async_trait]
impl Notifier for SmsNotifier {
    async fn deliver(&self, message: &str) -> Result<(), DeliveryError> {
        let form = [
            ("To", self.to_number.as_str()),
            ("From", self.from_number.as_str()),
            ("Body", message),
        ];

        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            let res = self
                .client
                .post(&self.endpoint)
                .basic_auth(&self.account_sid, Some(&self.auth_token))
                .timeout(self.timeout)
                .form(&form)
                .send()
                .await;

            match res {
                Ok(rsp) => {
                    let status = rsp.status();
                    if status.is_success() {
                        tracing::info!(status = %status, "sms accepted by gateway");
                        return Ok(());
                    }
                    // 4xx is a gateway verdict, not a transient fault.
                    if status.is_client_error() {
                        return Err(DeliveryError::Rejected(format!("http {status}")));
                    }
                    if attempt < self.max_retries {
                        tokio::time::sleep(Duration::from_millis(500u64 << (attempt - 1))).await;
                        continue;
                    }
                    return Err(DeliveryError::Transport(format!("http {status}")));
                }
                Err(e) => {
                    if attempt < self.max_retries {
                        tokio::time::sleep(Duration::from_millis(500u64 << (attempt - 1))).await;
                        continue;
                    }
                    return Err(DeliveryError::Transport(format!("sms post failed: {e}")));
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "sms"
    }
}
