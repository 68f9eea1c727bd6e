//! SMTP email alert channel via `lettre` with TLS support.
//!
//! Delivers price-drop alerts as emails through an SMTP server. The
//! recipient comes from the subscription, so the transport is shared
//! across all subscribers.

use lettre::{
    message::Mailbox, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Message, Tokio1Executor,
};

use crate::templating::TemplateRenderer;
use crate::traits::{AlertSender, NotifyError, PriceDropAlert};

/// Sends price-drop alerts as emails via SMTP.
pub struct EmailAlertSender {
    /// Async SMTP transport for sending emails.
    transport: AsyncSmtpTransport<Tokio1Executor>,
    /// Sender mailbox.
    from: Mailbox,
    renderer: TemplateRenderer,
}

impl EmailAlertSender {
    /// Build an `EmailAlertSender` from SMTP configuration.
    ///
    /// - `smtp_host`: SMTP server hostname.
    /// - `smtp_port`: Optional port (defaults to 587).
    /// - `tls`: Whether to use TLS. `None` or `Some(true)` enables STARTTLS;
    ///   port 465 always uses implicit TLS regardless of this flag.
    /// - `from`: Sender email address (e.g. `"Alerts <alerts@example.com>"`).
    ///
    /// SMTP credentials are resolved from the `SMTP_USERNAME` and `SMTP_PASSWORD`
    /// environment variables. If both are set, they are passed to the transport;
    /// otherwise the connection is unauthenticated.
    pub fn from_config(
        smtp_host: &str,
        smtp_port: Option<u16>,
        tls: Option<bool>,
        from: &str,
    ) -> Result<Self, NotifyError> {
        Self::with_renderer(smtp_host, smtp_port, tls, from, TemplateRenderer::new())
    }

    /// Same as [`from_config`](Self::from_config) with custom templates.
    pub fn with_renderer(
        smtp_host: &str,
        smtp_port: Option<u16>,
        tls: Option<bool>,
        from: &str,
        renderer: TemplateRenderer,
    ) -> Result<Self, NotifyError> {
        let from_mailbox: Mailbox = from
            .parse()
            .map_err(|e: lettre::address::AddressError| NotifyError::Config(e.to_string()))?;

        let port = smtp_port.unwrap_or(587);
        let use_tls = tls.unwrap_or(true);

        // Port 465 uses implicit TLS; everything else uses STARTTLS when TLS is enabled.
        let mut builder = if port == 465 || use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(smtp_host)
                .map_err(|e| NotifyError::Config(e.to_string()))?
                .port(port)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(smtp_host).port(port)
        };

        // Attach credentials from environment if available.
        if let (Ok(username), Ok(password)) =
            (std::env::var("SMTP_USERNAME"), std::env::var("SMTP_PASSWORD"))
        {
            builder = builder.credentials(Credentials::new(username, password));
        }

        Ok(Self {
            transport: builder.build(),
            from: from_mailbox,
            renderer,
        })
    }
}

#[async_trait::async_trait]
impl AlertSender for EmailAlertSender {
    /// Render and send one alert email to the subscription's recipient.
    async fn send_price_drop_alert(&self, alert: &PriceDropAlert) -> Result<(), NotifyError> {
        let to: Mailbox = alert
            .recipient
            .parse()
            .map_err(|e: lettre::address::AddressError| NotifyError::Config(e.to_string()))?;

        let subject = self.renderer.render_subject(alert)?;
        let body = self.renderer.render_body(alert)?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(&subject)
            .body(body)
            .map_err(|e| NotifyError::Smtp(e.to_string()))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| NotifyError::Smtp(e.to_string()))?;

        tracing::info!(
            channel = "email",
            recipient = %alert.recipient,
            asin = %alert.asin,
            price = alert.current_price,
            "alert delivered"
        );

        Ok(())
    }

    /// Returns `"email"`.
    fn channel_name(&self) -> &str {
        "email"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_email_address() {
        let mailbox: Result<Mailbox, _> = "alice@example.com".parse();
        assert!(mailbox.is_ok());
    }

    #[test]
    fn parse_email_with_display_name() {
        let mailbox: Result<Mailbox, _> = "Alice <alice@example.com>".parse();
        assert!(mailbox.is_ok());
        let mb = mailbox.unwrap();
        assert_eq!(mb.email.to_string(), "alice@example.com");
    }

    #[test]
    fn from_config_valid() {
        let sender = EmailAlertSender::from_config(
            "smtp.example.com",
            Some(587),
            Some(true),
            "alerts@example.com",
        );
        assert!(sender.is_ok());
    }

    #[test]
    fn from_config_invalid_from_address() {
        let result =
            EmailAlertSender::from_config("smtp.example.com", None, None, "bad-address");
        assert!(result.is_err());
        let err = result.err().unwrap().to_string();
        assert!(err.contains("Configuration error"), "got: {err}");
    }

    #[test]
    fn from_config_implicit_tls_port() {
        let sender = EmailAlertSender::from_config(
            "smtp.example.com",
            Some(465),
            None,
            "alerts@example.com",
        );
        assert!(sender.is_ok());
    }

    #[test]
    fn from_config_no_tls() {
        let sender = EmailAlertSender::from_config(
            "smtp.example.com",
            Some(25),
            Some(false),
            "alerts@example.com",
        );
        assert!(sender.is_ok());
    }

    #[test]
    fn channel_name_is_email() {
        let sender = EmailAlertSender::from_config(
            "smtp.example.com",
            Some(587),
            Some(true),
            "alerts@example.com",
        )
        .unwrap();
        assert_eq!(sender.channel_name(), "email");
    }
}
