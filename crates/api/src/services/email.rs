//! Email service for verification and notification messages.
//!
//! Uses SMTP via lettre for delivery with Askama HTML templates. Delivery
//! is best-effort everywhere: callers log failures and carry on, a lost
//! email never fails the workflow that triggered it.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;

/// One line of a purchase receipt.
pub struct ReceiptLine {
    /// Game title.
    pub title: String,
    /// Price paid, formatted.
    pub price: String,
}

/// HTML template for the email verification message.
#[derive(Template)]
#[template(path = "email/verification.html")]
struct VerificationEmailHtml<'a> {
    name: &'a str,
    verify_url: &'a str,
}

/// Plain text template for the email verification message.
#[derive(Template)]
#[template(path = "email/verification.txt")]
struct VerificationEmailText<'a> {
    name: &'a str,
    verify_url: &'a str,
}

/// HTML template for the password reset message.
#[derive(Template)]
#[template(path = "email/password_reset.html")]
struct PasswordResetHtml<'a> {
    name: &'a str,
    reset_url: &'a str,
}

/// Plain text template for the password reset message.
#[derive(Template)]
#[template(path = "email/password_reset.txt")]
struct PasswordResetText<'a> {
    name: &'a str,
    reset_url: &'a str,
}

/// HTML template for the purchase receipt.
#[derive(Template)]
#[template(path = "email/receipt.html")]
struct ReceiptEmailHtml<'a> {
    name: &'a str,
    order_number: &'a str,
    items: &'a [ReceiptLine],
    total: &'a str,
}

/// Plain text template for the purchase receipt.
#[derive(Template)]
#[template(path = "email/receipt.txt")]
struct ReceiptEmailText<'a> {
    name: &'a str,
    order_number: &'a str,
    items: &'a [ReceiptLine],
    total: &'a str,
}

/// HTML template for the listing-approved notification.
#[derive(Template)]
#[template(path = "email/listing_approved.html")]
struct ListingApprovedHtml<'a> {
    name: &'a str,
    title: &'a str,
}

/// Plain text template for the listing-approved notification.
#[derive(Template)]
#[template(path = "email/listing_approved.txt")]
struct ListingApprovedText<'a> {
    name: &'a str,
    title: &'a str,
}

/// HTML template for the listing-rejected notification.
#[derive(Template)]
#[template(path = "email/listing_rejected.html")]
struct ListingRejectedHtml<'a> {
    name: &'a str,
    title: &'a str,
    reason: &'a str,
}

/// Plain text template for the listing-rejected notification.
#[derive(Template)]
#[template(path = "email/listing_rejected.txt")]
struct ListingRejectedText<'a> {
    name: &'a str,
    title: &'a str,
    reason: &'a str,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_owned(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }

    /// Send the account verification email.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_verification_email(
        &self,
        to: &str,
        name: &str,
        verify_url: &str,
    ) -> Result<(), EmailError> {
        let html = VerificationEmailHtml { name, verify_url }.render()?;
        let text = VerificationEmailText { name, verify_url }.render()?;

        self.send_multipart_email(to, "Verify your Pixelport account", &text, &html)
            .await
    }

    /// Send the password reset email.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_password_reset(
        &self,
        to: &str,
        name: &str,
        reset_url: &str,
    ) -> Result<(), EmailError> {
        let html = PasswordResetHtml { name, reset_url }.render()?;
        let text = PasswordResetText { name, reset_url }.render()?;

        self.send_multipart_email(to, "Reset your Pixelport password", &text, &html)
            .await
    }

    /// Send a purchase receipt.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_purchase_receipt(
        &self,
        to: &str,
        name: &str,
        order_number: &str,
        items: &[ReceiptLine],
        total: &str,
    ) -> Result<(), EmailError> {
        let html = ReceiptEmailHtml {
            name,
            order_number,
            items,
            total,
        }
        .render()?;
        let text = ReceiptEmailText {
            name,
            order_number,
            items,
            total,
        }
        .render()?;

        self.send_multipart_email(to, &format!("Your Pixelport order {order_number}"), &text, &html)
            .await
    }

    /// Notify a developer that their listing was approved.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_listing_approved(
        &self,
        to: &str,
        name: &str,
        title: &str,
    ) -> Result<(), EmailError> {
        let html = ListingApprovedHtml { name, title }.render()?;
        let text = ListingApprovedText { name, title }.render()?;

        self.send_multipart_email(to, &format!("\"{title}\" is live on Pixelport"), &text, &html)
            .await
    }

    /// Notify a developer that their listing was rejected, with the reason.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_listing_rejected(
        &self,
        to: &str,
        name: &str,
        title: &str,
        reason: &str,
    ) -> Result<(), EmailError> {
        let html = ListingRejectedHtml { name, title, reason }.render()?;
        let text = ListingRejectedText { name, title, reason }.render()?;

        self.send_multipart_email(
            to,
            &format!("Review result for \"{title}\""),
            &text,
            &html,
        )
        .await
    }

    /// Build and send a text + HTML multipart message.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text: &str,
        html: &str,
    ) -> Result<(), EmailError> {
        let from = self
            .from_address
            .parse()
            .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?;
        let to_mailbox = to
            .parse()
            .map_err(|_| EmailError::InvalidAddress(to.to_owned()))?;

        let message = Message::builder()
            .from(from)
            .to(to_mailbox)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text.to_owned()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html.to_owned()),
                    ),
            )?;

        self.mailer.send(message).await?;

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_templates_render() {
        let html = VerificationEmailHtml {
            name: "Rin",
            verify_url: "https://api.example.com/api/auth/verificar/abc123",
        }
        .render()
        .unwrap();
        assert!(html.contains("Rin"));
        assert!(html.contains("verificar/abc123"));

        let text = VerificationEmailText {
            name: "Rin",
            verify_url: "https://api.example.com/api/auth/verificar/abc123",
        }
        .render()
        .unwrap();
        assert!(text.contains("verificar/abc123"));
    }

    #[test]
    fn test_receipt_templates_render_items() {
        let items = vec![
            ReceiptLine {
                title: "Aurora".to_owned(),
                price: "99.00".to_owned(),
            },
            ReceiptLine {
                title: "Starlit Cove".to_owned(),
                price: "4.50".to_owned(),
            },
        ];

        let text = ReceiptEmailText {
            name: "Rin",
            order_number: "PX-1A2B3C4D",
            items: &items,
            total: "120.06",
        }
        .render()
        .unwrap();

        assert!(text.contains("PX-1A2B3C4D"));
        assert!(text.contains("Aurora"));
        assert!(text.contains("Starlit Cove"));
        assert!(text.contains("120.06"));
    }

    #[test]
    fn test_rejection_template_carries_reason() {
        let html = ListingRejectedHtml {
            name: "Rin",
            title: "Aurora",
            reason: "Incomplete metadata",
        }
        .render()
        .unwrap();
        assert!(html.contains("Incomplete metadata"));
    }
}
