//! Outbound mail collaborator: the `MailSender` seam plus the HTML
//! bodies for verification and password-reset mails. The default
//! sender logs instead of speaking SMTP; a real transport implements
//! the same trait.

use {async_trait::async_trait, tracing::info};

use parley_common::ApiResult;

#[async_trait]
pub trait MailSender: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> ApiResult<()>;
}

/// Logs outbound mail instead of delivering it.
#[derive(Debug, Default, Clone)]
pub struct TracingMailer;

#[async_trait]
impl MailSender for TracingMailer {
    async fn send(&self, to: &str, subject: &str, _html_body: &str) -> ApiResult<()> {
        info!(to, subject, "outbound mail (not delivered: tracing mailer)");
        Ok(())
    }
}

pub fn email_verification_content(username: &str, verification_url: &str) -> String {
    format!(
        "<p>Hi {username},</p>\
         <p>Please verify your email address by clicking the link below. \
         The link expires in 20 minutes.</p>\
         <p><a href=\"{verification_url}\">Verify your email</a></p>"
    )
}

pub fn forgot_password_content(username: &str, reset_url: &str) -> String {
    format!(
        "<p>Hi {username},</p>\
         <p>We received a request to reset your password. \
         The link expires in 20 minutes.</p>\
         <p><a href=\"{reset_url}\">Reset your password</a></p>"
    )
}
