use async_trait::async_trait;

/// Out-of-band delivery seam for password reset links. Actual email transport
/// lives behind this trait; the default implementation only logs.
#[async_trait]
pub trait ResetNotifier: Send + Sync {
    async fn send_reset(&self, email: &str, token: &str) -> anyhow::Result<()>;
}

/// Development notifier that writes the reset token to the log stream.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl ResetNotifier for LogNotifier {
    async fn send_reset(&self, email: &str, token: &str) -> anyhow::Result<()> {
        tracing::info!(email = %email, token = %token, "password reset requested");
        Ok(())
    }
}
