// src/utils/notify.rs

use async_trait::async_trait;

use crate::error::AppError;

/// Outbound notification hook for assignment creation.
///
/// Delivery is best-effort: callers log a failure and move on, the
/// transactional write is never rolled back because of it.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn assignment_created(
        &self,
        email: &str,
        teacher_username: &str,
        title: &str,
    ) -> Result<(), AppError>;
}

/// Default notifier that only records the event in the application log.
/// Stands in for the mail integration in deployments without SMTP access.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn assignment_created(
        &self,
        email: &str,
        teacher_username: &str,
        title: &str,
    ) -> Result<(), AppError> {
        tracing::info!(email, teacher_username, title, "assignment notification");
        Ok(())
    }
}
