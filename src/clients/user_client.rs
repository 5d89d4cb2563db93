use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use crate::actor_framework::ResourceClient;
use crate::domain::{Notification, User, UserCreate, UserPatch};
use crate::user_actor::{UserAction, UserError};

/// Client for interacting with the User actor.
#[derive(Clone)]
pub struct UserClient {
    inner: ResourceClient<User>,
}

impl_basic_client!(UserClient, User, UserError, user);

impl UserClient {
    #[instrument(skip(self, payload), fields(email = %payload.email, role = ?payload.role))]
    pub async fn create_user(&self, payload: UserCreate) -> Result<User, UserError> {
        debug!("Sending request");
        self.inner.create(payload).await
    }

    #[instrument(skip(self, patch))]
    pub async fn update_profile(&self, id: String, patch: UserPatch) -> Result<User, UserError> {
        debug!("Sending request");
        self.inner.update(id, patch).await
    }

    #[instrument(skip(self))]
    pub async fn find_by_email(&self, email: String) -> Result<Option<User>, UserError> {
        let email = email.trim().to_lowercase();
        let mut found = self.inner.query(move |u| u.email == email).await?;
        Ok(found.pop())
    }

    #[instrument(skip(self, token_hash))]
    pub async fn find_by_reset_token(&self, token_hash: String) -> Result<Option<User>, UserError> {
        let mut found = self
            .inner
            .query(move |u| u.reset_password_token.as_deref() == Some(token_hash.as_str()))
            .await?;
        Ok(found.pop())
    }

    pub async fn list_users(
        &self,
        filter: impl Fn(&User) -> bool + Send + Sync + 'static,
    ) -> Result<Vec<User>, UserError> {
        self.inner.query(filter).await
    }

    async fn apply(&self, id: String, action: UserAction) -> Result<User, UserError> {
        debug!("Sending action");
        self.inner.perform_action(id, action).await
    }

    #[instrument(skip(self))]
    pub async fn record_login(&self, id: String) -> Result<User, UserError> {
        self.apply(id, UserAction::RecordLogin { at: Utc::now() }).await
    }

    #[instrument(skip(self, password_hash))]
    pub async fn set_password(&self, id: String, password_hash: String) -> Result<User, UserError> {
        self.apply(id, UserAction::SetPassword { password_hash }).await
    }

    #[instrument(skip(self, token_hash))]
    pub async fn issue_reset_token(
        &self,
        id: String,
        token_hash: String,
        expires_at: DateTime<Utc>,
    ) -> Result<User, UserError> {
        self.apply(id, UserAction::IssueResetToken { token_hash, expires_at }).await
    }

    #[instrument(skip(self))]
    pub async fn clear_reset_token(&self, id: String) -> Result<User, UserError> {
        self.apply(id, UserAction::ClearResetToken).await
    }

    #[instrument(skip(self, token_hash, password_hash))]
    pub async fn redeem_reset_token(
        &self,
        id: String,
        token_hash: String,
        password_hash: String,
        now: DateTime<Utc>,
    ) -> Result<User, UserError> {
        self.apply(id, UserAction::RedeemResetToken { token_hash, password_hash, now }).await
    }

    #[instrument(skip(self))]
    pub async fn credit_earnings(&self, id: String, amount: f64) -> Result<User, UserError> {
        self.apply(id, UserAction::CreditEarnings(amount)).await
    }

    #[instrument(skip(self))]
    pub async fn increment_orders(&self, id: String) -> Result<User, UserError> {
        self.apply(id, UserAction::IncrementOrders).await
    }

    #[instrument(skip(self, notification))]
    pub async fn push_notification(&self, id: String, notification: Notification) -> Result<User, UserError> {
        self.apply(id, UserAction::PushNotification(notification)).await
    }

    #[instrument(skip(self))]
    pub async fn mark_notification_read(&self, id: String, notification_id: String) -> Result<User, UserError> {
        self.apply(id, UserAction::MarkNotificationRead { notification_id }).await
    }

    #[instrument(skip(self))]
    pub async fn set_status(
        &self,
        id: String,
        is_active: Option<bool>,
        is_verified: Option<bool>,
    ) -> Result<User, UserError> {
        self.apply(id, UserAction::SetStatus { is_active, is_verified }).await
    }

    #[instrument(skip(self))]
    pub async fn set_profile_image(&self, id: String, url: String) -> Result<User, UserError> {
        self.apply(id, UserAction::SetProfileImage(url)).await
    }
}
