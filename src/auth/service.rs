use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::clients::UserClient;
use crate::domain::{is_valid_phone, Address, BusinessDetails, FarmDetails, Role, User, UserCreate};
use crate::user_actor::UserError;
use super::{
    generate_reset_token, hash_password, hash_reset_token, verify_password, AuthError, Mail, Mailer,
    TokenIssuer,
};

const MIN_PASSWORD_LEN: usize = 6;

fn customer() -> Role {
    Role::Customer
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    #[validate(length(min = 1, max = 50, message = "Please provide a name"))]
    pub name: String,
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    pub phone: String,
    #[serde(default = "customer")]
    pub role: Role,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub farm_details: Option<FarmDetails>,
    #[serde(default)]
    pub business_details: Option<BusinessDetails>,
}

/// A signed-in user and their bearer token.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// Account lifecycle on top of the user actor: registration, login, token
/// authentication and password management.
#[derive(Clone)]
pub struct AuthService {
    users: UserClient,
    tokens: TokenIssuer,
    mailer: Arc<dyn Mailer>,
    bcrypt_cost: u32,
    frontend_url: String,
}

impl AuthService {
    pub fn new(
        users: UserClient,
        tokens: TokenIssuer,
        mailer: Arc<dyn Mailer>,
        bcrypt_cost: u32,
        frontend_url: String,
    ) -> Self {
        Self { users, tokens, mailer, bcrypt_cost, frontend_url }
    }

    fn session(&self, user: User) -> Result<Session, AuthError> {
        let token = self.tokens.issue(&user.id)?;
        Ok(Session { token, user })
    }

    #[instrument(skip(self, registration), fields(email = %registration.email, role = ?registration.role))]
    pub async fn register(&self, registration: Registration) -> Result<Session, AuthError> {
        registration
            .validate()
            .map_err(|e| UserError::ValidationError(e.to_string()))?;
        if !is_valid_phone(&registration.phone) {
            return Err(UserError::ValidationError("Please provide a valid 10-digit phone number".into()).into());
        }
        if registration.role == Role::Admin {
            return Err(AuthError::AdminRegistration);
        }

        let password_hash = hash_password(registration.password, self.bcrypt_cost).await?;
        let role = registration.role;
        let user = self
            .users
            .create_user(UserCreate {
                name: registration.name,
                email: registration.email,
                password_hash,
                phone: registration.phone,
                role,
                address: registration.address,
                farm_details: registration.farm_details.filter(|_| role == Role::Farmer),
                business_details: registration.business_details.filter(|_| role.is_seller()),
                is_verified: false,
            })
            .await?;
        info!(user_id = %user.id, "User registered");
        self.session(user)
    }

    /// Deactivated accounts are refused before the password is checked.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: Option<String>, password: Option<String>) -> Result<Session, AuthError> {
        let (email, password) = match (email, password) {
            (Some(email), Some(password)) if !email.trim().is_empty() && !password.is_empty() => (email, password),
            _ => return Err(AuthError::MissingCredentials),
        };

        let user = self.users.find_by_email(email).await?.ok_or(AuthError::InvalidCredentials)?;
        if !user.is_active {
            warn!(user_id = %user.id, "Login attempt on deactivated account");
            return Err(AuthError::Deactivated);
        }
        if !verify_password(password, user.password_hash.clone()).await? {
            return Err(AuthError::InvalidCredentials);
        }

        let user = self.users.record_login(user.id).await?;
        info!(user_id = %user.id, "Login successful");
        self.session(user)
    }

    /// Resolve a bearer token to an active user.
    pub async fn authenticate(&self, token: &str) -> Result<User, AuthError> {
        let claims = self.tokens.verify(token)?;
        let user = self.users.get_user(claims.sub).await?.ok_or(AuthError::NotAuthorized)?;
        if !user.is_active {
            return Err(AuthError::Deactivated);
        }
        Ok(user)
    }

    /// Store a hashed reset token and mail the raw token as a link. If the
    /// mail cannot be sent the token is withdrawn again.
    #[instrument(skip(self))]
    pub async fn forgot_password(&self, email: String) -> Result<(), AuthError> {
        let user = self.users.find_by_email(email).await?.ok_or(AuthError::UnknownEmail)?;
        let reset = generate_reset_token(Utc::now());
        self.users
            .issue_reset_token(user.id.clone(), reset.token_hash, reset.expires_at)
            .await?;

        let url = format!("{}/reset-password/{}", self.frontend_url.trim_end_matches('/'), reset.token);
        let mail = Mail {
            to: user.email.clone(),
            subject: "Password Reset Request - Millets Platform".into(),
            body: format!(
                "You are receiving this email because you (or someone else) has requested a password reset.\n\n\
                 Please click on the following link to reset your password:\n{url}\n\n\
                 This link will expire in 30 minutes.\n\n\
                 If you did not request this, please ignore this email."
            ),
        };
        if let Err(e) = self.mailer.send(mail).await {
            warn!(user_id = %user.id, error = %e, "Reset mail failed, withdrawing token");
            self.users.clear_reset_token(user.id).await?;
            return Err(AuthError::EmailNotSent);
        }
        Ok(())
    }

    pub async fn reset_password(&self, token: &str, password: String) -> Result<Session, AuthError> {
        self.reset_password_at(token, password, Utc::now()).await
    }

    /// Redeem `token` as of `now`. Valid only strictly before its expiry.
    #[instrument(skip_all)]
    pub async fn reset_password_at(
        &self,
        token: &str,
        password: String,
        now: DateTime<Utc>,
    ) -> Result<Session, AuthError> {
        if password.len() < MIN_PASSWORD_LEN {
            return Err(UserError::ValidationError("Password must be at least 6 characters".into()).into());
        }
        let token_hash = hash_reset_token(token);
        let user = self
            .users
            .find_by_reset_token(token_hash.clone())
            .await?
            .ok_or(UserError::InvalidResetToken)?;
        let password_hash = hash_password(password, self.bcrypt_cost).await?;
        let user = self
            .users
            .redeem_reset_token(user.id, token_hash, password_hash, now)
            .await?;
        info!(user_id = %user.id, "Password reset");
        self.session(user)
    }

    #[instrument(skip(self, current, new_password))]
    pub async fn update_password(
        &self,
        user_id: String,
        current: String,
        new_password: String,
    ) -> Result<Session, AuthError> {
        let user = self.users.require_user(user_id).await?;
        if !verify_password(current, user.password_hash.clone()).await? {
            return Err(AuthError::IncorrectPassword);
        }
        if new_password.len() < MIN_PASSWORD_LEN {
            return Err(UserError::ValidationError("Password must be at least 6 characters".into()).into());
        }
        let password_hash = hash_password(new_password, self.bcrypt_cost).await?;
        let user = self.users.set_password(user.id, password_hash).await?;
        self.session(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor_framework::ResourceActor;
    use crate::mock_framework::CapturingMailer;
    use chrono::Duration;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn service(mailer: Arc<CapturingMailer>) -> (AuthService, UserClient) {
        let counter = AtomicU64::new(1);
        let (actor, client) =
            ResourceActor::<User>::new(16, move || format!("user_{}", counter.fetch_add(1, Ordering::SeqCst)));
        tokio::spawn(actor.run());
        let users = UserClient::new(client);
        let tokens = TokenIssuer::new("test-secret", Duration::days(7));
        let service = AuthService::new(users.clone(), tokens, mailer, 4, "http://localhost:3000/".into());
        (service, users)
    }

    fn registration(email: &str, role: Role) -> Registration {
        Registration {
            name: "Lakshmi".into(),
            email: email.into(),
            password: "secret123".into(),
            phone: "9876543210".into(),
            role,
            address: None,
            farm_details: Some(FarmDetails::default()),
            business_details: None,
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let (auth, _) = service(Arc::new(CapturingMailer::default()));
        let session = auth.register(registration("L@Example.com", Role::Customer)).await.unwrap();
        assert_eq!(session.user.email, "l@example.com");
        assert!(session.user.farm_details.is_none());
        assert_eq!(auth.authenticate(&session.token).await.unwrap().id, session.user.id);

        let login = auth.login(Some("l@example.com".into()), Some("secret123".into())).await.unwrap();
        assert!(login.user.last_login.is_some());

        let wrong = auth.login(Some("l@example.com".into()), Some("nope".into())).await;
        assert_eq!(wrong.unwrap_err(), AuthError::InvalidCredentials);
        let missing = auth.login(Some("l@example.com".into()), None).await;
        assert_eq!(missing.unwrap_err(), AuthError::MissingCredentials);
    }

    #[tokio::test]
    async fn test_register_refuses_duplicates_and_admins() {
        let (auth, _) = service(Arc::new(CapturingMailer::default()));
        auth.register(registration("a@example.com", Role::Farmer)).await.unwrap();
        let duplicate = auth.register(registration("A@example.com", Role::Farmer)).await;
        assert_eq!(duplicate.unwrap_err(), AuthError::User(UserError::AlreadyExists));
        let admin = auth.register(registration("b@example.com", Role::Admin)).await;
        assert_eq!(admin.unwrap_err(), AuthError::AdminRegistration);
    }

    #[tokio::test]
    async fn test_deactivated_account_cannot_login() {
        let (auth, users) = service(Arc::new(CapturingMailer::default()));
        let session = auth.register(registration("d@example.com", Role::Customer)).await.unwrap();
        users.set_status(session.user.id, Some(false), None).await.unwrap();

        let result = auth.login(Some("d@example.com".into()), Some("secret123".into())).await;
        assert_eq!(result.unwrap_err(), AuthError::Deactivated);
        assert_eq!(auth.authenticate(&session.token).await.unwrap_err(), AuthError::Deactivated);
    }

    #[tokio::test]
    async fn test_reset_flow_respects_expiry_boundary() {
        let mailer = Arc::new(CapturingMailer::default());
        let (auth, users) = service(mailer.clone());
        auth.register(registration("r@example.com", Role::Customer)).await.unwrap();
        auth.forgot_password("r@example.com".into()).await.unwrap();

        let mail = mailer.sent().pop().unwrap();
        let token = mail.body.split("/reset-password/").nth(1).unwrap().split_whitespace().next().unwrap().to_string();
        assert!(mail.body.contains("http://localhost:3000/reset-password/"));

        let stored = users.find_by_email("r@example.com".into()).await.unwrap().unwrap();
        let expires_at = stored.reset_password_expire.unwrap();

        let late = auth.reset_password_at(&token, "newsecret".into(), expires_at).await;
        assert_eq!(late.unwrap_err(), AuthError::User(UserError::InvalidResetToken));

        let session = auth
            .reset_password_at(&token, "newsecret".into(), expires_at - Duration::seconds(1))
            .await
            .unwrap();
        assert!(session.user.reset_password_token.is_none());
        auth.login(Some("r@example.com".into()), Some("newsecret".into())).await.unwrap();

        let reused = auth.reset_password_at(&token, "another1".into(), expires_at - Duration::seconds(1)).await;
        assert_eq!(reused.unwrap_err(), AuthError::User(UserError::InvalidResetToken));
    }

    #[tokio::test]
    async fn test_failed_mail_withdraws_token() {
        let mailer = Arc::new(CapturingMailer::failing());
        let (auth, users) = service(mailer);
        auth.register(registration("m@example.com", Role::Customer)).await.unwrap();

        let result = auth.forgot_password("m@example.com".into()).await;
        assert_eq!(result.unwrap_err(), AuthError::EmailNotSent);
        let user = users.find_by_email("m@example.com".into()).await.unwrap().unwrap();
        assert!(user.reset_password_token.is_none());

        let unknown = auth.forgot_password("nobody@example.com".into()).await;
        assert_eq!(unknown.unwrap_err(), AuthError::UnknownEmail);
    }

    #[tokio::test]
    async fn test_update_password_checks_current() {
        let (auth, _) = service(Arc::new(CapturingMailer::default()));
        let session = auth.register(registration("u@example.com", Role::Customer)).await.unwrap();
        let wrong = auth.update_password(session.user.id.clone(), "bad".into(), "newsecret".into()).await;
        assert_eq!(wrong.unwrap_err(), AuthError::IncorrectPassword);
        auth.update_password(session.user.id, "secret123".into(), "newsecret".into()).await.unwrap();
        auth.login(Some("u@example.com".into()), Some("newsecret".into())).await.unwrap();
    }
}
