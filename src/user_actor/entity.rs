use chrono::Utc;

use crate::actor_framework::Entity;
use crate::domain::{is_valid_phone, Language, User, UserCreate, UserPatch};
use super::actions::UserAction;
use super::error::UserError;

const DEFAULT_AVATAR: &str = "default-avatar.png";

impl Entity for User {
    type Id = String;
    type CreatePayload = UserCreate;
    type Patch = UserPatch;
    type Action = UserAction;
    type ActionResult = User;
    type Error = UserError;

    const COLLECTION: &'static str = "users";

    fn id(&self) -> &String {
        &self.id
    }

    /// Creates a new User. Emails are stored lowercased.
    fn from_create(id: String, _sequence: u64, params: UserCreate) -> Result<Self, UserError> {
        if params.name.trim().is_empty() {
            return Err(UserError::ValidationError("Please provide a name".into()));
        }
        let now = Utc::now();
        Ok(Self {
            id,
            name: params.name.trim().to_string(),
            email: params.email.trim().to_lowercase(),
            password_hash: params.password_hash,
            phone: params.phone,
            role: params.role,
            address: params.address.unwrap_or_default(),
            profile_image: DEFAULT_AVATAR.to_string(),
            language: Language::default(),
            is_verified: params.is_verified,
            is_active: true,
            farm_details: params.farm_details,
            business_details: params.business_details,
            total_earnings: 0.0,
            total_orders: 0,
            rating: 0.0,
            reviews: 0,
            reset_password_token: None,
            reset_password_expire: None,
            last_login: None,
            notifications: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Emails are unique across the collection.
    fn conflicts_with(&self, existing: &Self) -> bool {
        self.email == existing.email
    }

    /// Updates profile fields. Address and detail blocks merge field-wise.
    fn on_update(&mut self, patch: UserPatch) -> Result<(), UserError> {
        if let Some(name) = patch.name.filter(|n| !n.trim().is_empty()) {
            self.name = name.trim().to_string();
        }
        if let Some(phone) = patch.phone {
            if !is_valid_phone(&phone) {
                return Err(UserError::ValidationError("Please provide a valid 10-digit phone number".into()));
            }
            self.phone = phone;
        }
        if let Some(address) = patch.address {
            self.address.merge(address);
        }
        if let Some(language) = patch.language {
            self.language = language;
        }
        if let Some(farm) = patch.farm_details {
            self.farm_details.get_or_insert_with(Default::default).merge(farm);
        }
        if let Some(business) = patch.business_details {
            self.business_details.get_or_insert_with(Default::default).merge(business);
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    fn handle_action(&mut self, action: UserAction) -> Result<User, UserError> {
        match action {
            UserAction::RecordLogin { at } => {
                self.last_login = Some(at);
            }
            UserAction::SetPassword { password_hash } => {
                self.password_hash = password_hash;
                self.reset_password_token = None;
                self.reset_password_expire = None;
            }
            UserAction::IssueResetToken { token_hash, expires_at } => {
                self.reset_password_token = Some(token_hash);
                self.reset_password_expire = Some(expires_at);
            }
            UserAction::ClearResetToken => {
                self.reset_password_token = None;
                self.reset_password_expire = None;
            }
            UserAction::RedeemResetToken { token_hash, password_hash, now } => {
                let matches = self.reset_password_token.as_deref() == Some(token_hash.as_str());
                let live = self.reset_password_expire.is_some_and(|expires| now < expires);
                if !(matches && live) {
                    return Err(UserError::InvalidResetToken);
                }
                self.password_hash = password_hash;
                self.reset_password_token = None;
                self.reset_password_expire = None;
            }
            UserAction::CreditEarnings(amount) => {
                self.total_earnings += amount;
            }
            UserAction::IncrementOrders => {
                self.total_orders += 1;
            }
            UserAction::PushNotification(notification) => {
                self.notifications.push(notification);
            }
            UserAction::MarkNotificationRead { notification_id } => {
                let notification = self
                    .notifications
                    .iter_mut()
                    .find(|n| n.id == notification_id)
                    .ok_or(UserError::NotificationNotFound(notification_id))?;
                notification.read = true;
            }
            UserAction::SetStatus { is_active, is_verified } => {
                if let Some(active) = is_active {
                    self.is_active = active;
                }
                if let Some(verified) = is_verified {
                    self.is_verified = verified;
                }
            }
            UserAction::SetProfileImage(url) => {
                self.profile_image = url;
            }
        }
        self.updated_at = Utc::now();
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;
    use chrono::Duration;

    fn user() -> User {
        User::from_create(
            "user_1".into(),
            1,
            UserCreate {
                name: " Ramesh ".into(),
                email: "Farmer@Example.com".into(),
                password_hash: "hash".into(),
                phone: "9876543211".into(),
                role: Role::Farmer,
                address: None,
                farm_details: None,
                business_details: None,
                is_verified: false,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_create_normalizes_identity() {
        let user = user();
        assert_eq!(user.name, "Ramesh");
        assert_eq!(user.email, "farmer@example.com");
        assert!(user.is_active);
        assert_eq!(user.profile_image, DEFAULT_AVATAR);
    }

    #[test]
    fn test_reset_token_expires_at_boundary() {
        let issued = Utc::now();
        let expires_at = issued + Duration::minutes(30);
        let mut user = user();
        user.handle_action(UserAction::IssueResetToken { token_hash: "abc".into(), expires_at }).unwrap();

        let mut before = user.clone();
        let redeemed = before.handle_action(UserAction::RedeemResetToken {
            token_hash: "abc".into(),
            password_hash: "new".into(),
            now: expires_at - Duration::milliseconds(1),
        });
        assert_eq!(redeemed.unwrap().password_hash, "new");
        assert!(before.reset_password_token.is_none());

        let mut at_boundary = user.clone();
        let rejected = at_boundary.handle_action(UserAction::RedeemResetToken {
            token_hash: "abc".into(),
            password_hash: "new".into(),
            now: expires_at,
        });
        assert_eq!(rejected, Err(UserError::InvalidResetToken));
    }

    #[test]
    fn test_reset_token_is_single_use() {
        let now = Utc::now();
        let mut user = user();
        user.handle_action(UserAction::IssueResetToken {
            token_hash: "abc".into(),
            expires_at: now + Duration::minutes(30),
        })
        .unwrap();
        let redeem = UserAction::RedeemResetToken { token_hash: "abc".into(), password_hash: "new".into(), now };
        user.handle_action(redeem.clone()).unwrap();
        assert_eq!(user.handle_action(redeem), Err(UserError::InvalidResetToken));
    }

    #[test]
    fn test_mark_unknown_notification_fails() {
        let mut user = user();
        let result = user.handle_action(UserAction::MarkNotificationRead { notification_id: "n1".into() });
        assert_eq!(result, Err(UserError::NotificationNotFound("n1".into())));
    }

    #[test]
    fn test_profile_patch_rejects_bad_phone() {
        let mut user = user();
        let result = user.on_update(UserPatch { phone: Some("123".into()), ..UserPatch::default() });
        assert!(matches!(result, Err(UserError::ValidationError(_))));
    }
}
