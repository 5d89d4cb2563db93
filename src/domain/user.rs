use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Marketplace role. Farmers and processors are sellers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Farmer,
    Processor,
    Customer,
    Admin,
}

impl Role {
    pub fn is_seller(self) -> bool {
        matches!(self, Role::Farmer | Role::Processor)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Farmer => "farmer",
            Role::Processor => "processor",
            Role::Customer => "customer",
            Role::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Hi,
    Ta,
    Te,
    Kn,
    Bn,
    Mr,
    Gu,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub pincode: Option<String>,
    #[serde(default = "default_country")]
    pub country: String,
}

impl Default for Address {
    fn default() -> Self {
        Self {
            street: None,
            city: None,
            state: None,
            pincode: None,
            country: default_country(),
        }
    }
}

impl Address {
    /// Field-wise merge: values present in `patch` win.
    pub fn merge(&mut self, patch: AddressPatch) {
        merge_field(&mut self.street, patch.street);
        merge_field(&mut self.city, patch.city);
        merge_field(&mut self.state, patch.state);
        merge_field(&mut self.pincode, patch.pincode);
        if let Some(country) = patch.country {
            self.country = country;
        }
    }
}

/// Address fields of a profile update; absent fields keep their value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressPatch {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub country: Option<String>,
}

pub(crate) fn default_country() -> String {
    "India".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmDetails {
    #[serde(default)]
    pub farm_name: Option<String>,
    #[serde(default)]
    pub farm_size: Option<f64>,
    #[serde(default)]
    pub farm_location: Option<String>,
    #[serde(default)]
    pub certifications: Vec<String>,
}

impl FarmDetails {
    pub fn merge(&mut self, other: FarmDetails) {
        merge_field(&mut self.farm_name, other.farm_name);
        merge_field(&mut self.farm_size, other.farm_size);
        merge_field(&mut self.farm_location, other.farm_location);
        if !other.certifications.is_empty() {
            self.certifications = other.certifications;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessDetails {
    #[serde(default)]
    pub business_name: Option<String>,
    #[serde(default)]
    pub gst_number: Option<String>,
    #[serde(default)]
    pub license_number: Option<String>,
}

impl BusinessDetails {
    pub fn merge(&mut self, other: BusinessDetails) {
        merge_field(&mut self.business_name, other.business_name);
        merge_field(&mut self.gst_number, other.gst_number);
        merge_field(&mut self.license_number, other.license_number);
    }
}

fn merge_field<T>(target: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *target = value;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Order,
    Product,
    Payment,
    System,
}

/// An entry in a user's notification inbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    /// Order or product the notification is about.
    #[serde(default)]
    pub reference: Option<String>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Represents a registered user in the system.
///
/// This is the stored document and includes credentials; API responses use
/// [`UserProfile`] instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: String,
    pub role: Role,
    pub address: Address,
    pub profile_image: String,
    pub language: Language,
    pub is_verified: bool,
    pub is_active: bool,
    pub farm_details: Option<FarmDetails>,
    pub business_details: Option<BusinessDetails>,
    pub total_earnings: f64,
    pub total_orders: u64,
    pub rating: f64,
    pub reviews: u64,
    pub reset_password_token: Option<String>,
    pub reset_password_expire: Option<DateTime<Utc>>,
    pub last_login: Option<DateTime<Utc>>,
    pub notifications: Vec<Notification>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a new user. The password arrives already hashed.
#[derive(Debug, Clone)]
pub struct UserCreate {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: String,
    pub role: Role,
    pub address: Option<Address>,
    pub farm_details: Option<FarmDetails>,
    pub business_details: Option<BusinessDetails>,
    pub is_verified: bool,
}

/// Payload for updating an existing user's profile.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<AddressPatch>,
    pub language: Option<Language>,
    pub farm_details: Option<FarmDetails>,
    pub business_details: Option<BusinessDetails>,
}

/// Public view of a [`User`]: everything except credentials and reset state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub address: Address,
    pub profile_image: String,
    pub language: Language,
    pub is_verified: bool,
    pub is_active: bool,
    pub farm_details: Option<FarmDetails>,
    pub business_details: Option<BusinessDetails>,
    pub total_earnings: f64,
    pub total_orders: u64,
    pub rating: f64,
    pub reviews: u64,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            role: user.role,
            address: user.address.clone(),
            profile_image: user.profile_image.clone(),
            language: user.language,
            is_verified: user.is_verified,
            is_active: user.is_active,
            farm_details: user.farm_details.clone(),
            business_details: user.business_details.clone(),
            total_earnings: user.total_earnings,
            total_orders: user.total_orders,
            rating: user.rating,
            reviews: user.reviews,
            last_login: user.last_login,
            created_at: user.created_at,
        }
    }
}

impl User {
    pub fn profile(&self) -> UserProfile {
        UserProfile::from(self)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// The authenticated caller behind a mutation, used for ownership checks
/// inside entity hooks.
#[derive(Debug, Clone, PartialEq)]
pub struct Requester {
    pub user_id: String,
    pub role: Role,
}

impl Requester {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Owner of the resource, or an admin.
    pub fn may_manage(&self, owner_id: &str) -> bool {
        self.is_admin() || self.user_id == owner_id
    }
}

impl From<&User> for Requester {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id.clone(),
            role: user.role,
        }
    }
}

/// Ten ASCII digits.
pub fn is_valid_phone(phone: &str) -> bool {
    phone.len() == 10 && phone.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_validation() {
        assert!(is_valid_phone("9876543210"));
        assert!(!is_valid_phone("98765"));
        assert!(!is_valid_phone("98765432a0"));
    }

    #[test]
    fn test_address_merge_keeps_unset_fields() {
        let mut address = Address {
            street: Some("Village Road".into()),
            city: Some("Bangalore".into()),
            ..Address::default()
        };
        address.merge(AddressPatch {
            city: Some("Mysore".into()),
            ..AddressPatch::default()
        });
        assert_eq!(address.street.as_deref(), Some("Village Road"));
        assert_eq!(address.city.as_deref(), Some("Mysore"));
        assert_eq!(address.country, "India");
    }

    #[test]
    fn test_address_patch_without_country_keeps_it() {
        let mut address = Address { country: "Nepal".into(), ..Address::default() };
        let patch: UserPatch = serde_json::from_str(r#"{"address": {"pincode": "44600"}}"#).unwrap();
        address.merge(patch.address.unwrap());
        assert_eq!(address.pincode.as_deref(), Some("44600"));
        assert_eq!(address.country, "Nepal");

        address.merge(AddressPatch { country: Some("India".into()), ..AddressPatch::default() });
        assert_eq!(address.country, "India");
    }

    #[test]
    fn test_role_wire_names() {
        assert_eq!(serde_json::to_string(&Role::Processor).unwrap(), "\"processor\"");
        let role: Role = serde_json::from_str("\"farmer\"").unwrap();
        assert!(role.is_seller());
        assert!(!Role::Customer.is_seller());
    }
}
