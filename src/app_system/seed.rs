use thiserror::Error;
use tracing::info;

use crate::auth::{hash_password, AuthError};
use crate::domain::{
    Address, BusinessDetails, Category, FarmDetails, Location, MilletType, NutritionalInfo, ProductImage,
    Requester, Role, SellerType, Unit, User, UserCreate, VerificationStatus,
};
use crate::product_actor::{ProductCreate, ProductDraft, ProductError};
use crate::user_actor::UserError;
use super::MarketSystem;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    User(#[from] UserError),
    #[error(transparent)]
    Product(#[from] ProductError),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

struct DemoAccount {
    name: &'static str,
    email: &'static str,
    password: &'static str,
    phone: &'static str,
    role: Role,
}

const ACCOUNTS: [DemoAccount; 4] = [
    DemoAccount { name: "Admin User", email: "admin@millets.com", password: "admin123", phone: "9876543210", role: Role::Admin },
    DemoAccount { name: "Ramesh Kumar", email: "farmer@example.com", password: "farmer123", phone: "9876543211", role: Role::Farmer },
    DemoAccount { name: "Suresh Industries", email: "processor@example.com", password: "processor123", phone: "9876543212", role: Role::Processor },
    DemoAccount { name: "Priya Sharma", email: "customer@example.com", password: "customer123", phone: "9876543213", role: Role::Customer },
];

fn address(street: &str, city: &str, state: &str, pincode: &str) -> Option<Address> {
    Some(Address {
        street: Some(street.into()),
        city: Some(city.into()),
        state: Some(state.into()),
        pincode: Some(pincode.into()),
        ..Address::default()
    })
}

fn profile(role: Role) -> (Option<Address>, Option<FarmDetails>, Option<BusinessDetails>) {
    match role {
        Role::Farmer => (
            address("Village Road", "Bangalore", "Karnataka", "560001"),
            Some(FarmDetails {
                farm_name: Some("Green Valley Farm".into()),
                farm_size: Some(10.0),
                farm_location: Some("Bangalore Rural".into()),
                certifications: vec!["Organic".into()],
            }),
            None,
        ),
        Role::Processor => (
            address("Industrial Area", "Hyderabad", "Telangana", "500001"),
            None,
            Some(BusinessDetails {
                business_name: Some("Suresh Millets Processing".into()),
                gst_number: Some("GST123456789".into()),
                license_number: Some("LIC123456".into()),
            }),
        ),
        Role::Customer => (address("MG Road", "Mumbai", "Maharashtra", "400001"), None, None),
        Role::Admin => (None, None, None),
    }
}

fn karnataka() -> Location {
    Location {
        state: Some("Karnataka".into()),
        district: Some("Bangalore".into()),
        pincode: Some("560001".into()),
    }
}

fn demo_products() -> [(ProductDraft, &'static str); 2] {
    [
        (
            ProductDraft {
                name: "Organic Pearl Millet".into(),
                description: "Premium quality organic pearl millet, rich in iron and fiber. Perfect for making rotis and porridge.".into(),
                millet_type: MilletType::Pearl,
                category: Category::RawGrain,
                price: 80.0,
                unit: Unit::Kg,
                quantity: 1000,
                min_order_quantity: 10,
                certifications: Vec::new(),
                location: karnataka(),
                nutritional_info: NutritionalInfo {
                    protein: Some(11.0),
                    fiber: Some(8.0),
                    iron: Some(8.0),
                    calcium: Some(42.0),
                    calories: Some(378.0),
                },
                benefits: vec!["Rich in iron".into(), "Good for diabetics".into(), "Helps in weight loss".into(), "Gluten-free".into()],
                storage: Some("Store in a cool, dry place".into()),
                shelf_life: Some("6 months".into()),
                tags: vec!["organic".into(), "gluten-free".into(), "healthy".into()],
            },
            "pearl-millet",
        ),
        (
            ProductDraft {
                name: "Finger Millet Flour".into(),
                description: "Fresh finger millet flour (ragi flour), stone ground and unpolished. Excellent for babies and health-conscious individuals.".into(),
                millet_type: MilletType::Finger,
                category: Category::Flour,
                price: 60.0,
                unit: Unit::Kg,
                quantity: 500,
                min_order_quantity: 5,
                certifications: Vec::new(),
                location: karnataka(),
                nutritional_info: NutritionalInfo {
                    protein: Some(7.0),
                    fiber: Some(11.0),
                    iron: Some(3.9),
                    calcium: Some(364.0),
                    calories: Some(328.0),
                },
                benefits: vec!["High in calcium".into(), "Good for bones".into(), "Aids digestion".into(), "Controls blood sugar".into()],
                storage: Some("Refrigerate after opening".into()),
                shelf_life: Some("3 months".into()),
                tags: vec!["flour".into(), "ragi".into(), "healthy".into(), "baby-food".into()],
            },
            "ragi-flour",
        ),
    ]
}

/// Create demo accounts and two approved listings when no user exists yet.
/// Returns whether anything was seeded.
pub async fn seed_demo_data(system: &MarketSystem, bcrypt_cost: u32) -> Result<bool, SeedError> {
    if !system.user_client.list_users(|_| true).await?.is_empty() {
        info!("Users present, skipping demo seed");
        return Ok(false);
    }

    let mut created: Vec<User> = Vec::with_capacity(ACCOUNTS.len());
    for account in &ACCOUNTS {
        let (address, farm_details, business_details) = profile(account.role);
        let user = system
            .user_client
            .create_user(UserCreate {
                name: account.name.into(),
                email: account.email.into(),
                password_hash: hash_password(account.password.into(), bcrypt_cost).await?,
                phone: account.phone.into(),
                role: account.role,
                address,
                farm_details,
                business_details,
                is_verified: true,
            })
            .await?;
        info!(email = %user.email, role = user.role.as_str(), "Demo account created");
        created.push(user);
    }

    let admin = created.iter().find(|u| u.role == Role::Admin).map(|u| u.id.clone()).unwrap_or_default();
    let sellers = created.iter().filter(|u| u.role.is_seller());
    for (user, (draft, image)) in sellers.zip(demo_products()) {
        let seller_type = if user.role == Role::Farmer { SellerType::Farmer } else { SellerType::Processor };
        let product = system
            .product_client
            .create_product(ProductCreate { seller: user.id.clone(), seller_type, draft })
            .await?;
        system
            .product_client
            .add_images(
                product.id.clone(),
                Requester::from(user),
                vec![ProductImage { url: format!("/uploads/products/{image}.jpg"), public_id: Some(image.into()) }],
            )
            .await?;
        system
            .product_client
            .verify(product.id.clone(), VerificationStatus::Approved, admin.clone(), None)
            .await?;
        info!(product_id = %product.id, name = %product.name, "Demo product listed");
    }
    Ok(true)
}
