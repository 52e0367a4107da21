//! Resets the listings table to a small set of sample data owned by `demo`.

use sea_orm::Database;
use sea_orm_migration::MigratorTrait;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use wanderlust::{
    migration::Migrator,
    resources::ListingStore,
    validation::ListingInput,
    AppError, CredentialStore, DbCredentialStore, NewIdentity, Settings,
};

const DEMO_USER: &str = "demo";
const DEMO_PASSWORD: &str = "wanderlust-demo";

fn samples() -> Vec<ListingInput> {
    let listing = |title: &str, description: &str, price: i64, location: &str, country: &str| ListingInput {
        title: title.into(),
        description: description.into(),
        image: None,
        price,
        location: location.into(),
        country: country.into(),
    };
    vec![
        listing(
            "Cozy Beachfront Cottage",
            "Escape to this charming beachfront cottage for a relaxing getaway.",
            1500,
            "Malibu",
            "United States",
        ),
        listing(
            "Modern Loft in Downtown",
            "Stay in the heart of the city in this stylish loft apartment.",
            1200,
            "New York City",
            "United States",
        ),
        listing(
            "Mountain Retreat",
            "Unplug and unwind in this peaceful mountain cabin.",
            1000,
            "Aspen",
            "United States",
        ),
        listing(
            "Historic Villa in Tuscany",
            "Experience the charm of Tuscany in this beautifully restored villa.",
            2500,
            "Florence",
            "Italy",
        ),
        listing(
            "Secluded Treehouse Getaway",
            "Live among the treetops in this unique treehouse retreat.",
            800,
            "Portland",
            "United States",
        ),
    ]
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let settings = Settings::from_env()?;
    let db = Database::connect(&settings.database_url).await?;
    Migrator::up(&db, None).await?;

    let credentials = DbCredentialStore::new(db.clone());
    let identity = NewIdentity {
        username: DEMO_USER.into(),
        email: "demo@wanderlust.test".into(),
    };
    let owner = match credentials.register(identity, DEMO_PASSWORD).await {
        Ok(user) => user,
        Err(AppError::DuplicateIdentity(_)) => credentials.authenticate(DEMO_USER, DEMO_PASSWORD).await?,
        Err(e) => return Err(e.into()),
    };

    let listings = ListingStore::new(db);
    let removed = listings.delete_all().await?;
    info!(removed, "cleared listings");

    for sample in samples() {
        listings.create(owner.id, sample).await?;
    }
    info!("data was initialized");

    Ok(())
}
