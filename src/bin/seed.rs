use axum_payment_reconciler::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    dto::payouts::RegisterPayoutAccount,
    entity::products::{Column as ProdCol, Entity as Products},
    models::PaymentMethod,
    services::{catalog_service, payout_service},
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    // Ensure migrations are applied.
    run_migrations(&orm).await?;

    let seller_id = match std::env::var("SEED_SELLER_ID") {
        Ok(raw) => Uuid::parse_str(&raw)?,
        Err(_) => Uuid::new_v4(),
    };

    seed_products(&orm, seller_id).await?;
    seed_payout_accounts(&orm, seller_id).await?;

    println!("Seed completed. Seller ID: {seller_id}");
    Ok(())
}

async fn seed_products(orm: &sea_orm::DatabaseConnection, seller_id: Uuid) -> anyhow::Result<()> {
    let products = vec![
        ("Wax print fabric, 6 yards", 15000, 40),
        ("Ndop cotton shirt", 12500, 25),
        ("Penja white pepper, 250g", 4500, 120),
        ("Bamileke beaded bag", 30000, 8),
    ];

    for (name, price, stock) in products {
        let exists = Products::find()
            .filter(ProdCol::SellerId.eq(seller_id))
            .filter(ProdCol::Name.eq(name))
            .one(orm)
            .await?
            .is_some();
        if exists {
            continue;
        }
        catalog_service::create_product(orm, seller_id, name, price, stock).await?;
    }

    println!("Seeded products");
    Ok(())
}

async fn seed_payout_accounts(orm: &sea_orm::DatabaseConnection, seller_id: Uuid) -> anyhow::Result<()> {
    let accounts = [
        (PaymentMethod::MtnMomo, "Jean Dupont", "670000001"),
        (PaymentMethod::OrangeMoney, "Jean Dupont", "699000001"),
        (PaymentMethod::Chat, "Jean Dupont", "237670000001"),
    ];

    for (channel, holder_name, holder_number) in accounts {
        let existing =
            payout_service::list_active_payout_accounts(orm, seller_id, channel).await?;
        if !existing.is_empty() {
            continue;
        }
        payout_service::register_account(
            orm,
            RegisterPayoutAccount {
                seller_id,
                channel,
                holder_name: holder_name.to_string(),
                holder_number: holder_number.to_string(),
            },
        )
        .await?;
    }

    println!("Seeded payout accounts");
    Ok(())
}
