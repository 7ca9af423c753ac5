//! Demo data for local development.
//!
//! Every insert is guarded by the row's natural key, so running the command
//! twice leaves the database unchanged.

use rust_decimal::Decimal;

use super::{CommandError, connect};

const CATEGORIES: [&str; 3] = ["Tenis", "Ropa", "Accesorios"];

struct DemoProduct {
    name: &'static str,
    category: &'static str,
    brand: &'static str,
    /// Price in centavos.
    price_cents: i64,
    discount_percent: i64,
    stock: i32,
}

const PRODUCTS: [DemoProduct; 6] = [
    DemoProduct {
        name: "Tenis Runner Azul",
        category: "Tenis",
        brand: "Stern",
        price_cents: 129_900,
        discount_percent: 10,
        stock: 25,
    },
    DemoProduct {
        name: "Tenis Urbano Blanco",
        category: "Tenis",
        brand: "Stern",
        price_cents: 149_900,
        discount_percent: 0,
        stock: 12,
    },
    DemoProduct {
        name: "Playera Básica",
        category: "Ropa",
        brand: "Stern",
        price_cents: 24_900,
        discount_percent: 0,
        stock: 80,
    },
    DemoProduct {
        name: "Sudadera con Capucha",
        category: "Ropa",
        brand: "Stern",
        price_cents: 69_950,
        discount_percent: 15,
        stock: 30,
    },
    DemoProduct {
        name: "Gorra Clásica",
        category: "Accesorios",
        brand: "Stern",
        price_cents: 19_900,
        discount_percent: 0,
        stock: 40,
    },
    DemoProduct {
        name: "Mochila Urbana",
        category: "Accesorios",
        brand: "Stern",
        price_cents: 89_900,
        discount_percent: 20,
        stock: 5,
    },
];

const DEMO_CUSTOMER_NAME: &str = "Cliente Demo";
const DEMO_CUSTOMER_EMAIL: &str = "demo@stern.mx";

/// Insert demo categories, products and a customer.
///
/// # Errors
///
/// Returns an error if the database is unreachable or an insert fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;
    let mut tx = pool.begin().await?;

    let mut categories = 0;
    for name in CATEGORIES {
        categories += sqlx::query(
            "INSERT INTO shop.category (name) VALUES ($1) ON CONFLICT (name) DO NOTHING",
        )
        .bind(name)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    }

    let mut products = 0;
    for product in &PRODUCTS {
        products += sqlx::query(
            r"
            INSERT INTO shop.product (name, category, brand, price, discount_percent, stock)
            SELECT $1, $2, $3, $4, $5, $6
            WHERE NOT EXISTS (SELECT 1 FROM shop.product WHERE name = $1)
            ",
        )
        .bind(product.name)
        .bind(product.category)
        .bind(product.brand)
        .bind(Decimal::new(product.price_cents, 2))
        .bind(Decimal::from(product.discount_percent))
        .bind(product.stock)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    }

    let customers = sqlx::query(
        r"
        INSERT INTO shop.customer (name, email, city, region, country)
        VALUES ($1, $2, 'Monterrey', 'Nuevo León', 'México')
        ON CONFLICT (email) DO NOTHING
        ",
    )
    .bind(DEMO_CUSTOMER_NAME)
    .bind(DEMO_CUSTOMER_EMAIL)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    tx.commit().await?;

    tracing::info!(categories, products, customers, "Seeding complete!");
    Ok(())
}
