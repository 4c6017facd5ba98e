//! # Seed Data Generator
//!
//! Populates the database with demo products for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default database
//! cargo run -p mostrador-db --bin seed
//!
//! # Specify database path
//! cargo run -p mostrador-db --bin seed -- --db ./data/mostrador.db
//! ```
//!
//! Each product gets:
//! - A sequential id: `REP-NNNNNN`
//! - A realistic name and category
//! - A starting stock level and unit cost

use chrono::Utc;
use std::env;

use mostrador_core::Product;
use mostrador_db::{Database, DbConfig};

/// Demo catalog: (name, category, starting stock, unit cost in cents).
const CATALOG: &[(&str, &str, i64, i64)] = &[
    ("Filtro de aceite", "Filtros", 24, 1200),
    ("Filtro de aire", "Filtros", 18, 950),
    ("Filtro de combustible", "Filtros", 12, 1550),
    ("Pastillas de freno delanteras", "Frenos", 16, 4200),
    ("Pastillas de freno traseras", "Frenos", 14, 3900),
    ("Disco de freno", "Frenos", 8, 7800),
    ("Bujía estándar", "Encendido", 60, 450),
    ("Bujía iridium", "Encendido", 30, 1850),
    ("Bobina de encendido", "Encendido", 10, 5600),
    ("Amortiguador delantero", "Suspensión", 6, 11200),
    ("Amortiguador trasero", "Suspensión", 6, 9800),
    ("Correa de distribución", "Transmisión", 9, 6400),
    ("Correa poly-V", "Transmisión", 15, 2100),
    ("Radiador", "Refrigeración", 4, 18500),
    ("Termostato", "Refrigeración", 11, 2700),
    ("Bomba de agua", "Refrigeración", 7, 8900),
    ("Batería 12V 60Ah", "Eléctrico", 5, 16500),
    ("Alternador", "Eléctrico", 3, 24500),
    ("Juego de fusibles", "Eléctrico", 40, 350),
    ("Aceite 10W-40 (1L)", "Lubricantes", 48, 1150),
];

#[tokio::main]
async fn main() {
    let db_path = parse_db_path();
    println!("Seeding database at {db_path}");

    let db = match Database::new(DbConfig::new(&db_path)).await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Failed to open database: {e}");
            std::process::exit(1);
        }
    };

    let products = db.products();
    let now = Utc::now();
    let mut inserted = 0usize;

    for (index, (name, category, stock, cost)) in CATALOG.iter().enumerate() {
        let product = Product {
            id: format!("REP-{:06}", index + 1),
            name: name.to_string(),
            category: category.to_string(),
            quantity: *stock,
            unit_cost_cents: Some(*cost),
            created_at: now,
            updated_at: now,
        };

        match products.insert(&product).await {
            Ok(_) => inserted += 1,
            // Already seeded; keep going so the run stays idempotent
            Err(mostrador_db::DbError::UniqueViolation { .. }) => {}
            Err(e) => {
                eprintln!("Failed to insert {}: {e}", product.id);
                std::process::exit(1);
            }
        }
    }

    let total = products.count().await.unwrap_or(0);
    println!("Inserted {inserted} products ({total} total in database)");
}

/// Parses `--db <path>` from the command line, with a sensible default.
fn parse_db_path() -> String {
    let args: Vec<String> = env::args().collect();

    for window in args.windows(2) {
        if window[0] == "--db" {
            return window[1].clone();
        }
    }

    "./mostrador.db".to_string()
}
