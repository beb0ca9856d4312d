//! # Seed Data Generator
//!
//! Populates a fresh database with a superuser and demo catalog data for
//! development.
//!
//! ## Usage
//! ```bash
//! # Default database path
//! cargo run -p varejo-db --bin seed
//!
//! # Specify database path and admin password
//! cargo run -p varejo-db --bin seed -- --db ./data/varejo.db --admin-password segredo
//! ```
//!
//! Creates:
//! - An `admin` superuser (required for sale cancellation)
//! - A `caixa` regular user
//! - Categories with typical Brazilian grocery products
//! - A couple of demo customers

use std::env;

use chrono::Utc;
use uuid::Uuid;

use varejo_core::{Customer, Product};
use varejo_db::{Database, DbConfig};

/// Demo catalog: (category, [(product, price_cents, cost_cents, stock)]).
const CATALOG: &[(&str, &[(&str, i64, i64, i64)])] = &[
    (
        "Bebidas",
        &[
            ("Água Mineral 500ml", 250, 120, 120),
            ("Refrigerante Cola 2L", 899, 520, 48),
            ("Suco de Laranja 1L", 1190, 720, 30),
            ("Cerveja Pilsen Lata", 449, 280, 96),
            ("Café Torrado 500g", 1890, 1150, 25),
        ],
    ),
    (
        "Mercearia",
        &[
            ("Arroz Branco 5kg", 2490, 1800, 40),
            ("Feijão Carioca 1kg", 899, 560, 60),
            ("Macarrão Espaguete 500g", 449, 260, 80),
            ("Óleo de Soja 900ml", 749, 510, 50),
            ("Açúcar Refinado 1kg", 499, 310, 70),
            ("Sal Refinado 1kg", 249, 120, 90),
        ],
    ),
    (
        "Laticínios",
        &[
            ("Leite Integral 1L", 549, 380, 60),
            ("Queijo Mussarela 500g", 2290, 1600, 15),
            ("Manteiga 200g", 1190, 780, 20),
            ("Iogurte Natural 170g", 349, 190, 35),
        ],
    ),
    (
        "Limpeza",
        &[
            ("Detergente Neutro 500ml", 299, 150, 55),
            ("Sabão em Pó 1kg", 1290, 820, 30),
            ("Água Sanitária 1L", 449, 230, 45),
        ],
    ),
];

const CUSTOMERS: &[(&str, &str, &str, &str)] = &[
    ("Maria Silva", "maria@example.com", "(11) 98765-4321", "123.456.789-09"),
    ("João Souza", "joao@example.com", "(11) 91234-5678", "987.654.321-00"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./varejo_dev.db");
    let mut admin_password = String::from("admin");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--admin-password" | "-p" => {
                if i + 1 < args.len() {
                    admin_password = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Varejo POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>              Database file path (default: ./varejo_dev.db)");
                println!("  -p, --admin-password <PWD>   Password for the admin superuser (default: admin)");
                println!("  -h, --help                   Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Varejo POS Seed Data Generator");
    println!("=================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let admin = db.users().insert("admin", &admin_password, true).await?;
    db.users().insert("caixa", "caixa", false).await?;
    println!("✓ Users created (admin id: {})", admin.id);

    let mut products = 0;
    for (category_name, items) in CATALOG {
        let category = db.categories().insert(category_name, "").await?;

        for (idx, (name, price_cents, cost_cents, stock)) in items.iter().enumerate() {
            let now = Utc::now();
            let product = Product {
                id: Uuid::new_v4().to_string(),
                category_id: Some(category.id.clone()),
                name: name.to_string(),
                description: String::new(),
                price_cents: *price_cents,
                cost_cents: *cost_cents,
                stock: *stock,
                min_stock: 10,
                barcode: Some(format!("789{:010}", products * 100 + idx)),
                is_active: true,
                created_at: now,
                updated_at: now,
            };
            db.products().insert(&product).await?;
            products += 1;
        }

        println!("  {} ({} products)", category_name, items.len());
    }
    println!("✓ Generated {} products", products);

    for (name, email, phone, cpf) in CUSTOMERS {
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            address: String::new(),
            cpf: Some(cpf.to_string()),
            created_at: Utc::now(),
        };
        db.customers().insert(&customer).await?;
    }
    println!("✓ Generated {} customers", CUSTOMERS.len());

    let results = db.products().search("arroz", None, 10).await?;
    println!("  Search 'arroz': {} results", results.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
