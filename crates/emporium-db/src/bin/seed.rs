//! # Seed Data Generator
//!
//! Populates a database with a demo catalog and a month of expenses.
//!
//! ## Usage
//! ```bash
//! # Default: ./emporium_dev.db, full catalog
//! cargo run -p emporium-db --bin seed
//!
//! # Custom path and product cap
//! cargo run -p emporium-db --bin seed -- --db ./data/emporium.db --count 20
//! ```
//!
//! Each product has:
//! - Code: `{CATEGORY}-{NN}`
//! - Sale price $1.50 - $24.50, purchase price 55-75% of it
//! - Stock 0 - 40, so some products start at critical stock

use chrono::{Days, Utc};
use emporium_core::{Money, NewExpense, NewProduct};
use emporium_db::{Database, DbConfig};
use std::env;

const CATALOG: &[(&str, &[&str])] = &[
    (
        "BEV",
        &[
            "Sparkling Water",
            "Orange Juice",
            "Cola 2L",
            "Iced Tea",
            "Energy Drink",
            "Cold Brew Coffee",
        ],
    ),
    (
        "BAK",
        &[
            "Sourdough Loaf",
            "Baguette",
            "Croissant",
            "Cheese Bread",
            "Cinnamon Roll",
        ],
    ),
    (
        "DLI",
        &[
            "Smoked Ham 200g",
            "Gouda Slices",
            "Salami 150g",
            "Olive Tapenade",
            "Hummus",
        ],
    ),
    (
        "GRO",
        &[
            "Olive Oil 500ml",
            "Basmati Rice 1kg",
            "Pasta Penne",
            "Tomato Passata",
            "Honey Jar",
            "Ground Coffee",
        ],
    ),
];

const EXPENSES: &[(&str, &str, i64)] = &[
    ("Electricity bill", "utilities", 18_500),
    ("Supplier delivery fee", "logistics", 4_500),
    ("Cleaning supplies", "operations", 2_390),
    ("Packaging", "operations", 3_120),
    ("Card machine fee", "fees", 1_150),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = usize::MAX;
    let mut db_path = String::from("./emporium_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(usize::MAX);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Emporium Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Maximum number of products (default: whole catalog)");
                println!("  -d, --db <PATH>    Database file path (default: ./emporium_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Emporium Seed Data Generator");
    println!("============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database, migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        return Ok(());
    }

    let mut generated = 0;
    'catalog: for (category, names) in CATALOG {
        for (idx, name) in names.iter().enumerate() {
            if generated >= count {
                break 'catalog;
            }

            let product = generate_product(category, name, idx + 1, generated * 7 + idx);
            let code = product.code.clone();
            if let Err(e) = db.products().create(product).await {
                eprintln!("Failed to insert {}: {}", code, e);
                continue;
            }
            generated += 1;
        }
    }
    println!("✓ Generated {} products", generated);

    let today = Utc::now().date_naive();
    let mut recorded = 0;
    for days_ago in 0..30u64 {
        let (description, category, amount) = EXPENSES[days_ago as usize % EXPENSES.len()];
        let Some(date) = today.checked_sub_days(Days::new(days_ago)) else {
            continue;
        };
        if days_ago % 3 != 0 {
            continue;
        }
        db.expenses()
            .add(NewExpense {
                date,
                description: description.to_string(),
                category: category.to_string(),
                amount: Money::from_cents(amount),
            })
            .await?;
        recorded += 1;
    }
    println!("✓ Recorded {} expenses", recorded);

    let critical = db.products().at_or_below(5).await?;
    println!("  {} products start at critical stock", critical.len());

    println!();
    println!("✓ Seed complete!");
    Ok(())
}

fn generate_product(category: &str, name: &str, number: usize, seed: usize) -> NewProduct {
    // $1.50 - $24.50 in 50 cent steps
    let sale_cents = 150 + ((seed * 37) % 47) as i64 * 50;
    let cost_pct = 55 + (seed % 21) as i64;

    NewProduct {
        code: format!("{}-{:02}", category, number),
        name: name.to_string(),
        purchase_price: Money::from_cents(sale_cents * cost_pct / 100),
        sale_price: Money::from_cents(sale_cents),
        quantity_on_hand: ((seed * 13) % 41) as i64,
    }
}
