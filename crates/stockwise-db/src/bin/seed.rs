//! # Seed Data Generator
//!
//! Populates the database with suppliers, customers and stocked products for
//! development.
//!
//! ## Usage
//! ```bash
//! # Generate 200 products (default)
//! cargo run -p stockwise-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p stockwise-db --bin seed -- --count 1000
//!
//! # Specify database path
//! cargo run -p stockwise-db --bin seed -- --db ./data/stockwise.db
//! ```
//!
//! ## Generated Data
//! - One supplier per category
//! - One customer per price tier
//! - Products with tier prices, a low-stock threshold and an opening balance
//!   booked through the ledger, so history explains every starting quantity

use std::env;

use stockwise_core::{ActorId, Address, CustomerDraft, PriceTier, ProductDraft, SupplierDraft};
use stockwise_db::{Database, DbConfig};

/// Product categories: (sku prefix, supplier name, product names).
const CATEGORIES: &[(&str, &str, &[&str])] = &[
    (
        "OFC",
        "Northwind Office Supply",
        &[
            "Copy Paper",
            "Ballpoint Pen",
            "Stapler",
            "Binder Clip",
            "Sticky Notes",
            "Desk Organizer",
            "Whiteboard Marker",
            "File Folder",
        ],
    ),
    (
        "FRN",
        "Harbor Furniture Works",
        &[
            "Office Chair",
            "Standing Desk",
            "Bookshelf",
            "Filing Cabinet",
            "Monitor Arm",
            "Footrest",
        ],
    ),
    (
        "ELC",
        "Bright Circuit Trading",
        &[
            "USB-C Cable",
            "Wireless Mouse",
            "Keyboard",
            "Power Strip",
            "Desk Lamp",
            "Webcam",
            "Headset",
        ],
    ),
    (
        "CLN",
        "Evergreen Cleaning Co",
        &[
            "Hand Soap",
            "Paper Towel",
            "Disinfectant Spray",
            "Trash Bag",
            "Microfiber Cloth",
        ],
    ),
];

/// Variants with a retail price add-on in cents.
const SPECS: &[(&str, i64)] = &[("Standard", 0), ("Large", 450), ("Bulk Pack", 1_800)];

/// Customers seeded per tier: (code, name, tier).
const CUSTOMERS: &[(&str, &str, PriceTier)] = &[
    ("C-0001", "Walk-in Retail", PriceTier::Retail),
    ("C-0002", "Maple Street Dental", PriceTier::Bronze),
    ("C-0003", "Lakeside Accounting", PriceTier::Silver),
    ("C-0004", "Summit Coworking", PriceTier::Gold),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut db_path = String::from("./stockwise_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().expect("--count expects a number");
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
                println!("Stockwise Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: ./stockwise_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Stockwise Seed Data Generator");
    println!("===============================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
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

    let actor = ActorId::new("seed");

    // Customers, one per tier
    for (code, name, level) in CUSTOMERS {
        db.customers()
            .upsert(&CustomerDraft {
                customer_code: code.to_string(),
                name: name.to_string(),
                level: *level,
                address: Some(sample_address(code)),
                payment_terms: Some("Net 30".into()),
                is_active: true,
                ..Default::default()
            })
            .await?;
    }
    println!("✓ Created {} customers", CUSTOMERS.len());

    println!();
    println!("Generating products...");

    let mut generated = 0;
    let start = std::time::Instant::now();

    'categories: for (category_idx, (prefix, supplier_name, names)) in CATEGORIES.iter().enumerate() {
        let supplier = db
            .suppliers()
            .upsert(&SupplierDraft {
                supplier_code: format!("S-{}", prefix),
                name: supplier_name.to_string(),
                address: Some(sample_address(prefix)),
                payment_terms: Some("Net 45".into()),
                is_active: true,
                ..Default::default()
            })
            .await?;

        for (product_idx, name) in names.iter().enumerate() {
            for (spec_idx, (spec, price_addon)) in SPECS.iter().enumerate() {
                if generated >= count {
                    break 'categories;
                }

                let seed = category_idx * 1000 + product_idx * 10 + spec_idx;
                let draft = generate_product(prefix, name, spec, *price_addon, &supplier.id, seed);

                if let Err(e) = db.products().upsert(&draft, &actor).await {
                    eprintln!("Failed to insert {}: {}", draft.sku, e);
                    continue;
                }

                generated += 1;

                if generated % 50 == 0 {
                    println!("  Generated {} products...", generated);
                }
            }
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} products in {:?}", generated, elapsed);

    let low = db.products().list_low_stock().await?;
    println!("  Low stock: {} products", low.len());

    let history = db.history().list(None).await?;
    println!("  Opening balances booked: {}", history.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Generates one product draft with tier prices and an opening balance.
fn generate_product(
    prefix: &str,
    name: &str,
    spec: &str,
    price_addon: i64,
    supplier_id: &str,
    seed: usize,
) -> ProductDraft {
    let code: String = name.chars().filter(|c| c.is_ascii_alphanumeric()).take(3).collect();
    let sku = format!("{}-{}-{:04}", prefix, code.to_uppercase(), seed);

    // Retail $4.99 - $84.99 plus spec add-on; tiers step down 5% each
    let retail = 499 + ((seed * 37) % 8_000) as i64 + price_addon;
    let bronze = retail * 95 / 100;
    let silver = retail * 90 / 100;
    let gold = retail * 85 / 100;

    // Cost 55-75% of retail
    let cost = retail * (55 + (seed % 21) as i64) / 100;

    ProductDraft {
        sku,
        name: name.to_string(),
        category: Some(prefix.to_string()),
        spec: Some(spec.to_string()),
        unit: "pcs".into(),
        barcode: Some(format!("471{:010}", seed)),
        price_retail_cents: retail,
        price_bronze_cents: bronze,
        price_silver_cents: silver,
        price_gold_cents: gold,
        low_stock_threshold: Some(10),
        supplier_id: Some(supplier_id.to_string()),
        is_active: true,
        opening_stock: (seed % 61) as i64,
        opening_cost_cents: cost,
        ..Default::default()
    }
}

fn sample_address(code: &str) -> Address {
    Address {
        zip_code: format!("{:05}", code.bytes().map(u32::from).sum::<u32>() * 7 % 100_000),
        city: "Springfield".into(),
        district: "Riverside".into(),
        street: format!("{} Commerce Way", code.len() * 11),
    }
}
