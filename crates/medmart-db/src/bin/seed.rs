//! # Seed Data Generator
//!
//! Populates the database with a small marketplace for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default database
//! cargo run -p medmart-db --bin seed
//!
//! # Specify database path and shared password
//! cargo run -p medmart-db --bin seed -- --db ./data/medmart.db --password hunter22
//! ```
//!
//! ## Generated Data
//! - Categories: Wound Care, PPE, Diagnostics, Syringes & Needles, Mobility
//! - Accounts: one admin, three suppliers, two buyers (all sharing one password)
//! - Products: each supplier lists the items of its catalog below
//!
//! Each product has:
//! - SKU: `{SUPPLIER}-{CATEGORY}-{INDEX}`
//! - Price: from the catalog table, varied per supplier
//! - Stock: 0 - 150, a few deliberately low for the supplier dashboard

use std::env;

use tracing_subscriber::EnvFilter;

use medmart_core::{ActivityKind, UserRole};
use medmart_db::{password, Database, DbConfig, NewProduct, NewUser};

const DEFAULT_PASSWORD: &str = "medmart-dev";

/// `(slug, name, description)`
const CATEGORIES: &[(&str, &str, &str)] = &[
    ("wound-care", "Wound Care", "Dressings, gauze, bandages and tape"),
    ("ppe", "PPE", "Gloves, masks, gowns and face shields"),
    ("diagnostics", "Diagnostics", "Thermometers, test strips, monitors"),
    ("syringes", "Syringes & Needles", "Sterile single-use injection supplies"),
    ("mobility", "Mobility", "Wheelchairs, walkers and canes"),
];

/// `(category slug, sku code, name, base price in cents)`
const CATALOG: &[(&str, &str, &str, i64)] = &[
    ("wound-care", "GZ4", "Sterile Gauze Pads 4x4 (100 ct)", 1299),
    ("wound-care", "BND", "Elastic Bandage 3in (10 ct)", 1899),
    ("wound-care", "TPE", "Medical Paper Tape 1in (12 rolls)", 899),
    ("ppe", "GLV", "Nitrile Exam Gloves, Medium (200 ct)", 2499),
    ("ppe", "N95", "N95 Respirator Masks (20 ct)", 3499),
    ("ppe", "GWN", "Disposable Isolation Gowns (10 ct)", 2799),
    ("diagnostics", "THM", "Digital Oral Thermometer", 1499),
    ("diagnostics", "GLS", "Glucose Test Strips (50 ct)", 2199),
    ("diagnostics", "BPM", "Automatic Blood Pressure Monitor", 5999),
    ("syringes", "S3M", "Luer Lock Syringe 3ml (100 ct)", 1999),
    ("syringes", "N25", "Hypodermic Needle 25G (100 ct)", 1599),
    ("mobility", "WLK", "Folding Walker with Wheels", 7999),
    ("mobility", "CNE", "Adjustable Aluminum Cane", 2499),
];

/// `(email, full name, company)`
const SUPPLIERS: &[(&str, &str, &str)] = &[
    ("sales@northwind-medical.test", "Avery Lin", "Northwind Medical"),
    ("orders@bluepeak-supply.test", "Jordan Ellis", "BluePeak Supply"),
    ("hello@carefirst-dist.test", "Riley Moreau", "CareFirst Distribution"),
];

/// `(email, full name, organisation)`
const BUYERS: &[(&str, &str, &str)] = &[
    ("purchasing@stmarys-clinic.test", "Morgan Patel", "St. Mary's Clinic"),
    ("pharmacy@riverside.test", "Casey Nguyen", "Riverside Pharmacy"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,medmart_db=info")),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./medmart_dev.db");
    let mut shared_password = String::from(DEFAULT_PASSWORD);

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--password" | "-p" => {
                if i + 1 < args.len() {
                    shared_password = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("MedMart Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>          Database file path (default: ./medmart_dev.db)");
                println!("  -p, --password <PASS>    Password for every seeded account (default: {})", DEFAULT_PASSWORD);
                println!("  -h, --help               Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("MedMart Seed Data Generator");
    println!("===========================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Check existing products
    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let start = std::time::Instant::now();
    let password_hash = password::hash_password(&shared_password)?;

    // Categories
    let mut category_ids = Vec::with_capacity(CATEGORIES.len());
    for (slug, name, description) in CATEGORIES {
        let category = db.categories().insert(slug, name, Some(*description)).await?;
        category_ids.push((*slug, category.id));
    }
    println!("✓ {} categories", category_ids.len());

    // Accounts
    let admin = db
        .users()
        .create(&NewUser {
            email: "admin@medmart.test".to_string(),
            password_hash: password_hash.clone(),
            full_name: "Marketplace Admin".to_string(),
            role: UserRole::Admin,
            company_name: Some("MedMart".to_string()),
        })
        .await?;

    let mut supplier_ids = Vec::with_capacity(SUPPLIERS.len());
    for (email, full_name, company) in SUPPLIERS {
        let supplier = db
            .users()
            .create(&NewUser {
                email: email.to_string(),
                password_hash: password_hash.clone(),
                full_name: full_name.to_string(),
                role: UserRole::Supplier,
                company_name: Some(company.to_string()),
            })
            .await?;
        db.activity()
            .record(Some(supplier.id.as_str()), ActivityKind::UserSignedUp, &format!("{} joined as a supplier", company))
            .await?;
        supplier_ids.push((supplier.id, company.to_string()));
    }

    for (email, full_name, organisation) in BUYERS {
        let buyer = db
            .users()
            .create(&NewUser {
                email: email.to_string(),
                password_hash: password_hash.clone(),
                full_name: full_name.to_string(),
                role: UserRole::Buyer,
                company_name: Some(organisation.to_string()),
            })
            .await?;
        db.activity()
            .record(Some(buyer.id.as_str()), ActivityKind::UserSignedUp, &format!("{} joined as a buyer", organisation))
            .await?;
        db.notifications()
            .create(&buyer.id, "Welcome to MedMart", "Browse the catalog and add supplies to your cart.")
            .await?;
    }
    println!("✓ {} accounts (admin: {})", 1 + SUPPLIERS.len() + BUYERS.len(), admin.email);

    // Products
    let mut generated = 0;
    for (supplier_idx, (supplier_id, company)) in supplier_ids.iter().enumerate() {
        let code: String = company.chars().filter(|c| c.is_ascii_uppercase()).collect();

        for (product_idx, (category_slug, sku_code, name, base_price)) in CATALOG.iter().enumerate() {
            // Not every supplier carries everything
            if (product_idx + supplier_idx) % 3 == 2 {
                continue;
            }

            let seed = supplier_idx * 100 + product_idx;
            let category_id = category_ids
                .iter()
                .find(|(slug, _)| slug == category_slug)
                .map(|(_, id)| id.clone());

            let new = NewProduct {
                supplier_id: supplier_id.clone(),
                category_id,
                sku: format!("{}-{}-{:03}", code, sku_code, seed),
                name: name.to_string(),
                description: Some(format!("{} from {}", name, company)),
                // +/- up to 5% per supplier
                price_cents: base_price + base_price * (supplier_idx as i64 * 5 - 5) / 100,
                stock: ((seed * 37) % 151) as i64,
                image_url: None,
            };

            if let Err(e) = db.products().insert(&new).await {
                eprintln!("Failed to insert {}: {}", new.sku, e);
                continue;
            }
            db.activity()
                .record(Some(supplier_id.as_str()), ActivityKind::ProductListed, &format!("{} listed {}", company, name))
                .await?;

            generated += 1;
        }
    }

    let elapsed = start.elapsed();
    println!("✓ Generated {} products in {:?}", generated, elapsed);

    println!();
    println!("✓ Seed complete! Sign in with any seeded email and password '{}'.", shared_password);

    Ok(())
}
