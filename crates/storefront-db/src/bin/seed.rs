//! # Seed Data Generator
//!
//! Populates the database with a demo promotion catalog for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./storefront_dev.db
//! cargo run -p storefront-db --bin seed
//!
//! # Specify database path
//! cargo run -p storefront-db --bin seed -- --db ./data/storefront.db
//!
//! # Also create a customer profile for a user id
//! cargo run -p storefront-db --bin seed -- --user demo-user
//! ```
//!
//! ## Generated Data
//! - Promotion groups with a fixed pair price, each with a handful of SKUs
//! - Explicit coupons: a percentage code, a fixed code with a SKU filter,
//!   and a non-stackable code
//! - Automatic coupons (no code) that auto-apply can pick
//! - Optionally one customer profile

use chrono::{Duration, Utc};
use std::env;
use storefront_core::{ActiveWindow, Coupon, DiscountSpec, Money, PromotionGroup, SkuFilter};
use storefront_db::{Database, DbConfig};

/// (group id, pair price in agorot, member SKUs)
const GROUPS: &[(&str, i64, &[&str])] = &[
    ("tees-2-for-80", 8_000, &["TEE-BASIC", "TEE-STRIPE", "TEE-POCKET", "TEE-LONG"]),
    ("socks-2-for-30", 3_000, &["SOCK-ANKLE", "SOCK-CREW", "SOCK-WOOL"]),
    ("caps-2-for-99", 9_900, &["CAP-CLASSIC", "CAP-TRUCKER"]),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./storefront_dev.db");
    let mut user: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--user" | "-u" => {
                if i + 1 < args.len() {
                    user = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Storefront Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./storefront_dev.db)");
                println!("  -u, --user <ID>    Create a customer profile for this user id");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Storefront Seed Data Generator");
    println!("=================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    if let Some(user_id) = &user {
        db.profiles().upsert(user_id, "Demo Customer").await?;
        println!("✓ Profile ready for {}", user_id);
    }

    let existing = db.catalog().coupon_count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} coupons", existing);
        println!("  Skipping catalog seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Creating promotion groups...");

    let catalog = db.catalog();
    for (group_id, pair_cents, skus) in GROUPS {
        catalog
            .upsert_group(&PromotionGroup::new(*group_id, Money::from_cents(*pair_cents)))
            .await?;
        for sku in skus.iter() {
            catalog.assign_sku(sku, group_id).await?;
        }
        println!(
            "  {} ({} per pair, {} SKUs)",
            group_id,
            Money::from_cents(*pair_cents),
            skus.len()
        );
    }

    println!();
    println!("Creating coupons...");

    let coupons = demo_coupons();
    for coupon in &coupons {
        catalog.insert_coupon(coupon).await?;
        println!("  {}", coupon.label());
    }

    let snapshot = catalog.snapshot().await?;
    println!();
    println!(
        "✓ Seed complete: {} groups, {} coupons",
        snapshot.group_count(),
        snapshot.coupon_count()
    );

    Ok(())
}

fn demo_coupons() -> Vec<Coupon> {
    let now = Utc::now();
    let started = now - Duration::days(1);

    vec![
        Coupon {
            id: "cpn-welcome10".to_string(),
            code: Some("WELCOME10".to_string()),
            min_cart_value: Money::from_cents(10_000),
            eligible_skus: SkuFilter::All,
            discount: DiscountSpec::Percentage { bps: 1_000 },
            stackable: true,
            active_window: ActiveWindow::open_from(started),
            is_active: true,
        },
        Coupon {
            id: "cpn-socks15".to_string(),
            code: Some("SOCKS15".to_string()),
            min_cart_value: Money::zero(),
            eligible_skus: SkuFilter::skus(["SOCK-ANKLE", "SOCK-CREW", "SOCK-WOOL"]),
            discount: DiscountSpec::Fixed {
                amount: Money::from_cents(1_500),
            },
            stackable: true,
            active_window: ActiveWindow::between(started, now + Duration::days(30)),
            is_active: true,
        },
        Coupon {
            id: "cpn-vip50".to_string(),
            code: Some("VIP50".to_string()),
            min_cart_value: Money::from_cents(30_000),
            eligible_skus: SkuFilter::All,
            discount: DiscountSpec::Fixed {
                amount: Money::from_cents(5_000),
            },
            stackable: false,
            active_window: ActiveWindow::open_from(started),
            is_active: true,
        },
        Coupon {
            id: "auto-5pct-over-200".to_string(),
            code: None,
            min_cart_value: Money::from_cents(20_000),
            eligible_skus: SkuFilter::All,
            discount: DiscountSpec::Percentage { bps: 500 },
            stackable: true,
            active_window: ActiveWindow::open_from(started),
            is_active: true,
        },
        Coupon {
            id: "auto-caps-20".to_string(),
            code: None,
            min_cart_value: Money::zero(),
            eligible_skus: SkuFilter::skus(["CAP-CLASSIC", "CAP-TRUCKER"]),
            discount: DiscountSpec::Fixed {
                amount: Money::from_cents(2_000),
            },
            stackable: true,
            active_window: ActiveWindow::open_from(started),
            is_active: true,
        },
    ]
}
