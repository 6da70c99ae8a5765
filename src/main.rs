use std::path::Path;

use ecom_analytics::analysis::{self, Dataset};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let data = Dataset::load(Path::new("dataset"))?;

    // Manual null check over every loaded table
    for (name, table) in data.tables() {
        for (column, nulls) in table.null_counts() {
            if nulls > 0 {
                info!(table = name, column, nulls, "null values present");
            }
        }
    }

    let prepared_orders = analysis::prepare_orders(&data.orders)?;

    let payment_totals = analysis::order_payment_totals(&prepared_orders, &data.order_payments)?;
    println!("Per-order payment totals (first 10):");
    println!("{}", payment_totals.head(10));

    println!("Orders per month:");
    println!("{}", analysis::monthly_order_counts(&prepared_orders)?);

    println!("Total revenue each month:");
    println!(
        "{}",
        analysis::monthly_revenue(&prepared_orders, &data.order_items)?
    );

    println!("Top 10 best selling product categories:");
    println!(
        "{}",
        analysis::best_selling_categories(
            &data.order_items,
            &data.products,
            &data.category_translation,
        )?
    );

    println!("Bottom 10 selling product categories:");
    println!(
        "{}",
        analysis::worst_selling_categories(
            &data.order_items,
            &data.products,
            &data.category_translation,
        )?
    );

    let listing = analysis::seller_price_listing(
        &data.order_items,
        &data.products,
        &data.category_translation,
    )?;
    println!("Seller price listing (first 10 of {} rows):", listing.row_count());
    println!("{}", listing.head(10));

    println!("Price comparison, best vs least selling categories:");
    println!(
        "{}",
        analysis::category_price_comparison(&data.order_items, &data.products)?
    );

    Ok(())
}
