use std::path::Path;

use ecom_analytics::analysis::{self, Dataset};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().init();

    let data = Dataset::load(Path::new("dataset"))?;

    println!("Best selling:");
    println!(
        "{}",
        analysis::best_selling_categories(
            &data.order_items,
            &data.products,
            &data.category_translation,
        )?
    );

    println!("Least selling:");
    println!(
        "{}",
        analysis::worst_selling_categories(
            &data.order_items,
            &data.products,
            &data.category_translation,
        )?
    );

    println!("Price comparison:");
    println!(
        "{}",
        analysis::category_price_comparison(&data.order_items, &data.products)?
    );

    Ok(())
}
