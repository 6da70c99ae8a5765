use std::path::Path;

use ecom_analytics::analysis::{self, Dataset};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().init();

    let data = Dataset::load(Path::new("dataset"))?;
    let orders = analysis::prepare_orders(&data.orders)?;

    println!("{}", analysis::monthly_order_counts(&orders)?);
    println!("{}", analysis::monthly_revenue(&orders, &data.order_items)?);

    Ok(())
}
