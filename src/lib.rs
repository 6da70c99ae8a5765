//! # ecom-analytics
//!
//! `ecom-analytics` is a columnar join-and-aggregate pipeline over a fixed
//! e-commerce CSV dataset (orders, items, products, sellers, customers,
//! payments, reviews, geolocation). It supports:
//!
//! - Memory-mapped CSV loading with parallel chunk parsing
//! - Dynamic schema inference (int, float, string) with nullable columns
//! - Timestamp normalization into typed date/time/month columns
//! - Inner and left hash equi-joins with per-join row accounting
//! - Group-by reduction (sum, count, mean) and fixed-vocabulary month sorting
//!
//! The pipeline's deliverable is a summary table per analysis; rendering
//! (charts, prose) is a downstream concern.
//!
//! # Example
//!
//! ```no_run
//! use ecom_analytics::analysis::{self, Dataset};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let data = Dataset::load(Path::new("dataset"))?;
//!
//!     let orders = analysis::prepare_orders(&data.orders)?;
//!     let revenue = analysis::monthly_revenue(&orders, &data.order_items)?;
//!     println!("{}", revenue);
//!
//!     let best = analysis::best_selling_categories(
//!         &data.order_items,
//!         &data.products,
//!         &data.category_translation,
//!     )?;
//!     println!("{}", best);
//!
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod table;
