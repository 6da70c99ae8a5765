//! The fixed analyses over the marketplace dataset.
//!
//! Each analysis is a pure function from input tables to a summary table;
//! nothing here mutates its inputs, so the functions compose in any order.
//! Rendering the summaries (charts, prose) belongs to a downstream layer.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{info, warn};

use crate::table::{
    column::Column,
    group::{group_by, sort_by_month, top_n},
    join::{join, JoinKind},
    normalize::{add_month_label, split_timestamp},
    table::Table,
    AggregateOp, SortOrder, TableError,
};

const RANKING_SIZE: usize = 10;

/// The nine source tables, loaded once and immutable for the run.
#[derive(Debug)]
pub struct Dataset {
    pub customers: Table,
    pub geolocations: Table,
    pub order_items: Table,
    pub order_payments: Table,
    pub order_reviews: Table,
    pub orders: Table,
    pub category_translation: Table,
    pub products: Table,
    pub sellers: Table,
}

impl Dataset {
    /// Loads every table from its fixed file name under `dir`. A missing or
    /// malformed file aborts the whole run.
    pub fn load(dir: &Path) -> Result<Dataset, TableError> {
        let load = |name: &str| -> Result<Table, TableError> {
            let table = Table::load_csv(&dir.join(name))?;
            info!(file = name, rows = table.row_count(), "loaded");
            Ok(table)
        };

        // order_reviews is sourced from customers.csv upstream. This is a
        // known data-source misconfiguration, reproduced here until the data
        // owner resolves it.
        warn!("order_reviews sourced from customers.csv (upstream misconfiguration)");

        Ok(Dataset {
            customers: load("customers.csv")?,
            geolocations: load("geolocations.csv")?,
            order_items: load("order_items.csv")?,
            order_payments: load("order_payments.csv")?,
            order_reviews: load("customers.csv")?,
            orders: load("orders.csv")?,
            category_translation: load("product_category_name_translation.csv")?,
            products: load("products.csv")?,
            sellers: load("sellers.csv")?,
        })
    }

    /// Name/table pairs, for the manual null check after load.
    pub fn tables(&self) -> [(&'static str, &Table); 9] {
        [
            ("customers", &self.customers),
            ("geolocations", &self.geolocations),
            ("order_items", &self.order_items),
            ("order_payments", &self.order_payments),
            ("order_reviews", &self.order_reviews),
            ("orders", &self.orders),
            ("category_translation", &self.category_translation),
            ("products", &self.products),
            ("sellers", &self.sellers),
        ]
    }
}

/// Splits the purchase timestamp into `Date` and `Time` and adds the `Month`
/// label. Every other analysis over orders expects this shape.
pub fn prepare_orders(orders: &Table) -> Result<Table, TableError> {
    let orders = split_timestamp(orders, "order_purchase_timestamp", "Date", "Time")?;
    add_month_label(&orders, "Date", "Month")
}

/// Per-order total payment value, for downstream outlier analysis.
///
/// Output contract: `{order_id, payment_value}`, one row per order. Orders
/// with no payment rows survive the left join and total to zero payments.
pub fn order_payment_totals(orders: &Table, payments: &Table) -> Result<Table, TableError> {
    let (merged, _) = join(orders, payments, "order_id", JoinKind::Left)?;
    group_by(&merged, "order_id", "payment_value", AggregateOp::Sum)
}

/// Orders per month in calendar order.
///
/// Output contract: `{Month, Total Orders}`, at most twelve rows, Jan→Dec.
pub fn monthly_order_counts(prepared_orders: &Table) -> Result<Table, TableError> {
    let counts = group_by(prepared_orders, "Month", "order_id", AggregateOp::Count)?;
    let counts = counts.rename_column("order_id", "Total Orders")?;
    sort_by_month(&counts, "Month")
}

/// Revenue (`price + freight_value`) per month in calendar order.
///
/// Output contract: `{Month, revenue}`, at most twelve rows, Jan→Dec. The
/// orders→items inner join fans out one row per item, which is what makes
/// the per-month sum an item-level revenue total.
pub fn monthly_revenue(prepared_orders: &Table, order_items: &Table) -> Result<Table, TableError> {
    let items = order_items.derive_sum("revenue", "price", "freight_value")?;
    let (merged, _) = join(prepared_orders, &items, "order_id", JoinKind::Inner)?;
    let revenue = group_by(&merged, "Month", "revenue", AggregateOp::Sum)?;
    sort_by_month(&revenue, "Month")
}

/// Item count per product category, category key in the source language.
/// Shared base for the best/worst rankings and the price comparison.
fn category_sales(order_items: &Table, products: &Table) -> Result<Table, TableError> {
    let (merged, _) = join(order_items, products, "product_id", JoinKind::Inner)?;
    let counts = group_by(
        &merged,
        "product_category_name",
        "order_item_id",
        AggregateOp::Count,
    )?;
    counts.rename_column("order_item_id", "total_sales")
}

fn translate_ranking(ranked: &Table, translation: &Table) -> Result<Table, TableError> {
    // Left join: a category missing from the translation table keeps its row
    // with a null English name rather than dropping out of the ranking.
    let (named, report) = join(ranked, translation, "product_category_name", JoinKind::Left)?;
    if report.unmatched_left > 0 {
        warn!(
            untranslated = report.unmatched_left,
            "categories missing an English translation"
        );
    }
    let out = named.select(&["product_category_name_english", "total_sales"])?;
    let out = out.rename_column("product_category_name_english", "product_category_name")?;
    out.rename_column("total_sales", "Total Orders")
}

/// Top ten categories by items sold, English names.
///
/// Output contract: `{product_category_name, Total Orders}`, descending,
/// at most ten rows.
pub fn best_selling_categories(
    order_items: &Table,
    products: &Table,
    translation: &Table,
) -> Result<Table, TableError> {
    let counts = category_sales(order_items, products)?;
    let ranked = top_n(&counts, "total_sales", SortOrder::Descending, RANKING_SIZE)?;
    translate_ranking(&ranked, translation)
}

/// Bottom ten categories by items sold, English names.
///
/// Output contract: `{product_category_name, Total Orders}`, ascending,
/// at most ten rows.
pub fn worst_selling_categories(
    order_items: &Table,
    products: &Table,
    translation: &Table,
) -> Result<Table, TableError> {
    let counts = category_sales(order_items, products)?;
    let ranked = top_n(&counts, "total_sales", SortOrder::Ascending, RANKING_SIZE)?;
    translate_ranking(&ranked, translation)
}

/// Per-item seller/price listing with English category names, the input for
/// the seller price scatter.
///
/// Output contract: `{seller_id, price, product_category_name_english}`.
pub fn seller_price_listing(
    order_items: &Table,
    products: &Table,
    translation: &Table,
) -> Result<Table, TableError> {
    let (merged, _) = join(order_items, products, "product_id", JoinKind::Inner)?;
    let (named, _) = join(&merged, translation, "product_category_name", JoinKind::Left)?;
    named.select(&["seller_id", "price", "product_category_name_english"])
}

/// Mean item price per category for the union of the top-ten and bottom-ten
/// selling categories, each row labeled with its group.
///
/// Output contract: `{product_category_name, Category Type, price}` where
/// `Category Type` is `Top 10` or `Bottom 10`. A category qualifying for
/// both groups counts as `Top 10`.
pub fn category_price_comparison(
    order_items: &Table,
    products: &Table,
) -> Result<Table, TableError> {
    let (merged, _) = join(order_items, products, "product_id", JoinKind::Inner)?;
    let counts = group_by(
        &merged,
        "product_category_name",
        "order_item_id",
        AggregateOp::Count,
    )?;

    let top = top_n(&counts, "order_item_id", SortOrder::Descending, RANKING_SIZE)?;
    let bottom = top_n(&counts, "order_item_id", SortOrder::Ascending, RANKING_SIZE)?;

    let means = group_by(&merged, "product_category_name", "price", AggregateOp::Mean)?;
    let mean_by_category: HashMap<String, f64> = means
        .column("product_category_name")?
        .iter_str()
        .zip(means.column("price")?.iter_f64())
        .filter_map(|(k, v)| Some((k?.to_string(), v?)))
        .collect();

    let mut categories: Vec<Option<String>> = Vec::new();
    let mut labels: Vec<Option<String>> = Vec::new();
    let mut prices: Vec<Option<f64>> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for (ranked, label) in [(&top, "Top 10"), (&bottom, "Bottom 10")] {
        for cell in ranked.column("product_category_name")?.iter_str() {
            let Some(category) = cell else { continue };
            if !seen.insert(category.to_string()) {
                continue;
            }
            prices.push(mean_by_category.get(category).copied());
            categories.push(Some(category.to_string()));
            labels.push(Some(label.to_string()));
        }
    }

    Table::new(
        vec![
            "product_category_name".into(),
            "Category Type".into(),
            "price".into(),
        ],
        vec![
            Column::Str(categories),
            Column::Str(labels),
            Column::Float64(prices),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Value;

    fn table(headers: &[&str], columns: Vec<Column>) -> Table {
        Table::new(headers.iter().map(|s| s.to_string()).collect(), columns).unwrap()
    }

    fn orders() -> Table {
        table(
            &["order_id", "customer_id", "order_purchase_timestamp"],
            vec![
                Column::Str(vec![Some("o1".into()), Some("o2".into())]),
                Column::Str(vec![Some("c1".into()), Some("c2".into())]),
                Column::Str(vec![
                    Some("2023-06-15 10:00:00".into()),
                    Some("2023-07-01 09:30:00".into()),
                ]),
            ],
        )
    }

    fn order_items() -> Table {
        table(
            &[
                "order_id",
                "order_item_id",
                "product_id",
                "seller_id",
                "price",
                "freight_value",
            ],
            vec![
                Column::Str(vec![Some("o1".into()), Some("o1".into()), Some("o2".into())]),
                Column::Int64(vec![Some(1), Some(2), Some(1)]),
                Column::Str(vec![Some("P1".into()), Some("P2".into()), Some("P1".into())]),
                Column::Str(vec![Some("s1".into()), Some("s1".into()), Some("s2".into())]),
                Column::Float64(vec![Some(10.0), Some(20.0), Some(5.0)]),
                Column::Float64(vec![Some(1.0), Some(2.0), Some(0.5)]),
            ],
        )
    }

    fn products() -> Table {
        table(
            &["product_id", "product_category_name"],
            vec![
                Column::Str(vec![Some("P1".into()), Some("P2".into())]),
                Column::Str(vec![Some("cat_a".into()), Some("cat_b".into())]),
            ],
        )
    }

    fn translation() -> Table {
        table(
            &["product_category_name", "product_category_name_english"],
            vec![
                Column::Str(vec![Some("cat_b".into())]),
                Column::Str(vec![Some("category b".into())]),
            ],
        )
    }

    #[test]
    fn monthly_revenue_sums_items_per_month() {
        let prepared = prepare_orders(&orders()).unwrap();
        let out = monthly_revenue(&prepared, &order_items()).unwrap();
        assert_eq!(out.row_count(), 2);
        assert_eq!(out.value(0, 0), Some(Value::Str("Jun".into())));
        assert_eq!(out.value(0, 1), Some(Value::Float(33.0)));
        assert_eq!(out.value(1, 0), Some(Value::Str("Jul".into())));
        assert_eq!(out.value(1, 1), Some(Value::Float(5.5)));
    }

    #[test]
    fn monthly_order_counts_reads_chronologically() {
        let prepared = prepare_orders(&orders()).unwrap();
        let out = monthly_order_counts(&prepared).unwrap();
        assert_eq!(out.headers(), &["Month", "Total Orders"]);
        assert_eq!(out.value(0, 0), Some(Value::Str("Jun".into())));
        assert_eq!(out.value(0, 1), Some(Value::Int(1)));
        assert_eq!(out.value(1, 1), Some(Value::Int(1)));
    }

    #[test]
    fn payment_totals_sum_installments_per_order() {
        let payments = table(
            &["order_id", "payment_value"],
            vec![
                Column::Str(vec![Some("o1".into()), Some("o1".into()), Some("o2".into())]),
                Column::Float64(vec![Some(30.0), Some(3.0), Some(5.5)]),
            ],
        );
        let out = order_payment_totals(&orders(), &payments).unwrap();
        assert_eq!(out.headers(), &["order_id", "payment_value"]);
        assert_eq!(out.row_count(), 2);
        assert_eq!(out.value(0, 1), Some(Value::Float(33.0)));
        assert_eq!(out.value(1, 1), Some(Value::Float(5.5)));
    }

    #[test]
    fn best_selling_ranks_descending_with_translation() {
        let out =
            best_selling_categories(&order_items(), &products(), &translation()).unwrap();
        assert_eq!(out.headers(), &["product_category_name", "Total Orders"]);
        assert!(out.row_count() <= 2);
        // cat_a sold 2 items, cat_b sold 1; cat_a has no translation and
        // survives the ranking with a null name
        assert_eq!(out.value(0, 0), None);
        assert_eq!(out.value(0, 1), Some(Value::Int(2)));
        assert_eq!(out.value(1, 0), Some(Value::Str("category b".into())));
        assert_eq!(out.value(1, 1), Some(Value::Int(1)));
    }

    #[test]
    fn worst_selling_ranks_ascending() {
        let out =
            worst_selling_categories(&order_items(), &products(), &translation()).unwrap();
        assert_eq!(out.value(0, 1), Some(Value::Int(1)));
        assert_eq!(out.value(1, 1), Some(Value::Int(2)));
    }

    #[test]
    fn seller_listing_carries_category_names() {
        let out = seller_price_listing(&order_items(), &products(), &translation()).unwrap();
        assert_eq!(
            out.headers(),
            &["seller_id", "price", "product_category_name_english"]
        );
        assert_eq!(out.row_count(), 3);
    }

    #[test]
    fn price_comparison_labels_top_and_bottom() {
        let out = category_price_comparison(&order_items(), &products()).unwrap();
        // two categories: both rank in the top ten, none left for bottom
        assert_eq!(out.row_count(), 2);
        assert_eq!(out.value(0, 0), Some(Value::Str("cat_a".into())));
        assert_eq!(out.value(0, 1), Some(Value::Str("Top 10".into())));
        assert_eq!(out.value(0, 2), Some(Value::Float(7.5)));
        assert_eq!(out.value(1, 2), Some(Value::Float(20.0)));
    }
}
