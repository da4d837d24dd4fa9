//! Plain-text presentation of a catalog projection.

use crate::domain::{format_price, Product};

const CURRENCY: &str = "₹";
const HEADERS: [&str; 5] = ["ID", "Product", "Quantity", "Cost Price", "Single Price"];

fn format_quantity(quantity: f64) -> String {
    if quantity.fract() == 0.0 {
        format!("{:.0}", quantity)
    } else {
        quantity.to_string()
    }
}

fn row(product: &Product) -> [String; 5] {
    [
        product.id.clone(),
        format!("{} ({})", product.name, product.shop_name),
        format!("{} {}", format_quantity(product.quantity), product.unit),
        format!("{}{}", CURRENCY, format_price(product.cost_price)),
        format!("{}{}", CURRENCY, format_price(product.price_per_unit)),
    ]
}

/// Renders products as an aligned table, one product per line.
pub fn product_table(products: &[Product]) -> String {
    if products.is_empty() {
        return "No products found.\n".to_string();
    }

    let rows: Vec<[String; 5]> = products.iter().map(row).collect();
    let mut widths = HEADERS.map(|h| h.chars().count());
    for cells in &rows {
        for (width, cell) in widths.iter_mut().zip(cells) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let mut push_line = |cells: &[&str]| {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{}{}", cell, " ".repeat(width - cell.chars().count())))
            .collect();
        out.push_str(padded.join("  ").trim_end());
        out.push('\n');
    };

    push_line(&HEADERS);
    for cells in &rows {
        let cells: Vec<&str> = cells.iter().map(String::as_str).collect();
        push_line(&cells);
    }
    out
}
