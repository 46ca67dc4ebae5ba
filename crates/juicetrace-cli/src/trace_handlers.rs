//! Handlers for `trace`, `products`, `parse` and `health`.
//!
//! Each handler writes to a caller-supplied sink; the app passes stdout.

use std::io::Write;

use juicetrace_core::{Error, ProvenanceRecord, Result, TraceEngine, code};

/// Trace one package code and print the provenance records.
pub async fn handle_trace(
    out: &mut impl Write,
    engine: &TraceEngine,
    product: &str,
    raw_code: &str,
    json: bool,
) -> Result<()> {
    let records = engine.trace(product, raw_code).await?;
    if json {
        writeln!(out, "{}", to_json(&records)?)?;
    } else {
        write!(out, "{}", format_records_table(&records))?;
    }
    Ok(())
}

/// Print every product name.
pub async fn handle_products(out: &mut impl Write, engine: &TraceEngine, json: bool) -> Result<()> {
    let names = engine.list_products().await?;
    if json {
        writeln!(out, "{}", to_json(&names)?)?;
    } else {
        for name in names {
            writeln!(out, "{name}")?;
        }
    }
    Ok(())
}

/// Parse a package code and print its components.
pub fn handle_parse(out: &mut impl Write, raw_code: &str, json: bool) -> Result<()> {
    let parsed = code::parse(raw_code).map_err(juicetrace_core::TraceError::from)?;
    if json {
        writeln!(out, "{}", to_json(&parsed)?)?;
    } else {
        writeln!(out, "line:       {}", parsed.line)?;
        writeln!(out, "tank:       {}", parsed.tank)?;
        writeln!(out, "expiration: {}", parsed.expiration_date)?;
    }
    Ok(())
}

/// Ping the store and report the result.
pub async fn handle_health(out: &mut impl Write, name: &str, engine: &TraceEngine) -> Result<()> {
    engine.ping().await?;
    writeln!(out, "{name}: healthy")?;
    Ok(())
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| Error::serialization(e.to_string()))
}

/// Render records as a plain-text table.
///
/// The batch header comes from the first record; every record of one trace
/// shares it.
pub fn format_records_table(records: &[ProvenanceRecord]) -> String {
    let Some(first) = records.first() else {
        return "No ingredient inputs recorded for this batch.\n".to_string();
    };

    let headers = ["INGREDIENT", "SUPPLIER", "LOT", "LOCATION"];
    let rows: Vec<[&str; 4]> = records
        .iter()
        .map(|r| {
            [
                r.ingredient.as_str(),
                r.supplier_name.as_str(),
                r.supplier_lot.as_str(),
                r.source_location.as_deref().unwrap_or("-"),
            ]
        })
        .collect();

    let mut widths = headers.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut table = format!(
        "{} produced {} on line {}, tank {}\n\n",
        first.product_name, first.production_date, first.line, first.tank
    );
    for row in std::iter::once(headers).chain(rows) {
        let cells: Vec<String> = row
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect();
        table.push_str(cells.join("  ").trim_end());
        table.push('\n');
    }
    table
}
