use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{cell, levies_cell, SUMMARY_FIELDS};

/// Format output as tables: summary, breakdown, preset tiers or tariff rates.
pub fn print_table(value: &Value) {
    let Value::Object(map) = value else {
        println!("{}", cell(value));
        return;
    };

    match map.get("result") {
        Some(Value::Object(result)) if result.contains_key("breakdown") => {
            print_calc_result(result);
        }
        Some(Value::Array(rows)) => print_presets(rows),
        Some(Value::Object(result)) => print_fields(result.iter()),
        _ if map.contains_key("rates") => print_tariffs(map),
        _ => print_fields(map.iter()),
    }

    print_warnings(map);
}

fn print_calc_result(result: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for key in SUMMARY_FIELDS {
        if let Some(val) = result.get(key) {
            builder.push_record([key, cell(val).as_str()]);
        }
    }
    println!("{}", Table::from(builder));

    if let Some(Value::Array(lines)) = result.get("breakdown") {
        let mut builder = Builder::default();
        builder.push_record(["Line", "Amount (ZAR)", "Formula"]);
        for line in lines {
            builder.push_record([
                cell(&line["label"]),
                cell(&line["amount_zar"]),
                cell(&line["audit"]["formula"]),
            ]);
        }
        println!("\n{}", Table::from(builder));
    }

    if let Some(Value::Array(metrics)) = result.get("product_metrics") {
        let mut builder = Builder::default();
        builder.push_record(["Metric", "Value"]);
        for metric in metrics {
            builder.push_record([cell(&metric["label"]), cell(&metric["value"])]);
        }
        println!("\n{}", Table::from(builder));
    }

    if let Some(label) = result.get("tariff_version_label") {
        println!(
            "\nTariff: {} effective {} ({})",
            cell(label),
            cell(&result["effective_date"]),
            cell(&result["source_pointer_short"])
        );
    }
}

fn print_presets(rows: &[Value]) {
    if rows.is_empty() {
        println!("(no tiers)");
        return;
    }
    let mut builder = Builder::default();
    builder.push_record(["Tier", "Invoice", "Landed total", "Per unit", "Margin %", "Verdict"]);
    for row in rows {
        let output = &row["output"];
        builder.push_record([
            cell(&row["id"]),
            cell(&row["invoice_value_zar"]),
            cell(&output["landed_cost_total_zar"]),
            cell(&output["landed_cost_per_unit_zar"]),
            cell(&output["gross_margin_percent"]),
            cell(&output["verdict"]),
        ]);
    }
    println!("{}", Table::from(builder));
}

fn print_tariffs(map: &Map<String, Value>) {
    if let Some(version) = map.get("version") {
        println!(
            "{} (effective {}, {})\n",
            cell(&version["label"]),
            cell(&version["effective_date"]),
            cell(&version["source_pointer_short"])
        );
    }
    let mut builder = Builder::default();
    builder.push_record(["HS6", "Origin", "Destination", "Duty", "VAT", "Levies"]);
    if let Some(Value::Array(rates)) = map.get("rates") {
        for rate in rates {
            builder.push_record([
                cell(&rate["hs6"]),
                cell(&rate["origin_slug"]),
                cell(&rate["dest_slug"]),
                cell(&rate["duty_rate"]),
                cell(&rate["vat_rate"]),
                levies_cell(rate),
            ]);
        }
    }
    println!("{}", Table::from(builder));
}

fn print_fields<'a>(fields: impl Iterator<Item = (&'a String, &'a Value)>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in fields {
        builder.push_record([key.as_str(), cell(val).as_str()]);
    }
    println!("{}", Table::from(builder));
}

fn print_warnings(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}
