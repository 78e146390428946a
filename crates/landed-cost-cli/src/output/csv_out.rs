use serde_json::Value;
use std::io;

use super::{cell, levies_cell, SUMMARY_FIELDS};

/// Write output as CSV to stdout.
///
/// A calculation writes its breakdown lines (with the summary figures as
/// trailing rows), presets write one row per tier, tariffs one row per rate.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = match value.get("result") {
        Some(Value::Object(result)) if result.contains_key("breakdown") => {
            write_calc(&mut wtr, value)
        }
        Some(Value::Array(rows)) => write_presets(&mut wtr, rows),
        Some(Value::Object(result)) => write_fields(&mut wtr, result.iter()),
        _ => match value {
            Value::Object(map) if map.contains_key("rates") => write_rates(&mut wtr, &map["rates"]),
            Value::Object(map) => write_fields(&mut wtr, map.iter()),
            _ => wtr.write_record([cell(value)]),
        },
    };

    if let Err(e) = result.and_then(|_| wtr.flush().map_err(csv::Error::from)) {
        eprintln!("CSV write error: {}", e);
    }
}

fn write_calc<W: io::Write>(wtr: &mut csv::Writer<W>, value: &Value) -> csv::Result<()> {
    let result = &value["result"];
    wtr.write_record(["id", "label", "amount_zar", "formula"])?;
    if let Some(lines) = result["breakdown"].as_array() {
        for line in lines {
            wtr.write_record([
                cell(&line["id"]),
                cell(&line["label"]),
                cell(&line["amount_zar"]),
                cell(&line["audit"]["formula"]),
            ])?;
        }
    }
    for key in SUMMARY_FIELDS {
        if let Some(val) = result.get(key) {
            wtr.write_record([key, "", cell(val).as_str(), ""])?;
        }
    }
    Ok(())
}

fn write_presets<W: io::Write>(wtr: &mut csv::Writer<W>, rows: &[Value]) -> csv::Result<()> {
    wtr.write_record([
        "tier",
        "invoice_value_zar",
        "landed_cost_total_zar",
        "landed_cost_per_unit_zar",
        "gross_margin_percent",
    ])?;
    for row in rows {
        let output = &row["output"];
        wtr.write_record([
            cell(&row["id"]),
            cell(&row["invoice_value_zar"]),
            cell(&output["landed_cost_total_zar"]),
            cell(&output["landed_cost_per_unit_zar"]),
            cell(&output["gross_margin_percent"]),
        ])?;
    }
    Ok(())
}

fn write_rates<W: io::Write>(wtr: &mut csv::Writer<W>, rates: &Value) -> csv::Result<()> {
    wtr.write_record([
        "tariff_version_id",
        "hs6",
        "origin_slug",
        "dest_slug",
        "duty_rate",
        "vat_rate",
        "levies",
    ])?;
    for rate in rates.as_array().into_iter().flatten() {
        wtr.write_record([
            cell(&rate["tariff_version_id"]),
            cell(&rate["hs6"]),
            cell(&rate["origin_slug"]),
            cell(&rate["dest_slug"]),
            cell(&rate["duty_rate"]),
            cell(&rate["vat_rate"]),
            levies_cell(rate),
        ])?;
    }
    Ok(())
}

fn write_fields<'a, W: io::Write>(
    wtr: &mut csv::Writer<W>,
    fields: impl Iterator<Item = (&'a String, &'a Value)>,
) -> csv::Result<()> {
    wtr.write_record(["field", "value"])?;
    for (key, val) in fields {
        wtr.write_record([key.as_str(), cell(val).as_str()])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tariffs::{run_tariffs, TariffsArgs};
    use crate::commands::Workspace;

    #[test]
    fn test_rates_csv_carries_levies() {
        let ws = Workspace::load(None).unwrap();
        let value = run_tariffs(
            TariffsArgs {
                hs6: Some("850760".into()),
                origin: None,
            },
            &ws,
        )
        .unwrap();

        let mut wtr = csv::Writer::from_writer(Vec::new());
        write_rates(&mut wtr, &value["rates"]).unwrap();
        let csv = String::from_utf8(wtr.into_inner().unwrap()).unwrap();

        let mut lines = csv.lines();
        assert!(lines.next().unwrap().ends_with(",levies"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("tv-2026-02,850760,china,south-africa,"));
        assert!(row.ends_with(",environmental=0.01"), "row: {}", row);
    }
}
