use serde_json::Value;

use super::cell;

/// Key figures checked in order; the first non-null one is printed. A reverse
/// search also reports the landed cost at its price, so its answer comes first.
const PRIORITY_KEYS: [&str; 5] = [
    "max_price_per_unit_zar",
    "landed_cost_per_unit_zar",
    "gross_margin_percent",
    "landed_cost_total_zar",
    "margin_note",
];

/// Print just the headline figure: per-unit landed cost for a calculation,
/// the max price for a reverse search, one line per tier for presets.
pub fn print_minimal(value: &Value) {
    let result = value.get("result").unwrap_or(value);
    for line in headline(result) {
        println!("{}", line);
    }
}

fn headline(result: &Value) -> Vec<String> {
    match result {
        Value::Array(rows) => rows
            .iter()
            .map(|row| {
                format!(
                    "{}: {}",
                    cell(&row["id"]),
                    cell(&row["output"]["landed_cost_per_unit_zar"])
                )
            })
            .collect(),
        Value::Object(map) => {
            if let Some(val) = PRIORITY_KEYS
                .iter()
                .filter_map(|key| map.get(*key))
                .find(|val| !val.is_null())
            {
                return vec![cell(val)];
            }
            if let Some(version) = map.get("version") {
                return vec![cell(&version["label"])];
            }
            map.iter()
                .next()
                .map(|(key, val)| vec![format!("{}: {}", key, cell(val))])
                .unwrap_or_default()
        }
        other => vec![cell(other)],
    }
}
