use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

/// Format output as tables using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result_table(result, map);
            } else {
                print_flat_object(value);
            }
        }
        Value::Array(arr) => {
            print_array_table(arr);
        }
        _ => {
            println!("{}", value);
        }
    }
}

fn print_result_table(result: &Value, envelope: &Map<String, Value>) {
    if let Value::Object(res_map) = result {
        if let Some(Value::Array(loans)) = res_map.get("loans") {
            print_plan_loans(loans);
            if let Some(summary) = res_map.get("summary") {
                println!();
                print_flat_object(summary);
            }
            print_scalar_fields(res_map);
        } else if let Some(Value::Array(ranking)) = res_map.get("ranking") {
            print_ranking(ranking);
            print_scalar_fields(res_map);
        } else {
            print_flat_object(result);
        }
    } else {
        print_flat_object(&Value::Object(envelope.clone()));
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

/// One row per planned loan, in selection order.
fn print_plan_loans(loans: &[Value]) {
    if loans.is_empty() {
        println!("No allocations found. Check your target and loan caps.");
        return;
    }

    let mut builder = Builder::default();
    builder.push_record([
        "Loan",
        "Rate %",
        "Principal",
        "Origination Fee",
        "Net Proceeds",
        "% of Principal",
        "Cost / $",
    ]);
    for loan in loans {
        let allocation = &loan["allocation"];
        let stats = &loan["stats"];
        builder.push_record([
            format_value(&allocation["offer"]["name"]),
            format_value(&allocation["offer"]["interest_rate_pct"]),
            format_value(&allocation["principal_used"]),
            format_value(&stats["origination_fee"]),
            format_value(&stats["net_proceeds"]),
            format_value(&loan["share_of_principal_pct"]),
            format_value(&allocation["cost_per_dollar"]),
        ]);
    }
    println!("{}", Table::from(builder));
}

fn print_ranking(ranking: &[Value]) {
    let mut builder = Builder::default();
    builder.push_record(["Rank", "Loan", "Rate %", "Fee %", "Cost / $"]);
    for entry in ranking {
        builder.push_record([
            format_value(&entry["rank"]),
            format_value(&entry["name"]),
            format_value(&entry["interest_rate_pct"]),
            format_value(&entry["origination_fee_pct"]),
            format_value(&entry["breakdown"]["cost_per_dollar"]),
        ]);
    }
    println!("{}", Table::from(builder));
}

/// Top-level scalars next to the main table (target, shortfall, ...).
fn print_scalar_fields(map: &Map<String, Value>) {
    let scalars: Vec<(&String, &Value)> = map
        .iter()
        .filter(|(_, v)| !v.is_array() && !v.is_object())
        .collect();
    if scalars.is_empty() {
        return;
    }
    println!();
    for (key, val) in scalars {
        println!("{}: {}", key, format_value(val));
    }
}

fn print_flat_object(value: &Value) {
    if let Value::Object(map) = value {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in map {
            builder.push_record([key.as_str(), &format_value(val)]);
        }
        println!("{}", Table::from(builder));
    }
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "—".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
