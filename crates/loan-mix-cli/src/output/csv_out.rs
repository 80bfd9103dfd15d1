use serde_json::Value;
use std::io;

type StdoutWriter<'a> = csv::Writer<io::StdoutLock<'a>>;

/// Write output as CSV to stdout.
///
/// Plans become one row per loan, rankings one row per offer; anything else is
/// written as field/value pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(result)) => {
                if let Some(Value::Array(loans)) = result.get("loans") {
                    write_plan_csv(&mut wtr, loans);
                } else if let Some(Value::Array(ranking)) = result.get("ranking") {
                    write_ranking_csv(&mut wtr, ranking);
                } else {
                    write_pairs(&mut wtr, result);
                }
            }
            _ => write_pairs(&mut wtr, map),
        },
        Value::Array(arr) => {
            for item in arr {
                let _ = wtr.write_record([&format_csv_value(item)]);
            }
        }
        _ => {
            let _ = wtr.write_record([&format_csv_value(value)]);
        }
    }

    let _ = wtr.flush();
}

fn write_plan_csv(wtr: &mut StdoutWriter<'_>, loans: &[Value]) {
    let _ = wtr.write_record([
        "name",
        "interest_rate_pct",
        "origination_fee_pct",
        "principal_used",
        "origination_fee",
        "net_proceeds",
        "in_school_interest",
        "capitalized_balance",
        "monthly_payment",
        "share_of_principal_pct",
        "cost_per_dollar",
    ]);
    for loan in loans {
        let allocation = &loan["allocation"];
        let stats = &loan["stats"];
        let _ = wtr.write_record([
            format_csv_value(&allocation["offer"]["name"]),
            format_csv_value(&allocation["offer"]["interest_rate_pct"]),
            format_csv_value(&allocation["offer"]["origination_fee_pct"]),
            format_csv_value(&allocation["principal_used"]),
            format_csv_value(&stats["origination_fee"]),
            format_csv_value(&stats["net_proceeds"]),
            format_csv_value(&stats["in_school_interest"]),
            format_csv_value(&stats["capitalized_balance"]),
            format_csv_value(&stats["repayment"]["monthly_payment"]),
            format_csv_value(&loan["share_of_principal_pct"]),
            format_csv_value(&allocation["cost_per_dollar"]),
        ]);
    }
}

fn write_ranking_csv(wtr: &mut StdoutWriter<'_>, ranking: &[Value]) {
    let _ = wtr.write_record([
        "rank",
        "name",
        "fee_factor",
        "in_school_factor",
        "amortization_factor",
        "cost_per_dollar",
    ]);
    for entry in ranking {
        let breakdown = &entry["breakdown"];
        let _ = wtr.write_record([
            format_csv_value(&entry["rank"]),
            format_csv_value(&entry["name"]),
            format_csv_value(&breakdown["fee_factor"]),
            format_csv_value(&breakdown["in_school_factor"]),
            format_csv_value(&breakdown["amortization_factor"]),
            format_csv_value(&breakdown["cost_per_dollar"]),
        ]);
    }
}

fn write_pairs(wtr: &mut StdoutWriter<'_>, map: &serde_json::Map<String, Value>) {
    let _ = wtr.write_record(["field", "value"]);
    for (key, val) in map {
        let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
