//! Inspection helpers for encoded expression graphs.

use serde_json::Value;

/// Name of the function invoked at the root of a graph.
pub fn root_function(graph: &Value) -> Option<&str> {
    let result = graph["result"].as_str()?;
    graph["values"][result]["functionInvocationValue"]["functionName"].as_str()
}

/// Every function name invoked anywhere in the graph, in document order.
pub fn function_names(graph: &Value) -> Vec<String> {
    let mut names = Vec::new();
    collect_functions(graph, &mut names);
    names
}

pub fn contains_function(graph: &Value, name: &str) -> bool {
    function_names(graph).iter().any(|n| n == name)
}

fn collect_functions(value: &Value, names: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(name)) = map.get("functionName") {
                names.push(name.clone());
            }
            for v in map.values() {
                collect_functions(v, names);
            }
        }
        Value::Array(items) => items.iter().for_each(|v| collect_functions(v, names)),
        _ => {}
    }
}

/// Year of the first date filter in the graph, from its `YYYY-01-01` start.
pub fn year_of(graph: &Value) -> Option<i32> {
    find_date_start(graph)?.get(..4)?.parse().ok()
}

fn find_date_start(value: &Value) -> Option<&str> {
    match value {
        Value::Object(map) => {
            if map.get("functionName").and_then(Value::as_str) == Some("DateRange") {
                return map["arguments"]["start"]["constantValue"].as_str();
            }
            map.values().find_map(find_date_start)
        }
        Value::Array(items) => items.iter().find_map(find_date_start),
        _ => None,
    }
}
