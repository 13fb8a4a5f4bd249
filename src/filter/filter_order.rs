use serde_json::Value;

use super::error::FilterError;
use super::filter::Filter;
use super::types::{FilterOrderInfo, SortDirection};

pub struct FilterOrder;

impl FilterOrder {
    pub fn validate_and_parse(order: &Value) -> Result<Vec<FilterOrderInfo>, FilterError> {
        let infos = match order {
            Value::String(s) => Self::parse_order_string(s),
            Value::Array(arr) => {
                // ["assigned_at desc", "id asc"]
                let mut out = Vec::new();
                for v in arr {
                    if let Value::String(s) = v { out.extend(Self::parse_order_string(s)); }
                }
                out
            }
            Value::Object(obj) => {
                // { "assigned_at": "desc", "id": "asc" }
                obj.iter()
                    .map(|(k, v)| FilterOrderInfo {
                        column: k.clone(),
                        sort: Self::direction(v.as_str().unwrap_or("asc")),
                    })
                    .collect()
            }
            _ => vec![],
        };

        for info in &infos {
            Filter::validate_column(&info.column)?;
        }
        Ok(infos)
    }

    fn parse_order_string(s: &str) -> Vec<FilterOrderInfo> {
        let mut out = Vec::new();
        for part in s.split(',') {
            let mut it = part.split_whitespace();
            if let Some(col) = it.next() {
                out.push(FilterOrderInfo {
                    column: col.to_string(),
                    sort: Self::direction(it.next().unwrap_or("asc")),
                });
            }
        }
        out
    }

    fn direction(s: &str) -> SortDirection {
        if s.eq_ignore_ascii_case("desc") { SortDirection::Desc } else { SortDirection::Asc }
    }

    pub fn generate(infos: &[FilterOrderInfo]) -> String {
        if infos.is_empty() { return String::new(); }
        let parts: Vec<String> = infos
            .iter()
            .map(|i| format!("\"{}\" {}", i.column, i.sort.to_sql()))
            .collect();
        format!("ORDER BY {}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_string_array_and_object_forms() {
        let infos = FilterOrder::validate_and_parse(&json!("assigned_at desc, id")).unwrap();
        assert_eq!(FilterOrder::generate(&infos), "ORDER BY \"assigned_at\" DESC, \"id\" ASC");

        let infos = FilterOrder::validate_and_parse(&json!(["points desc"])).unwrap();
        assert_eq!(FilterOrder::generate(&infos), "ORDER BY \"points\" DESC");

        let infos = FilterOrder::validate_and_parse(&json!({ "deadline": "asc" })).unwrap();
        assert_eq!(FilterOrder::generate(&infos), "ORDER BY \"deadline\" ASC");
    }

    #[test]
    fn rejects_injected_column_names() {
        let err = FilterOrder::validate_and_parse(&json!("name; DROP TABLE results")).unwrap_err();
        assert!(matches!(err, FilterError::InvalidColumn(_)));
    }
}
