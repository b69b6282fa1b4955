//! Notion wire types and record decoding.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body of `POST /databases/{id}/query`.
#[derive(Debug, Clone, Serialize)]
pub struct QueryRequest {
    pub page_size: u32,
    pub filter: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_cursor: Option<String>,
}

/// One page of query results.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryPage {
    #[serde(default)]
    pub results: Vec<Page>,
    #[serde(default)]
    pub has_more: bool,
    pub next_cursor: Option<String>,
}

/// A database record. Properties are kept as raw JSON since their shape
/// depends on the database schema.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

/// Response of `GET /databases/{id}`, reduced to property names and types.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseSchema {
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl DatabaseSchema {
    /// Map of property name to Notion property type.
    pub fn property_types(&self) -> Map<String, Value> {
        self.properties
            .iter()
            .map(|(name, property)| {
                let kind = property.get("type").cloned().unwrap_or(Value::Null);
                (name.clone(), kind)
            })
            .collect()
    }
}

/// Debug view of a counted record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchRecord {
    pub title: Option<String>,
    pub status: Option<String>,
    pub end_date: Option<String>,
}

impl Page {
    /// Plain text of a property, whatever text-bearing type it has.
    pub fn text(&self, name: &str) -> Option<String> {
        property_text(self.properties.get(name)?)
    }

    /// Raw `date.start` string of a date property.
    pub fn date_start(&self, name: &str) -> Option<&str> {
        self.properties
            .get(name)?
            .get("date")?
            .get("start")?
            .as_str()
    }

    /// Title text, read from `preferred` when present and otherwise from the
    /// first property whose type is `title`.
    pub fn title(&self, preferred: &str) -> Option<String> {
        if let Some(text) = self.text(preferred) {
            return Some(text);
        }

        self.properties
            .values()
            .find(|property| property.get("type").and_then(Value::as_str) == Some("title"))
            .and_then(property_text)
    }

    pub fn to_match_record(&self, title_property: &str, status_property: &str, end_date_property: &str) -> MatchRecord {
        MatchRecord {
            title: self.title(title_property),
            status: self.text(status_property),
            end_date: self.date_start(end_date_property).map(String::from),
        }
    }
}

fn property_text(property: &Value) -> Option<String> {
    let kind = property.get("type").and_then(Value::as_str)?;

    match kind {
        "rich_text" | "title" => {
            let parts = property.get(kind)?.as_array()?;
            Some(
                parts
                    .iter()
                    .filter_map(|part| part.get("plain_text").and_then(Value::as_str))
                    .collect(),
            )
        }
        "select" | "status" => property
            .get(kind)?
            .get("name")?
            .as_str()
            .map(String::from),
        "formula" => property
            .get("formula")?
            .get("string")?
            .as_str()
            .map(String::from),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page(properties: Value) -> Page {
        serde_json::from_value(json!({ "id": "page-1", "properties": properties })).unwrap()
    }

    #[test]
    fn test_rich_text_and_title() {
        let page = page(json!({
            "Book": { "type": "title", "title": [
                { "plain_text": "The " }, { "plain_text": "Hobbit" }
            ]},
            "Status": { "type": "rich_text", "rich_text": [{ "plain_text": "📘" }] },
            "End Date": { "type": "date", "date": { "start": "2026-02-28", "end": null } }
        }));

        assert_eq!(page.text("Status").as_deref(), Some("📘"));
        assert_eq!(page.date_start("End Date"), Some("2026-02-28"));

        // "Name" is absent so the title-typed property is used
        assert_eq!(page.title("Name").as_deref(), Some("The Hobbit"));
    }

    #[test]
    fn test_select_status_and_formula() {
        let page = page(json!({
            "Shelf": { "type": "select", "select": { "name": "Read" } },
            "State": { "type": "status", "status": { "name": "Done" } },
            "Label": { "type": "formula", "formula": { "type": "string", "string": "📘✨ ARC" } },
            "Pages": { "type": "number", "number": 310 }
        }));

        assert_eq!(page.text("Shelf").as_deref(), Some("Read"));
        assert_eq!(page.text("State").as_deref(), Some("Done"));
        assert_eq!(page.text("Label").as_deref(), Some("📘✨ ARC"));
        assert_eq!(page.text("Pages"), None);
        assert_eq!(page.text("Missing"), None);
    }

    #[test]
    fn test_empty_date_has_no_start() {
        let page = page(json!({
            "End Date": { "type": "date", "date": null }
        }));
        assert_eq!(page.date_start("End Date"), None);
    }

    #[test]
    fn test_query_page_defaults() {
        let page: QueryPage = serde_json::from_str(r#"{"object":"list"}"#).unwrap();
        assert!(page.results.is_empty());
        assert!(!page.has_more);
        assert_eq!(page.next_cursor, None);
    }

    #[test]
    fn test_first_request_omits_cursor() {
        let request = QueryRequest {
            page_size: 100,
            filter: json!({}),
            start_cursor: None,
        };
        let body = serde_json::to_value(&request).unwrap();
        assert!(body.get("start_cursor").is_none());
        assert_eq!(body["page_size"], 100);
    }

    #[test]
    fn test_schema_property_types() {
        let schema: DatabaseSchema = serde_json::from_value(json!({
            "object": "database",
            "properties": {
                "Name": { "id": "title", "type": "title", "title": {} },
                "End Date": { "id": "abc", "type": "date", "date": {} }
            }
        }))
        .unwrap();

        let types = schema.property_types();
        assert_eq!(types["Name"], "title");
        assert_eq!(types["End Date"], "date");
    }
}
