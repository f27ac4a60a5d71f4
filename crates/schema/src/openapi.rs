//! Compact rendering of an OpenAPI document.
//!
//! Endpoints, schemas, and auth schemes are rewritten into a short notation
//! (`str`, `int`, `User[]`, `dict[str, V]`) with required-only filtering:
//! optional query parameters and optional object fields are elided entirely,
//! since the full document stays searchable through the schema search tool.

use serde_json::Value;

/// Convert one OpenAPI schema to compact type notation.
///
/// `field_name` feeds the string-format inference heuristics; pass `""` when
/// there is no meaningful name. An explicit `format` in the schema always
/// wins over name inference.
pub fn schema_to_type(schema: Option<&Value>, field_name: &str) -> String {
    let Some(schema) = schema.filter(|s| s.is_object()) else {
        return "any".to_string();
    };

    if let Some(reference) = schema.get("$ref").and_then(Value::as_str) {
        return reference.rsplit('/').next().unwrap_or("any").to_string();
    }

    // OpenAPI 3.1 nullable unions arrive as `type: [T, "null"]`.
    let type_name = match schema.get("type") {
        Some(Value::String(s)) => Some(s.as_str()),
        Some(Value::Array(items)) => {
            items.iter().filter_map(Value::as_str).find(|t| *t != "null")
        }
        _ => None,
    };

    match type_name {
        Some("string") => {
            let format = schema
                .get("format")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| infer_string_format(field_name).to_string());
            if format.is_empty() {
                "str".to_string()
            } else {
                format!("str({format})")
            }
        }
        Some("integer") => "int".to_string(),
        Some("number") => "float".to_string(),
        Some("boolean") => "bool".to_string(),
        Some("array") => format!("{}[]", schema_to_type(schema.get("items"), "")),
        Some("object") => match schema.get("additionalProperties").filter(|v| v.is_object()) {
            Some(values) => format!("dict[str, {}]", schema_to_type(Some(values), "")),
            None => "object".to_string(),
        },
        _ => "any".to_string(),
    }
}

/// Guess a string format from the field name.
///
/// Case-insensitive substring checks; "update" is excluded entirely so names
/// like `updatedAt` never masquerade as dates.
pub fn infer_string_format(field_name: &str) -> &'static str {
    let name = field_name.to_lowercase();
    if name.contains("update") {
        return "";
    }
    if name.contains("datetime") {
        "date-time"
    } else if name.contains("time") {
        "time"
    } else if name.contains("date") {
        "date"
    } else {
        ""
    }
}

/// Render an operation's parameter list, required parameters only.
///
/// Path parameters count as required regardless of their declared flag.
pub fn format_params(params: &[Value]) -> String {
    let rendered: Vec<String> = params
        .iter()
        .filter(|p| {
            let in_path = p.get("in").and_then(Value::as_str) == Some("path");
            let required = p.get("required").and_then(Value::as_bool).unwrap_or(false);
            in_path || required
        })
        .map(|p| {
            let name = p.get("name").and_then(Value::as_str).unwrap_or("");
            format!("{name}: {}", schema_to_type(p.get("schema"), name))
        })
        .collect();
    rendered.join(", ")
}

/// Render one named component schema.
///
/// Object schemas show required fields only; entries of the `required` array
/// that are not strings (seen in the wild: nested lists, mappings, nulls,
/// numbers) are dropped rather than failing the whole document.
pub fn format_schema(name: &str, schema: &Value) -> String {
    if let Some(values) = schema.get("enum").and_then(Value::as_array) {
        let literals: Vec<String> = values.iter().map(enum_literal).collect();
        return format!("{name}: enum({})", literals.join(" | "));
    }

    if let Some(props) = schema.get("properties").and_then(Value::as_object) {
        let required: Vec<&str> = schema
            .get("required")
            .and_then(Value::as_array)
            .map(|entries| entries.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        let fields: Vec<String> = props
            .iter()
            .filter(|(key, _)| required.contains(&key.as_str()))
            .map(|(key, value)| format!("{key}: {}!", schema_to_type(Some(value), key)))
            .collect();
        return format!("{name} {{ {} }}", fields.join(", "));
    }

    format!("{name}: {}", schema_to_type(Some(schema), ""))
}

fn enum_literal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Base URL declared by the document, when present.
pub fn base_url_from_spec(spec: &Value) -> Option<String> {
    spec.get("servers")?
        .as_array()?
        .first()?
        .get("url")?
        .as_str()
        .map(str::to_string)
}

/// Build the compact schema document: `<endpoints>`, `<schemas>`, `<auth>`.
///
/// An empty input document yields an empty string.
pub fn build_schema_context(spec: &Value) -> String {
    let Some(root) = spec.as_object() else {
        return String::new();
    };
    if root.is_empty() {
        return String::new();
    }

    let mut sections: Vec<String> = Vec::new();

    let mut endpoints: Vec<String> = Vec::new();
    if let Some(paths) = spec.get("paths").and_then(Value::as_object) {
        for (path, item) in paths {
            let Some(operations) = item.as_object() else {
                continue;
            };
            for (method, op) in operations {
                if !is_http_method(method) {
                    continue;
                }
                endpoints.push(render_endpoint(method, path, op));
            }
        }
    }
    if !endpoints.is_empty() {
        sections.push(format!("<endpoints>\n{}", endpoints.join("\n")));
    }

    if let Some(schemas) = spec
        .get("components")
        .and_then(|c| c.get("schemas"))
        .and_then(Value::as_object)
    {
        if !schemas.is_empty() {
            let rendered: Vec<String> =
                schemas.iter().map(|(name, schema)| format_schema(name, schema)).collect();
            sections.push(format!("<schemas>\n{}", rendered.join("\n")));
        }
    }

    if let Some(schemes) = spec
        .get("components")
        .and_then(|c| c.get("securitySchemes"))
        .and_then(Value::as_object)
    {
        if !schemes.is_empty() {
            let rendered: Vec<String> =
                schemes.iter().map(|(name, scheme)| render_auth(name, scheme)).collect();
            sections.push(format!("<auth>\n{}", rendered.join("\n")));
        }
    }

    sections.join("\n\n")
}

fn is_http_method(name: &str) -> bool {
    matches!(name, "get" | "post" | "put" | "patch" | "delete" | "head" | "options")
}

fn render_endpoint(method: &str, path: &str, op: &Value) -> String {
    let mut signature_parts: Vec<String> = Vec::new();

    let params = op
        .get("parameters")
        .and_then(Value::as_array)
        .map(|p| format_params(p))
        .unwrap_or_default();
    if !params.is_empty() {
        signature_parts.push(params);
    }

    if let Some(request_body) = op.get("requestBody") {
        let body_type = schema_to_type(json_body_schema(request_body), "");
        let required = request_body
            .get("required")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let marker = if required { "!" } else { "" };
        signature_parts.push(format!("body: {body_type}{marker}"));
    }

    let response = ["200", "201"]
        .iter()
        .find_map(|code| {
            op.get("responses")
                .and_then(|r| r.get(*code))
                .and_then(json_body_schema)
        })
        .map(|schema| format!(" -> {}", schema_to_type(Some(schema), "")))
        .unwrap_or_default();

    let summary = match op.get("summary").and_then(Value::as_str) {
        Some(s) if !s.is_empty() => format!(" # {s}"),
        _ => String::new(),
    };

    format!(
        "{} {path}({}){response}{summary}",
        method.to_uppercase(),
        signature_parts.join(", ")
    )
}

/// The `application/json` schema of a request body or response object.
fn json_body_schema(holder: &Value) -> Option<&Value> {
    holder
        .get("content")?
        .get("application/json")?
        .get("schema")
}

fn render_auth(name: &str, scheme: &Value) -> String {
    let scheme_type = scheme.get("type").and_then(Value::as_str).unwrap_or("");
    match scheme_type {
        "http" => {
            let mut parts = vec!["HTTP".to_string()];
            if let Some(s) = scheme.get("scheme").and_then(Value::as_str) {
                parts.push(s.to_string());
            }
            if let Some(f) = scheme.get("bearerFormat").and_then(Value::as_str) {
                parts.push(f.to_string());
            }
            format!("{name}: {}", parts.join(" "))
        }
        "apiKey" => {
            let location = scheme.get("in").and_then(Value::as_str).unwrap_or("header");
            let key_name = scheme.get("name").and_then(Value::as_str).unwrap_or("");
            format!("{name}: API key in {location} '{key_name}'")
        }
        other => format!("{name}: {other}"),
    }
}
