//! Compact SDL-like rendering of a GraphQL introspection result.
//!
//! Type references fold recursively (`NON_NULL` to a trailing `!`, `LIST` to
//! surrounding brackets); top-level queries show required arguments only, so
//! the rendered document stays small enough to inject into the question.
//! Everything elided remains reachable through schema search over the raw
//! introspection JSON.

use serde_json::Value;

/// Introspection query issued once per question. The three-level `ofType`
/// nesting matches the deepest wrapping the compactor folds.
pub const INTROSPECTION_QUERY: &str = r#"{
  __schema {
    queryType {
      fields { name description args { name type { ...TypeRef } defaultValue } type { ...TypeRef } }
    }
    types {
      name kind description
      fields { name description args { name type { ...TypeRef } defaultValue } type { ...TypeRef } }
      enumValues { name description }
      inputFields { name type { ...TypeRef } defaultValue }
      interfaces { name }
      possibleTypes { name }
    }
  }
}
fragment TypeRef on __Type {
  name kind ofType { name kind ofType { name kind ofType { name } } }
}"#;

/// Fold a type reference into compact notation, e.g. `[User!]!`.
pub fn format_type(t: Option<&Value>) -> String {
    let Some(t) = t.filter(|t| t.is_object()) else {
        return "?".to_string();
    };
    match t.get("kind").and_then(Value::as_str) {
        Some("NON_NULL") => format!("{}!", format_type(t.get("ofType"))),
        Some("LIST") => format!("[{}]", format_type(t.get("ofType"))),
        _ => t
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| "?".to_string()),
    }
}

/// A reference is required when it is non-null at the top level.
fn is_required(t: Option<&Value>) -> bool {
    t.and_then(|t| t.get("kind"))
        .and_then(Value::as_str)
        .map(|k| k == "NON_NULL")
        .unwrap_or(false)
}

/// Render an argument with its optional literal default.
pub fn format_arg(arg: &Value) -> String {
    let name = str_field(arg, "name");
    let type_str = format_type(arg.get("type"));
    match arg.get("defaultValue").and_then(Value::as_str) {
        Some(default) => format!("{name}: {type_str} = {default}"),
        None => format!("{name}: {type_str}"),
    }
}

/// Render a field with its arguments and trailing description comment.
pub fn format_field(field: &Value) -> String {
    let args = list_field(field, "args");
    let arg_str = if args.is_empty() {
        String::new()
    } else {
        let rendered: Vec<String> = args.iter().map(format_arg).collect();
        format!("({})", rendered.join(", "))
    };
    let desc = description_suffix(field);
    format!(
        "  {}{arg_str}: {}{desc}",
        str_field(field, "name"),
        format_type(field.get("type"))
    )
}

/// Build the compact schema document from an introspected `__schema` value.
pub fn build_schema_context(schema: &Value) -> String {
    let queries = schema
        .get("queryType")
        .map(|q| list_field(q, "fields"))
        .unwrap_or_default();
    let all_types: Vec<&Value> = list_field(schema, "types")
        .iter()
        .filter(|&t| !str_field(t, "name").starts_with("__"))
        .collect();

    let of_kind = |kind: &str| -> Vec<&Value> {
        all_types.iter().copied().filter(|&t| str_field(t, "kind") == kind).collect()
    };
    let objects: Vec<&Value> = of_kind("OBJECT")
        .into_iter()
        .filter(|&t| !matches!(str_field(t, "name"), "Query" | "Mutation" | "Subscription"))
        .collect();
    let enums = of_kind("ENUM");
    let inputs = of_kind("INPUT_OBJECT");
    let interfaces = of_kind("INTERFACE");
    let unions = of_kind("UNION");

    let mut lines = vec!["<queries>".to_string()];
    for field in queries {
        let required_args: Vec<&Value> = list_field(field, "args")
            .iter()
            .filter(|a| is_required(a.get("type")))
            .collect();
        let args: Vec<String> = required_args.into_iter().map(format_arg).collect();
        lines.push(format!(
            "{}({}) -> {}{}",
            str_field(field, "name"),
            args.join(", "),
            format_type(field.get("type")),
            description_suffix(field)
        ));
    }

    if !interfaces.is_empty() {
        lines.push("\n<interfaces>".to_string());
        for &t in &interfaces {
            let implementors: Vec<&str> = list_field(t, "possibleTypes")
                .iter()
                .map(|p| str_field(p, "name"))
                .collect();
            let impl_str = if implementors.is_empty() {
                String::new()
            } else {
                format!(" # implemented by: {}", implementors.join(", "))
            };
            let fields: Vec<String> = list_field(t, "fields").iter().map(format_field).collect();
            lines.push(format!(
                "{} {{{impl_str}\n{}\n}}",
                str_field(t, "name"),
                fields.join("\n")
            ));
        }
    }

    if !unions.is_empty() {
        lines.push("\n<unions>".to_string());
        for &t in &unions {
            let members: Vec<&str> = list_field(t, "possibleTypes")
                .iter()
                .map(|p| str_field(p, "name"))
                .collect();
            lines.push(format!("{}: {}", str_field(t, "name"), members.join(" | ")));
        }
    }

    lines.push("\n<types>".to_string());
    for &t in &objects {
        let implemented: Vec<&str> = list_field(t, "interfaces")
            .iter()
            .map(|i| str_field(i, "name"))
            .collect();
        let impl_str = if implemented.is_empty() {
            String::new()
        } else {
            format!(" implements {}", implemented.join(", "))
        };
        let fields: Vec<String> = list_field(t, "fields").iter().map(format_field).collect();
        lines.push(format!(
            "{}{impl_str} {{\n{}\n}}",
            str_field(t, "name"),
            fields.join("\n")
        ));
    }

    lines.push("\n<enums>".to_string());
    for &t in &enums {
        let values: Vec<&str> = list_field(t, "enumValues")
            .iter()
            .map(|v| str_field(v, "name"))
            .collect();
        lines.push(format!("{}: {}", str_field(t, "name"), values.join(" | ")));
    }

    lines.push("\n<inputs>".to_string());
    for &t in &inputs {
        let required: Vec<String> = list_field(t, "inputFields")
            .iter()
            .filter(|f| is_required(f.get("type")))
            .map(|f| format!("{}: {}", str_field(f, "name"), format_type(f.get("type"))))
            .collect();
        lines.push(format!("{} {{ {} }}", str_field(t, "name"), required.join(", ")));
    }

    lines.join("\n")
}

// ── Value accessors ────────────────────────────────────────────────

fn str_field<'a>(v: &'a Value, key: &str) -> &'a str {
    v.get(key).and_then(Value::as_str).unwrap_or("")
}

/// Treats absent and `null` lists the same as empty ones.
fn list_field<'a>(v: &'a Value, key: &str) -> &'a [Value] {
    v.get(key).and_then(Value::as_array).map(Vec::as_slice).unwrap_or(&[])
}

fn description_suffix(v: &Value) -> String {
    match v.get("description").and_then(Value::as_str) {
        Some(desc) if !desc.is_empty() => format!(" # {desc}"),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalar_type() {
        assert_eq!(format_type(Some(&json!({"name": "String", "kind": "SCALAR"}))), "String");
    }

    #[test]
    fn non_null_type() {
        let t = json!({"kind": "NON_NULL", "ofType": {"name": "String", "kind": "SCALAR"}});
        assert_eq!(format_type(Some(&t)), "String!");
    }

    #[test]
    fn list_type() {
        let t = json!({"kind": "LIST", "ofType": {"name": "User", "kind": "OBJECT"}});
        assert_eq!(format_type(Some(&t)), "[User]");
    }

    #[test]
    fn non_null_list() {
        let t = json!({
            "kind": "NON_NULL",
            "ofType": {"kind": "LIST", "ofType": {"name": "User", "kind": "OBJECT"}},
        });
        assert_eq!(format_type(Some(&t)), "[User]!");
    }

    #[test]
    fn list_of_non_null() {
        let t = json!({
            "kind": "LIST",
            "ofType": {"kind": "NON_NULL", "ofType": {"name": "User", "kind": "OBJECT"}},
        });
        assert_eq!(format_type(Some(&t)), "[User!]");
    }

    #[test]
    fn deeply_nested_folding() {
        let t = json!({
            "kind": "NON_NULL",
            "ofType": {
                "kind": "LIST",
                "ofType": {
                    "kind": "NON_NULL",
                    "ofType": {
                        "kind": "LIST",
                        "ofType": {"kind": "NON_NULL", "ofType": {"name": "User", "kind": "OBJECT"}},
                    },
                },
            },
        });
        assert_eq!(format_type(Some(&t)), "[[User!]!]!");
    }

    #[test]
    fn absent_reference_is_question_mark() {
        assert_eq!(format_type(None), "?");
        assert_eq!(format_type(Some(&json!({}))), "?");
        assert_eq!(format_type(Some(&json!(null))), "?");
    }

    #[test]
    fn arg_without_default() {
        let arg = json!({"name": "limit", "type": {"name": "Int", "kind": "SCALAR"}});
        assert_eq!(format_arg(&arg), "limit: Int");
    }

    #[test]
    fn arg_with_default() {
        let arg =
            json!({"name": "limit", "type": {"name": "Int", "kind": "SCALAR"}, "defaultValue": "10"});
        assert_eq!(format_arg(&arg), "limit: Int = 10");
    }

    #[test]
    fn arg_with_string_default() {
        let arg = json!({
            "name": "order",
            "type": {"name": "String", "kind": "SCALAR"},
            "defaultValue": "\"ASC\"",
        });
        assert_eq!(format_arg(&arg), "order: String = \"ASC\"");
    }

    #[test]
    fn arg_with_non_null_type() {
        let arg = json!({
            "name": "id",
            "type": {"kind": "NON_NULL", "ofType": {"name": "ID", "kind": "SCALAR"}},
        });
        assert_eq!(format_arg(&arg), "id: ID!");
    }

    #[test]
    fn arg_with_list_type_and_default() {
        let arg = json!({
            "name": "statuses",
            "type": {"kind": "LIST", "ofType": {"name": "Status", "kind": "ENUM"}},
            "defaultValue": "[ACTIVE]",
        });
        assert_eq!(format_arg(&arg), "statuses: [Status] = [ACTIVE]");
    }

    #[test]
    fn field_without_args() {
        let field = json!({
            "name": "id",
            "args": [],
            "type": {"kind": "NON_NULL", "ofType": {"name": "ID", "kind": "SCALAR"}},
        });
        assert_eq!(format_field(&field), "  id: ID!");
    }

    #[test]
    fn field_with_args() {
        let field = json!({
            "name": "components",
            "args": [
                {"name": "type", "type": {"name": "Type", "kind": "ENUM"}},
                {"name": "first", "type": {"name": "Int", "kind": "SCALAR"}},
            ],
            "type": {"kind": "LIST", "ofType": {"name": "Component", "kind": "INTERFACE"}},
        });
        assert_eq!(format_field(&field), "  components(type: Type, first: Int): [Component]");
    }

    #[test]
    fn field_with_description() {
        let field = json!({
            "name": "team",
            "args": [],
            "type": {"name": "Team", "kind": "OBJECT"},
            "description": "Owner team",
        });
        assert_eq!(format_field(&field), "  team: Team # Owner team");
    }

    fn sample_schema() -> Value {
        json!({
            "queryType": {
                "fields": [
                    {
                        "name": "components",
                        "description": "List components",
                        "args": [
                            {
                                "name": "names",
                                "type": {
                                    "kind": "LIST",
                                    "ofType": {
                                        "kind": "NON_NULL",
                                        "ofType": {"name": "String", "kind": "SCALAR"},
                                    },
                                },
                            },
                            {"name": "type", "type": {"name": "Type", "kind": "ENUM"}},
                        ],
                        "type": {
                            "kind": "NON_NULL",
                            "ofType": {
                                "kind": "LIST",
                                "ofType": {
                                    "kind": "NON_NULL",
                                    "ofType": {"name": "Component", "kind": "INTERFACE"},
                                },
                            },
                        },
                    },
                    {
                        "name": "teams",
                        "description": null,
                        "args": [
                            {
                                "name": "ids",
                                "type": {"kind": "LIST", "ofType": {"name": "ID", "kind": "SCALAR"}},
                            }
                        ],
                        "type": {"kind": "LIST", "ofType": {"name": "Team", "kind": "OBJECT"}},
                    },
                ]
            },
            "types": [
                {
                    "name": "Component",
                    "kind": "INTERFACE",
                    "description": "Base component interface",
                    "fields": [
                        {
                            "name": "id",
                            "args": [],
                            "type": {"kind": "NON_NULL", "ofType": {"name": "ID", "kind": "SCALAR"}},
                        },
                        {
                            "name": "name",
                            "args": [],
                            "type": {
                                "kind": "NON_NULL",
                                "ofType": {"name": "String", "kind": "SCALAR"},
                            },
                        },
                        {"name": "team", "args": [], "type": {"name": "Team", "kind": "OBJECT"}},
                        {
                            "name": "repositories",
                            "description": "Code repositories",
                            "args": [
                                {"name": "search", "type": {"name": "String", "kind": "SCALAR"}},
                                {"name": "first", "type": {"name": "Int", "kind": "SCALAR"}},
                            ],
                            "type": {"name": "ProjectConnection", "kind": "OBJECT"},
                        },
                    ],
                    "possibleTypes": [{"name": "Service"}, {"name": "Job"}, {"name": "Library"}],
                },
                {
                    "name": "ApprovalChange",
                    "kind": "UNION",
                    "possibleTypes": [{"name": "RequestToDelete"}, {"name": "RequestToUpdate"}],
                },
                {
                    "name": "Service",
                    "kind": "OBJECT",
                    "interfaces": [{"name": "Component"}],
                    "fields": [
                        {
                            "name": "id",
                            "args": [],
                            "type": {"kind": "NON_NULL", "ofType": {"name": "ID", "kind": "SCALAR"}},
                        },
                        {
                            "name": "endpoint",
                            "args": [],
                            "type": {"name": "String", "kind": "SCALAR"},
                            "description": "API endpoint",
                        },
                    ],
                },
                {
                    "name": "Team",
                    "kind": "OBJECT",
                    "fields": [
                        {
                            "name": "id",
                            "args": [],
                            "type": {"kind": "NON_NULL", "ofType": {"name": "ID", "kind": "SCALAR"}},
                        },
                        {
                            "name": "components",
                            "args": [{"name": "type", "type": {"name": "Type", "kind": "ENUM"}}],
                            "type": {
                                "kind": "LIST",
                                "ofType": {"name": "Component", "kind": "INTERFACE"},
                            },
                        },
                    ],
                },
                {
                    "name": "Type",
                    "kind": "ENUM",
                    "enumValues": [{"name": "Service"}, {"name": "Job"}, {"name": "Library"}],
                },
                {
                    "name": "LifecycleStatus",
                    "kind": "ENUM",
                    "enumValues": [{"name": "ACTIVE"}, {"name": "DEPRECATED"}],
                },
                {
                    "name": "ComponentFilter",
                    "kind": "INPUT_OBJECT",
                    "inputFields": [
                        {"name": "type", "type": {"name": "Type", "kind": "ENUM"}},
                        {"name": "teamId", "type": {"name": "ID", "kind": "SCALAR"}},
                    ],
                },
            ],
        })
    }

    #[test]
    fn queries_section_shows_required_args_only() {
        let ctx = build_schema_context(&sample_schema());
        assert!(ctx.contains("<queries>"));
        // names and type are optional, so the signatures are empty.
        assert!(ctx.contains("components() -> [Component!]! # List components"));
        assert!(ctx.contains("teams() -> [Team]"));
    }

    #[test]
    fn interfaces_section() {
        let ctx = build_schema_context(&sample_schema());
        assert!(ctx.contains("<interfaces>"));
        assert!(ctx.contains("Component {"));
        assert!(ctx.contains("# implemented by: Service, Job, Library"));
        assert!(ctx.contains(
            "repositories(search: String, first: Int): ProjectConnection # Code repositories"
        ));
    }

    #[test]
    fn unions_section() {
        let ctx = build_schema_context(&sample_schema());
        assert!(ctx.contains("<unions>"));
        assert!(ctx.contains("ApprovalChange: RequestToDelete | RequestToUpdate"));
    }

    #[test]
    fn types_section_with_implements() {
        let ctx = build_schema_context(&sample_schema());
        assert!(ctx.contains("<types>"));
        assert!(ctx.contains("Service implements Component {"));
        assert!(ctx.contains("endpoint: String # API endpoint"));
    }

    #[test]
    fn types_section_keeps_nested_args() {
        let ctx = build_schema_context(&sample_schema());
        assert!(ctx.contains("components(type: Type): [Component]"));
    }

    #[test]
    fn enums_section() {
        let ctx = build_schema_context(&sample_schema());
        assert!(ctx.contains("<enums>"));
        assert!(ctx.contains("Type: Service | Job | Library"));
        assert!(ctx.contains("LifecycleStatus: ACTIVE | DEPRECATED"));
    }

    #[test]
    fn inputs_show_required_fields_only() {
        let ctx = build_schema_context(&sample_schema());
        assert!(ctx.contains("<inputs>"));
        // Neither input field is NON_NULL, so the body is empty.
        assert!(ctx.contains("ComponentFilter {  }"));
    }

    #[test]
    fn excludes_introspection_types() {
        let mut schema = sample_schema();
        schema["types"]
            .as_array_mut()
            .unwrap()
            .push(json!({"name": "__Schema", "kind": "OBJECT", "fields": []}));
        let ctx = build_schema_context(&schema);
        assert!(!ctx.contains("__Schema"));
    }

    #[test]
    fn excludes_query_mutation_subscription() {
        let mut schema = sample_schema();
        for name in ["Query", "Mutation", "Subscription"] {
            schema["types"]
                .as_array_mut()
                .unwrap()
                .push(json!({"name": name, "kind": "OBJECT", "fields": []}));
        }
        let ctx = build_schema_context(&schema);
        assert!(!ctx.contains("\nQuery "));
        assert!(!ctx.contains("\nMutation "));
        assert!(!ctx.contains("\nSubscription "));
    }

    #[test]
    fn empty_schema_still_has_sections() {
        let ctx = build_schema_context(&json!({}));
        assert!(ctx.contains("<queries>"));
        assert!(ctx.contains("<types>"));
        assert!(ctx.contains("<enums>"));
        assert!(ctx.contains("<inputs>"));
    }
}
