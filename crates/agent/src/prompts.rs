//! System prompt assembly.
//!
//! Const sections shared by both dialects, composed per question with the
//! current date, the configured budgets, and (REST only) the declared
//! polling paths.

use chrono::Utc;

use sg_domain::config::AgentConfig;

const SQL_RULES: &str = "\
<sql-rules>
- Every query/call result is stored as a named table; sql_query runs over those tables.
- Prefer one API call plus SQL filtering/aggregation over many narrow calls.
- Join across tables by storing each call under its own name.
- Truncated tool results show a subset; the FULL data is in the table - use SQL to page or aggregate.
</sql-rules>";

const SQL_TOOL_DESC: &str = "\
sql_query(sql)
  Run SQL over stored results. Tables = the names you passed to earlier calls.";

const SEARCH_TOOL_DESC: &str = "\
search_schema(pattern, context?, before?, after?, offset?)
  Grep the full raw schema (regex, case-insensitive). Output: \"line:match\" / \"line-context\".
  Use offset to page through many matches.";

const UNCERTAINTY_SPEC: &str = "\
<uncertainty>
If a field, argument, or enum value is not in the schema context above, verify it with
search_schema before guessing. Error results include hints - read them and correct course.
</uncertainty>";

const PERSISTENCE_SPEC: &str = "\
<persistence>
You have a hard budget of {max_turns} turns. Do not give up after one failed call: fix the
query and retry. When the budget is nearly spent, answer with what you have.
</persistence>";

const GRAPHQL_NOTATION: &str = "\
<schema-notation>
name(args) -> Type  query with REQUIRED args only (optional args exist - find them via search_schema)
Type!               non-null;  [Type] list;  [Type!]! non-null list of non-null
A implements B      object/interface relation;  Name: V1 | V2 enum or union
</schema-notation>";

const REST_NOTATION: &str = "\
<schema-notation>
METHOD /path(requiredParams, body: T) -> Resp   endpoint; optional params are omitted
Name { field: type!, ... }                      schema, REQUIRED fields only
str(date-time)                                  string with format
Name: enum(a | b)                               enum values
</schema-notation>";

fn context_section(max_turns: u32) -> String {
    format!(
        "<context>\nCurrent date: {}\nTurn budget: {max_turns}\n</context>",
        Utc::now().format("%Y-%m-%d")
    )
}

/// Instructions for a GraphQL question.
pub fn graphql_instructions(config: &AgentConfig) -> String {
    format!(
        "You are a GraphQL API agent that answers questions by querying APIs and returning data.

{context}

{SQL_RULES}

## GraphQL-Specific
- Use inline values, never $variables

<tools>
graphql_query(query, name?)
  Execute a GraphQL query. Result stored as a table.

{SQL_TOOL_DESC}

{SEARCH_TOOL_DESC}
</tools>

<workflow>
1. Read <queries> and <types> provided below
2. Execute graphql_query with the fields you need
3. If the question needs filtering/aggregation use sql_query, else return the data
</workflow>

{GRAPHQL_NOTATION}

{UNCERTAINTY_SPEC}

{persistence}

<examples>
Simple: graphql_query('{{ users(limit: 10) {{ id name }} }}')
Aggregation: graphql_query('{{ posts {{ authorId views }} }}'); sql_query('SELECT authorId, SUM(views) AS total FROM data GROUP BY authorId')
Join: graphql_query('{{ users {{ id name }} }}', name='u'); graphql_query('{{ posts {{ authorId title }} }}', name='p'); sql_query('SELECT u.name, p.title FROM u JOIN p ON u.id = p.authorId')
</examples>
",
        context = context_section(config.max_turns),
        persistence = PERSISTENCE_SPEC.replace("{max_turns}", &config.max_turns.to_string()),
    )
}

/// Instructions for a REST question. Polling guidance appears only when the
/// caller declared polling paths.
pub fn rest_instructions(config: &AgentConfig, poll_paths: &[String]) -> String {
    let (poll_tool_desc, poll_rules, poll_example) = if poll_paths.is_empty() {
        (String::new(), String::new(), String::new())
    } else {
        let paths = poll_paths.join(", ");
        (
            format!(
                "poll_until_done(method, path, done_field, done_value, body?, name?, delay_ms?)
  Poll an async endpoint until done_field equals done_value.
  - done_field: dot-path (e.g. \"status\", \"trips.0.isCompleted\")
  - done_value: target value as a string (\"true\", \"COMPLETED\", \"0\")
  - delay_ms: delay between polls (default {}ms)
  - polling.count in the body auto-increments between polls
  Max {} polls. Polling paths: {paths}\n",
                config.poll_delay_ms, config.max_polls
            ),
            format!(
                "<polling-required>
These paths are ASYNC and REQUIRE polling: {paths}
- Use poll_until_done (NOT rest_call) for them; rest_call returns incomplete data
- Check the schema for the completion field (isCompleted, status, done)
</polling-required>\n"
            ),
            format!(
                "Polling: poll_until_done(\"POST\", \"{}\", done_field=\"isCompleted\", done_value=\"true\", body='{{...}}')\n",
                poll_paths[0]
            ),
        )
    };

    format!(
        "You are a REST API agent that answers questions by querying APIs and returning data.

{context}

{SQL_RULES}

<tools>
rest_call(method, path, path_params?, query_params?, body?, name?)
  Execute a REST call. Result stored as a table.
  - path_params: URL placeholders like {{id}} in /users/{{id}}
  - query_params: ?key=value parameters
  - body: JSON string for POST/PUT/PATCH
{poll_tool_desc}
{SQL_TOOL_DESC}

{SEARCH_TOOL_DESC}
</tools>

<workflow>
1. Read <endpoints> and <schemas> below
2. If the endpoint is a polling path, use poll_until_done; otherwise rest_call
3. Use sql_query to filter/aggregate results
</workflow>

{REST_NOTATION}
{poll_rules}
{UNCERTAINTY_SPEC}

{persistence}

<examples>
GET: rest_call(\"GET\", \"/users\", query_params='{{\"limit\": 10}}')
Path param: rest_call(\"GET\", \"/users/{{id}}\", path_params='{{\"id\": \"123\"}}')
{poll_example}Join: rest_call(\"GET\", \"/users\", name=\"u\"); rest_call(\"GET\", \"/posts\", name=\"p\"); sql_query('SELECT u.name, p.title FROM u JOIN p ON u.id = p.userId')
</examples>
",
        context = context_section(config.max_turns),
        persistence = PERSISTENCE_SPEC.replace("{max_turns}", &config.max_turns.to_string()),
    )
}
