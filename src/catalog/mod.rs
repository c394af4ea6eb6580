// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 elt-builder contributors

//! Credential and source-configuration catalogs
//!
//! Static lookup tables describing which credentials a source or destination
//! needs and which extra settings a source accepts. Lookups never fail: an
//! unknown type yields an empty field list.

mod configuration;
mod credentials;

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::pipeline::Tool;

/// Input widget type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Password,
    Boolean,
    Select,
    Multiselect,
    Textarea,
}

/// A typed value used for defaults and visibility conditions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(&'static str),
    Bool(bool),
    List(Vec<&'static str>),
}

impl FieldValue {
    /// Whether a user-supplied string satisfies this value
    pub fn matches(&self, supplied: &str) -> bool {
        match self {
            Self::Text(expected) => supplied == *expected,
            Self::Bool(expected) => parse_bool(supplied) == Some(*expected),
            Self::List(values) => values.iter().any(|v| *v == supplied),
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{}", s),
            Self::Bool(b) => write!(f, "{}", b),
            Self::List(values) => write!(f, "{}", values.join(", ")),
        }
    }
}

/// One choice of a select/multiselect field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldOption {
    pub value: &'static str,
    pub label: &'static str,
}

/// "Visible only if `field` equals `equals`"
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShowIf {
    pub field: &'static str,
    pub equals: FieldValue,
}

/// Describes a single credential or configuration field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    pub key: &'static str,
    pub label: &'static str,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<FieldValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_if: Option<ShowIf>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FieldOption>,
}

impl FieldDescriptor {
    fn new(key: &'static str, label: &'static str, field_type: FieldType) -> Self {
        Self {
            key,
            label,
            field_type,
            required: false,
            default: None,
            placeholder: None,
            help: None,
            show_if: None,
            options: Vec::new(),
        }
    }

    pub(crate) fn text(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, FieldType::Text)
    }

    pub(crate) fn password(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, FieldType::Password)
    }

    pub(crate) fn textarea(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, FieldType::Textarea)
    }

    pub(crate) fn boolean(key: &'static str, label: &'static str, default: bool) -> Self {
        Self::new(key, label, FieldType::Boolean).default(FieldValue::Bool(default))
    }

    pub(crate) fn select(
        key: &'static str,
        label: &'static str,
        options: &[(&'static str, &'static str)],
    ) -> Self {
        Self::new(key, label, FieldType::Select).options(options)
    }

    pub(crate) fn multiselect(
        key: &'static str,
        label: &'static str,
        options: &[(&'static str, &'static str)],
    ) -> Self {
        Self::new(key, label, FieldType::Multiselect).options(options)
    }

    pub(crate) fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub(crate) fn default(mut self, value: FieldValue) -> Self {
        self.default = Some(value);
        self
    }

    pub(crate) fn default_text(self, value: &'static str) -> Self {
        self.default(FieldValue::Text(value))
    }

    pub(crate) fn default_list(self, values: &[&'static str]) -> Self {
        self.default(FieldValue::List(values.to_vec()))
    }

    pub(crate) fn placeholder(mut self, placeholder: &'static str) -> Self {
        self.placeholder = Some(placeholder);
        self
    }

    pub(crate) fn help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }

    pub(crate) fn show_if(mut self, field: &'static str, equals: FieldValue) -> Self {
        self.show_if = Some(ShowIf { field, equals });
        self
    }

    pub(crate) fn shown_when(self, field: &'static str, value: &'static str) -> Self {
        self.show_if(field, FieldValue::Text(value))
    }

    fn options(mut self, options: &[(&'static str, &'static str)]) -> Self {
        self.options = options
            .iter()
            .map(|(value, label)| FieldOption { value, label })
            .collect();
        self
    }

    /// Whether this field applies given the other supplied values
    pub fn is_visible(&self, lookup: &dyn Fn(&str) -> Option<String>) -> bool {
        match &self.show_if {
            None => true,
            Some(cond) => lookup(cond.field)
                .map(|v| cond.equals.matches(&v))
                .unwrap_or(false),
        }
    }
}

/// Credentials needed by a (source, destination) pair
#[derive(Debug, Clone, Default, Serialize)]
pub struct RequiredCredentials {
    pub source: Vec<FieldDescriptor>,
    pub destination: Vec<FieldDescriptor>,
}

impl RequiredCredentials {
    /// All keys, source first
    pub fn keys(&self) -> Vec<&'static str> {
        self.source
            .iter()
            .chain(self.destination.iter())
            .map(|f| f.key)
            .collect()
    }
}

/// Deduplicated catalog tables, keyed by lower-case type name
struct Catalog {
    source_credentials: BTreeMap<&'static str, Vec<FieldDescriptor>>,
    destination_credentials: BTreeMap<&'static str, Vec<FieldDescriptor>>,
    source_configurations: BTreeMap<&'static str, Vec<FieldDescriptor>>,
}

fn catalog() -> &'static Catalog {
    static CATALOG: OnceLock<Catalog> = OnceLock::new();
    CATALOG.get_or_init(|| Catalog {
        source_credentials: dedup(credentials::source_credentials()),
        destination_credentials: dedup(credentials::destination_credentials()),
        source_configurations: dedup(configuration::source_configurations()),
    })
}

/// Collapse an ordered table into a map; a later entry for the same type wins.
fn dedup(
    entries: Vec<(&'static str, Vec<FieldDescriptor>)>,
) -> BTreeMap<&'static str, Vec<FieldDescriptor>> {
    entries.into_iter().collect()
}

/// Credential fields for a source and a destination
pub fn required_credentials(source_type: &str, destination_type: &str) -> RequiredCredentials {
    let catalog = catalog();
    RequiredCredentials {
        source: lookup(&catalog.source_credentials, source_type),
        destination: lookup(&catalog.destination_credentials, destination_type),
    }
}

/// Credential fields for a single source or destination type, sources first
pub fn credentials_for(type_name: &str) -> Option<Vec<FieldDescriptor>> {
    let catalog = catalog();
    let key = type_name.to_lowercase();
    catalog
        .source_credentials
        .get(key.as_str())
        .or_else(|| catalog.destination_credentials.get(key.as_str()))
        .cloned()
}

/// Source-specific configuration fields (what to load, not how to log in)
pub fn source_configuration_fields(source_type: &str) -> Vec<FieldDescriptor> {
    lookup(&catalog().source_configurations, source_type)
}

fn lookup(table: &BTreeMap<&'static str, Vec<FieldDescriptor>>, type_name: &str) -> Vec<FieldDescriptor> {
    table
        .get(type_name.to_lowercase().as_str())
        .cloned()
        .unwrap_or_default()
}

/// Known source types, sorted
pub fn source_types() -> Vec<&'static str> {
    catalog().source_credentials.keys().copied().collect()
}

/// Known destination types, sorted
pub fn destination_types() -> Vec<&'static str> {
    catalog().destination_credentials.keys().copied().collect()
}

const DUAL_TOOL_SOURCES: &[&str] = &["postgres", "mysql", "mssql", "oracle"];

const DUAL_TOOL_DESTINATIONS: &[&str] = &[
    "postgres", "mysql", "snowflake", "bigquery", "redshift", "databricks", "mssql",
];

/// Tools able to read from a source type
pub fn source_tools(source_type: &str) -> Vec<Tool> {
    let source = source_type.to_lowercase();
    if DUAL_TOOL_SOURCES.contains(&source.as_str()) {
        vec![Tool::Dlt, Tool::Sling]
    } else {
        vec![Tool::Dlt]
    }
}

/// Tools able to write to a destination type
pub fn destination_tools(destination_type: &str) -> Vec<Tool> {
    let destination = destination_type.to_lowercase();
    if DUAL_TOOL_DESTINATIONS.contains(&destination.as_str()) {
        return vec![Tool::Dlt, Tool::Sling];
    }
    vec![Tool::Dlt]
}

/// Sling connection URL template with `${VAR}` placeholders
///
/// The source wins when both are given and the source has a template.
pub fn connection_string_template(source_type: Option<&str>, destination_type: Option<&str>) -> String {
    if let Some(source) = source_type {
        match source.to_lowercase().as_str() {
            "postgres" => {
                return "postgresql://${POSTGRES_USER}:${POSTGRES_PASSWORD}@${POSTGRES_HOST}:${POSTGRES_PORT:-5432}/${POSTGRES_DATABASE}".into()
            }
            "mysql" => {
                return "mysql://${MYSQL_USER}:${MYSQL_PASSWORD}@${MYSQL_HOST}:${MYSQL_PORT:-3306}/${MYSQL_DATABASE}".into()
            }
            "mongodb" => return "${MONGODB_CONNECTION_STRING}".into(),
            _ => {}
        }
    }

    if let Some(destination) = destination_type {
        match destination.to_lowercase().as_str() {
            "snowflake" => {
                return "snowflake://${SNOWFLAKE_USER}:${SNOWFLAKE_PASSWORD}@${SNOWFLAKE_ACCOUNT}/${SNOWFLAKE_DATABASE}?warehouse=${SNOWFLAKE_WAREHOUSE}".into()
            }
            "bigquery" => return "bigquery://${GCP_PROJECT_ID}?credentials_path=credentials.json".into(),
            "postgres" => {
                return "postgresql://${DEST_POSTGRES_USER}:${DEST_POSTGRES_PASSWORD}@${DEST_POSTGRES_HOST}:${DEST_POSTGRES_PORT:-5432}/${DEST_POSTGRES_DATABASE}".into()
            }
            _ => {}
        }
    }

    String::new()
}

/// Keys of required credentials that are absent or blank
///
/// Only presence is checked. A field with a catalog default counts as
/// supplied, and fields hidden by an unmet `show_if` condition are skipped.
pub fn missing_credentials(
    source_type: &str,
    destination_type: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Vec<&'static str> {
    let required = required_credentials(source_type, destination_type);
    let mut missing = Vec::new();

    for fields in [&required.source, &required.destination] {
        let resolve = |key: &str| -> Option<String> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .or_else(|| {
                    fields
                        .iter()
                        .find(|f| f.key == key)
                        .and_then(|f| f.default.as_ref())
                        .map(|d| d.to_string())
                })
        };

        for field in fields.iter().filter(|f| f.required) {
            if !field.is_visible(&resolve) {
                continue;
            }
            if resolve(field.key).is_none() {
                missing.push(field.key);
            }
        }
    }

    missing
}

/// Interpret common boolean spellings
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "y" | "1" | "on" => Some(true),
        "false" | "no" | "n" | "0" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};

    #[test]
    fn test_unknown_types_yield_empty_lists() {
        let creds = required_credentials("nope", "also_nope");
        assert!(creds.source.is_empty());
        assert!(creds.destination.is_empty());
        assert!(source_configuration_fields("nope").is_empty());
        assert!(credentials_for("nope").is_none());
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let creds = required_credentials("GitHub", "SNOWFLAKE");
        assert_eq!(creds.source[0].key, "GITHUB_TOKEN");
        assert!(creds.destination.iter().any(|f| f.key == "SNOWFLAKE_ACCOUNT"));
    }

    #[test]
    fn test_tables_have_no_unintended_collisions() {
        // The destination table deliberately defines clickhouse twice; every
        // other type must appear exactly once per table.
        let allowed: HashSet<&str> = ["clickhouse"].into_iter().collect();

        for (name, table) in [
            ("source credentials", credentials::source_credentials()),
            ("destination credentials", credentials::destination_credentials()),
            ("source configurations", configuration::source_configurations()),
        ] {
            let mut seen = HashMap::new();
            for (type_name, _) in &table {
                *seen.entry(*type_name).or_insert(0) += 1;
            }
            for (type_name, count) in seen {
                if count > 1 {
                    assert!(
                        allowed.contains(type_name) && name == "destination credentials",
                        "{name}: '{type_name}' defined {count} times"
                    );
                }
            }
        }
    }

    #[test]
    fn test_duplicate_definition_last_wins() {
        let creds = required_credentials("unknown", "clickhouse");
        let password = creds
            .destination
            .iter()
            .find(|f| f.key == "CLICKHOUSE_PASSWORD")
            .unwrap();
        assert!(!password.required);
    }

    #[test]
    fn test_field_keys_unique_within_type() {
        for (type_name, fields) in credentials::source_credentials()
            .into_iter()
            .chain(credentials::destination_credentials())
            .chain(configuration::source_configurations())
        {
            let mut keys = HashSet::new();
            for field in &fields {
                assert!(keys.insert(field.key), "{type_name}: duplicate key {}", field.key);
            }
        }
    }

    #[test]
    fn test_select_fields_have_options() {
        for (_, fields) in credentials::source_credentials()
            .into_iter()
            .chain(credentials::destination_credentials())
            .chain(configuration::source_configurations())
        {
            for field in fields {
                if matches!(field.field_type, FieldType::Select | FieldType::Multiselect) {
                    assert!(!field.options.is_empty(), "{} has no options", field.key);
                }
            }
        }
    }

    #[test]
    fn test_local_file_sources_need_no_credentials() {
        for source in ["csv", "json", "parquet"] {
            assert!(source_types().contains(&source));
            assert!(required_credentials(source, "duckdb").source.is_empty());
        }
    }

    #[test]
    fn test_missing_credentials_respects_show_if() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("POSTGRES_HOST", "localhost"),
            ("POSTGRES_DATABASE", "app"),
            ("POSTGRES_USER", "app"),
        ]);
        let missing = missing_credentials("postgres", "duckdb", |k| {
            env.get(k).map(|v| v.to_string())
        });
        // Auth method falls back to its default, password is optional
        assert!(missing.is_empty());

        let missing = missing_credentials("postgres", "snowflake", |_| None);
        assert_eq!(
            missing,
            vec![
                "POSTGRES_HOST",
                "POSTGRES_DATABASE",
                "POSTGRES_USER",
                "SNOWFLAKE_ACCOUNT",
                "SNOWFLAKE_USER",
                "SNOWFLAKE_DATABASE",
                "SNOWFLAKE_WAREHOUSE",
            ]
        );

        let missing = missing_credentials("rest_api", "duckdb", |k| {
            (k == "REST_API_AUTH_TYPE").then(|| "bearer".to_string())
        });
        assert_eq!(missing, vec!["REST_API_BEARER_TOKEN"]);
    }

    #[test]
    fn test_missing_credentials_blank_counts_as_missing() {
        let missing = missing_credentials("github", "unknown", |_| Some("   ".to_string()));
        assert_eq!(missing, vec!["GITHUB_TOKEN"]);
    }

    #[test]
    fn test_tool_support() {
        assert_eq!(source_tools("github"), vec![Tool::Dlt]);
        assert_eq!(source_tools("postgres"), vec![Tool::Dlt, Tool::Sling]);
        assert_eq!(source_tools("MongoDB"), vec![Tool::Dlt]);
        assert_eq!(source_tools("clickhouse"), vec![Tool::Dlt]);
        assert_eq!(destination_tools("snowflake"), vec![Tool::Dlt, Tool::Sling]);
        assert_eq!(destination_tools("duckdb"), vec![Tool::Dlt]);
    }

    #[test]
    fn test_connection_string_templates() {
        assert!(connection_string_template(Some("postgres"), None).starts_with("postgresql://"));
        assert!(connection_string_template(None, Some("bigquery")).starts_with("bigquery://"));
        assert!(connection_string_template(Some("github"), Some("snowflake")).starts_with("snowflake://"));
        assert!(connection_string_template(Some("github"), Some("duckdb")).is_empty());
    }

    #[test]
    fn test_field_value_matching() {
        assert!(FieldValue::Bool(true).matches("yes"));
        assert!(!FieldValue::Bool(true).matches("false"));
        assert!(FieldValue::Text("bearer").matches("bearer"));
        assert!(FieldValue::List(vec!["a", "b"]).matches("b"));
    }
}
