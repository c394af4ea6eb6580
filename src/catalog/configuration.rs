// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 elt-builder contributors

//! Source configuration tables: what to load, not how to authenticate

use super::{FieldDescriptor as F, FieldValue};

const ADVANCED_CONFIG_EXAMPLE: &str = r#"{
  "client": {
    "base_url": "https://api.example.com",
    "paginator": {
      "type": "json_link",
      "next_url_path": "paging.next"
    }
  },
  "resources": [
    {
      "name": "users",
      "endpoint": {
        "path": "/users",
        "params": {
          "limit": 100
        }
      }
    }
  ]
}"#;

fn resources(options: &[(&'static str, &'static str)], default: &[&'static str]) -> F {
    F::multiselect("resources", "Select resources to load", options).default_list(default)
}

fn comma_list(key: &'static str, label: &'static str, placeholder: &'static str) -> F {
    F::text(key, label).placeholder(placeholder)
}

fn database_source(schema_label: &'static str, schema_placeholder: &'static str, schema_help: &'static str) -> Vec<F> {
    vec![
        comma_list("schemas", schema_label, schema_placeholder).help(schema_help),
        comma_list("tables", "Table names (comma-separated)", "users, orders, products")
            .help("Leave empty to load all tables"),
        F::boolean("incremental", "Use incremental loading", true)
            .help("Only load new/changed data on subsequent runs"),
    ]
}

pub(super) fn source_configurations() -> Vec<(&'static str, Vec<F>)> {
    vec![
        (
            "rest_api",
            vec![
                F::text("base_url", "Base URL")
                    .required()
                    .help("The base URL for your API (e.g., https://api.example.com)")
                    .placeholder("https://api.example.com"),
                F::text("resource_name", "Resource Name")
                    .required()
                    .help("Name for this data resource (will be used as table name)")
                    .placeholder("users"),
                F::text("endpoint", "Endpoint Path")
                    .required()
                    .help("API endpoint path (e.g., /v1/users)")
                    .placeholder("/v1/users"),
                F::select("http_method", "HTTP Method", &[("GET", "GET"), ("POST", "POST")])
                    .required()
                    .default_text("GET"),
                F::select(
                    "pagination_type",
                    "Pagination Strategy",
                    &[
                        ("none", "No Pagination"),
                        ("auto", "Auto-detect (DLT will try to detect)"),
                        ("offset", "Offset-based (page number or offset)"),
                        ("cursor", "Cursor-based (next page token)"),
                        ("json_link", "JSON Link (next page URL in response)"),
                    ],
                )
                .default_text("auto")
                .help("How the API handles pagination"),
                F::text("data_selector", "Data Selector (JSON Path)")
                    .help("Path to data in response (e.g., 'data.items' or 'results')")
                    .placeholder("data"),
                F::boolean("advanced_mode", "Advanced Mode", false)
                    .help("Enable advanced JSON configuration for complex APIs"),
                F::textarea("advanced_config", "Advanced Configuration (JSON)")
                    .show_if("advanced_mode", FieldValue::Bool(true))
                    .help("Full REST API client configuration in JSON format. See DLT documentation for details.")
                    .placeholder(ADVANCED_CONFIG_EXAMPLE),
            ],
        ),
        (
            "github",
            vec![
                F::text("repos", "Which repositories do you want to load?")
                    .required()
                    .help("Comma-separated list of repos in format owner/repo")
                    .placeholder("dlt-hub/dlt, dagster-io/dagster"),
                resources(
                    &[
                        ("issues", "Issues"),
                        ("pull_requests", "Pull Requests"),
                        ("commits", "Commits"),
                        ("stargazers", "Stargazers"),
                        ("workflows", "Workflows"),
                        ("releases", "Releases"),
                    ],
                    &["issues", "pull_requests"],
                )
                .help("Select which GitHub resources to sync"),
            ],
        ),
        (
            "stripe",
            vec![resources(
                &[
                    ("customers", "Customers"),
                    ("invoices", "Invoices"),
                    ("charges", "Charges"),
                    ("subscriptions", "Subscriptions"),
                    ("products", "Products"),
                    ("payment_intents", "Payment Intents"),
                ],
                &["customers", "invoices", "charges"],
            )
            .help("Select which Stripe resources to sync")],
        ),
        (
            "shopify",
            vec![resources(
                &[
                    ("orders", "Orders"),
                    ("customers", "Customers"),
                    ("products", "Products"),
                    ("inventory", "Inventory"),
                    ("fulfillments", "Fulfillments"),
                ],
                &["orders", "customers", "products"],
            )],
        ),
        (
            "salesforce",
            vec![
                F::text("objects", "Which Salesforce objects?")
                    .required()
                    .help("Comma-separated list of Salesforce objects")
                    .placeholder("Account, Contact, Opportunity, Lead"),
                F::boolean("use_bulk_api", "Use Bulk API (for large datasets)", true),
            ],
        ),
        (
            "hubspot",
            vec![resources(
                &[
                    ("contacts", "Contacts"),
                    ("companies", "Companies"),
                    ("deals", "Deals"),
                    ("tickets", "Tickets"),
                    ("products", "Products"),
                ],
                &["contacts", "companies", "deals"],
            )],
        ),
        (
            "postgres",
            database_source(
                "Schema names (comma-separated)",
                "public, analytics",
                "Leave empty to load all schemas",
            ),
        ),
        (
            "mysql",
            database_source(
                "Database/Schema names (comma-separated)",
                "mydb, analytics",
                "Leave empty to load all databases",
            ),
        ),
        (
            "mongodb",
            vec![comma_list(
                "collections",
                "Collection names (comma-separated)",
                "users, orders, products",
            )
            .help("Leave empty to load all collections")],
        ),
        (
            "google_analytics",
            vec![
                F::text("property_id", "GA4 Property ID")
                    .required()
                    .placeholder("123456789"),
                comma_list("dimensions", "Dimensions (comma-separated)", "date, city, deviceCategory")
                    .help("GA4 dimension names"),
                comma_list("metrics", "Metrics (comma-separated)", "activeUsers, sessions, pageviews")
                    .help("GA4 metric names"),
            ],
        ),
        (
            "zendesk",
            vec![resources(
                &[
                    ("tickets", "Tickets"),
                    ("users", "Users"),
                    ("organizations", "Organizations"),
                    ("groups", "Groups"),
                ],
                &["tickets", "users"],
            )],
        ),
        (
            "jira",
            vec![
                comma_list("projects", "Project keys (comma-separated)", "PROJ1, PROJ2")
                    .help("Leave empty to load all projects"),
                resources(
                    &[
                        ("issues", "Issues"),
                        ("users", "Users"),
                        ("projects", "Projects"),
                        ("workflows", "Workflows"),
                    ],
                    &["issues", "projects"],
                ),
            ],
        ),
        (
            "slack",
            vec![
                comma_list("channels", "Channel IDs (comma-separated)", "C1234567890, C0987654321")
                    .help("Leave empty to load all channels"),
                F::boolean("include_private", "Include private channels", false),
            ],
        ),
        (
            "s3",
            vec![
                F::text("bucket", "S3 Bucket Name")
                    .required()
                    .placeholder("my-data-bucket"),
                F::text("prefix", "Prefix/Path")
                    .placeholder("data/exports/")
                    .help("Optional path within the bucket"),
                F::text("file_format", "File Format")
                    .placeholder("csv, json, parquet")
                    .help("Expected file format in the bucket"),
            ],
        ),
        (
            "csv",
            vec![
                F::text("file_path", "CSV File Path")
                    .required()
                    .placeholder("/path/to/data.csv"),
                F::text("delimiter", "Delimiter")
                    .placeholder(",")
                    .default_text(","),
            ],
        ),
    ]
}
