//! Configuration loading integration tests

use cartage::config::{load_config, JoinProviderKind};
use secrecy::ExposeSecret;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn full_config() -> String {
    r#"
[application]
log_level = "debug"

[sources.customers]
url = "https://example.com/data/customers.csv"
filename = "customers.csv"

[sources.orders]
url = "https://example.com/data/orders.csv"
filename = "orders.csv"

[staging]
intake_dir = "/var/lib/cartage/intake"
archive_dir = "/var/lib/cartage/archive"

[stores.customers]
connection_string = "postgresql://etl:pw@customers-db:5432/shop"
table = "customers"
max_connections = 8

[stores.orders]
connection_string = "postgresql://etl:pw@orders-db:5432/shop"
table = "orders"

[join]
provider = "foreign_table"
materialized_table = "customers_orders"

[join.linkage]
host = "customers-db"
port = 5432
dbname = "shop"
username = "etl"
password = "linkage-pw"

[export]
output_dir = "/var/lib/cartage/output"
filename_prefix = "customers_orders"

[http]
request_timeout_seconds = 15

[logging]
local_enabled = true
local_path = "/var/log/cartage"
local_rotation = "hourly"
"#
    .to_string()
}

#[test]
fn test_full_config_round_trip() {
    let file = write_config(&full_config());
    let config = load_config(file.path()).unwrap();

    assert_eq!(config.application.log_level, "debug");
    assert_eq!(
        config.sources.customers.url,
        "https://example.com/data/customers.csv"
    );
    assert_eq!(config.staging.archive_dir, "/var/lib/cartage/archive");
    assert_eq!(config.stores.customers.max_connections, 8);
    // Defaulted pool size on the orders store.
    assert_eq!(config.stores.orders.max_connections, 4);
    assert_eq!(config.join.provider, JoinProviderKind::ForeignTable);
    assert_eq!(config.join.foreign_table, "customers_remote");
    let linkage = config.join.linkage.as_ref().unwrap();
    assert_eq!(linkage.password.expose_secret().as_ref(), "linkage-pw");
    assert_eq!(config.http.request_timeout_seconds, 15);
    assert_eq!(config.http.connect_timeout_seconds, 10);
    assert!(config.logging.local_enabled);
}

#[test]
fn test_env_substitution_in_connection_strings() {
    std::env::set_var(
        "CARTAGE_IT_CUSTOMERS_DSN",
        "postgresql://etl:secret@db:5432/shop",
    );

    let contents = full_config().replace(
        "postgresql://etl:pw@customers-db:5432/shop",
        "${CARTAGE_IT_CUSTOMERS_DSN}",
    );
    let file = write_config(&contents);
    let config = load_config(file.path()).unwrap();

    assert_eq!(
        config.stores.customers.connection_string.expose_secret().as_ref(),
        "postgresql://etl:secret@db:5432/shop"
    );

    std::env::remove_var("CARTAGE_IT_CUSTOMERS_DSN");
}

#[test]
fn test_missing_env_variable_is_an_error() {
    std::env::remove_var("CARTAGE_IT_MISSING_DSN");
    let contents = full_config().replace(
        "postgresql://etl:pw@customers-db:5432/shop",
        "${CARTAGE_IT_MISSING_DSN}",
    );
    let file = write_config(&contents);

    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("CARTAGE_IT_MISSING_DSN"));
}

#[test]
fn test_merge_provider_needs_no_linkage() {
    let contents = full_config()
        .replace("provider = \"foreign_table\"", "provider = \"merge\"")
        .replace(
            r#"[join.linkage]
host = "customers-db"
port = 5432
dbname = "shop"
username = "etl"
password = "linkage-pw"
"#,
            "",
        );
    let file = write_config(&contents);

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.join.provider, JoinProviderKind::Merge);
    assert!(config.join.linkage.is_none());
}

#[test]
fn test_missing_section_rejected() {
    let contents = full_config().replace("[staging]", "[staging_typo]");
    let file = write_config(&contents);
    assert!(load_config(file.path()).is_err());
}

#[test]
fn test_invalid_table_identifier_rejected() {
    let contents = full_config().replace(
        "table = \"orders\"",
        "table = \"orders; drop table customers\"",
    );
    let file = write_config(&contents);
    assert!(load_config(file.path()).is_err());
}

#[test]
fn test_same_intake_and_archive_rejected() {
    let contents = full_config().replace(
        "archive_dir = \"/var/lib/cartage/archive\"",
        "archive_dir = \"/var/lib/cartage/intake\"",
    );
    let file = write_config(&contents);
    assert!(load_config(file.path()).is_err());
}
