use anyhow::Result;
use propconv::core::binder::ValueOrigin;
use propconv::utils::validation::Validate;
use propconv::{ConversionRegistry, Period, PropertyBinder, PropertyFile};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(content: &str) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    file.write_all(content.as_bytes())?;
    Ok(file)
}

#[test]
fn test_bind_property_file_end_to_end() -> Result<()> {
    let config = write_config(
        r#"
[properties]
session_timeout = "30m"
report_date = "2024-02-29"
nightly_at = "02:30"
last_run = "2024-02-28T02:30:00"
workers = 8
hosts = ["alpha", "beta"]
log_level = "warn"

[[fields]]
name = "session_timeout"
type = "duration"

[[fields]]
name = "report_date"
type = "date"

[[fields]]
name = "nightly_at"
type = "time"

[[fields]]
name = "last_run"
type = "date-time"

[[fields]]
name = "workers"
type = "u8"

[[fields]]
name = "hosts"
type = "list<string>"

[[fields]]
name = "log_level"
type = "enum(Debug|Info|Warn)"

[[fields]]
name = "cache_ttl"
type = "period"
default = "P1D"
"#,
    )?;

    let file = PropertyFile::from_file(config.path())?;
    file.validate()?;

    let binder = PropertyBinder::new(ConversionRegistry::default());
    let bound = binder.bind(&file.fields, &file)?;

    assert_eq!(bound.len(), 8);
    assert_eq!(bound.get_period("session_timeout"), Some(Period::minutes(30)));
    assert_eq!(bound.get_date("report_date").map(|d| d.to_string()), Some("2024-02-29".to_string()));
    assert_eq!(bound.get_time("nightly_at").map(|t| t.to_string()), Some("02:30:00".to_string()));
    assert!(bound.get_date_time("last_run").is_some());
    assert_eq!(bound.get_unsigned("workers"), Some(8));
    assert_eq!(
        bound
            .get_list("hosts")
            .map(|items| items.iter().filter_map(|i| i.as_str()).collect::<Vec<_>>()),
        Some(vec!["alpha", "beta"])
    );
    assert_eq!(bound.get_str("log_level"), Some("Warn"));
    assert_eq!(bound.get_period("cache_ttl"), Some(Period::days(1)));
    assert_eq!(bound.field("cache_ttl").map(|f| f.origin), Some(ValueOrigin::Default));

    let json = bound.to_json()?;
    assert_eq!(json["session_timeout"], "PT30M");
    assert_eq!(json["workers"], 8);
    Ok(())
}

#[test]
fn test_bad_generic_value_aborts_binding() -> Result<()> {
    let file = PropertyFile::from_toml_str(
        r#"
[properties]
workers = "many"

[[fields]]
name = "workers"
type = "u8"
"#,
    )?;

    let binder = PropertyBinder::new(ConversionRegistry::default());
    let err = binder.bind(&file.fields, &file).unwrap_err();
    assert!(err.is_conversion_failure());
    assert!(err.to_string().contains("[workers]"));
    assert!(err.to_string().contains("[many]"));
    Ok(())
}

#[test]
fn test_unparseable_date_falls_back_to_unset() -> Result<()> {
    let file = PropertyFile::from_toml_str(
        r#"
[properties]
report_date = "last tuesday"

[[fields]]
name = "report_date"
type = "date"
"#,
    )?;

    let binder = PropertyBinder::new(ConversionRegistry::default());
    let bound = binder.bind(&file.fields, &file)?;
    assert_eq!(bound.get_date("report_date"), None);
    assert_eq!(bound.field("report_date").map(|f| f.origin), Some(ValueOrigin::Unset));
    Ok(())
}

#[test]
fn test_list_elements_with_commas_stay_whole() -> Result<()> {
    let file = PropertyFile::from_toml_str(
        r#"
[properties]
hosts = ["a,b", "c"]
ports = [8080, 8081]

[[fields]]
name = "hosts"
type = "list<string>"

[[fields]]
name = "ports"
type = "list<u16>"
"#,
    )?;

    let binder = PropertyBinder::new(ConversionRegistry::default());
    let bound = binder.bind(&file.fields, &file)?;
    assert_eq!(
        bound
            .get_list("hosts")
            .map(|items| items.iter().filter_map(|i| i.as_str()).collect::<Vec<_>>()),
        Some(vec!["a,b", "c"])
    );
    assert_eq!(
        bound
            .get_list("ports")
            .map(|items| items.iter().filter_map(|i| i.as_u64()).collect::<Vec<_>>()),
        Some(vec![8080, 8081])
    );
    Ok(())
}
