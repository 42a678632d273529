//! Request parameter sanitization
//!
//! Everything a caller sends is checked here before it can influence SQL.
//! Two failure grades: selection, sort and order problems degrade to safe
//! defaults and surface as [`Warning`]s in the response; unknown filter
//! fields and operators are hard errors because silently dropping a filter
//! clause would change which records the caller sees.

#![allow(clippy::result_large_err)]

use atheneum_core::errors::{AthError, AthErrorKind, Result, Warning};

use crate::field_map::{FieldMap, DEFAULT_SORT_FIELD};

/// Page-size window applied when the caller sends nothing usable
pub const DEFAULT_LIMIT: u64 = 100;
pub const MAX_LIMIT: u64 = 100;
pub const DEFAULT_OFFSET: u64 = 0;
pub const MAX_OFFSET: u64 = 100_000;

/// Raw operator tokens accepted in filter expressions
pub const RAW_OPERATORS: [&str; 7] = ["=", "!=", ">", ">=", "<", "<=", "~"];

/// A validated sort instruction
///
/// `subkey` is present for the `field:subkey` form, used to sort on one
/// entry of a map-valued column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub subkey: Option<String>,
}

impl SortSpec {
    pub fn default_sort() -> Self {
        Self {
            field: DEFAULT_SORT_FIELD.to_string(),
            subkey: None,
        }
    }
}

/// Clamp a caller-supplied window value into `1..=max`, substituting
/// `default` for anything absent, non-positive or out of range
pub fn check_value(value: Option<i64>, default: u64, max: u64) -> u64 {
    match value {
        Some(v) if v > 0 && (v as u64) <= max => v as u64,
        _ => default,
    }
}

/// Map a raw comparison operator to its canonical SQL token
///
/// `!=` becomes `<>` and `~` becomes `LIKE`; everything downstream
/// dispatches on the canonical form only.
pub fn sanitize_operator(raw: &str) -> Result<&'static str> {
    match raw {
        "=" => Ok("="),
        "!=" => Ok("<>"),
        ">" => Ok(">"),
        ">=" => Ok(">="),
        "<" => Ok("<"),
        "<=" => Ok("<="),
        "~" => Ok("LIKE"),
        other => Err(AthError::new(AthErrorKind::UnknownOperator)
            .with_op("filter_sanitize")
            .with_message(format!("unknown operator '{}'", other))
            .with_valid_set(RAW_OPERATORS.iter().map(|s| s.to_string()).collect())),
    }
}

/// Map a raw connector token to `AND` or `OR`
pub fn sanitize_connector(raw: &str) -> &'static str {
    if raw == "||" || raw.eq_ignore_ascii_case("or") {
        "OR"
    } else {
        "AND"
    }
}

/// Wrap the value for the canonical operator
///
/// Fuzzy comparisons get `%` wildcards here so field types see a ready
/// LIKE pattern. A wrapped value is no longer the `NULL` sentinel, which
/// makes `~'null'` a substring match rather than an absence check.
pub fn prepare_value(operator: &str, value: &str) -> String {
    if operator == "LIKE" {
        format!("%{}%", value)
    } else {
        value.to_string()
    }
}

/// Resolve a filter field token against the registry
///
/// Unknown tokens and tokens registered as not filterable are both hard
/// errors carrying the full allowed set.
pub fn check_filter_field<'a>(
    map: &'a FieldMap,
    field: &str,
) -> Result<&'a crate::field_map::FieldDescriptor> {
    match map.find(field) {
        Some(descriptor) if descriptor.search_allowed => Ok(descriptor),
        _ => Err(AthError::new(AthErrorKind::UnknownFilterField)
            .with_op("filter_sanitize")
            .with_message(format!("'{}' is not a filterable field", field))
            .with_valid_set(map.search_allowed_names())),
    }
}

/// Validate the output field selection
///
/// `None` means every output field. An explicitly empty selection is a
/// hard error; a selection naming any unknown field degrades to the full
/// set with a warning.
pub fn check_fields(
    map: &FieldMap,
    fields: Option<&[String]>,
) -> Result<(Vec<String>, Option<Warning>)> {
    let all = map.output_names();
    let Some(requested) = fields else {
        return Ok((all, None));
    };
    if requested.is_empty() {
        return Err(AthError::new(AthErrorKind::EmptyFieldSelection)
            .with_op("fields_sanitize")
            .with_message("fields selection must name at least one field"));
    }
    if requested.iter().all(|f| all.contains(f)) {
        return Ok((requested.to_vec(), None));
    }
    let warning = Warning::new(
        "invalid_fields",
        format!("Use any of {} for fields parameter", all.join(", ")),
    );
    Ok((all, Some(warning)))
}

/// Validate the sort parameter, splitting off a `:subkey` suffix
pub fn check_sort(map: &FieldMap, sort: Option<&str>) -> (SortSpec, Option<Warning>) {
    let sortable = map.sortable_names();
    let Some(raw) = sort.map(str::trim).filter(|s| !s.is_empty()) else {
        return (SortSpec::default_sort(), None);
    };

    let (field, subkey) = match raw.split_once(':') {
        Some((field, subkey)) => (field, Some(subkey.to_string())),
        None => (raw, None),
    };

    if sortable.iter().any(|s| s == field) {
        return (
            SortSpec {
                field: field.to_string(),
                subkey,
            },
            None,
        );
    }

    let warning = Warning::new(
        "invalid_sort_field",
        format!("Use any of {} for sorting parameter", sortable.join(", ")),
    );
    (SortSpec::default_sort(), Some(warning))
}

/// Validate the sort direction, degrading to ascending
pub fn check_order(order_by: Option<&str>) -> (&'static str, Option<Warning>) {
    match order_by.map(str::trim) {
        None => ("ASC", None),
        Some(raw) if raw.eq_ignore_ascii_case("asc") => ("ASC", None),
        Some(raw) if raw.eq_ignore_ascii_case("desc") => ("DESC", None),
        Some(_) => (
            "ASC",
            Some(Warning::new(
                "invalid_order_by",
                "Use asc or desc for orderBy parameter",
            )),
        ),
    }
}
