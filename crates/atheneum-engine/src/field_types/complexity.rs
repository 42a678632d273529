//! Text-complexity and typical-age-range fields

#![allow(clippy::result_large_err)]

use atheneum_core::errors::Result;
use atheneum_core::filter::Clause;
use atheneum_core::model::TEXT_COMPLEXITY_METRICS;
use rusqlite::types::Value;
use rusqlite::Connection;

use crate::field_types::{
    match_everything, match_nothing, null_clause, CompileContext, FieldType, SqlFragment,
};

/// Which part of the complexity map a clause addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextComplexityAttr {
    /// The whole map: only presence is filterable
    Bare,
    /// A metric name: validates membership in the closed set
    Name,
    /// A metric value: numeric comparison against any metric
    Value,
}

/// Text-complexity map filter (`textComplexity`, `.name`, `.value`)
#[derive(Debug, Clone, Copy)]
pub struct TextComplexityField {
    attr: TextComplexityAttr,
}

impl TextComplexityField {
    pub fn new(attr: TextComplexityAttr) -> Self {
        Self { attr }
    }
}

impl FieldType for TextComplexityField {
    fn compile(
        &self,
        _conn: &Connection,
        clause: &Clause,
        _ctx: &CompileContext,
    ) -> Result<SqlFragment> {
        match self.attr {
            TextComplexityAttr::Bare => {
                if clause.is_null_sentinel() {
                    return Ok(null_clause("resources.text_complexity", &clause.operator));
                }
                Ok(match_everything())
            }
            TextComplexityAttr::Name => {
                let known = TEXT_COMPLEXITY_METRICS
                    .contains(&clause.value.to_lowercase().as_str());
                if clause.operator == "=" && !known {
                    return Ok(match_nothing());
                }
                Ok(match_everything())
            }
            TextComplexityAttr::Value => {
                if clause.is_null_sentinel() {
                    return Ok(null_clause("resources.text_complexity", &clause.operator));
                }
                let operator = if clause.operator == "LIKE" {
                    "="
                } else {
                    clause.operator.as_str()
                };
                match clause.value.replace('%', "").trim().parse::<f64>() {
                    Ok(number) => {
                        let comparisons: Vec<String> = TEXT_COMPLEXITY_METRICS
                            .iter()
                            .map(|metric| {
                                format!(
                                    "CAST(json_extract(resources.text_complexity, '$.\"{}\"') \
                                     AS REAL) {} ?",
                                    metric, operator
                                )
                            })
                            .collect();
                        Ok(SqlFragment::with_params(
                            format!("({})", comparisons.join(" OR ")),
                            vec![Value::Real(number); TEXT_COMPLEXITY_METRICS.len()],
                        ))
                    }
                    Err(_) => Ok(match_nothing()),
                }
            }
        }
    }
}

/// Typical-age-range filter
///
/// The value is a `min-max` range (or a single age); a resource matches
/// when its own closed interval overlaps the requested one. Unparseable
/// bounds degrade to zero, matching the historical lenient behavior.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypicalAgeRangeField;

impl FieldType for TypicalAgeRangeField {
    fn compile(
        &self,
        _conn: &Connection,
        clause: &Clause,
        _ctx: &CompileContext,
    ) -> Result<SqlFragment> {
        if clause.is_null_sentinel() {
            let sql = if clause.operator == "<>" {
                "(resources.min_age IS NOT NULL OR resources.max_age IS NOT NULL)"
            } else {
                "(resources.min_age IS NULL AND resources.max_age IS NULL)"
            };
            return Ok(SqlFragment::new(sql));
        }

        let cleaned = clause.value.replace('%', "");
        let bounds: Vec<i64> = cleaned
            .split('-')
            .map(|part| part.trim().parse::<i64>().unwrap_or(0))
            .collect();
        let requested_min = bounds.first().copied().unwrap_or(0);
        let requested_max = bounds.last().copied().unwrap_or(requested_min);

        Ok(SqlFragment::with_params(
            "(resources.min_age <= ? AND resources.max_age >= ?)".to_string(),
            vec![Value::Integer(requested_max), Value::Integer(requested_min)],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clause(operator: &str, value: &str) -> Clause {
        Clause {
            lparens: 0,
            field: "textComplexity".to_string(),
            operator: operator.to_string(),
            value: value.to_string(),
            connector: None,
            rparens: 0,
        }
    }

    fn conn() -> Connection {
        Connection::open_in_memory().unwrap()
    }

    #[test]
    fn test_bare_only_presence_is_filterable() {
        let f = TextComplexityField::new(TextComplexityAttr::Bare);
        let frag = f
            .compile(&conn(), &clause("=", "NULL"), &CompileContext::default())
            .unwrap();
        assert_eq!(frag.sql, "resources.text_complexity IS NULL");

        let frag = f
            .compile(&conn(), &clause("=", "anything"), &CompileContext::default())
            .unwrap();
        assert_eq!(frag.sql, "1=1");
    }

    #[test]
    fn test_name_validates_metric_set() {
        let f = TextComplexityField::new(TextComplexityAttr::Name);
        let frag = f
            .compile(&conn(), &clause("=", "lexile"), &CompileContext::default())
            .unwrap();
        assert_eq!(frag.sql, "1=1");

        let frag = f
            .compile(&conn(), &clause("=", "unknown-metric"), &CompileContext::default())
            .unwrap();
        assert_eq!(frag.sql, "1=0");
    }

    #[test]
    fn test_value_compares_any_metric() {
        let f = TextComplexityField::new(TextComplexityAttr::Value);
        let frag = f
            .compile(&conn(), &clause(">", "800"), &CompileContext::default())
            .unwrap();
        assert!(frag.sql.contains("flesch-kincaid"));
        assert!(frag.sql.contains("lexile"));
        assert!(frag.sql.contains(" OR "));
        assert_eq!(frag.params.len(), TEXT_COMPLEXITY_METRICS.len());
    }

    #[test]
    fn test_value_garbage_matches_nothing() {
        let f = TextComplexityField::new(TextComplexityAttr::Value);
        let frag = f
            .compile(&conn(), &clause("=", "very hard"), &CompileContext::default())
            .unwrap();
        assert_eq!(frag.sql, "1=0");
    }

    #[test]
    fn test_age_range_overlap() {
        let frag = TypicalAgeRangeField
            .compile(&conn(), &clause("=", "8-10"), &CompileContext::default())
            .unwrap();
        assert_eq!(
            frag.sql,
            "(resources.min_age <= ? AND resources.max_age >= ?)"
        );
        assert_eq!(frag.params, vec![Value::Integer(10), Value::Integer(8)]);
    }

    #[test]
    fn test_age_range_single_number() {
        let frag = TypicalAgeRangeField
            .compile(&conn(), &clause("=", "9"), &CompileContext::default())
            .unwrap();
        assert_eq!(frag.params, vec![Value::Integer(9), Value::Integer(9)]);
    }

    #[test]
    fn test_age_range_null_uses_both_bounds() {
        let frag = TypicalAgeRangeField
            .compile(&conn(), &clause("=", "NULL"), &CompileContext::default())
            .unwrap();
        assert_eq!(
            frag.sql,
            "(resources.min_age IS NULL AND resources.max_age IS NULL)"
        );

        let frag = TypicalAgeRangeField
            .compile(&conn(), &clause("<>", "NULL"), &CompileContext::default())
            .unwrap();
        assert_eq!(
            frag.sql,
            "(resources.min_age IS NOT NULL OR resources.max_age IS NOT NULL)"
        );
    }
}
