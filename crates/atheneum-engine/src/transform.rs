//! Filter-clause compilation
//!
//! Turns the parsed clause list into one parameterized WHERE predicate.
//! Each clause is canonicalized (operator, connector, fuzzy wildcards) and
//! dispatched to its field type; the fragments are then reassembled with
//! the original parenthesis grouping. Values never reach the SQL text,
//! only the parameter vector.

#![allow(clippy::result_large_err)]

use atheneum_core::errors::Result;
use atheneum_core::filter::Clause;
use rusqlite::types::Value;
use rusqlite::Connection;

use crate::field_map::FieldMap;
use crate::field_types::{match_nothing, CompileContext};
use crate::sanitize::{check_filter_field, prepare_value, sanitize_connector, sanitize_operator};

/// A fully compiled filter predicate
///
/// `text_matches` carries the FTS query of every full-text clause so the
/// engine can build a relevance rank expression over the same terms.
#[derive(Debug, Clone, Default)]
pub struct CompiledFilter {
    pub sql: String,
    pub params: Vec<Value>,
    pub text_matches: Vec<String>,
}

impl CompiledFilter {
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }
}

/// Compile parsed clauses into a single predicate
///
/// An empty clause list compiles to an empty predicate, meaning no WHERE
/// restriction at all.
pub fn compile(
    conn: &Connection,
    map: &FieldMap,
    clauses: &[Clause],
    ctx: &CompileContext,
) -> Result<CompiledFilter> {
    let mut compiled = CompiledFilter::default();
    let mut pieces: Vec<String> = Vec::with_capacity(clauses.len());

    for clause in clauses {
        let descriptor = check_filter_field(map, &clause.field)?;
        let operator = sanitize_operator(&clause.operator)?;

        let prepared = Clause {
            lparens: clause.lparens,
            field: clause.field.clone(),
            operator: operator.to_string(),
            value: prepare_value(operator, &clause.value),
            connector: clause.connector.clone(),
            rparens: clause.rparens,
        };

        let fragment = if clause.is_blank() {
            match_nothing()
        } else {
            descriptor.field_type.compile(conn, &prepared, ctx)?
        };

        let mut piece = String::new();
        if let Some(raw) = &clause.connector {
            piece.push_str(sanitize_connector(raw));
            piece.push(' ');
        }
        for _ in 0..clause.lparens {
            piece.push('(');
        }
        piece.push_str(&fragment.sql);
        for _ in 0..clause.rparens {
            piece.push(')');
        }
        pieces.push(piece);

        compiled.params.extend(fragment.params);
        if let Some(query) = fragment.text_match {
            compiled.text_matches.push(query);
        }
    }

    compiled.sql = pieces.join(" ");
    Ok(compiled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use atheneum_core::filter::parse_filter;
    use atheneum_store::migrations::apply_migrations;

    fn setup() -> (Connection, FieldMap) {
        let mut conn = Connection::open_in_memory().unwrap();
        atheneum_store::db::configure(&conn).unwrap();
        apply_migrations(&mut conn).unwrap();
        let map = FieldMap::build(&conn, &EngineConfig::default()).unwrap();
        (conn, map)
    }

    fn compile_text(filter: &str) -> CompiledFilter {
        let (conn, map) = setup();
        let clauses = parse_filter(filter).unwrap();
        compile(&conn, &map, &clauses, &CompileContext::default()).unwrap()
    }

    #[test]
    fn test_single_clause() {
        let compiled = compile_text("name='test'");
        assert_eq!(compiled.sql, "resources.name = ?");
        assert_eq!(compiled.params, vec![Value::Text("test".to_string())]);
        assert!(compiled.text_matches.is_empty());
    }

    #[test]
    fn test_fuzzy_clause_wraps_value() {
        let compiled = compile_text("name~'TeS'");
        assert_eq!(compiled.sql, "lower(resources.name) LIKE ?");
        assert_eq!(compiled.params, vec![Value::Text("%tes%".to_string())]);
    }

    #[test]
    fn test_connectors_and_parens_preserved() {
        let compiled =
            compile_text("(name='a' OR name='b') AND rating>'3'");
        assert_eq!(
            compiled.sql,
            "(resources.name = ? OR resources.name = ?) AND resources.rating > ?"
        );
        assert_eq!(compiled.params.len(), 3);
    }

    #[test]
    fn test_symbolic_connectors_canonicalized() {
        let compiled = compile_text("name='a' && name='b' || name='c'");
        assert!(compiled.sql.contains(" AND "));
        assert!(compiled.sql.contains(" OR "));
        assert!(!compiled.sql.contains("&&"));
    }

    #[test]
    fn test_blank_value_matches_nothing() {
        let compiled = compile_text("name=''");
        assert_eq!(compiled.sql, "1=0");
        assert!(compiled.params.is_empty());
    }

    #[test]
    fn test_unknown_field_is_fatal() {
        let (conn, map) = setup();
        let clauses = parse_filter("bogus='x'").unwrap();
        let err = compile(&conn, &map, &clauses, &CompileContext::default()).unwrap_err();
        assert_eq!(err.code(), "ERR_UNKNOWN_FILTER_FIELD");
    }

    #[test]
    fn test_unknown_operator_is_fatal() {
        let (conn, map) = setup();
        let mut clauses = parse_filter("name='x'").unwrap();
        clauses[0].operator = "LIKE".to_string();
        let err = compile(&conn, &map, &clauses, &CompileContext::default()).unwrap_err();
        assert_eq!(err.code(), "ERR_UNKNOWN_OPERATOR");
    }

    #[test]
    fn test_search_clause_contributes_text_match() {
        let compiled = compile_text("search='fraction story'");
        assert_eq!(compiled.text_matches, vec!["\"fraction\" \"story\""]);
        assert!(compiled.sql.contains("resources_fts MATCH ?"));
    }

    #[test]
    fn test_empty_clause_list() {
        let (conn, map) = setup();
        let compiled = compile(&conn, &map, &[], &CompileContext::default()).unwrap();
        assert!(compiled.is_empty());
    }
}
