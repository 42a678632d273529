//! Search orchestration
//!
//! Runs one search request end to end: sanitize the selection, sort and
//! window parameters, parse and compile the filter, run the count and page
//! queries, then project the page rows into output records. Soft
//! degradations accumulate as warnings on the outcome; only filter
//! problems abort the request.

#![allow(clippy::result_large_err)]

use atheneum_core::errors::{Result, Warning};
use atheneum_core::filter::parse_filter;
use atheneum_core::pagination::PageNumbers;
use atheneum_store::errors::from_rusqlite;
use atheneum_store::repo::resource::SELECT_COLUMNS;
use atheneum_store::repo::ResourceRepo;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use serde::{Deserialize, Serialize};

use crate::config::{EngineConfig, VisibilityFilter};
use crate::field_map::FieldMap;
use crate::field_types::CompileContext;
use crate::links;
use crate::output::project;
use crate::sanitize::{
    check_fields, check_order, check_sort, check_value, SortSpec, DEFAULT_LIMIT, DEFAULT_OFFSET,
    MAX_LIMIT, MAX_OFFSET,
};
use crate::transform;

/// Relevance rank for one resource row, negated so larger means better
const RANK_SQL: &str = "(SELECT -bm25(resources_fts) FROM resources_fts \
     WHERE resources_fts.rowid = resources.id AND resources_fts MATCH ?)";

/// Collection path the pagination links point back at
const COLLECTION_PATH: &str = "/resources";

/// One search request, as received from the caller
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchRequest {
    pub filter: Option<String>,
    pub fields: Option<Vec<String>>,
    pub sort: Option<String>,
    pub order_by: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub expand_objectives: bool,
}

/// Result-window metadata returned with every search
#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
    #[serde(skip_serializing_if = "PageNumbers::is_empty")]
    pub pages: PageNumbers,
}

/// The full result of one search
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub records: Vec<serde_json::Value>,
    pub pagination: Pagination,
    pub warnings: Vec<Warning>,
    pub links: Vec<String>,
}

/// The search engine: a field registry plus a visibility filter
///
/// Built once against a live connection; [`QueryEngine::search`] is then
/// read-only and reusable across requests.
pub struct QueryEngine {
    map: FieldMap,
    visibility: Box<dyn VisibilityFilter>,
    alias_search: bool,
}

impl QueryEngine {
    pub fn new(conn: &Connection, config: EngineConfig) -> Result<Self> {
        let map = FieldMap::build(conn, &config)?;
        Ok(Self {
            map,
            visibility: config.visibility,
            alias_search: config.search_by_aliases,
        })
    }

    pub fn field_map(&self) -> &FieldMap {
        &self.map
    }

    /// Run one search request
    pub fn search(&self, conn: &Connection, request: &SearchRequest) -> Result<SearchOutcome> {
        let limit = check_value(request.limit, DEFAULT_LIMIT, MAX_LIMIT);
        let offset = check_value(request.offset, DEFAULT_OFFSET, MAX_OFFSET);

        let mut warnings = Vec::new();
        let (fields, warning) = check_fields(&self.map, request.fields.as_deref())?;
        warnings.extend(warning);
        let (sort, warning) = check_sort(&self.map, request.sort.as_deref());
        warnings.extend(warning);
        let (direction, warning) = check_order(request.order_by.as_deref());
        warnings.extend(warning);

        let clauses = match &request.filter {
            Some(filter) if !filter.trim().is_empty() => parse_filter(filter)?,
            _ => Vec::new(),
        };
        let ctx = CompileContext {
            expand_objectives: request.expand_objectives,
            alias_search: self.alias_search,
        };
        let compiled = transform::compile(conn, &self.map, &clauses, &ctx)?;

        let fused_query = if compiled.text_matches.is_empty() {
            None
        } else {
            Some(compiled.text_matches.join(" "))
        };
        let wants_relevance =
            sort.field == "relevance" || fields.iter().any(|f| f == "relevance");
        if wants_relevance && fused_query.is_none() {
            warnings.push(Warning::new(
                "invalid_relevance",
                "Use relevance together with a search filter clause",
            ));
        }

        let mut where_parts: Vec<String> = Vec::new();
        let mut where_params: Vec<Value> = Vec::new();
        if !compiled.is_empty() {
            where_parts.push(compiled.sql.clone());
            where_params.extend(compiled.params.clone());
        }
        if let Some((sql, params)) = self.visibility.predicate() {
            where_parts.push(sql);
            where_params.extend(params);
        }
        let where_sql = if where_parts.is_empty() {
            String::new()
        } else {
            format!(" WHERE ({})", where_parts.join(") AND ("))
        };

        let total = count(conn, &where_sql, &where_params)?;

        let (select_expr, select_params) = match &fused_query {
            Some(query) => (RANK_SQL, vec![Value::Text(query.clone())]),
            None => ("0.0", Vec::new()),
        };
        let (sort_expr, sort_params) = self.sort_expression(&sort, fused_query.as_deref());
        let tiebreak = if sort.field == "relevance" {
            ", resources.id ASC"
        } else {
            ""
        };

        let page_sql = format!(
            "SELECT {}, {} AS relevance FROM resources{} \
             ORDER BY ({} IS NULL) ASC, {} {}{} LIMIT ? OFFSET ?",
            SELECT_COLUMNS, select_expr, where_sql, sort_expr, sort_expr, direction, tiebreak
        );
        tracing::debug!(sql = %page_sql, total, "compiled search");

        let mut params = select_params;
        params.extend(where_params);
        params.extend(sort_params.iter().cloned());
        params.extend(sort_params);
        params.push(Value::Integer(limit as i64));
        params.push(Value::Integer(offset as i64));

        let mut stmt = conn.prepare(&page_sql).map_err(from_rusqlite)?;
        let rows = stmt
            .query_map(params_from_iter(params.iter()), |row| {
                let resource = ResourceRepo::from_row(row)?;
                let relevance: Option<f64> = row.get(33)?;
                Ok((resource, relevance.unwrap_or(0.0)))
            })
            .map_err(from_rusqlite)?;

        let mut records = Vec::new();
        for row in rows {
            let (resource, relevance) = row.map_err(from_rusqlite)?;
            records.push(project(
                conn,
                &resource,
                &fields,
                relevance,
                request.expand_objectives,
            )?);
        }

        let pages = PageNumbers::compute(limit, offset, total);
        let links = links::render(COLLECTION_PATH, request, limit, &pages);

        Ok(SearchOutcome {
            records,
            pagination: Pagination {
                total,
                limit,
                offset,
                pages,
            },
            warnings,
            links,
        })
    }

    /// Resolve the sort instruction to a SQL expression plus its parameters
    ///
    /// The expression is interpolated twice into ORDER BY (null steering
    /// and direction), so the caller binds the parameters once per use.
    fn sort_expression(&self, sort: &SortSpec, fused_query: Option<&str>) -> (String, Vec<Value>) {
        if sort.field == "relevance" {
            return match fused_query {
                Some(query) => (RANK_SQL.to_string(), vec![Value::Text(query.to_string())]),
                None => ("0.0".to_string(), Vec::new()),
            };
        }
        if sort.field == "efficacy" {
            if let Some(subkey) = &sort.subkey {
                return (
                    "json_extract(resources.efficacy, ?)".to_string(),
                    vec![Value::Text(format!("$.\"{}\"", subkey.replace('"', "")))],
                );
            }
            return ("resources.avg_efficacy".to_string(), Vec::new());
        }
        let storage = self
            .map
            .find(&sort.field)
            .and_then(|d| d.storage.clone())
            .unwrap_or_else(|| "resources.name".to_string());
        (storage, Vec::new())
    }
}

impl std::fmt::Debug for QueryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryEngine")
            .field("map", &self.map)
            .field("alias_search", &self.alias_search)
            .finish()
    }
}

fn count(conn: &Connection, where_sql: &str, params: &[Value]) -> Result<u64> {
    let sql = format!(
        "SELECT COUNT(DISTINCT resources.id) FROM resources{}",
        where_sql
    );
    let total: i64 = conn
        .query_row(&sql, params_from_iter(params.iter()), |row| row.get(0))
        .map_err(from_rusqlite)?;
    Ok(total.max(0) as u64)
}
