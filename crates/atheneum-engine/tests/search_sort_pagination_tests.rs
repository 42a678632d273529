// Integration tests for sorting, windowing, and pagination links.

use atheneum_core::model::{Alignment, AlignmentStatus, Resource, ResourceStat, Taxonomy};
use atheneum_engine::{EngineConfig, QueryEngine, SearchOutcome, SearchRequest};
use atheneum_store::denorm;
use atheneum_store::migrations::apply_migrations;
use atheneum_store::repo::{AlignmentRepo, ResourceRepo, ResourceStatRepo, TaxonomyRepo};
use rusqlite::Connection;

fn setup_test_db() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    atheneum_store::db::configure(&conn).unwrap();
    apply_migrations(&mut conn).unwrap();
    conn
}

fn seed(conn: &Connection, name: &str) -> i64 {
    let mut r = Resource::new(name, "d");
    ResourceRepo::persist(conn, &mut r).unwrap();
    r.id
}

fn run(conn: &Connection, request: &SearchRequest) -> SearchOutcome {
    QueryEngine::new(conn, EngineConfig::default())
        .unwrap()
        .search(conn, request)
        .unwrap()
}

fn names(outcome: &SearchOutcome) -> Vec<&str> {
    outcome
        .records
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect()
}

#[test]
fn test_default_window_covers_one_page() {
    let conn = setup_test_db();
    for name in ["a", "b", "c", "d"] {
        seed(&conn, name);
    }

    let outcome = run(&conn, &SearchRequest::default());
    assert_eq!(outcome.pagination.total, 4);
    assert_eq!(outcome.pagination.limit, 100);
    assert_eq!(outcome.pagination.offset, 0);
    assert!(outcome.pagination.pages.is_empty());
    assert!(outcome.links.is_empty());
}

#[test]
fn test_two_page_navigation() {
    let conn = setup_test_db();
    for name in ["a", "b", "c", "d"] {
        seed(&conn, name);
    }

    let first = run(
        &conn,
        &SearchRequest {
            limit: Some(2),
            ..Default::default()
        },
    );
    assert_eq!(names(&first), vec!["a", "b"]);
    assert_eq!(first.pagination.pages.next, Some(2));
    assert_eq!(first.pagination.pages.prev, None);
    assert!(first.links.iter().any(|l| l.ends_with("rel=\"next\"")));
    assert!(!first.links.iter().any(|l| l.ends_with("rel=\"prev\"")));

    let second = run(
        &conn,
        &SearchRequest {
            limit: Some(2),
            offset: Some(2),
            ..Default::default()
        },
    );
    assert_eq!(names(&second), vec!["c", "d"]);
    assert_eq!(second.pagination.pages.prev, Some(1));
    assert_eq!(second.pagination.pages.next, None);
    assert!(second.links.iter().any(|l| l.ends_with("rel=\"prev\"")));
    assert!(!second.links.iter().any(|l| l.ends_with("rel=\"next\"")));
}

#[test]
fn test_out_of_range_window_degrades_to_defaults() {
    let conn = setup_test_db();
    seed(&conn, "a");

    let outcome = run(
        &conn,
        &SearchRequest {
            limit: Some(5000),
            offset: Some(-3),
            ..Default::default()
        },
    );
    assert_eq!(outcome.pagination.limit, 100);
    assert_eq!(outcome.pagination.offset, 0);
}

#[test]
fn test_unknown_sort_degrades_to_name_with_warning() {
    let conn = setup_test_db();
    seed(&conn, "beta");
    seed(&conn, "alpha");

    let outcome = run(
        &conn,
        &SearchRequest {
            sort: Some("oio".to_string()),
            ..Default::default()
        },
    );
    assert_eq!(names(&outcome), vec!["alpha", "beta"]);
    assert_eq!(outcome.warnings.len(), 1);
    let warning = &outcome.warnings[0];
    assert_eq!(warning.code, "invalid_sort_field");
    assert!(warning.description.contains("for sorting parameter"));
}

#[test]
fn test_sort_by_rating_descending_with_nulls_last() {
    let conn = setup_test_db();
    for (name, rating) in [("low", Some(2.0)), ("high", Some(4.5)), ("none", None)] {
        let mut r = Resource::new(name, "d");
        r.rating = rating;
        ResourceRepo::persist(&conn, &mut r).unwrap();
    }

    let outcome = run(
        &conn,
        &SearchRequest {
            sort: Some("rating".to_string()),
            order_by: Some("desc".to_string()),
            ..Default::default()
        },
    );
    assert_eq!(names(&outcome), vec!["high", "low", "none"]);
}

#[test]
fn test_invalid_order_by_degrades_ascending() {
    let conn = setup_test_db();
    seed(&conn, "beta");
    seed(&conn, "alpha");

    let outcome = run(
        &conn,
        &SearchRequest {
            order_by: Some("sideways".to_string()),
            ..Default::default()
        },
    );
    assert_eq!(names(&outcome), vec!["alpha", "beta"]);
    assert_eq!(outcome.warnings[0].code, "invalid_order_by");
}

#[test]
fn test_sort_by_efficacy_subkey() {
    let conn = setup_test_db();
    let strong = seed(&conn, "strong");
    let weak = seed(&conn, "weak");
    seed(&conn, "unmeasured");
    let mut t = Taxonomy::new("CCSS.Math.5.NF.1");
    TaxonomyRepo::persist(&conn, &mut t).unwrap();
    for (resource_id, score) in [(strong, 0.9), (weak, 0.3)] {
        let mut a = Alignment::new(resource_id, t.id);
        a.status = AlignmentStatus::Confirmed;
        AlignmentRepo::persist(&conn, &mut a).unwrap();
        let mut stat = ResourceStat::new(resource_id, t.id, "CCSS.Math.5.NF.1", score);
        ResourceStatRepo::persist(&conn, &mut stat).unwrap();
    }
    denorm::recompute_all(&conn).unwrap();

    let outcome = run(
        &conn,
        &SearchRequest {
            sort: Some("efficacy:CCSS.Math.5.NF.1".to_string()),
            order_by: Some("desc".to_string()),
            ..Default::default()
        },
    );
    // unmeasured resources sort after scored ones in either direction
    assert_eq!(names(&outcome), vec!["strong", "weak", "unmeasured"]);
}

#[test]
fn test_sort_by_bare_efficacy_uses_average() {
    let conn = setup_test_db();
    let strong = seed(&conn, "strong");
    let weak = seed(&conn, "weak");
    let mut t = Taxonomy::new("CCSS.Math.5.NF.1");
    TaxonomyRepo::persist(&conn, &mut t).unwrap();
    for (resource_id, score) in [(strong, 0.8), (weak, 0.2)] {
        let mut a = Alignment::new(resource_id, t.id);
        a.status = AlignmentStatus::Confirmed;
        AlignmentRepo::persist(&conn, &mut a).unwrap();
        let mut stat = ResourceStat::new(resource_id, t.id, "CCSS.Math.5.NF.1", score);
        ResourceStatRepo::persist(&conn, &mut stat).unwrap();
    }
    denorm::recompute_all(&conn).unwrap();

    let outcome = run(
        &conn,
        &SearchRequest {
            sort: Some("efficacy".to_string()),
            order_by: Some("desc".to_string()),
            ..Default::default()
        },
    );
    assert_eq!(names(&outcome), vec!["strong", "weak"]);
}

#[test]
fn test_relevance_sort_orders_by_rank() {
    let conn = setup_test_db();
    let mut heavy = Resource::new("fraction fraction drill", "fraction practice sheets");
    ResourceRepo::persist(&conn, &mut heavy).unwrap();
    let mut light = Resource::new("story hour", "includes one fraction");
    ResourceRepo::persist(&conn, &mut light).unwrap();
    seed(&conn, "unrelated");

    let outcome = run(
        &conn,
        &SearchRequest {
            filter: Some("search='fraction'".to_string()),
            sort: Some("relevance".to_string()),
            order_by: Some("desc".to_string()),
            ..Default::default()
        },
    );
    assert_eq!(outcome.pagination.total, 2);
    assert_eq!(names(&outcome)[0], "fraction fraction drill");
}
