// Full persist-and-reload coverage for the repositories: a resource with
// every optional field populated, taxonomy nodes with aliases, updates,
// deletes, and the denormalized columns after a recompute.

use atheneum_core::model::{Alignment, Resource, ResourceStat, Taxonomy};
use atheneum_store::denorm;
use atheneum_store::migrations::apply_migrations;
use atheneum_store::repo::{AlignmentRepo, ResourceRepo, ResourceStatRepo, TaxonomyRepo};
use chrono::TimeZone;
use rusqlite::Connection;
use serde_json::json;

fn setup_test_db() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    atheneum_store::db::configure(&conn).unwrap();
    apply_migrations(&mut conn).unwrap();
    conn
}

fn full_resource() -> Resource {
    let mut r = Resource::new("Fractions 101", "Adding and comparing fractions");
    r.url = Some("https://example.org/fractions".to_string());
    r.publisher = Some("Example Press".to_string());
    r.author = Some("A. Teacher".to_string());
    r.learning_resource_type = Some("Media/Video".to_string());
    r.language = Some("en".to_string());
    r.thumbnail_url = Some("https://example.org/thumb.png".to_string());
    r.technical_format = Some("video/mp4".to_string());
    r.use_rights_url = Some("https://example.org/license".to_string());
    r.rating = Some(4.5);
    r.publish_date = Some(chrono::Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
    r.time_required = Some(45);
    r.min_age = Some(9);
    r.max_age = Some(11);
    r.lti_link = Some(json!({"launchUrl": "https://example.org/lti"}));
    r.text_complexity = Some(json!({"lexile": 820}));
    r.extensions = Some(json!({"district": "42"}));
    r.educational_audience = vec!["student".to_string(), "teacher".to_string()];
    r.accessibility_api = vec!["ARIAv1".to_string()];
    r.accessibility_input_methods = vec!["fullKeyboardControl".to_string()];
    r.access_mode = vec!["visual".to_string(), "auditory".to_string()];
    r.accessibility_features = vec!["captions".to_string()];
    r.accessibility_hazards = vec!["flashing".to_string()];
    r
}

#[test]
fn test_full_resource_round_trip() {
    let conn = setup_test_db();
    let mut r = full_resource();
    ResourceRepo::persist(&conn, &mut r).unwrap();
    assert!(r.id > 0);

    let loaded = ResourceRepo::get(&conn, r.id).unwrap().unwrap();
    assert_eq!(loaded, r);
}

#[test]
fn test_update_round_trip() {
    let conn = setup_test_db();
    let mut r = full_resource();
    ResourceRepo::persist(&conn, &mut r).unwrap();

    r.name = "Fractions 102".to_string();
    r.rating = Some(3.0);
    r.publish_date = None;
    ResourceRepo::persist(&conn, &mut r).unwrap();

    let loaded = ResourceRepo::get(&conn, r.id).unwrap().unwrap();
    assert_eq!(loaded, r);
    assert!(loaded.updated_at >= loaded.created_at);
}

#[test]
fn test_delete_removes_row() {
    let conn = setup_test_db();
    let mut r = Resource::new("n", "d");
    ResourceRepo::persist(&conn, &mut r).unwrap();

    assert!(ResourceRepo::delete(&conn, r.id).unwrap());
    assert!(ResourceRepo::get(&conn, r.id).unwrap().is_none());
    assert!(!ResourceRepo::delete(&conn, r.id).unwrap());
}

#[test]
fn test_taxonomy_round_trip_with_aliases() {
    let conn = setup_test_db();
    let mut t = Taxonomy::new("CCSS.Math.5.NF.1");
    t.opensalt_identifier = Some("b1547a2e-ff11-4f25".to_string());
    t.description = Some("Add and subtract fractions".to_string());
    t.alignment_type = Some("teaches".to_string());
    t.source = Some("https://frameworks.example.org/items/b1547a2e-ff11-4f25".to_string());
    t.ancestry = Some("1/5".to_string());
    t.min_age = Some(10);
    t.max_age = Some(11);
    t.aliases = vec!["5.NF.1".to_string(), "NF.1".to_string()];
    TaxonomyRepo::persist(&conn, &mut t).unwrap();

    let loaded = TaxonomyRepo::get(&conn, t.id).unwrap().unwrap();
    assert_eq!(loaded, t);
    assert_eq!(loaded.ancestor_ids(), vec![1, 5]);
}

#[test]
fn test_closure_columns_after_recompute() {
    let conn = setup_test_db();
    let mut r = Resource::new("measured", "d");
    ResourceRepo::persist(&conn, &mut r).unwrap();
    let mut t = Taxonomy::new("CCSS.Math.5.NF.1");
    TaxonomyRepo::persist(&conn, &mut t).unwrap();
    let mut a = Alignment::new(r.id, t.id);
    AlignmentRepo::persist(&conn, &mut a).unwrap();
    let mut stat = ResourceStat::new(r.id, t.id, "CCSS.Math.5.NF.1", 0.6);
    ResourceStatRepo::persist(&conn, &mut stat).unwrap();
    denorm::recompute_all(&conn).unwrap();

    let loaded = ResourceRepo::get(&conn, r.id).unwrap().unwrap();
    assert_eq!(loaded.direct_taxonomy_ids, vec![t.id]);
    assert_eq!(loaded.all_taxonomy_ids, vec![t.id]);
    assert_eq!(loaded.resource_stat_ids, vec![stat.id]);
    assert_eq!(loaded.efficacy.get("CCSS.Math.5.NF.1"), Some(&0.6));
    assert_eq!(loaded.avg_efficacy, Some(0.6));
}
