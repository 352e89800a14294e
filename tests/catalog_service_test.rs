//! Tests for CatalogService paging and the JSON file record source

use std::fs;
use std::io;
use std::sync::Arc;

use rstest::rstest;
use tempfile::TempDir;

use catmap::application::services::CatalogService;
use catmap::application::ApplicationError;
use catmap::domain::{Perspective, RawCatalogRecord};
use catmap::infrastructure::traits::{
    CatalogPage, CatalogSource, InMemoryCatalogSource, JsonFileCatalogSource, RealFileSystem,
};
use catmap::util::testing;

fn record(id: &str) -> RawCatalogRecord {
    RawCatalogRecord::new(id, id.to_uppercase()).with_department("d1", "Dept1")
}

/// Source that always hands out the same continuation token.
struct LoopingSource;

impl CatalogSource for LoopingSource {
    fn fetch_page(&self, _: Perspective, _: Option<&str>) -> io::Result<CatalogPage> {
        Ok(CatalogPage {
            records: vec![record("r")],
            next: Some("again".to_string()),
        })
    }
}

// ============================================================
// CatalogService
// ============================================================

#[test]
fn given_three_pages_when_fetching_all_then_records_arrive_in_page_order() {
    testing::init_test_setup();
    // Arrange
    let source = InMemoryCatalogSource::new()
        .with_page(Perspective::Organization, vec![record("a"), record("b")])
        .with_page(Perspective::Organization, vec![record("c")])
        .with_page(Perspective::Organization, vec![record("d")]);
    let service = CatalogService::new(Arc::new(source), 1000);

    // Act
    let records = service
        .fetch_all_catalog_records(Perspective::Organization)
        .unwrap();

    // Assert
    let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c", "d"]);
}

#[rstest]
#[case(1, true)]
#[case(2, true)]
#[case(3, false)]
fn given_page_limit_when_fetching_then_exceeding_it_fails(
    #[case] limit: usize,
    #[case] fails: bool,
) {
    testing::init_test_setup();
    let source = InMemoryCatalogSource::new()
        .with_page(Perspective::Organization, vec![record("a")])
        .with_page(Perspective::Organization, vec![record("b")])
        .with_page(Perspective::Organization, vec![record("c")]);
    let service = CatalogService::new(Arc::new(source), limit);

    let result = service.fetch_all_catalog_records(Perspective::Organization);

    assert_eq!(
        matches!(result, Err(ApplicationError::PageLimit { limit: l }) if l == limit),
        fails
    );
}

#[test]
fn given_failing_source_when_fetching_then_fetch_error_without_partial_data() {
    testing::init_test_setup();
    let service = CatalogService::new(Arc::new(InMemoryCatalogSource::failing()), 10);

    let result = service.fetch_all_catalog_records(Perspective::Organization);

    match result {
        Err(ApplicationError::Fetch { message }) => {
            assert!(message.contains("unavailable"))
        }
        other => panic!("expected fetch error, got {other:?}"),
    }
}

#[test]
fn given_source_repeating_token_when_fetching_then_fetch_error() {
    testing::init_test_setup();
    let service = CatalogService::new(Arc::new(LoopingSource), 1000);

    let result = service.fetch_all_catalog_records(Perspective::Organization);

    assert!(matches!(result, Err(ApplicationError::Fetch { .. })));
}

// ============================================================
// JsonFileCatalogSource
// ============================================================

#[test]
fn given_directory_with_pages_when_fetching_then_follows_token_files() {
    testing::init_test_setup();
    // Arrange
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("organization.json"),
        r#"{"records": [{"id": "r1", "name": "Catalog1",
             "main_business_departments": [{"id": "d1", "name": "Dept1"}]}],
            "next": "p2"}"#,
    )
    .unwrap();
    fs::write(
        temp.path().join("organization.p2.json"),
        r#"[{"id": "r2", "name": "Catalog2",
             "department": [{"id": "d1", "name": "Dept1"}],
             "main_business": {"id": "m2", "name": "Proc2"}}]"#,
    )
    .unwrap();
    let source = JsonFileCatalogSource::new(Arc::new(RealFileSystem), temp.path());
    let service = CatalogService::new(Arc::new(source), 10);

    // Act
    let records = service
        .fetch_all_catalog_records(Perspective::Organization)
        .unwrap();

    // Assert
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].department[0].id.as_deref(), Some("d1"));
    assert_eq!(
        records[1].main_business.as_ref().unwrap().name.as_deref(),
        Some("Proc2")
    );
}

#[test]
fn given_single_file_when_fetching_any_perspective_then_file_is_first_page() {
    testing::init_test_setup();
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("dump.json");
    fs::write(
        &path,
        r#"[{"id": "r1", "name": "Catalog1", "business_domain": {"id": "bd1", "name": "Finance"}}]"#,
    )
    .unwrap();
    let source = JsonFileCatalogSource::new(Arc::new(RealFileSystem), &path);

    let page = source.fetch_page(Perspective::BusinessDomain, None).unwrap();

    assert_eq!(page.records.len(), 1);
    assert!(page.next.is_none());
}

#[test]
fn given_missing_page_file_when_fetching_then_io_error_names_path() {
    testing::init_test_setup();
    let temp = TempDir::new().unwrap();
    let source = JsonFileCatalogSource::new(Arc::new(RealFileSystem), temp.path());

    let err = source
        .fetch_page(Perspective::BusinessDomain, None)
        .unwrap_err();

    assert_eq!(err.kind(), io::ErrorKind::NotFound);
    assert!(err.to_string().contains("business_domain.json"));
}

#[test]
fn given_malformed_json_when_fetching_then_invalid_data() {
    testing::init_test_setup();
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("organization.json"), "{ not json").unwrap();
    let source = JsonFileCatalogSource::new(Arc::new(RealFileSystem), temp.path());

    let err = source.fetch_page(Perspective::Organization, None).unwrap_err();

    assert_eq!(err.kind(), io::ErrorKind::InvalidData);
}
