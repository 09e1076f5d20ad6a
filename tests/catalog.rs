//! End-to-end catalog behaviour through the public API.

use cert_tracker::error::AppError;
use cert_tracker::models::{
    CertForm, ResourceDraft, ResourceKind, SectionDraft, SectionUpdate,
};
use cert_tracker::routes::{FileRouteRegistry, StaticRouteRegistry};
use cert_tracker::services::{
    ContentService, CreatedContent, PublishResult, PublishingCoordinator, catalog, search,
};
use cert_tracker::storage::{ContentStore, SnapshotStore, SqliteStore};
use tempfile::TempDir;

fn test_form() -> CertForm {
    CertForm {
        name: "Test".to_string(),
        code: "tst-101".to_string(),
        date: "01/01/2000".to_string(),
        head_img: "test/test.jpg".to_string(),
        badge_img: "test/BADGE_test.png".to_string(),
        exam_date: None,
        tags: "test_tag".to_string(),
    }
}

fn resource(cert_id: i64, kind: ResourceKind, url: &str, title: &str) -> ResourceDraft {
    ResourceDraft {
        cert_id,
        kind,
        url: url.to_string(),
        title: title.to_string(),
        image: "test/COU_test.png".to_string(),
        description: "This is a test".to_string(),
        site_logo: "test.svg".to_string(),
        site_name: "Test".to_string(),
        has_og_data: false,
    }
}

#[tokio::test]
async fn duplicate_name_or_code_is_rejected_without_a_second_row() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let registry = StaticRouteRegistry::new();
    let coordinator = PublishingCoordinator::new(&store, &registry, "data");
    coordinator.create_cert(&test_form()).await.unwrap();

    let same_name = CertForm {
        code: "tst-202".to_string(),
        ..test_form()
    };
    let err = coordinator.create_cert(&same_name).await.unwrap_err();
    assert_eq!(err.to_string(), "Name must be unique");

    let same_code = CertForm {
        name: "Other".to_string(),
        ..test_form()
    };
    let err = coordinator.create_cert(&same_code).await.unwrap_err();
    assert_eq!(err.to_string(), "Code must be unique");

    assert_eq!(store.list_certs().await.unwrap().len(), 1);
}

#[tokio::test]
async fn path_and_route_are_derived_from_name_and_code() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let registry = StaticRouteRegistry::new();
    let coordinator = PublishingCoordinator::new(&store, &registry, "data");

    let cert = coordinator.create_cert(&test_form()).await.unwrap().cert;
    assert_eq!(cert.path, "/test_tst101");
    assert_eq!(cert.route, "data.test_tst101");
}

#[tokio::test]
async fn published_flag_reflects_registry_at_creation() {
    let absent = SqliteStore::open_in_memory().await.unwrap();
    let empty = StaticRouteRegistry::new();
    let cert = PublishingCoordinator::new(&absent, &empty, "data")
        .create_cert(&test_form())
        .await
        .unwrap()
        .cert;
    assert!(!cert.published);

    let present = SqliteStore::open_in_memory().await.unwrap();
    let live = StaticRouteRegistry::with_endpoints(["data.test_tst101"]);
    let cert = PublishingCoordinator::new(&present, &live, "data")
        .create_cert(&test_form())
        .await
        .unwrap()
        .cert;
    assert!(cert.published);
}

#[tokio::test]
async fn publish_then_search_through_file_registry() {
    let tmp = TempDir::new().unwrap();
    let store = SqliteStore::open(tmp.path().join("certs.db"), 2).await.unwrap();
    let registry = FileRouteRegistry::new(tmp.path().join("routes.toml"));
    let coordinator = PublishingCoordinator::new(&store, &registry, "data");

    coordinator.create_cert(&test_form()).await.unwrap();
    assert!(search::find(&store, "Test").await.unwrap().is_empty());

    // Rejected: nothing changes and the unpublished set comes back.
    let rejected = coordinator
        .publish_by_route_identifier("data.test_typo")
        .await
        .unwrap();
    match &rejected {
        PublishResult::Rejected { unpublished, .. } => assert_eq!(unpublished.len(), 1),
        other => panic!("expected rejection, got {other:?}"),
    }
    assert!(rejected.message().contains("data.test_typo"));
    assert!(search::find_published(&store).await.unwrap().is_empty());

    // The page is deployed, then published twice.
    registry
        .register("data.test_tst101", Some("/test_tst101".to_string()))
        .await
        .unwrap();
    for _ in 0..2 {
        let result = coordinator
            .publish_by_route_identifier("data.test_tst101")
            .await
            .unwrap();
        assert!(result.is_published());
    }

    for query in ["tst-101", "Test", "/test_tst101", "test_tag"] {
        let found = search::find(&store, query).await.unwrap();
        assert_eq!(found.len(), 1, "query {query}");
        assert_eq!(found[0].name, "Test");
    }
    assert!(matches!(
        search::find(&store, "").await,
        Err(AppError::InvalidInput(_))
    ));

    let snapshot = SnapshotStore::new(tmp.path().join("catalog.json"));
    let meta = snapshot
        .write(&store.list_certs().await.unwrap())
        .await
        .unwrap();
    assert_eq!(meta.count, 1);
    assert_eq!(snapshot.load().await.unwrap()[0].route, "data.test_tst101");
}

#[tokio::test]
async fn cert_view_counts_course_and_video() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let registry = StaticRouteRegistry::new();
    let cert = PublishingCoordinator::new(&store, &registry, "data")
        .create_cert(&test_form())
        .await
        .unwrap()
        .cert;

    let content = ContentService::new(&store);
    content
        .create_resource(resource(cert.id, ResourceKind::Course, "http://test.test", "Test Course"))
        .await
        .unwrap();
    content
        .create_resource(resource(cert.id, ResourceKind::Video, "http://video.test", "Test Video"))
        .await
        .unwrap();

    let view = catalog::fetch_cert_view(&store, cert).await.unwrap();
    assert_eq!(view.courses.len(), 1);
    assert_eq!(view.videos.len(), 1);
    assert!(view.articles.is_empty());
    assert!(view.documentation.is_empty());
}

#[tokio::test]
async fn section_update_round_trips() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let registry = StaticRouteRegistry::new();
    let cert = PublishingCoordinator::new(&store, &registry, "data")
        .create_cert(&test_form())
        .await
        .unwrap()
        .cert;

    let content = ContentService::new(&store);
    let CreatedContent::Course(course) = content
        .create_resource(resource(cert.id, ResourceKind::Course, "http://test.test", "Test Course"))
        .await
        .unwrap()
    else {
        panic!("course draft did not create a course");
    };

    let section = content
        .create_section(SectionDraft {
            course_id: course.id,
            number: 1,
            title: "Test Section".to_string(),
        })
        .await
        .unwrap();

    content
        .update_section(
            section.id,
            SectionUpdate {
                cards_made: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let stored = store.section_by_id(section.id).await.unwrap().unwrap();
    assert!(stored.cards_made);
    assert!(!stored.complete);
}
