//! Integration tests for the pinned list service.

mod common;

use common::{Fixture, chart_in};
use serde_json::json;
use tessera_content::events;
use tessera_core::error::{ErrorKind, TesseraError};
use tessera_core::models::chart::ChartParent;
use tessera_core::models::dashboard::CreateDashboard;
use tessera_core::models::pinned_list::{PinnedItemKind, PinnedItemRef};
use tessera_core::repository::DashboardRepository;
use tessera_db::repository::SurrealDashboardRepository;
use uuid::Uuid;

async fn dashboard(f: &Fixture, space_id: Uuid, name: &str) -> Uuid {
    SurrealDashboardRepository::new(f.db.clone())
        .create(CreateDashboard {
            project_id: f.project_id,
            space_id,
            name: name.into(),
        })
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn dashboards_and_spaces_share_the_project_list() {
    let f = Fixture::new().await;
    let pinning = f.pinning_service();
    let board = dashboard(&f, f.public_space, "Overview").await;

    pinning
        .toggle_pinning(&f.editor, PinnedItemRef::dashboard(board))
        .await
        .unwrap();
    let list = pinning
        .toggle_pinning(&f.editor, PinnedItemRef::space(f.restricted_space))
        .await
        .unwrap();
    assert_eq!(list.project_id, f.project_id);
    assert_eq!(
        list.item_refs(),
        vec![
            PinnedItemRef::dashboard(board),
            PinnedItemRef::space(f.restricted_space)
        ]
    );

    let items = pinning
        .get_pinned_items(&f.viewer, f.project_id, list.id)
        .await
        .unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[1].item.kind, PinnedItemKind::Space);
    assert_eq!(items[1].order, 1);

    let list = pinning
        .toggle_pinning(&f.editor, PinnedItemRef::dashboard(board))
        .await
        .unwrap();
    assert_eq!(list.item_refs(), vec![PinnedItemRef::space(f.restricted_space)]);
    assert!(list.is_dense());
}

#[tokio::test]
async fn pinning_requires_space_access() {
    let f = Fixture::new().await;
    let pinning = f.pinning_service();
    let board = dashboard(&f, f.restricted_space, "Finance board").await;

    let err = pinning
        .toggle_pinning(&f.outsider, PinnedItemRef::dashboard(board))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let err = pinning
        .toggle_pinning(&f.viewer, PinnedItemRef::space(f.public_space))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    assert!(f.events.events().is_empty());
}

#[tokio::test]
async fn charts_cannot_be_toggled_here() {
    let f = Fixture::new().await;
    let chart = f
        .chart_service()
        .create(&f.editor, f.project_id, chart_in(ChartParent::Space(f.public_space), "C"))
        .await
        .unwrap();

    let err = f
        .pinning_service()
        .toggle_pinning(&f.editor, PinnedItemRef::chart(chart.id))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[tokio::test]
async fn unknown_items_are_not_found() {
    let f = Fixture::new().await;
    let err = f
        .pinning_service()
        .toggle_pinning(&f.editor, PinnedItemRef::space(Uuid::new_v4()))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn reorder_applies_permutation_and_emits_snapshot() {
    let f = Fixture::new().await;
    let pinning = f.pinning_service();
    let board = dashboard(&f, f.public_space, "Overview").await;
    let a = PinnedItemRef::dashboard(board);
    let b = PinnedItemRef::space(f.public_space);

    pinning.toggle_pinning(&f.editor, a).await.unwrap();
    let list = pinning.toggle_pinning(&f.editor, b).await.unwrap();

    let items = pinning
        .update_pinned_items_order(&f.editor, f.project_id, list.id, vec![b, a])
        .await
        .unwrap();
    assert_eq!(items[0].item, b);
    assert_eq!(items[0].order, 0);
    assert_eq!(items[1].item, a);
    assert_eq!(items[1].order, 1);

    let snapshot = f
        .events
        .events()
        .into_iter()
        .rfind(|e| e.event == events::PINNED_LIST_UPDATED)
        .unwrap();
    assert_eq!(snapshot.properties["pinnedListId"], json!(list.id));
    assert_eq!(snapshot.properties["organizationId"], json!(f.org_id));
    assert_eq!(
        snapshot.properties["pinnedItems"],
        json!([
            { "itemId": f.public_space, "itemKind": "space", "order": 0 },
            { "itemId": board, "itemKind": "dashboard", "order": 1 },
        ])
    );
}

#[tokio::test]
async fn reorder_rejects_non_permutations_without_changes() {
    let f = Fixture::new().await;
    let pinning = f.pinning_service();
    let board = dashboard(&f, f.public_space, "Overview").await;
    let a = PinnedItemRef::dashboard(board);
    let b = PinnedItemRef::space(f.public_space);
    pinning.toggle_pinning(&f.editor, a).await.unwrap();
    let list = pinning.toggle_pinning(&f.editor, b).await.unwrap();
    let emitted = f.events.events().len();

    for order in [
        vec![a],
        vec![a, a],
        vec![a, b, PinnedItemRef::space(f.restricted_space)],
        vec![a, PinnedItemRef::chart(Uuid::new_v4())],
    ] {
        let err = pinning
            .update_pinned_items_order(&f.editor, f.project_id, list.id, order)
            .await
            .unwrap_err();
        assert!(matches!(err, TesseraError::InvalidOrder { .. }));
    }

    let items = pinning
        .get_pinned_items(&f.editor, f.project_id, list.id)
        .await
        .unwrap();
    assert_eq!(items.iter().map(|i| i.item).collect::<Vec<_>>(), vec![a, b]);
    assert_eq!(f.events.events().len(), emitted);
}

#[tokio::test]
async fn viewers_can_read_but_not_reorder() {
    let f = Fixture::new().await;
    let pinning = f.pinning_service();
    let list = pinning
        .toggle_pinning(&f.editor, PinnedItemRef::space(f.public_space))
        .await
        .unwrap();

    assert!(
        pinning
            .get_pinned_items(&f.viewer, f.project_id, list.id)
            .await
            .is_ok()
    );
    let err = pinning
        .update_pinned_items_order(
            &f.viewer,
            f.project_id,
            list.id,
            vec![PinnedItemRef::space(f.public_space)],
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

#[tokio::test]
async fn list_must_belong_to_the_requested_project() {
    let f = Fixture::new().await;
    let pinning = f.pinning_service();
    let list = pinning
        .toggle_pinning(&f.editor, PinnedItemRef::space(f.public_space))
        .await
        .unwrap();

    let err = pinning
        .get_pinned_items(&f.editor, Uuid::new_v4(), list.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = pinning
        .get_pinned_items(&f.editor, f.project_id, Uuid::new_v4())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
