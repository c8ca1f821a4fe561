//! SurrealDB implementation of [`PinnedListRepository`].
//!
//! Every mutation loads the whole list, applies the ordering rules from
//! [`PinnedList`] and rewrites the list's item rows in one transaction
//! while holding the project's slot in [`PINNED_LISTS`]. The unique
//! indexes on `(item_kind, item_id)` and `(pinned_list_id, item_order)`
//! reject conflicting writers from other processes.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tessera_core::error::TesseraResult;
use tessera_core::models::pinned_list::{
    PinToggle, PinnedItem, PinnedItemKind, PinnedItemRef, PinnedList,
};
use tessera_core::repository::PinnedListRepository;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, parse_uuid};
use crate::locks::PINNED_LISTS;

#[derive(Debug, SurrealValue)]
struct PinnedListRow {
    record_id: String,
    project_id: String,
}

#[derive(Debug, SurrealValue)]
struct PinnedItemRow {
    item_kind: String,
    item_id: String,
    item_order: u32,
}

#[derive(Debug, SurrealValue)]
struct MembershipRow {
    pinned_list_id: String,
}

impl PinnedItemRow {
    fn try_into_item(self) -> Result<PinnedItem, DbError> {
        let kind = PinnedItemKind::parse(&self.item_kind).ok_or_else(|| {
            DbError::Decode(format!("unknown pinned item kind: {}", self.item_kind))
        })?;
        Ok(PinnedItem {
            item: PinnedItemRef {
                kind,
                id: parse_uuid(&self.item_id, "pinned item")?,
            },
            order: self.item_order,
        })
    }
}

async fn load_items<C: Connection>(
    db: &Surreal<C>,
    list_id: &str,
) -> Result<Vec<PinnedItem>, DbError> {
    let mut result = db
        .query(
            "SELECT item_kind, item_id, item_order FROM pinned_item \
             WHERE pinned_list_id = $list_id ORDER BY item_order ASC",
        )
        .bind(("list_id", list_id.to_string()))
        .await?;
    let rows: Vec<PinnedItemRow> = result.take(0)?;
    rows.into_iter().map(PinnedItemRow::try_into_item).collect()
}

async fn load_list<C: Connection>(
    db: &Surreal<C>,
    row: PinnedListRow,
) -> Result<PinnedList, DbError> {
    let id = parse_uuid(&row.record_id, "pinned list")?;
    let project_id = parse_uuid(&row.project_id, "project")?;
    let items = load_items(db, &row.record_id).await?;
    Ok(PinnedList::from_items(id, project_id, items))
}

async fn find_by_project<C: Connection>(
    db: &Surreal<C>,
    project_id: Uuid,
) -> Result<Option<PinnedList>, DbError> {
    let mut result = db
        .query(
            "SELECT meta::id(id) AS record_id, project_id FROM pinned_list \
             WHERE project_id = $project_id",
        )
        .bind(("project_id", project_id.to_string()))
        .await?;
    let rows: Vec<PinnedListRow> = result.take(0)?;
    match rows.into_iter().next() {
        Some(row) => Ok(Some(load_list(db, row).await?)),
        None => Ok(None),
    }
}

async fn find_by_id<C: Connection>(db: &Surreal<C>, list_id: Uuid) -> Result<PinnedList, DbError> {
    let mut result = db
        .query(
            "SELECT meta::id(id) AS record_id, project_id \
             FROM type::record('pinned_list', $id)",
        )
        .bind(("id", list_id.to_string()))
        .await?;
    let rows: Vec<PinnedListRow> = result.take(0)?;
    let row = rows
        .into_iter()
        .next()
        .ok_or_else(|| DbError::not_found("pinned_list", list_id))?;
    load_list(db, row).await
}

/// List the item currently belongs to, if any.
pub(crate) async fn membership_of<C: Connection>(
    db: &Surreal<C>,
    item: PinnedItemRef,
) -> Result<Option<Uuid>, DbError> {
    let mut result = db
        .query(
            "SELECT pinned_list_id FROM pinned_item \
             WHERE item_kind = $kind AND item_id = $item_id LIMIT 1",
        )
        .bind(("kind", item.kind.as_str()))
        .bind(("item_id", item.id.to_string()))
        .await?;
    let rows: Vec<MembershipRow> = result.take(0)?;
    rows.first()
        .map(|row| parse_uuid(&row.pinned_list_id, "pinned list"))
        .transpose()
}

/// Load the list an item belongs to, if any. Callers must hold the
/// list's project slot in [`PINNED_LISTS`] when they intend to rewrite it.
pub(crate) async fn list_containing<C: Connection>(
    db: &Surreal<C>,
    item: PinnedItemRef,
) -> Result<Option<PinnedList>, DbError> {
    match membership_of(db, item).await? {
        Some(list_id) => Ok(Some(find_by_id(db, list_id).await?)),
        None => Ok(None),
    }
}

/// Statements replacing every item row of `list` with its current state.
/// Values are typed ids, kinds and integers, so they are inlined.
pub(crate) fn rewrite_items_statements(list: &PinnedList) -> String {
    let list_id = list.id;
    let mut sql = format!("DELETE pinned_item WHERE pinned_list_id = '{list_id}';");
    for entry in &list.items {
        sql.push_str(&format!(
            " CREATE pinned_item SET pinned_list_id = '{list_id}', \
             item_kind = '{}', item_id = '{}', item_order = {};",
            entry.item.kind.as_str(),
            entry.item.id,
            entry.order,
        ));
    }
    sql
}

/// SurrealDB implementation of the Pinned List repository.
#[derive(Clone)]
pub struct SurrealPinnedListRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealPinnedListRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn create_list(&self, project_id: Uuid) -> Result<PinnedList, DbError> {
        let id = Uuid::new_v4();
        self.db
            .query("CREATE type::record('pinned_list', $id) SET project_id = $project_id")
            .bind(("id", id.to_string()))
            .bind(("project_id", project_id.to_string()))
            .await?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;
        debug!(%project_id, pinned_list_id = %id, "Created pinned list");
        Ok(PinnedList::new(id, project_id))
    }

    async fn persist(&self, list: &PinnedList) -> Result<(), DbError> {
        let query = format!(
            "BEGIN TRANSACTION; {} COMMIT TRANSACTION;",
            rewrite_items_statements(list)
        );
        self.db
            .query(query)
            .await?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;
        Ok(())
    }
}

impl<C: Connection> PinnedListRepository for SurrealPinnedListRepository<C> {
    async fn get_by_project(&self, project_id: Uuid) -> TesseraResult<Option<PinnedList>> {
        find_by_project(&self.db, project_id)
            .await
            .map_err(Into::into)
    }

    async fn get(&self, list_id: Uuid) -> TesseraResult<PinnedList> {
        find_by_id(&self.db, list_id).await.map_err(Into::into)
    }

    async fn toggle(
        &self,
        project_id: Uuid,
        item: PinnedItemRef,
    ) -> TesseraResult<(PinToggle, PinnedList)> {
        // An item lives in at most one list, possibly another project's.
        // Lock both projects, then make sure the item did not move while
        // we were waiting.
        let (_guards, holder) = loop {
            let seen = list_containing(&self.db, item).await?;
            let seen_project = seen.as_ref().map(|list| list.project_id);
            let guards = PINNED_LISTS
                .lock_all(std::iter::once(project_id).chain(seen_project))
                .await;
            let holder = list_containing(&self.db, item).await?;
            if holder.as_ref().map(|list| list.project_id) == seen_project {
                break (guards, holder);
            }
        };

        // Unpin it from a foreign list before considering the project's own.
        match holder {
            Some(mut current) if current.project_id != project_id => {
                current.unpin(&item);
                self.persist(&current).await?;
            }
            _ => {}
        }

        let mut list = match find_by_project(&self.db, project_id).await? {
            Some(list) => list,
            None => self.create_list(project_id).await?,
        };
        let outcome = list.toggle(item);
        self.persist(&list).await?;

        debug!(
            pinned_list_id = %list.id,
            item_id = %item.id,
            ?outcome,
            items = list.items.len(),
            "Toggled pinned item"
        );
        Ok((outcome, list))
    }

    async fn reorder(
        &self,
        list_id: Uuid,
        order: Vec<PinnedItemRef>,
    ) -> TesseraResult<PinnedList> {
        let project_id = find_by_id(&self.db, list_id).await?.project_id;
        let _guard = PINNED_LISTS.lock(project_id).await;

        let mut list = find_by_id(&self.db, list_id).await?;
        list.reorder(&order)?;
        self.persist(&list).await?;
        Ok(list)
    }
}
