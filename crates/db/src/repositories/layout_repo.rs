//! Repository for the `saved_layouts` table.
//!
//! All queries are scoped to the owning user; a layout id from another
//! user behaves exactly like a missing row. The three-slot capacity
//! limit is enforced inside the insert statement so concurrent tabs
//! cannot overshoot it.

use sqlx::PgPool;
use uuid::Uuid;

use coldwatch_core::layout::MAX_CUSTOM_LAYOUTS;
use coldwatch_core::types::DbId;

use crate::models::layout::{CreateSavedLayout, SavedLayout, UpdateSavedLayout};

/// Column list for `saved_layouts` queries.
const LAYOUT_COLUMNS: &str = "\
    id, organization_id, entity_type, entity_id, user_id, name, \
    is_user_default, layout_json, widget_prefs_json, timeline_state_json, \
    version, created_at, updated_at";

/// Provides data access for saved dashboard layouts.
pub struct LayoutRepo;

impl LayoutRepo {
    /// Create a new saved layout, enforcing the per-scope slot limit.
    ///
    /// Returns `None` when the scope already holds the maximum number
    /// of custom layouts; the guard runs inside the statement, so a
    /// concurrent insert from another session cannot slip past it.
    pub async fn create(
        pool: &PgPool,
        organization_id: Uuid,
        user_id: DbId,
        version: i32,
        dto: &CreateSavedLayout,
    ) -> Result<Option<SavedLayout>, sqlx::Error> {
        let query = format!(
            "INSERT INTO saved_layouts \
                 (organization_id, entity_type, entity_id, user_id, name, \
                  layout_json, widget_prefs_json, timeline_state_json, version) \
             SELECT $1, $2, $3, $4, $5, $6, \
                    COALESCE($7, 'null'::jsonb), COALESCE($8, 'null'::jsonb), $9 \
             WHERE (SELECT COUNT(*) FROM saved_layouts \
                    WHERE user_id = $4 AND entity_type = $2 AND entity_id = $3) < {MAX_CUSTOM_LAYOUTS} \
             RETURNING {LAYOUT_COLUMNS}"
        );
        sqlx::query_as::<_, SavedLayout>(&query)
            .bind(organization_id)
            .bind(&dto.entity_type)
            .bind(dto.entity_id)
            .bind(user_id)
            .bind(&dto.name)
            .bind(&dto.layout_json)
            .bind(&dto.widget_prefs_json)
            .bind(&dto.timeline_state_json)
            .bind(version)
            .fetch_optional(pool)
            .await
    }

    /// All of a user's layouts for one entity, in creation order.
    pub async fn list_for_entity(
        pool: &PgPool,
        entity_type: &str,
        entity_id: DbId,
        user_id: DbId,
    ) -> Result<Vec<SavedLayout>, sqlx::Error> {
        let query = format!(
            "SELECT {LAYOUT_COLUMNS} FROM saved_layouts \
             WHERE entity_type = $1 AND entity_id = $2 AND user_id = $3 \
             ORDER BY created_at, id"
        );
        sqlx::query_as::<_, SavedLayout>(&query)
            .bind(entity_type)
            .bind(entity_id)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Find a single layout owned by `user_id`.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
    ) -> Result<Option<SavedLayout>, sqlx::Error> {
        let query =
            format!("SELECT {LAYOUT_COLUMNS} FROM saved_layouts WHERE id = $1 AND user_id = $2");
        sqlx::query_as::<_, SavedLayout>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Partially update a layout owned by `user_id`.
    ///
    /// Uses `COALESCE` so only provided fields are changed.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
        dto: &UpdateSavedLayout,
    ) -> Result<Option<SavedLayout>, sqlx::Error> {
        let query = format!(
            "UPDATE saved_layouts SET \
                 name                = COALESCE($3, name), \
                 layout_json         = COALESCE($4, layout_json), \
                 widget_prefs_json   = COALESCE($5, widget_prefs_json), \
                 timeline_state_json = COALESCE($6, timeline_state_json), \
                 updated_at          = now() \
             WHERE id = $1 AND user_id = $2 \
             RETURNING {LAYOUT_COLUMNS}"
        );
        sqlx::query_as::<_, SavedLayout>(&query)
            .bind(id)
            .bind(user_id)
            .bind(&dto.name)
            .bind(&dto.layout_json)
            .bind(&dto.widget_prefs_json)
            .bind(&dto.timeline_state_json)
            .fetch_optional(pool)
            .await
    }

    /// Delete a layout owned by `user_id`.
    ///
    /// Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId, user_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM saved_layouts WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Make `id` the user's single default layout within its entity
    /// scope. Runs in a transaction: the flag is cleared on every
    /// sibling before being set on the target.
    ///
    /// Returns `false` when the layout does not exist for this user.
    pub async fn set_user_default(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let Some(target) = sqlx::query_as::<_, SavedLayout>(&format!(
            "SELECT {LAYOUT_COLUMNS} FROM saved_layouts WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        else {
            return Ok(false);
        };

        sqlx::query(
            "UPDATE saved_layouts SET is_user_default = FALSE \
             WHERE user_id = $1 AND entity_type = $2 AND entity_id = $3 AND is_user_default",
        )
        .bind(user_id)
        .bind(&target.entity_type)
        .bind(target.entity_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE saved_layouts SET is_user_default = TRUE WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    /// How many custom layouts the scope currently holds.
    pub async fn count_for_entity(
        pool: &PgPool,
        entity_type: &str,
        entity_id: DbId,
        user_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM saved_layouts \
             WHERE entity_type = $1 AND entity_id = $2 AND user_id = $3",
        )
        .bind(entity_type)
        .bind(entity_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }
}
