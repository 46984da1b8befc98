//! # Sale Repository
//!
//! SQLite implementation of [`SaleStore`].
//!
//! ## Record Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Record Lifecycle                             │
//! │                                                                         │
//! │  1. CONTRACT                                                           │
//! │     └── create() → SaleRecord { id, created_at = updated_at = now }    │
//! │                                                                         │
//! │  2. (OPTIONAL) ADMIN EDIT                                              │
//! │     └── update() → customer and/or inventory replaced                  │
//! │         └── inventory changed? compute() again, same transaction       │
//! │                                                                         │
//! │  3. (OPTIONAL) ADMIN DELETE                                            │
//! │     └── delete() → row removed, later get() → NotFound                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Queries are built at runtime (`query_as::<_, SaleRow>`); the only dynamic
//! SQL is the ORDER BY clause, assembled from enums, never from user text.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::store::SaleStore;
use micks_core::validation::fold_name;
use micks_core::{
    compute, CustomerInfo, DeviceBreakdown, DeviceInventory, NewSale, PlanResult, PlanTier,
    SaleQuery, SaleRecord, SaleSort, SaleUpdate, SortKey, Weight,
};

const ENTITY: &str = "Sale";

const SELECT_COLUMNS: &str = r#"
    SELECT
        id, name, email, phone,
        cellphones, computers, smart_tvs, tv_boxes, others, gamer,
        cellphones_weight, computers_weight, smart_tvs_weight, tv_boxes_weight, others_weight,
        total_weight, plan, speed_mbps,
        created_at, updated_at
    FROM sales
"#;

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    async fn fetch(&self, id: &str) -> DbResult<Option<SaleRecord>> {
        let row = sqlx::query_as::<_, SaleRow>(&format!("{SELECT_COLUMNS} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(SaleRow::into_record).transpose()
    }

    /// Computes the folded name of rows stored before the column existed.
    ///
    /// Returns the number of rows updated. A no-op once every row has a key.
    pub async fn fold_missing_names(&self) -> DbResult<u64> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT id, name FROM sales WHERE name_folded = ''")
                .fetch_all(&mut *tx)
                .await?;

        let mut updated = 0;
        for (id, name) in &rows {
            updated += sqlx::query("UPDATE sales SET name_folded = ?2 WHERE id = ?1")
                .bind(id)
                .bind(fold_name(name))
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(updated)
    }
}

#[async_trait]
impl SaleStore for SaleRepository {
    async fn create(&self, sale: NewSale) -> DbResult<SaleRecord> {
        let now = now();
        let record = SaleRecord {
            id: Uuid::new_v4().to_string(),
            customer: sale.customer,
            inventory: sale.inventory,
            plan: sale.plan,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %record.id, plan = %record.plan.plan, "Inserting sale");

        let inv = &record.inventory;
        let weights = &record.plan.contributions;
        sqlx::query(
            r#"
            INSERT INTO sales (
                id, name, email, phone,
                cellphones, computers, smart_tvs, tv_boxes, others, gamer,
                cellphones_weight, computers_weight, smart_tvs_weight, tv_boxes_weight, others_weight,
                total_weight, plan, speed_mbps,
                created_at, updated_at, name_folded
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6, ?7, ?8, ?9, ?10,
                ?11, ?12, ?13, ?14, ?15,
                ?16, ?17, ?18,
                ?19, ?20, ?21
            )
            "#,
        )
        .bind(&record.id)
        .bind(&record.customer.name)
        .bind(&record.customer.email)
        .bind(&record.customer.phone)
        .bind(i64::from(inv.cellphones))
        .bind(i64::from(inv.computers))
        .bind(i64::from(inv.smart_tvs))
        .bind(i64::from(inv.tv_boxes))
        .bind(i64::from(inv.others))
        .bind(inv.gamer)
        .bind(weights.cellphones.hundredths())
        .bind(weights.computers.hundredths())
        .bind(weights.smart_tvs.hundredths())
        .bind(weights.tv_boxes.hundredths())
        .bind(weights.others.hundredths())
        .bind(record.plan.total_weight.hundredths())
        .bind(record.plan.plan)
        .bind(i64::from(record.plan.speed_mbps))
        .bind(format_timestamp(&record.created_at))
        .bind(format_timestamp(&record.updated_at))
        .bind(fold_name(&record.customer.name))
        .execute(&self.pool)
        .await?;

        Ok(record)
    }

    async fn list(&self, query: &SaleQuery) -> DbResult<Vec<SaleRecord>> {
        let pattern = query
            .name_contains
            .as_deref()
            .filter(|needle| !needle.is_empty())
            .map(|needle| format!("%{}%", escape_like(&fold_name(needle))));

        let where_clause = if pattern.is_some() {
            r"WHERE name_folded LIKE ?1 ESCAPE '\'"
        } else {
            ""
        };
        let sql = format!(
            "{SELECT_COLUMNS} {where_clause} ORDER BY {}",
            order_by(&query.sort)
        );

        debug!(filter = ?query.name_contains, sort = %query.sort, "Listing sales");

        let mut q = sqlx::query_as::<_, SaleRow>(&sql);
        if let Some(pattern) = pattern {
            q = q.bind(pattern);
        }
        let rows = q.fetch_all(&self.pool).await?;

        rows.into_iter().map(SaleRow::into_record).collect()
    }

    async fn get(&self, id: &str) -> DbResult<SaleRecord> {
        self.fetch(id)
            .await?
            .ok_or_else(|| DbError::not_found(ENTITY, id))
    }

    async fn update(&self, id: &str, update: SaleUpdate) -> DbResult<SaleRecord> {
        if update.is_empty() {
            return self.get(id).await;
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let row = sqlx::query_as::<_, SaleRow>(&format!("{SELECT_COLUMNS} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let mut record = match row {
            Some(row) => row.into_record()?,
            None => return Err(DbError::not_found(ENTITY, id)),
        };

        if let Some(customer) = update.customer {
            record.customer = customer;
        }
        if let Some(inventory) = update.inventory {
            record.inventory = inventory;
            record.plan = compute(&inventory);
            debug!(id = %id, plan = %record.plan.plan, "Inventory edited, plan recomputed");
        }
        record.updated_at = now().max(record.created_at);

        let inv = &record.inventory;
        let weights = &record.plan.contributions;
        sqlx::query(
            r#"
            UPDATE sales SET
                name = ?2, email = ?3, phone = ?4,
                cellphones = ?5, computers = ?6, smart_tvs = ?7, tv_boxes = ?8, others = ?9,
                gamer = ?10,
                cellphones_weight = ?11, computers_weight = ?12, smart_tvs_weight = ?13,
                tv_boxes_weight = ?14, others_weight = ?15,
                total_weight = ?16, plan = ?17, speed_mbps = ?18,
                updated_at = ?19, name_folded = ?20
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&record.customer.name)
        .bind(&record.customer.email)
        .bind(&record.customer.phone)
        .bind(i64::from(inv.cellphones))
        .bind(i64::from(inv.computers))
        .bind(i64::from(inv.smart_tvs))
        .bind(i64::from(inv.tv_boxes))
        .bind(i64::from(inv.others))
        .bind(inv.gamer)
        .bind(weights.cellphones.hundredths())
        .bind(weights.computers.hundredths())
        .bind(weights.smart_tvs.hundredths())
        .bind(weights.tv_boxes.hundredths())
        .bind(weights.others.hundredths())
        .bind(record.plan.total_weight.hundredths())
        .bind(record.plan.plan)
        .bind(i64::from(record.plan.speed_mbps))
        .bind(format_timestamp(&record.updated_at))
        .bind(fold_name(&record.customer.name))
        .execute(&mut *tx)
        .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(record)
    }

    async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting sale");

        let result = sqlx::query("DELETE FROM sales WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(ENTITY, id));
        }

        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> DbResult<Vec<SaleRecord>> {
        let rows = sqlx::query_as::<_, SaleRow>(&format!(
            "{SELECT_COLUMNS} WHERE email = ?1 COLLATE NOCASE ORDER BY created_at DESC, rowid DESC"
        ))
        .bind(email.trim())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(SaleRow::into_record).collect()
    }

    async fn count(&self) -> DbResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        u64::try_from(count).map_err(|e| DbError::Internal(e.to_string()))
    }
}

// =============================================================================
// Row Mapping
// =============================================================================

/// One row of the `sales` table, as stored.
#[derive(Debug, sqlx::FromRow)]
struct SaleRow {
    id: String,
    name: String,
    email: String,
    phone: String,
    cellphones: i64,
    computers: i64,
    smart_tvs: i64,
    tv_boxes: i64,
    others: i64,
    gamer: bool,
    cellphones_weight: i64,
    computers_weight: i64,
    smart_tvs_weight: i64,
    tv_boxes_weight: i64,
    others_weight: i64,
    total_weight: i64,
    plan: PlanTier,
    speed_mbps: i64,
    created_at: String,
    updated_at: String,
}

impl SaleRow {
    fn into_record(self) -> DbResult<SaleRecord> {
        let id = self.id.as_str();
        let to_u32 = |field: &str, value: i64| {
            u32::try_from(value)
                .map_err(|_| DbError::invalid_record(ENTITY, id, format!("{field} = {value}")))
        };

        let inventory = DeviceInventory {
            cellphones: to_u32("cellphones", self.cellphones)?,
            computers: to_u32("computers", self.computers)?,
            smart_tvs: to_u32("smart_tvs", self.smart_tvs)?,
            tv_boxes: to_u32("tv_boxes", self.tv_boxes)?,
            others: to_u32("others", self.others)?,
            gamer: self.gamer,
        };

        let plan = PlanResult {
            contributions: DeviceBreakdown {
                cellphones: Weight::from_hundredths(self.cellphones_weight),
                computers: Weight::from_hundredths(self.computers_weight),
                smart_tvs: Weight::from_hundredths(self.smart_tvs_weight),
                tv_boxes: Weight::from_hundredths(self.tv_boxes_weight),
                others: Weight::from_hundredths(self.others_weight),
            },
            total_weight: Weight::from_hundredths(self.total_weight),
            plan: self.plan,
            speed_mbps: to_u32("speed_mbps", self.speed_mbps)?,
        };

        let created_at = parse_timestamp(id, "created_at", &self.created_at)?;
        let updated_at = parse_timestamp(id, "updated_at", &self.updated_at)?;

        Ok(SaleRecord {
            id: self.id,
            customer: CustomerInfo {
                name: self.name,
                email: self.email,
                phone: self.phone,
            },
            inventory,
            plan,
            created_at,
            updated_at,
        })
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Current time at the precision the table keeps.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Fixed-width RFC 3339 (`2026-03-01T12:00:00.000000Z`): text order is time order.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(id: &str, field: &str, value: &str) -> DbResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| DbError::invalid_record(ENTITY, id, format!("{field}: {e}")))
}

/// Escapes LIKE wildcards so the needle matches literally.
fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// ORDER BY clause. Ties on name fall back to newest first, then insertion order.
fn order_by(sort: &SaleSort) -> String {
    let dir = sort.direction.as_sql();
    match sort.key {
        SortKey::CreatedAt => format!("created_at {dir}, rowid {dir}"),
        SortKey::Name => format!("name_folded {dir}, created_at DESC, rowid DESC"),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use micks_core::SortDirection;

    async fn repo() -> SaleRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().sales()
    }

    fn customer(name: &str, email: &str) -> CustomerInfo {
        CustomerInfo {
            name: name.to_string(),
            email: email.to_string(),
            phone: "(11) 99999-0000".to_string(),
        }
    }

    fn inventory(cellphones: u32, gamer: bool) -> DeviceInventory {
        DeviceInventory {
            cellphones,
            computers: 1,
            gamer,
            ..Default::default()
        }
    }

    async fn contract(repo: &SaleRepository, name: &str) -> SaleRecord {
        let email = format!("{}@example.com", name.to_lowercase().replace(' ', "."));
        repo.create(NewSale::contract(customer(name, &email), inventory(1, false)))
            .await
            .unwrap()
    }

    fn names(records: &[SaleRecord]) -> Vec<&str> {
        records.iter().map(|r| r.customer.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_create_then_get_round_trip() {
        let repo = repo().await;
        let sale = NewSale::contract(customer("Ana Souza", "ana@example.com"), inventory(2, true));

        let created = repo.create(sale.clone()).await.unwrap();
        assert!(Uuid::parse_str(&created.id).is_ok());
        assert_eq!(created.plan, sale.plan);
        assert_eq!(created.created_at, created.updated_at);

        let fetched = repo.get(&created.id).await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_get_unknown_is_not_found() {
        let repo = repo().await;
        let err = repo.get("550e8400-e29b-41d4-a716-446655440000").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let repo = repo().await;
        let record = contract(&repo, "Ana").await;

        repo.delete(&record.id).await.unwrap();
        assert!(repo.delete(&record.id).await.unwrap_err().is_not_found());
        assert!(repo.get(&record.id).await.unwrap_err().is_not_found());
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_inventory_recomputes_plan() {
        let repo = repo().await;
        let record = contract(&repo, "Ana").await;
        assert_eq!(record.plan.plan, PlanTier::Bronze); // 0.8 + 0.5 = 1.30

        let new_inventory = inventory(4, false); // 3.2 + 0.5 = 3.70
        let updated = repo
            .update(
                &record.id,
                SaleUpdate {
                    inventory: Some(new_inventory),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.plan, compute(&new_inventory));
        assert_eq!(updated.plan.plan, PlanTier::Diamante);
        assert_eq!(updated.created_at, record.created_at);
        assert!(updated.updated_at >= record.updated_at);
        assert_eq!(repo.get(&record.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn test_update_customer_keeps_plan() {
        let repo = repo().await;
        let record = contract(&repo, "Ana").await;

        let updated = repo
            .update(
                &record.id,
                SaleUpdate {
                    customer: Some(customer("Ana Maria", "ana.maria@example.com")),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.customer.name, "Ana Maria");
        assert_eq!(updated.inventory, record.inventory);
        assert_eq!(updated.plan, record.plan);
    }

    #[tokio::test]
    async fn test_update_unknown_is_not_found() {
        let repo = repo().await;
        let update = SaleUpdate {
            inventory: Some(inventory(1, true)),
            ..Default::default()
        };
        let err = repo.update("missing", update).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_list_defaults_to_newest_first() {
        let repo = repo().await;
        for name in ["First", "Second", "Third"] {
            contract(&repo, name).await;
        }

        let all = repo.list(&SaleQuery::default()).await.unwrap();
        assert_eq!(names(&all), vec!["Third", "Second", "First"]);

        let oldest_first = SaleQuery {
            sort: SaleSort::default().direction(SortDirection::Asc),
            ..Default::default()
        };
        let all = repo.list(&oldest_first).await.unwrap();
        assert_eq!(names(&all), vec!["First", "Second", "Third"]);
    }

    #[tokio::test]
    async fn test_list_filters_by_name_case_insensitive() {
        let repo = repo().await;
        for name in ["Mariana", "Bruno", "Ana Souza", "JULIANA"] {
            contract(&repo, name).await;
        }

        let query = SaleQuery {
            name_contains: Some("ana".to_string()),
            sort: SaleSort::by(SortKey::Name),
        };
        let found = repo.list(&query).await.unwrap();
        assert_eq!(names(&found), vec!["Ana Souza", "JULIANA", "Mariana"]);

        let query = SaleQuery {
            sort: SaleSort::by(SortKey::Name).direction(SortDirection::Desc),
            ..query
        };
        let found = repo.list(&query).await.unwrap();
        assert_eq!(names(&found), vec!["Mariana", "JULIANA", "Ana Souza"]);
    }

    #[tokio::test]
    async fn test_name_sort_ties_newest_first() {
        let repo = repo().await;
        let older = contract(&repo, "Ana").await;
        let newer = contract(&repo, "Ana").await;

        let query = SaleQuery {
            sort: SaleSort::by(SortKey::Name),
            ..Default::default()
        };
        let found = repo.list(&query).await.unwrap();
        let ids: Vec<&str> = found.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec![newer.id.as_str(), older.id.as_str()]);
    }

    #[tokio::test]
    async fn test_list_folds_accented_names() {
        let repo = repo().await;
        for name in ["ÂNGELA Souza", "Ângela Lima", "Zé Carlos", "Ágata", "Bruno"] {
            contract(&repo, name).await;
        }

        let query = |needle: &str| SaleQuery {
            name_contains: Some(needle.to_string()),
            sort: SaleSort::by(SortKey::Name),
        };
        let expected = vec!["Ângela Lima", "ÂNGELA Souza"];
        assert_eq!(names(&repo.list(&query("ângela")).await.unwrap()), expected);
        assert_eq!(names(&repo.list(&query("ÂNGELA")).await.unwrap()), expected);
        assert_eq!(names(&repo.list(&query("angela")).await.unwrap()), expected);

        let all = repo
            .list(&SaleQuery {
                sort: SaleSort::by(SortKey::Name),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(
            names(&all),
            vec!["Ágata", "Ângela Lima", "ÂNGELA Souza", "Bruno", "Zé Carlos"]
        );
    }

    #[tokio::test]
    async fn test_update_refreshes_folded_name() {
        let repo = repo().await;
        let sale = contract(&repo, "Bruno").await;

        let update = SaleUpdate {
            customer: Some(customer("Érica Bruna", "erica@example.com")),
            inventory: None,
        };
        repo.update(&sale.id, update).await.unwrap();

        let query = |needle: &str| SaleQuery {
            name_contains: Some(needle.to_string()),
            ..Default::default()
        };
        assert_eq!(names(&repo.list(&query("ÉRICA")).await.unwrap()), vec!["Érica Bruna"]);
        assert!(repo.list(&query("bruno")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fold_missing_names_backfills_old_rows() {
        let repo = repo().await;
        contract(&repo, "Ângela Lima").await;
        contract(&repo, "Bruno").await;

        // Rows written before 002_add_name_folded.sql carry the empty default
        sqlx::query("UPDATE sales SET name_folded = ''")
            .execute(&repo.pool)
            .await
            .unwrap();

        assert_eq!(repo.fold_missing_names().await.unwrap(), 2);
        assert_eq!(repo.fold_missing_names().await.unwrap(), 0);

        let query = SaleQuery {
            name_contains: Some("ÂNGELA".to_string()),
            ..Default::default()
        };
        assert_eq!(names(&repo.list(&query).await.unwrap()), vec!["Ângela Lima"]);
    }

    #[tokio::test]
    async fn test_list_filter_matches_wildcards_literally() {
        let repo = repo().await;
        contract(&repo, "Loja 100% Fibra").await;
        contract(&repo, "Loja 1000 Fibra").await;
        contract(&repo, "Ana_Paula").await;
        contract(&repo, "AnaXPaula").await;

        let query = |needle: &str| SaleQuery {
            name_contains: Some(needle.to_string()),
            ..Default::default()
        };
        assert_eq!(names(&repo.list(&query("100%")).await.unwrap()), vec!["Loja 100% Fibra"]);
        assert_eq!(names(&repo.list(&query("a_p")).await.unwrap()), vec!["Ana_Paula"]);
        assert!(repo.list(&query("zzz")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_by_email() {
        let repo = repo().await;
        let first = contract(&repo, "Ana").await;
        let second = repo
            .create(NewSale::contract(customer("Ana", "ANA@example.com"), inventory(3, true)))
            .await
            .unwrap();
        contract(&repo, "Bruno").await;

        let found = repo.find_by_email("ana@EXAMPLE.com").await.unwrap();
        let ids: Vec<&str> = found.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec![second.id.as_str(), first.id.as_str()]);
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("ana"), "ana");
        assert_eq!(escape_like("100%"), r"100\%");
        assert_eq!(escape_like(r"a_b\c"), r"a\_b\\c");
    }

    #[test]
    fn test_timestamp_format_is_fixed_width() {
        let ts = DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(format_timestamp(&ts), "2026-03-01T12:00:00.000000Z");
        assert_eq!(parse_timestamp("x", "created_at", &format_timestamp(&ts)).unwrap(), ts);
        assert!(parse_timestamp("x", "created_at", "yesterday").is_err());
    }
}
