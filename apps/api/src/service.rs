//! # Sales Service
//!
//! The boundary between HTTP handlers and the store. All customer and
//! inventory validation happens here, before anything is persisted.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  handler ──► SalesService ──► validate (micks_core::validation)         │
//! │                   │                                                     │
//! │                   ├──► compute (micks_core::plan)                       │
//! │                   ├──► Arc<dyn SaleStore>   (persist / query)           │
//! │                   └──► Arc<dyn Notifier>    (spawned, best effort)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use micks_core::export::sales_to_csv;
use micks_core::validation::{validate_email, validate_search_query, validate_uuid};
use micks_core::{
    compute, CustomerInfo, InventoryInput, NewSale, PlanResult, SaleQuery, SaleRecord, SaleSort,
    SaleUpdate, SortDirection, SortKey,
};
use micks_db::SaleStore;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{ApiError, ApiResult};
use crate::notify::Notifier;

/// Body of `POST /api/contract`.
#[derive(Debug, Clone, Deserialize)]
pub struct ContractRequest {
    pub customer: CustomerInfo,
    #[serde(default)]
    pub inventory: InventoryInput,
}

/// Body of `PUT /api/admin/sales/{id}`. Absent parts stay as stored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaleEdit {
    pub customer: Option<CustomerInfo>,
    pub inventory: Option<InventoryInput>,
}

/// Query string of the admin listing and the export.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    /// Case-insensitive substring of the customer name.
    pub name: Option<String>,
    /// `date` (default) or `name`.
    pub sort: Option<String>,
    /// `asc` or `desc`; defaults depend on the sort key.
    pub dir: Option<String>,
    /// Exact customer e-mail; takes precedence over the other parameters.
    pub email: Option<String>,
}

impl ListParams {
    /// Parses the listing parameters. The e-mail lookup is not part of it.
    pub fn to_query(&self) -> ApiResult<SaleQuery> {
        let name_contains = match self.name.as_deref() {
            Some(name) => validate_search_query(name)?,
            None => None,
        };

        let key = match self.sort.as_deref().map(str::trim) {
            Some(sort) if !sort.is_empty() => sort.parse::<SortKey>()?,
            _ => SortKey::default(),
        };

        let mut sort = SaleSort::by(key);
        if let Some(dir) = self.dir.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            sort = sort.direction(dir.parse::<SortDirection>()?);
        }

        Ok(SaleQuery {
            name_contains,
            sort,
        })
    }
}

/// Plan preview, contract and administrative operations on sales.
pub struct SalesService {
    store: Arc<dyn SaleStore>,
    notifier: Arc<dyn Notifier>,
}

impl SalesService {
    pub fn new(store: Arc<dyn SaleStore>, notifier: Arc<dyn Notifier>) -> Self {
        SalesService { store, notifier }
    }

    /// Computes the plan for an inventory without persisting anything.
    pub fn preview(&self, input: &InventoryInput) -> ApiResult<PlanResult> {
        let inventory = input.validate()?;
        let result = compute(&inventory);
        debug!(
            total_weight = %result.total_weight,
            plan = %result.plan,
            "Plan preview"
        );
        Ok(result)
    }

    /// Validates, computes and stores a sale, then notifies in the background.
    ///
    /// The returned record is final once stored; notification failures are
    /// only logged.
    pub async fn contract(&self, request: ContractRequest) -> ApiResult<SaleRecord> {
        let customer = request.customer.validate()?;
        let inventory = request.inventory.validate()?;

        let record = self
            .store
            .create(NewSale::contract(customer, inventory))
            .await?;

        info!(
            sale_id = %record.id,
            plan = %record.plan.plan,
            total_weight = %record.plan.total_weight,
            devices = record.inventory.total_devices(),
            "Sale contracted"
        );

        let notifier = Arc::clone(&self.notifier);
        let sale = record.clone();
        tokio::spawn(async move {
            if let Err(e) = notifier.sale_created(&sale).await {
                warn!(sale_id = %sale.id, error = %e, "Sale notification failed");
            }
        });

        Ok(record)
    }

    /// Admin listing, or the e-mail lookup when `email` is given.
    pub async fn list(&self, params: &ListParams) -> ApiResult<Vec<SaleRecord>> {
        if let Some(email) = params.email.as_deref().filter(|e| !e.trim().is_empty()) {
            return self.find_by_email(email).await;
        }

        let query = params.to_query()?;
        let records = self.store.list(&query).await?;
        debug!(count = records.len(), sort = %query.sort, "Listed sales");
        Ok(records)
    }

    /// All sales of one customer e-mail, newest first.
    pub async fn find_by_email(&self, email: &str) -> ApiResult<Vec<SaleRecord>> {
        let email = validate_email(email)?;
        Ok(self.store.find_by_email(&email).await?)
    }

    pub async fn get(&self, id: &str) -> ApiResult<SaleRecord> {
        check_id(id)?;
        Ok(self.store.get(id).await?)
    }

    /// Applies an administrative edit. A new inventory recomputes the plan.
    pub async fn update(&self, id: &str, edit: SaleEdit) -> ApiResult<SaleRecord> {
        check_id(id)?;

        let update = SaleUpdate {
            customer: edit.customer.as_ref().map(CustomerInfo::validate).transpose()?,
            inventory: edit
                .inventory
                .as_ref()
                .map(InventoryInput::validate)
                .transpose()?,
        };

        let record = self.store.update(id, update).await?;
        info!(sale_id = %record.id, plan = %record.plan.plan, "Sale updated");
        Ok(record)
    }

    pub async fn delete(&self, id: &str) -> ApiResult<()> {
        check_id(id)?;
        self.store.delete(id).await?;
        info!(sale_id = %id, "Sale deleted");
        Ok(())
    }

    /// CSV of the listing, with the same filter and order.
    pub async fn export(&self, params: &ListParams) -> ApiResult<Vec<u8>> {
        let records = self.list(params).await?;
        info!(count = records.len(), "Exporting sales");
        Ok(sales_to_csv(&records))
    }
}

/// A malformed id cannot name a stored record.
fn check_id(id: &str) -> ApiResult<()> {
    validate_uuid(id).map_err(|_| ApiError::not_found(format!("Sale not found: {}", id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::notify::NotifyError;
    use async_trait::async_trait;
    use micks_core::PlanTier;
    use micks_db::{Database, DbConfig, DbError, DbResult};
    use std::time::Duration;
    use tokio::sync::mpsc;

    struct RecordingNotifier(mpsc::UnboundedSender<String>);

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn sale_created(&self, sale: &SaleRecord) -> Result<(), NotifyError> {
            let _ = self.0.send(sale.id.clone());
            Ok(())
        }
    }

    struct FailingNotifier;

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn sale_created(&self, _sale: &SaleRecord) -> Result<(), NotifyError> {
            Err(NotifyError::Timeout(Duration::from_secs(1)))
        }
    }

    /// Store whose backend is gone.
    struct UnavailableStore;

    #[async_trait]
    impl SaleStore for UnavailableStore {
        async fn create(&self, _sale: NewSale) -> DbResult<SaleRecord> {
            Err(DbError::ConnectionFailed("disk gone".into()))
        }
        async fn list(&self, _query: &SaleQuery) -> DbResult<Vec<SaleRecord>> {
            Err(DbError::PoolExhausted)
        }
        async fn get(&self, _id: &str) -> DbResult<SaleRecord> {
            Err(DbError::ConnectionFailed("disk gone".into()))
        }
        async fn update(&self, _id: &str, _update: SaleUpdate) -> DbResult<SaleRecord> {
            Err(DbError::TransactionFailed("locked".into()))
        }
        async fn delete(&self, _id: &str) -> DbResult<()> {
            Err(DbError::QueryFailed("locked".into()))
        }
        async fn find_by_email(&self, _email: &str) -> DbResult<Vec<SaleRecord>> {
            Err(DbError::PoolExhausted)
        }
        async fn count(&self) -> DbResult<u64> {
            Err(DbError::PoolExhausted)
        }
    }

    async fn service(notifier: Arc<dyn Notifier>) -> (SalesService, Database) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        (SalesService::new(db.sale_store(), notifier), db)
    }

    fn request(name: &str, cellphones: i64) -> ContractRequest {
        ContractRequest {
            customer: CustomerInfo {
                name: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
                phone: "(11) 99999-0000".to_string(),
            },
            inventory: InventoryInput {
                cellphones,
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn test_contract_stores_and_notifies() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (service, db) = service(Arc::new(RecordingNotifier(tx))).await;

        let record = service.contract(request("Ana Souza", 2)).await.unwrap();
        assert_eq!(record.plan.plan, PlanTier::Bronze);
        assert_eq!(record.customer.name, "Ana Souza");

        let notified = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(notified, record.id);
        assert_eq!(db.sales().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_contract_succeeds_when_notifier_fails() {
        let (service, db) = service(Arc::new(FailingNotifier)).await;

        let record = service.contract(request("Bruno", 1)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(service.get(&record.id).await.unwrap(), record);
        assert_eq!(db.sales().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_contract_trims_customer_fields() {
        let (service, _db) = service(Arc::new(FailingNotifier)).await;

        let mut req = request("Carla", 0);
        req.customer.name = "  Carla  ".to_string();
        let record = service.contract(req).await.unwrap();
        assert_eq!(record.customer.name, "Carla");
        assert_eq!(record.plan.plan, PlanTier::Prata);
    }

    #[tokio::test]
    async fn test_negative_counts_rejected_without_persisting() {
        let (service, db) = service(Arc::new(FailingNotifier)).await;

        let err = service.contract(request("Ana", -1)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(err.message.contains("cellphones"));

        let mut bad_email = request("Ana", 1);
        bad_email.customer.email = "not-an-email".to_string();
        assert_eq!(
            service.contract(bad_email).await.unwrap_err().code,
            ErrorCode::ValidationError
        );

        assert_eq!(db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_preview_never_persists() {
        let (service, db) = service(Arc::new(FailingNotifier)).await;

        let input = InventoryInput {
            cellphones: 2,
            computers: 1,
            gamer: true,
            ..Default::default()
        };
        let result = service.preview(&input).unwrap();
        assert_eq!(result.plan, PlanTier::Diamante);
        assert_eq!(result.total_weight.to_string(), "4.20");
        assert_eq!(db.sales().count().await.unwrap(), 0);

        let negative = InventoryInput {
            others: -5,
            ..Default::default()
        };
        assert!(service.preview(&negative).is_err());
    }

    #[test]
    fn test_list_params() {
        let params = ListParams {
            name: Some("  ana ".to_string()),
            sort: Some("name".to_string()),
            ..Default::default()
        };
        let query = params.to_query().unwrap();
        assert_eq!(query.name_contains.as_deref(), Some("ana"));
        assert_eq!(query.sort, SaleSort::by(SortKey::Name));

        let empty = ListParams {
            name: Some(String::new()),
            sort: Some(String::new()),
            dir: Some("asc".to_string()),
            ..Default::default()
        };
        let query = empty.to_query().unwrap();
        assert_eq!(query.name_contains, None);
        assert_eq!(query.sort.key, SortKey::CreatedAt);
        assert_eq!(query.sort.direction, SortDirection::Asc);

        let bad = ListParams {
            sort: Some("price".to_string()),
            ..Default::default()
        };
        assert_eq!(bad.to_query().unwrap_err().code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_list_filter_and_email_lookup() {
        let (service, _db) = service(Arc::new(FailingNotifier)).await;

        service.contract(request("Ana Souza", 1)).await.unwrap();
        service.contract(request("Bruno", 1)).await.unwrap();
        service.contract(request("Mariana", 1)).await.unwrap();

        let params = ListParams {
            name: Some("ANA".to_string()),
            sort: Some("name".to_string()),
            ..Default::default()
        };
        let names: Vec<_> = service
            .list(&params)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.customer.name)
            .collect();
        assert_eq!(names, vec!["Ana Souza", "Mariana"]);

        let by_email = ListParams {
            email: Some("BRUNO@example.com".to_string()),
            ..Default::default()
        };
        let found = service.list(&by_email).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].customer.name, "Bruno");
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let (service, _db) = service(Arc::new(FailingNotifier)).await;
        let record = service.contract(request("Ana", 1)).await.unwrap();

        let updated = service
            .update(
                &record.id,
                SaleEdit {
                    inventory: Some(InventoryInput {
                        cellphones: 4,
                        ..Default::default()
                    }),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.plan.plan, PlanTier::Diamante);
        assert_eq!(updated.customer, record.customer);

        let bad_edit = SaleEdit {
            inventory: Some(InventoryInput {
                tv_boxes: -1,
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(
            service.update(&record.id, bad_edit).await.unwrap_err().code,
            ErrorCode::ValidationError
        );

        service.delete(&record.id).await.unwrap();
        assert_eq!(
            service.delete(&record.id).await.unwrap_err().code,
            ErrorCode::NotFound
        );
        assert_eq!(
            service.get("not-a-uuid").await.unwrap_err().code,
            ErrorCode::NotFound
        );
    }

    #[tokio::test]
    async fn test_export_follows_listing() {
        let (service, _db) = service(Arc::new(FailingNotifier)).await;
        service.contract(request("Ana", 1)).await.unwrap();
        service.contract(request("Bruno", 1)).await.unwrap();

        let csv = service
            .export(&ListParams {
                name: Some("bru".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        let text = String::from_utf8(csv).unwrap();
        let lines: Vec<_> = text.split("\r\n").filter(|l| !l.is_empty()).collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("created_at,name,email"));
        assert!(lines[1].contains("Bruno"));
    }

    #[tokio::test]
    async fn test_storage_failure_is_unavailable() {
        let service = SalesService::new(Arc::new(UnavailableStore), Arc::new(FailingNotifier));

        let err = service.contract(request("Ana", 1)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::StorageUnavailable);
        assert!(!err.message.contains("disk gone"));

        let err = service.list(&ListParams::default()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::StorageUnavailable);
    }
}
