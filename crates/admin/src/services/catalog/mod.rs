//! Catalog integrity service.
//!
//! Owns the lifecycle rules for brands, categories, items and item
//! instances: validated writes, reference checks, and the delete gate that
//! refuses to remove protected records or records something still depends
//! on. Every routine is generic over [`CatalogEntity`]; the per-kind
//! differences live in the trait impls.
//!
//! Outcomes that the presentation layer renders (validation failures,
//! blocked deletes, already-absent records) are returned as values. Only
//! unknown ids and store failures are errors.

pub mod entity;
pub mod validation;

use std::sync::Arc;

use thiserror::Error;
use tracing::instrument;

use catalog_core::{EntityKind, StoredImage};

use crate::db::{CatalogStore, ListOrder, Projection, StoreError};
use crate::models::{
    Brand, BrandFilter, Category, CategoryFilter, Item, ItemFilter, ItemInstance,
    ItemInstanceFilter,
};

pub use entity::{CatalogEntity, MissingPolicy, Reference};
pub use validation::{FieldError, FormValues};

/// Times `confirm_delete` re-runs the gate after the store refuses a delete.
const DELETE_ATTEMPTS: usize = 3;

/// Errors returned by catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No record of this kind has the id.
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: i32 },

    /// The store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CatalogError {
    fn not_found<T: CatalogEntity>(id: T::Id) -> Self {
        Self::NotFound {
            kind: T::KIND,
            id: id.into(),
        }
    }
}

/// A rejected submission: every field error plus the escaped values to
/// re-populate the form with.
#[derive(Debug, Clone)]
pub struct ValidationFailed<F> {
    pub errors: Vec<FieldError>,
    pub values: F,
}

impl<F> ValidationFailed<F> {
    /// First error recorded for `field`, if any.
    #[must_use]
    pub fn error_for(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }
}

/// Result of a create or update.
#[derive(Debug, Clone)]
pub enum WriteOutcome<Id, F> {
    /// A new record was stored.
    Created(Id),
    /// An existing record was replaced.
    Updated(Id),
    /// A record with the same natural key already exists; nothing was written.
    Existing(Id),
    /// The submission was rejected; nothing was written.
    Invalid(ValidationFailed<F>),
}

impl<Id: Copy, F> WriteOutcome<Id, F> {
    /// Id of the record the operator should be sent to, unless invalid.
    pub const fn target(&self) -> Option<Id> {
        match self {
            Self::Created(id) | Self::Updated(id) | Self::Existing(id) => Some(*id),
            Self::Invalid(_) => None,
        }
    }
}

/// Why a delete was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    /// The record carries the protected flag.
    Protected,
    /// Other records still reference it.
    HasChildren,
}

/// A refused delete, with everything the confirmation view shows.
#[derive(Debug, Clone)]
pub struct Blocked<T: CatalogEntity> {
    pub record: T,
    pub children: Vec<T::Child>,
    pub reason: BlockReason,
}

impl<T: CatalogEntity> Blocked<T> {
    /// Protected records bounce back to their own detail page; records
    /// with children re-render the confirmation view instead.
    #[must_use]
    pub fn redirect_path(&self) -> Option<String> {
        match self.reason {
            BlockReason::Protected => Some(self.record.detail_path()),
            BlockReason::HasChildren => None,
        }
    }
}

/// Read-only verdict of the delete gate.
#[derive(Debug, Clone)]
pub enum DeleteGate<T: CatalogEntity> {
    ClearToDelete(T),
    Blocked(Blocked<T>),
    /// Nothing to delete; the operator goes back to the list.
    Absent,
}

/// Result of a committed delete.
#[derive(Debug, Clone)]
pub enum ConfirmOutcome<T: CatalogEntity> {
    Deleted(T),
    Blocked(Blocked<T>),
    Absent,
}

/// A category on the overview page with the number of items filed under it.
#[derive(Debug, Clone)]
pub struct CategorySummary {
    pub category: Category,
    pub item_count: usize,
}

/// Counts for the catalog overview page.
#[derive(Debug, Clone)]
pub struct CatalogOverview {
    pub categories: Vec<CategorySummary>,
    pub brand_count: usize,
    pub item_count: usize,
    pub instance_count: usize,
}

/// Stateless service over an injected [`CatalogStore`].
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
}

impl std::fmt::Debug for CatalogService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogService").finish_non_exhaustive()
    }
}

impl CatalogService {
    #[must_use]
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &dyn CatalogStore {
        self.store.as_ref()
    }

    /// Verify the store can serve requests.
    ///
    /// # Errors
    ///
    /// Returns the store's error when it is unreachable.
    pub async fn health_check(&self) -> Result<(), CatalogError> {
        Ok(self.store.health_check().await?)
    }

    /// Every record of a kind matching `filter`, ordered by label, without
    /// images.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Store` if the read fails.
    #[instrument(skip(self, filter), fields(kind = %T::KIND))]
    pub async fn list<T: CatalogEntity>(&self, filter: &T::Filter) -> Result<Vec<T>, CatalogError> {
        Ok(T::collection(self.store())
            .find_many(filter, ListOrder::ByLabel, Projection::Summary)
            .await?)
    }

    /// Fetch one record.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the id doesn't resolve.
    #[instrument(skip(self), fields(kind = %T::KIND))]
    pub async fn get<T: CatalogEntity>(&self, id: T::Id) -> Result<T, CatalogError> {
        T::collection(self.store())
            .find_by_id(id)
            .await?
            .ok_or_else(|| CatalogError::not_found::<T>(id))
    }

    /// Fetch one record with its references resolved and dependents listed.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the id doesn't resolve, and
    /// `CatalogError::Store` if the record or a lookup fails.
    #[instrument(skip(self), fields(kind = %T::KIND))]
    pub async fn detail<T: CatalogEntity>(&self, id: T::Id) -> Result<T::Detail, CatalogError> {
        let record = self.get::<T>(id).await?;
        Ok(T::resolve(self.store(), record).await?)
    }

    /// Validate and store a new record.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Store` if a read or the write fails.
    #[instrument(skip(self, form, image), fields(kind = %T::KIND))]
    pub async fn create<T: CatalogEntity>(
        &self,
        form: T::Form,
        image: Option<StoredImage>,
    ) -> Result<WriteOutcome<T::Id, T::Form>, CatalogError> {
        let mut draft = match self.validate::<T>(&form, image.as_ref()).await? {
            Ok(draft) => draft,
            Err(failed) => return Ok(WriteOutcome::Invalid(failed)),
        };

        let collection = T::collection(self.store());
        let identity = T::identity(&draft).map(|(_, filter)| filter);
        if let Some(filter) = &identity {
            if let Some(existing) = collection.find_one(filter).await? {
                tracing::info!(id = %existing.id(), "Record already exists, skipping insert");
                return Ok(WriteOutcome::Existing(existing.id()));
            }
        }

        if let Some(image) = image {
            T::set_image(&mut draft, image);
        }
        match collection.insert(draft).await {
            Ok(record) => {
                tracing::info!(id = %record.id(), "Record created");
                Ok(WriteOutcome::Created(record.id()))
            }
            // Another request stored the same natural key after our lookup.
            Err(StoreError::Duplicate(reason)) => {
                let existing = match &identity {
                    Some(filter) => collection.find_one(filter).await?,
                    None => None,
                };
                let existing = existing.ok_or(StoreError::Duplicate(reason))?;
                tracing::info!(id = %existing.id(), "Record created concurrently, skipping insert");
                Ok(WriteOutcome::Existing(existing.id()))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Validate and replace the mutable fields of an existing record.
    ///
    /// The protected flag is preserved, and so is the image when no new one
    /// is uploaded.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the id doesn't resolve, and
    /// `CatalogError::Store` if a read or the write fails.
    #[instrument(skip(self, form, image), fields(kind = %T::KIND))]
    pub async fn update<T: CatalogEntity>(
        &self,
        id: T::Id,
        form: T::Form,
        image: Option<StoredImage>,
    ) -> Result<WriteOutcome<T::Id, T::Form>, CatalogError> {
        let collection = T::collection(self.store());
        let existing = collection
            .find_by_id(id)
            .await?
            .ok_or_else(|| CatalogError::not_found::<T>(id))?;

        let mut draft = match self.validate::<T>(&form, image.as_ref()).await? {
            Ok(draft) => draft,
            Err(failed) => return Ok(WriteOutcome::Invalid(failed)),
        };

        let identity = T::identity(&draft);
        if let Some((field, filter)) = &identity {
            if let Some(holder) = collection.find_one(filter).await? {
                if holder.id() != id {
                    return Ok(key_taken(*field, &holder, &form));
                }
            }
        }

        if let Some(image) = image {
            T::set_image(&mut draft, image);
        }
        T::carry_over(&mut draft, &existing);

        match collection.replace_by_id(id, draft).await {
            Ok(Some(updated)) => {
                tracing::info!(id = %updated.id(), "Record updated");
                Ok(WriteOutcome::Updated(updated.id()))
            }
            Ok(None) => Err(CatalogError::not_found::<T>(id)),
            // Another record took the natural key after our lookup.
            Err(StoreError::Duplicate(reason)) => {
                if let Some((field, filter)) = &identity {
                    if let Some(holder) = collection.find_one(filter).await? {
                        return Ok(key_taken(*field, &holder, &form));
                    }
                }
                Err(StoreError::Duplicate(reason).into())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Decide whether a record may be deleted. Reads only.
    ///
    /// The record and its dependents are read concurrently; either read
    /// failing fails the whole check.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` for a missing item or item instance,
    /// and `CatalogError::Store` if either read fails.
    #[instrument(skip(self), fields(kind = %T::KIND))]
    pub async fn request_delete<T: CatalogEntity>(
        &self,
        id: T::Id,
    ) -> Result<DeleteGate<T>, CatalogError> {
        let store = self.store();
        let record = T::collection(store).find_by_id(id);
        let children = async {
            match T::child_filter(id) {
                Some(filter) => {
                    <T::Child as CatalogEntity>::collection(store)
                        .find_many(&filter, ListOrder::ByLabel, Projection::Summary)
                        .await
                }
                None => Ok(Vec::new()),
            }
        };
        let (record, children) = tokio::try_join!(record, children)?;

        let Some(record) = record else {
            return match T::MISSING_ON_DELETE {
                MissingPolicy::ReturnToList => Ok(DeleteGate::Absent),
                MissingPolicy::NotFound => Err(CatalogError::not_found::<T>(id)),
            };
        };

        let reason = if record.is_protected() {
            BlockReason::Protected
        } else if !children.is_empty() {
            BlockReason::HasChildren
        } else {
            return Ok(DeleteGate::ClearToDelete(record));
        };

        tracing::info!(?reason, children = children.len(), "Delete blocked");
        Ok(DeleteGate::Blocked(Blocked {
            record,
            children,
            reason,
        }))
    }

    /// Re-run the delete gate and delete if it is clear.
    ///
    /// The store refuses to remove a protected record, and refuses (with
    /// `StoreError::Conflict`) a record that gained a dependent after the
    /// gate ran. Either refusal re-runs the gate, so the caller sees the
    /// current verdict.
    ///
    /// # Errors
    ///
    /// Same as [`Self::request_delete`], plus `CatalogError::Store` if the
    /// delete itself fails or the record keeps changing under the gate.
    #[instrument(skip(self), fields(kind = %T::KIND))]
    pub async fn confirm_delete<T: CatalogEntity>(
        &self,
        id: T::Id,
    ) -> Result<ConfirmOutcome<T>, CatalogError> {
        for _ in 0..DELETE_ATTEMPTS {
            let record = match self.request_delete::<T>(id).await? {
                DeleteGate::ClearToDelete(record) => record,
                DeleteGate::Blocked(blocked) => return Ok(ConfirmOutcome::Blocked(blocked)),
                DeleteGate::Absent => return Ok(ConfirmOutcome::Absent),
            };
            match T::collection(self.store()).delete_by_id(id).await {
                Ok(true) => {
                    tracing::info!(%id, "Record deleted");
                    return Ok(ConfirmOutcome::Deleted(record));
                }
                Ok(false) => tracing::info!(%id, "Record changed before delete, re-checking"),
                Err(StoreError::Conflict(reason)) => {
                    tracing::info!(%id, %reason, "Dependent added before delete, re-checking");
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(StoreError::Conflict(format!("{} {id} kept changing during delete", T::KIND)).into())
    }

    /// Set or clear the protected flag.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the id doesn't resolve.
    #[instrument(skip(self), fields(kind = %T::KIND))]
    pub async fn set_protected<T: CatalogEntity>(
        &self,
        id: T::Id,
        protected: bool,
    ) -> Result<T, CatalogError> {
        let collection = T::collection(self.store());
        let existing = collection
            .find_by_id(id)
            .await?
            .ok_or_else(|| CatalogError::not_found::<T>(id))?;

        let mut draft = existing.to_draft();
        T::set_protected(&mut draft, protected);
        let updated = collection
            .replace_by_id(id, draft)
            .await?
            .ok_or_else(|| CatalogError::not_found::<T>(id))?;
        tracing::info!(protected, "Protected flag changed");
        Ok(updated)
    }

    /// Categories with computed item counts, plus totals per kind.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Store` if any read fails.
    #[instrument(skip(self))]
    pub async fn overview(&self) -> Result<CatalogOverview, CatalogError> {
        let store = self.store();
        let category_filter = CategoryFilter::default();
        let item_filter = ItemFilter::default();
        let instance_filter = ItemInstanceFilter::default();
        let summary = Projection::Summary;
        let (categories, brands, items, instances) = tokio::try_join!(
            store
                .categories()
                .find_many(&category_filter, ListOrder::ByLabel, summary),
            store
                .brands()
                .find_many(&BrandFilter, ListOrder::Unsorted, summary),
            store
                .items()
                .find_many(&item_filter, ListOrder::Unsorted, summary),
            store
                .item_instances()
                .find_many(&instance_filter, ListOrder::Unsorted, summary),
        )?;

        let categories = categories
            .into_iter()
            .map(|category| {
                let item_count = items
                    .iter()
                    .filter(|item| item.category_ids.contains(&category.id))
                    .count();
                CategorySummary {
                    category,
                    item_count,
                }
            })
            .collect();

        Ok(CatalogOverview {
            categories,
            brand_count: brands.len(),
            item_count: items.len(),
            instance_count: instances.len(),
        })
    }

    /// Full validation of a submission: field rules, upload type and
    /// reference existence. Every error is collected before returning.
    async fn validate<T: CatalogEntity>(
        &self,
        form: &T::Form,
        image: Option<&StoredImage>,
    ) -> Result<Result<T::Draft, ValidationFailed<T::Form>>, CatalogError> {
        let (draft, mut errors) = match T::validate(form) {
            Ok(draft) => (Some(draft), Vec::new()),
            Err(errors) => (None, errors),
        };

        if let Some(image) = image {
            if !image.is_image() {
                errors.push(FieldError::new("image", "Uploaded file must be an image"));
            }
        }

        errors.extend(self.check_references(&T::references(form)).await?);

        match draft {
            Some(draft) if errors.is_empty() => Ok(Ok(draft)),
            _ => {
                tracing::debug!(errors = errors.len(), "Submission rejected");
                Ok(Err(ValidationFailed {
                    errors,
                    values: form.escaped(),
                }))
            }
        }
    }

    /// A field error for every reference that doesn't resolve.
    async fn check_references(
        &self,
        references: &[Reference],
    ) -> Result<Vec<FieldError>, CatalogError> {
        let store = self.store();
        let lookups = references.iter().map(|reference| async move {
            let exists = match *reference {
                Reference::Brand(id) => store.brands().find_by_id(id).await?.is_some(),
                Reference::Category(id) => store.categories().find_by_id(id).await?.is_some(),
                Reference::Item(id) => store.items().find_by_id(id).await?.is_some(),
            };
            Ok::<_, StoreError>((*reference, exists))
        });
        let resolved = futures::future::try_join_all(lookups).await?;

        Ok(resolved
            .into_iter()
            .filter(|(_, exists)| !exists)
            .map(|(reference, _)| {
                let message = match reference {
                    Reference::Brand(id) => format!("Brand {id} does not exist"),
                    Reference::Category(id) => format!("Category {id} does not exist"),
                    Reference::Item(id) => format!("Product {id} does not exist"),
                };
                FieldError::new(reference.field(), message)
            })
            .collect())
    }
}

/// Rejection for a natural key already held by `holder`.
fn key_taken<T: CatalogEntity>(
    field: &'static str,
    holder: &T,
    form: &T::Form,
) -> WriteOutcome<T::Id, T::Form> {
    WriteOutcome::Invalid(ValidationFailed {
        errors: vec![FieldError::new(
            field,
            format!("{} is already used by another record", holder.label()),
        )],
        values: form.escaped(),
    })
}

/// Resolve a kind name and id from the operator CLI and toggle protection.
///
/// # Errors
///
/// Returns `CatalogError::NotFound` if the id doesn't resolve.
pub async fn set_protected_by_kind(
    service: &CatalogService,
    kind: EntityKind,
    id: i32,
    protected: bool,
) -> Result<String, CatalogError> {
    let path = match kind {
        EntityKind::Brand => service
            .set_protected::<Brand>(id.into(), protected)
            .await?
            .detail_path(),
        EntityKind::Category => service
            .set_protected::<Category>(id.into(), protected)
            .await?
            .detail_path(),
        EntityKind::Item => service
            .set_protected::<Item>(id.into(), protected)
            .await?
            .detail_path(),
        EntityKind::ItemInstance => service
            .set_protected::<ItemInstance>(id.into(), protected)
            .await?
            .detail_path(),
    };
    Ok(path)
}
