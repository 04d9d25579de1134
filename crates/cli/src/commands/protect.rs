//! Record protection commands.
//!
//! Protection is the only way to mark a record as undeletable; the web
//! forms never touch the flag.
//!
//! # Usage
//!
//! ```bash
//! catalog-cli protect category 2
//! catalog-cli unprotect category 2
//! ```

use catalog_admin::services::catalog::set_protected_by_kind;
use catalog_core::EntityKind;

use super::{CommandError, catalog_service};

/// Set or clear the protected flag on one record.
///
/// # Errors
///
/// Returns an error if the database can't be reached or the record doesn't
/// exist.
pub async fn run(kind: EntityKind, id: i32, protected: bool) -> Result<(), CommandError> {
    let service = catalog_service().await?;
    let path = set_protected_by_kind(&service, kind, id, protected).await?;

    if protected {
        tracing::info!(%kind, id, %path, "Record protected");
    } else {
        tracing::info!(%kind, id, %path, "Record unprotected");
    }
    Ok(())
}
