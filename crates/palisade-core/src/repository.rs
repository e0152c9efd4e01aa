//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Every multi-row write (company
//! with children, role with its grants, user with its role set) must be
//! atomic: a failed association cancels the parent write. List queries
//! count matching non-deleted rows before applying the page window, in
//! the same request.

use std::collections::HashMap;

use uuid::Uuid;

use crate::error::PalisadeResult;
use crate::models::company::{Company, CompanyDraft};
use crate::models::permission::{Permission, PermissionChange, PermissionDraft};
use crate::models::role::{Role, RoleChange, RoleDraft};
use crate::models::user::{User, UserChange, UserDraft};
use crate::query::{PageRequest, Paginated};

/// Raw filter map as received from the transport layer. Implementations
/// resolve it against the entity's static whitelist; unknown keys never
/// reach the query text.
pub type FilterMap = HashMap<String, String>;

pub trait CompanyRepository: Send + Sync {
    /// Persist a company with its address and contacts in one
    /// transaction and return the stored entity.
    fn create(&self, draft: &CompanyDraft) -> impl Future<Output = PalisadeResult<Company>> + Send;

    fn get_by_id(
        &self,
        id: Uuid,
        include_deleted: bool,
    ) -> impl Future<Output = PalisadeResult<Company>> + Send;

    fn get_by_tax_id(
        &self,
        tax_id: &str,
        include_deleted: bool,
    ) -> impl Future<Output = PalisadeResult<Company>> + Send;

    /// Cheap existence probe over non-deleted companies; does not
    /// hydrate the row.
    fn exists(&self, id: Uuid) -> impl Future<Output = PalisadeResult<bool>> + Send;

    /// Full-row replace. Children are hard-deleted and re-inserted in
    /// the same transaction; `created_at` is left untouched.
    fn update(&self, draft: &CompanyDraft) -> impl Future<Output = PalisadeResult<Company>> + Send;

    /// Soft-delete. Deleting a missing or already-deleted company is
    /// `NotFound`.
    fn delete(&self, id: Uuid) -> impl Future<Output = PalisadeResult<()>> + Send;

    /// Clear the soft-delete marker. Restoring a missing or non-deleted
    /// company is `NotFound`.
    fn restore(&self, id: Uuid) -> impl Future<Output = PalisadeResult<()>> + Send;

    fn list(
        &self,
        filters: &FilterMap,
        page: PageRequest,
    ) -> impl Future<Output = PalisadeResult<Paginated<Company>>> + Send;
}

pub trait PermissionRepository: Send + Sync {
    fn create(
        &self,
        draft: &PermissionDraft,
    ) -> impl Future<Output = PalisadeResult<Permission>> + Send;

    fn get_by_id(&self, id: Uuid) -> impl Future<Output = PalisadeResult<Permission>> + Send;

    /// Probe for a permission with this (already normalized) name in the
    /// company, optionally ignoring one row (the row being updated).
    fn name_exists(
        &self,
        company_id: Uuid,
        name: &str,
        exclude: Option<Uuid>,
    ) -> impl Future<Output = PalisadeResult<bool>> + Send;

    /// Resolve a set of permission IDs, optionally constrained to one
    /// company. Returns only the rows that exist (and match the
    /// company); callers compare set sizes to detect dangling or
    /// foreign-tenant references.
    fn get_by_ids(
        &self,
        ids: &[Uuid],
        company_id: Option<Uuid>,
    ) -> impl Future<Output = PalisadeResult<Vec<Permission>>> + Send;

    fn update(
        &self,
        id: Uuid,
        change: &PermissionChange,
    ) -> impl Future<Output = PalisadeResult<Permission>> + Send;

    /// Hard delete; grant edges referencing the permission are removed
    /// with it.
    fn delete(&self, id: Uuid) -> impl Future<Output = PalisadeResult<()>> + Send;

    fn list(
        &self,
        filters: &FilterMap,
        page: PageRequest,
        company_id: Uuid,
    ) -> impl Future<Output = PalisadeResult<Paginated<Permission>>> + Send;
}

pub trait RoleRepository: Send + Sync {
    /// Persist the role row and one grant edge per permission as a
    /// single transaction. Commits only if every permission exists in
    /// the role's company at commit time.
    fn create(&self, draft: &RoleDraft) -> impl Future<Output = PalisadeResult<Role>> + Send;

    fn get_by_id(&self, id: Uuid) -> impl Future<Output = PalisadeResult<Role>> + Send;

    /// Probe for a non-deleted role with this (already normalized) name
    /// in the company, optionally ignoring one row.
    fn name_exists(
        &self,
        company_id: Uuid,
        name: &str,
        exclude: Option<Uuid>,
    ) -> impl Future<Output = PalisadeResult<bool>> + Send;

    /// Resolve a set of role IDs among non-deleted roles, optionally
    /// constrained to one company; same shortfall contract as
    /// [`PermissionRepository::get_by_ids`].
    fn get_by_ids(
        &self,
        ids: &[Uuid],
        company_id: Option<Uuid>,
    ) -> impl Future<Output = PalisadeResult<Vec<Role>>> + Send;

    /// Full-row replace including the complete grant set, atomically.
    fn update(
        &self,
        id: Uuid,
        change: &RoleChange,
    ) -> impl Future<Output = PalisadeResult<Role>> + Send;

    /// Append grant edges for the given permissions.
    fn associate_permissions(
        &self,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> impl Future<Output = PalisadeResult<()>> + Send;

    /// Soft-delete. Grant edges are kept with the row.
    fn delete(&self, id: Uuid) -> impl Future<Output = PalisadeResult<()>> + Send;

    fn list(
        &self,
        filters: &FilterMap,
        page: PageRequest,
        company_id: Uuid,
    ) -> impl Future<Output = PalisadeResult<Paginated<Role>>> + Send;
}

pub trait UserRepository: Send + Sync {
    /// Persist the user row and one `has_role` edge per role as a
    /// single transaction. Commits only if every role exists, is not
    /// deleted, and belongs to the user's company at commit time.
    fn create(&self, draft: &UserDraft) -> impl Future<Output = PalisadeResult<User>> + Send;

    fn get_by_id(&self, id: Uuid) -> impl Future<Output = PalisadeResult<User>> + Send;

    fn get_by_email(
        &self,
        company_id: Uuid,
        email: &str,
    ) -> impl Future<Output = PalisadeResult<User>> + Send;

    /// Probe for a non-deleted user with this email in the company,
    /// optionally ignoring one row (the row being updated).
    fn email_exists(
        &self,
        company_id: Uuid,
        email: &str,
        exclude: Option<Uuid>,
    ) -> impl Future<Output = PalisadeResult<bool>> + Send;

    /// Partial update; `role_ids: Some(..)` replaces the full role set
    /// in the same transaction.
    fn update(
        &self,
        id: Uuid,
        change: &UserChange,
    ) -> impl Future<Output = PalisadeResult<User>> + Send;

    /// Append `has_role` edges for the given roles.
    fn associate_roles(
        &self,
        user_id: Uuid,
        role_ids: &[Uuid],
    ) -> impl Future<Output = PalisadeResult<()>> + Send;

    /// Soft-delete.
    fn delete(&self, id: Uuid) -> impl Future<Output = PalisadeResult<()>> + Send;

    fn list(
        &self,
        filters: &FilterMap,
        page: PageRequest,
        company_id: Uuid,
    ) -> impl Future<Output = PalisadeResult<Paginated<User>>> + Send;
}
