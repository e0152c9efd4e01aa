//! Integration tests for the permission catalog and role graph services.

use std::collections::HashMap;

use palisade_core::dto::company::{
    CreateCompanyAddressDto, CreateCompanyContactDto, CreateCompanyDto,
};
use palisade_core::dto::permission::CreatePermissionDto;
use palisade_core::dto::role::CreateRoleDto;
use palisade_core::error::PalisadeError;
use palisade_core::id::IdGenerator;
use palisade_db::repository::{
    SurrealCompanyRepository, SurrealPermissionRepository, SurrealRoleRepository,
};
use palisade_service::company::CompanyService;
use palisade_service::config::ServiceConfig;
use palisade_service::permission::PermissionService;
use palisade_service::role::RoleService;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

type Companies = CompanyService<SurrealCompanyRepository<Db>>;
type Permissions =
    PermissionService<SurrealPermissionRepository<Db>, SurrealCompanyRepository<Db>>;
type Roles = RoleService<
    SurrealRoleRepository<Db>,
    SurrealPermissionRepository<Db>,
    SurrealCompanyRepository<Db>,
>;

/// Spin up the full service stack over one in-memory database and
/// create a company to work in.
async fn setup() -> (Companies, Permissions, Roles, Uuid) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    palisade_db::run_migrations(&db).await.unwrap();

    let ids = IdGenerator::new(1).unwrap();
    let config = ServiceConfig::default();

    let companies = CompanyService::new(
        SurrealCompanyRepository::new(db.clone()),
        ids.clone(),
        config.clone(),
    );
    let permissions = PermissionService::new(
        SurrealPermissionRepository::new(db.clone()),
        SurrealCompanyRepository::new(db.clone()),
        ids.clone(),
        config.clone(),
    );
    let roles = RoleService::new(
        SurrealRoleRepository::new(db.clone()),
        SurrealPermissionRepository::new(db.clone()),
        SurrealCompanyRepository::new(db),
        ids,
        config,
    );

    let company = companies.create(company_dto("Test Co", "12345678000190")).await.unwrap();
    (companies, permissions, roles, company.id)
}

fn company_dto(name: &str, tax_id: &str) -> CreateCompanyDto {
    CreateCompanyDto {
        name: name.into(),
        legal_name: format!("{name} Ltd"),
        description: None,
        tax_id: tax_id.into(),
        enabled: true,
        email: None,
        address: CreateCompanyAddressDto {
            street: "Main St".into(),
            street_number: None,
            street_complement: None,
            city: "Springfield".into(),
            state: "IL".into(),
            postal_code: "62701".into(),
            country: "US".into(),
        },
        contacts: vec![CreateCompanyContactDto {
            name: "Jo".into(),
            email: None,
            phone: None,
            tax_id: None,
        }],
    }
}

fn permission_dto(company_id: Uuid, name: &str) -> CreatePermissionDto {
    CreatePermissionDto {
        name: name.into(),
        company_id,
        description: None,
    }
}

fn role_dto(company_id: Uuid, name: &str, permission_ids: Vec<Uuid>) -> CreateRoleDto {
    CreateRoleDto {
        name: name.into(),
        company_id,
        description: None,
        permission_ids,
        can_edit: false,
        can_delete: false,
        is_admin: false,
    }
}

// ---------------------------------------------------------------------------
// Permission catalog
// ---------------------------------------------------------------------------

#[tokio::test]
async fn permission_names_are_normalized_and_tenant_unique() {
    let (companies, permissions, _, company_a) = setup().await;

    let created = permissions
        .create(permission_dto(company_a, "  reports.read "))
        .await
        .unwrap();
    assert_eq!(created.name, "REPORTS.READ");

    // The same name (in any casing) is taken within the company...
    let err = permissions
        .create(permission_dto(company_a, "Reports.Read"))
        .await
        .unwrap_err();
    assert!(matches!(err, PalisadeError::NameInUse { .. }));

    // ...but free in another company.
    let company_b = companies
        .create(company_dto("Other Co", "98765432000110"))
        .await
        .unwrap();
    permissions
        .create(permission_dto(company_b.id, "REPORTS.READ"))
        .await
        .unwrap();
}

#[tokio::test]
async fn permission_create_requires_an_active_company() {
    let (companies, permissions, _, company_id) = setup().await;

    let err = permissions
        .create(permission_dto(Uuid::now_v7(), "ORPHAN"))
        .await
        .unwrap_err();
    assert!(matches!(err, PalisadeError::CompanyNotFound));

    // A soft-deleted company cannot take new permissions either.
    companies.delete(company_id).await.unwrap();
    let err = permissions
        .create(permission_dto(company_id, "LATE"))
        .await
        .unwrap_err();
    assert!(matches!(err, PalisadeError::CompanyNotFound));
}

#[tokio::test]
async fn permission_update_rechecks_uniqueness_only_on_rename() {
    let (_, permissions, _, company_id) = setup().await;

    let read = permissions
        .create(permission_dto(company_id, "READ"))
        .await
        .unwrap();
    permissions
        .create(permission_dto(company_id, "WRITE"))
        .await
        .unwrap();

    // Same canonical name: allowed, description may still change.
    let mut dto = permission_dto(company_id, " read ");
    dto.description = Some("fresh description".into());
    let updated = permissions.update(dto, read.id).await.unwrap();
    assert_eq!(updated.name, "READ");
    assert_eq!(updated.description.as_deref(), Some("fresh description"));

    // Renaming onto a taken name is rejected.
    let err = permissions
        .update(permission_dto(company_id, "write"), read.id)
        .await
        .unwrap_err();
    assert!(matches!(err, PalisadeError::NameInUse { .. }));
}

#[tokio::test]
async fn permission_list_is_company_scoped() {
    let (companies, permissions, _, company_a) = setup().await;
    let company_b = companies
        .create(company_dto("Other Co", "98765432000110"))
        .await
        .unwrap();

    for name in ["ALPHA", "BETA", "GAMMA"] {
        permissions.create(permission_dto(company_a, name)).await.unwrap();
    }
    permissions
        .create(permission_dto(company_b.id, "DELTA"))
        .await
        .unwrap();

    let page = permissions
        .find_all(&HashMap::new(), 1, 10, company_a)
        .await
        .unwrap();
    assert_eq!(page.page_info.total_items, 3);

    let mut filters = HashMap::new();
    filters.insert("name".to_string(), "eta".to_string());
    let page = permissions
        .find_all(&filters, 1, 10, company_a)
        .await
        .unwrap();
    assert_eq!(page.page_info.total_items, 1, "substring match on BETA");
}

// ---------------------------------------------------------------------------
// Role graph
// ---------------------------------------------------------------------------

#[tokio::test]
async fn role_names_are_normalized_and_tenant_unique() {
    let (_, permissions, roles, company_id) = setup().await;

    let read = permissions
        .create(permission_dto(company_id, "READ"))
        .await
        .unwrap();

    let created = roles
        .create(role_dto(company_id, " admin ", vec![read.id]))
        .await
        .unwrap();
    assert_eq!(created.name, "ADMIN");

    let fetched = roles.find_by_id(created.id).await.unwrap();
    assert_eq!(fetched.name, "ADMIN");

    let err = roles
        .create(role_dto(company_id, "ADMIN", vec![read.id]))
        .await
        .unwrap_err();
    assert!(matches!(err, PalisadeError::NameInUse { .. }));
}

#[tokio::test]
async fn role_requires_at_least_one_permission() {
    let (_, _, roles, company_id) = setup().await;

    let err = roles
        .create(role_dto(company_id, "EMPTY", vec![]))
        .await
        .unwrap_err();
    assert!(matches!(err, PalisadeError::MustHavePermissions));
    assert_eq!(err.http_status(), 422);
}

#[tokio::test]
async fn role_referential_closure_leaves_no_orphan_row() {
    let (_, permissions, roles, company_id) = setup().await;

    let p1 = permissions.create(permission_dto(company_id, "P1")).await.unwrap();
    let p2 = permissions.create(permission_dto(company_id, "P2")).await.unwrap();

    let err = roles
        .create(role_dto(company_id, "GHOST", vec![p1.id, p2.id, Uuid::now_v7()]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PalisadeError::ReferencedNotFound { entity: "permissions" }
    ));

    // No role row was persisted.
    let page = roles
        .find_all(&HashMap::new(), 1, 10, company_id)
        .await
        .unwrap();
    assert_eq!(page.page_info.total_items, 0);
}

#[tokio::test]
async fn role_rejects_foreign_tenant_permissions() {
    let (companies, permissions, roles, company_a) = setup().await;
    let company_b = companies
        .create(company_dto("Other Co", "98765432000110"))
        .await
        .unwrap();

    let foreign = permissions
        .create(permission_dto(company_b.id, "FOREIGN"))
        .await
        .unwrap();

    let err = roles
        .create(role_dto(company_a, "SMUGGLER", vec![foreign.id]))
        .await
        .unwrap_err();
    assert!(matches!(err, PalisadeError::ReferencedNotFound { .. }));
}

#[tokio::test]
async fn role_rejects_duplicated_permission_ids() {
    let (_, permissions, roles, company_id) = setup().await;

    let read = permissions
        .create(permission_dto(company_id, "READ"))
        .await
        .unwrap();

    // A duplicated id resolves to fewer rows than requested.
    let err = roles
        .create(role_dto(company_id, "DOUBLE", vec![read.id, read.id]))
        .await
        .unwrap_err();
    assert!(matches!(err, PalisadeError::ReferencedNotFound { .. }));
}

#[tokio::test]
async fn role_update_replaces_the_permission_set() {
    let (_, permissions, roles, company_id) = setup().await;

    let read = permissions.create(permission_dto(company_id, "READ")).await.unwrap();
    let write = permissions.create(permission_dto(company_id, "WRITE")).await.unwrap();

    let role = roles
        .create(role_dto(company_id, "EDITOR", vec![read.id]))
        .await
        .unwrap();

    let mut dto = role_dto(company_id, "EDITOR", vec![write.id]);
    dto.can_delete = true;
    let updated = roles.update(dto, role.id).await.unwrap();

    assert!(updated.can_delete);
    assert_eq!(updated.permissions.len(), 1);
    assert_eq!(updated.permissions[0].name, "WRITE");
}

#[tokio::test]
async fn role_update_keeps_uniqueness_rule_but_allows_own_name() {
    let (_, permissions, roles, company_id) = setup().await;

    let read = permissions.create(permission_dto(company_id, "READ")).await.unwrap();
    let editor = roles
        .create(role_dto(company_id, "EDITOR", vec![read.id]))
        .await
        .unwrap();
    roles
        .create(role_dto(company_id, "VIEWER", vec![read.id]))
        .await
        .unwrap();

    // Keeping its own name passes the uniqueness check.
    roles
        .update(role_dto(company_id, "editor", vec![read.id]), editor.id)
        .await
        .unwrap();

    let err = roles
        .update(role_dto(company_id, "VIEWER", vec![read.id]), editor.id)
        .await
        .unwrap_err();
    assert!(matches!(err, PalisadeError::NameInUse { .. }));
}

#[tokio::test]
async fn associate_permissions_validates_tenant_closure() {
    let (companies, permissions, roles, company_a) = setup().await;
    let company_b = companies
        .create(company_dto("Other Co", "98765432000110"))
        .await
        .unwrap();

    let read = permissions.create(permission_dto(company_a, "READ")).await.unwrap();
    let write = permissions.create(permission_dto(company_a, "WRITE")).await.unwrap();
    let foreign = permissions
        .create(permission_dto(company_b.id, "FOREIGN"))
        .await
        .unwrap();

    let role = roles
        .create(role_dto(company_a, "EDITOR", vec![read.id]))
        .await
        .unwrap();

    let err = roles
        .associate_permissions(role.id, &[foreign.id])
        .await
        .unwrap_err();
    assert!(matches!(err, PalisadeError::ReferencedNotFound { .. }));

    let updated = roles
        .associate_permissions(role.id, &[write.id])
        .await
        .unwrap();
    assert_eq!(updated.permissions.len(), 2);
}

#[tokio::test]
async fn deleted_role_is_gone_from_reads_and_lookups() {
    let (_, permissions, roles, company_id) = setup().await;

    let read = permissions.create(permission_dto(company_id, "READ")).await.unwrap();
    let role = roles
        .create(role_dto(company_id, "TEMP", vec![read.id]))
        .await
        .unwrap();

    roles.delete(role.id).await.unwrap();

    let err = roles.find_by_id(role.id).await.unwrap_err();
    assert!(matches!(err, PalisadeError::NotFound { .. }));

    let resolved = roles.find_all_by_ids(&[role.id]).await.unwrap();
    assert!(resolved.is_empty());

    // The freed name is immediately reusable.
    roles
        .create(role_dto(company_id, "TEMP", vec![read.id]))
        .await
        .unwrap();
}
