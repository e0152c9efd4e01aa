//! Integration tests for the User repository using in-memory SurrealDB.

use std::collections::HashMap;

use palisade_core::models::company::{
    CompanyAddressDraft, CompanyContactDraft, CompanyDraft,
};
use palisade_core::models::permission::PermissionDraft;
use palisade_core::models::role::RoleDraft;
use palisade_core::models::user::{UserChange, UserDraft};
use palisade_core::query::PageRequest;
use palisade_core::repository::{
    CompanyRepository, PermissionRepository, RoleRepository, UserRepository,
};
use palisade_db::repository::{
    SurrealCompanyRepository, SurrealPermissionRepository, SurrealRoleRepository,
    SurrealUserRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

/// Spin up in-memory DB, run migrations, create company + role.
async fn setup() -> (Surreal<Db>, Uuid, Uuid) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    palisade_db::run_migrations(&db).await.unwrap();

    let company_id = create_company(&db, "12345678000190").await;
    let role_id = create_role(&db, company_id, "MEMBER").await;
    (db, company_id, role_id)
}

async fn create_company(db: &Surreal<Db>, tax_id: &str) -> Uuid {
    let repo = SurrealCompanyRepository::new(db.clone());
    let company = repo
        .create(&CompanyDraft {
            id: Uuid::now_v7(),
            name: "Test Co".into(),
            legal_name: "Test Co Ltd".into(),
            description: None,
            tax_id: tax_id.into(),
            email: None,
            enabled: true,
            address: Some(CompanyAddressDraft {
                id: Uuid::now_v7(),
                street: "Main St".into(),
                street_number: None,
                street_complement: None,
                city: "Springfield".into(),
                state: "IL".into(),
                postal_code: "62701".into(),
                country: "US".into(),
            }),
            contacts: vec![CompanyContactDraft {
                id: Uuid::now_v7(),
                name: "Jo".into(),
                email: None,
                phone: None,
                tax_id: None,
            }],
        })
        .await
        .unwrap();
    company.id
}

async fn create_role(db: &Surreal<Db>, company_id: Uuid, name: &str) -> Uuid {
    let permission_repo = SurrealPermissionRepository::new(db.clone());
    let permission = permission_repo
        .create(&PermissionDraft {
            id: Uuid::now_v7(),
            company_id,
            name: format!("{name}.BASE"),
            description: None,
        })
        .await
        .unwrap();

    let role_repo = SurrealRoleRepository::new(db.clone());
    let role = role_repo
        .create(&RoleDraft {
            id: Uuid::now_v7(),
            company_id,
            name: name.into(),
            description: None,
            can_edit: false,
            can_delete: false,
            is_admin: false,
            permission_ids: vec![permission.id],
        })
        .await
        .unwrap();
    role.id
}

fn user_draft(company_id: Uuid, email: &str, role_ids: Vec<Uuid>) -> UserDraft {
    UserDraft {
        id: Uuid::now_v7(),
        company_id,
        full_name: "Alice Example".into(),
        email: email.into(),
        password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHQ$aGFzaGhhc2g".into(),
        enabled: true,
        role_ids,
    }
}

#[tokio::test]
async fn create_and_get_user_hydrates_company_and_roles() {
    let (db, company_id, role_id) = setup().await;
    let repo = SurrealUserRepository::new(db);

    let user = repo
        .create(&user_draft(company_id, "alice@example.com", vec![role_id]))
        .await
        .unwrap();

    assert_eq!(user.email, "alice@example.com");
    assert_eq!(user.company.id, company_id, "owning company is eager-loaded");
    assert_eq!(user.company.contacts.len(), 1);
    assert_eq!(user.roles.len(), 1);
    assert_eq!(user.roles[0].name, "MEMBER");
    assert_eq!(
        user.roles[0].permissions.len(),
        1,
        "roles hydrate with their permissions"
    );

    let fetched = repo.get_by_id(user.id).await.unwrap();
    assert_eq!(fetched.id, user.id);
    assert_eq!(fetched.roles.len(), 1);
}

#[tokio::test]
async fn user_create_rolls_back_when_a_role_is_missing() {
    let (db, company_id, role_id) = setup().await;
    let repo = SurrealUserRepository::new(db);

    let draft = user_draft(
        company_id,
        "ghost@example.com",
        vec![role_id, Uuid::now_v7()],
    );
    assert!(repo.create(&draft).await.is_err());
    assert!(repo.get_by_id(draft.id).await.is_err(), "transaction rolled back");
}

#[tokio::test]
async fn user_create_rejects_foreign_tenant_roles() {
    let (db, company_a, _) = setup().await;
    let company_b = create_company(&db, "98765432000110").await;
    let foreign_role = create_role(&db, company_b, "FOREIGN").await;
    let repo = SurrealUserRepository::new(db);

    let draft = user_draft(company_a, "smuggler@example.com", vec![foreign_role]);
    assert!(repo.create(&draft).await.is_err());
    assert!(repo.get_by_id(draft.id).await.is_err());
}

#[tokio::test]
async fn user_create_rejects_soft_deleted_roles() {
    let (db, company_id, role_id) = setup().await;
    let role_repo = SurrealRoleRepository::new(db.clone());
    role_repo.delete(role_id).await.unwrap();

    let repo = SurrealUserRepository::new(db);
    let draft = user_draft(company_id, "late@example.com", vec![role_id]);
    assert!(repo.create(&draft).await.is_err());
}

#[tokio::test]
async fn email_exists_scopes_and_excludes() {
    let (db, company_a, role_id) = setup().await;
    let company_b = create_company(&db, "98765432000110").await;
    let repo = SurrealUserRepository::new(db);

    let user = repo
        .create(&user_draft(company_a, "alice@example.com", vec![role_id]))
        .await
        .unwrap();

    assert!(repo.email_exists(company_a, "alice@example.com", None).await.unwrap());
    assert!(
        !repo.email_exists(company_b, "alice@example.com", None).await.unwrap(),
        "email uniqueness is tenant-scoped"
    );
    assert!(
        !repo
            .email_exists(company_a, "alice@example.com", Some(user.id))
            .await
            .unwrap()
    );

    repo.delete(user.id).await.unwrap();
    assert!(
        !repo.email_exists(company_a, "alice@example.com", None).await.unwrap(),
        "soft-deleted users free their email"
    );
}

#[tokio::test]
async fn duplicate_email_hits_the_index() {
    let (db, company_id, role_id) = setup().await;
    let repo = SurrealUserRepository::new(db);

    repo.create(&user_draft(company_id, "dup@example.com", vec![role_id]))
        .await
        .unwrap();
    assert!(
        repo.create(&user_draft(company_id, "dup@example.com", vec![role_id]))
            .await
            .is_err()
    );
}

#[tokio::test]
async fn get_by_email() {
    let (db, company_id, role_id) = setup().await;
    let repo = SurrealUserRepository::new(db);

    let user = repo
        .create(&user_draft(company_id, "alice@example.com", vec![role_id]))
        .await
        .unwrap();

    let fetched = repo.get_by_email(company_id, "alice@example.com").await.unwrap();
    assert_eq!(fetched.id, user.id);
    assert!(repo.get_by_email(company_id, "nobody@example.com").await.is_err());
}

#[tokio::test]
async fn partial_update_touches_only_present_fields() {
    let (db, company_id, role_id) = setup().await;
    let repo = SurrealUserRepository::new(db.clone());

    let user = repo
        .create(&user_draft(company_id, "alice@example.com", vec![role_id]))
        .await
        .unwrap();

    let updated = repo
        .update(
            user.id,
            &UserChange {
                full_name: Some("Alice Renamed".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.full_name, "Alice Renamed");
    assert_eq!(updated.email, "alice@example.com");
    assert_eq!(updated.roles.len(), 1, "role set untouched");
    assert_eq!(updated.created_at, user.created_at);

    // Replacing the role set rides in the same transaction.
    let other_role = create_role(&db, company_id, "AUDITOR").await;
    let updated = repo
        .update(
            user.id,
            &UserChange {
                role_ids: Some(vec![other_role]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.roles.len(), 1);
    assert_eq!(updated.roles[0].name, "AUDITOR");
}

#[tokio::test]
async fn update_with_bad_role_set_rolls_back_entirely() {
    let (db, company_id, role_id) = setup().await;
    let repo = SurrealUserRepository::new(db);

    let user = repo
        .create(&user_draft(company_id, "alice@example.com", vec![role_id]))
        .await
        .unwrap();

    let result = repo
        .update(
            user.id,
            &UserChange {
                full_name: Some("Never Applied".into()),
                role_ids: Some(vec![Uuid::now_v7()]),
                ..Default::default()
            },
        )
        .await;
    assert!(result.is_err());

    let unchanged = repo.get_by_id(user.id).await.unwrap();
    assert_eq!(unchanged.full_name, "Alice Example", "scalar update rolled back too");
    assert_eq!(unchanged.roles.len(), 1);
}

#[tokio::test]
async fn associate_roles_appends_idempotently() {
    let (db, company_id, role_id) = setup().await;
    let other_role = create_role(&db, company_id, "AUDITOR").await;
    let repo = SurrealUserRepository::new(db);

    let user = repo
        .create(&user_draft(company_id, "alice@example.com", vec![role_id]))
        .await
        .unwrap();

    repo.associate_roles(user.id, &[role_id, other_role]).await.unwrap();
    repo.associate_roles(user.id, &[other_role]).await.unwrap();

    let user = repo.get_by_id(user.id).await.unwrap();
    assert_eq!(user.roles.len(), 2, "no duplicate edges");
}

#[tokio::test]
async fn soft_delete_user_is_terminal() {
    let (db, company_id, role_id) = setup().await;
    let repo = SurrealUserRepository::new(db);

    let user = repo
        .create(&user_draft(company_id, "alice@example.com", vec![role_id]))
        .await
        .unwrap();

    repo.delete(user.id).await.unwrap();
    assert!(repo.get_by_id(user.id).await.is_err());
    assert!(repo.delete(user.id).await.is_err());
}

#[tokio::test]
async fn list_users_filters_and_paginates() {
    let (db, company_id, role_id) = setup().await;
    let repo = SurrealUserRepository::new(db);

    for i in 0..5 {
        let mut draft = user_draft(company_id, &format!("user{i}@example.com"), vec![role_id]);
        draft.full_name = format!("User {i}");
        repo.create(&draft).await.unwrap();
    }

    let page = repo
        .list(
            &HashMap::new(),
            PageRequest { page: 1, page_size: 2 },
            company_id,
        )
        .await
        .unwrap();
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.page_info.total_items, 5);
    assert_eq!(page.page_info.total_pages, 3);
    assert!(page.items.iter().all(|u| u.roles.len() == 1));
    assert!(page.items.iter().all(|u| u.company.id == company_id));

    let mut filters = HashMap::new();
    filters.insert("email".to_string(), "user3@example.com".to_string());
    let page = repo
        .list(&filters, PageRequest::default(), company_id)
        .await
        .unwrap();
    assert_eq!(page.page_info.total_items, 1);
    assert_eq!(page.items[0].full_name, "User 3");
}
