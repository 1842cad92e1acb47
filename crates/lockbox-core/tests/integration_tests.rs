//! Lockbox Core Integration Tests

use lockbox_core::{
    Error,
    config::SearchConfig,
    domain::auth::{AuthService, hash_password},
    domain::search::{
        AccountSearchService, PALETTE, Principal, QueryParam, SearchCriteria, SearchOutcome,
        SearchResults, SearchSession, SessionStore, SortKey, SortOrder, UserPreferences,
    },
    storage::Database,
};

const FIXTURE: &str = r#"
    INSERT INTO user_groups (id, name) VALUES (1, 'admins'), (2, 'ops'), (3, 'dev'), (4, 'audit');
    INSERT INTO users (id, login, name, email, group_id, is_admin_app, pass_hash, hash_salt)
    VALUES
        (1, 'admin', 'Admin', 'admin@example.test', 1, 1, '', ''),
        (2, 'alice', 'Alice', 'alice@example.test', 2, 0, '', ''),
        (3, 'bob', 'Bob', 'bob@example.test', 3, 0, '', ''),
        (4, 'carol', 'Carol', 'carol@example.test', 4, 0, '', '');
    INSERT INTO user_to_groups (user_id, group_id) VALUES (4, 3);
    INSERT INTO categories (id, name) VALUES (1, 'Web'), (2, 'Database');
    INSERT INTO customers (id, name) VALUES (1, 'Acme'), (2, 'Globex'), (3, 'Initech');
    INSERT INTO accounts (id, name, login, url, notes, category_id, customer_id, user_id, user_group_id, count_view)
    VALUES
        (1, 'Mail server', 'postmaster', 'https://mail.acme.test', '', 1, 1, 1, 1, 40),
        (2, 'Billing DB', 'billing', '', 'primary replica', 2, 2, 1, 1, 3),
        (3, 'Intranet', 'www', 'https://intra.acme.test', '', 1, 1, 1, 1, 0),
        (4, 'Build cache', 'ci', '', '', 1, 3, 3, 3, 7),
        (5, 'Ops console', 'root', 'https://ops.acme.test', '', 1, 2, 1, 2, 12),
        (6, 'Shared SFTP', 'sftp', '', '', 2, 2, 1, 1, 1);
    INSERT INTO account_users (account_id, user_id) VALUES (6, 2);
    INSERT INTO tags (id, name) VALUES (1, 'production'), (2, 'staging');
    INSERT INTO account_tags (account_id, tag_id) VALUES (2, 1), (5, 1), (4, 2);
    INSERT INTO account_files (account_id, name) VALUES (4, 'deploy_key.pem');
    INSERT INTO account_favorites (account_id, user_id) VALUES (3, 1), (5, 2), (1, 2);
"#;

async fn setup() -> Database {
    let db = Database::in_memory().await.unwrap();
    sqlx::raw_sql(FIXTURE).execute(db.pool()).await.unwrap();
    db
}

fn service(db: &Database) -> AccountSearchService {
    AccountSearchService::new(db.pool().clone(), SearchConfig::default())
}

fn admin() -> Principal {
    Principal::new(1, "admin", 1).with_admin_app(true)
}

fn alice() -> Principal {
    Principal::new(2, "alice", 2)
}

fn found(outcome: SearchOutcome) -> SearchResults {
    match outcome {
        SearchOutcome::Found(results) => results,
        SearchOutcome::QueryFailed { reason } => panic!("query failed: {}", reason),
    }
}

fn ids(results: &SearchResults) -> Vec<i64> {
    let mut ids: Vec<i64> = results.rows.iter().map(|r| r.account.id).collect();
    ids.sort();
    ids
}

#[tokio::test]
async fn test_owner_via_primary_group_sees_account_with_stable_color() {
    let db = setup().await;
    let service = service(&db);
    let mut session = SearchSession::interactive(UserPreferences::default());
    let principal = alice();

    let first = found(
        service
            .execute(SearchCriteria::default(), &principal, &mut session)
            .await
            .unwrap(),
    );
    let second = found(
        service
            .execute(SearchCriteria::default(), &principal, &mut session)
            .await
            .unwrap(),
    );

    assert_eq!(ids(&first), vec![5, 6]);

    let row = first.rows.iter().find(|r| r.account.id == 5).unwrap();
    assert!(row.access.can_view);
    assert!(row.access.can_edit);
    assert!(PALETTE.contains(&&row.color[1..]));

    let again = second.rows.iter().find(|r| r.account.id == 5).unwrap();
    assert_eq!(row.color, again.color);
}

#[tokio::test]
async fn test_secondary_group_membership_grants_visibility() {
    let db = setup().await;
    let carol = Principal::new(4, "carol", 4).with_secondary_groups(vec![3]);
    let mut session = SearchSession::api();

    let results = found(
        service(&db)
            .execute(SearchCriteria::default(), &carol, &mut session)
            .await
            .unwrap(),
    );

    assert_eq!(ids(&results), vec![4]);
    assert!(results.rows[0].access.can_edit);
}

#[tokio::test]
async fn test_global_search_bypasses_visibility() {
    let db = setup().await;
    let mut session = SearchSession::api();

    let criteria = SearchCriteria::default().with_page(0, 0).with_global_search(true);
    let results = found(service(&db).execute(criteria, &alice(), &mut session).await.unwrap());

    assert_eq!(results.total, 6);
    let hidden = results.rows.iter().find(|r| r.account.id == 1).unwrap();
    assert!(!hidden.access.can_view);
}

#[tokio::test]
async fn test_tag_and_file_search() {
    let db = setup().await;
    let service = service(&db);
    let mut session = SearchSession::api();

    let tagged = found(
        service
            .execute(SearchCriteria::default().with_text("TAG:production"), &admin(), &mut session)
            .await
            .unwrap(),
    );
    assert_eq!(ids(&tagged), vec![2, 5]);

    let files = found(
        service
            .execute(SearchCriteria::default().with_text("file:deploy"), &admin(), &mut session)
            .await
            .unwrap(),
    );
    assert_eq!(ids(&files), vec![4]);
}

#[tokio::test]
async fn test_user_and_group_tags() {
    let db = setup().await;
    let service = service(&db);
    let mut session = SearchSession::api();

    let by_user = found(
        service
            .execute(SearchCriteria::default().with_text("user:alice"), &admin(), &mut session)
            .await
            .unwrap(),
    );
    assert_eq!(ids(&by_user), vec![6]);

    let by_group = found(
        service
            .execute(SearchCriteria::default().with_text("group:dev"), &admin(), &mut session)
            .await
            .unwrap(),
    );
    assert_eq!(ids(&by_group), vec![4]);
}

#[tokio::test]
async fn test_unknown_user_tag_matches_nothing() {
    let db = setup().await;
    let mut session = SearchSession::api();

    let outcome = service(&db)
        .execute(SearchCriteria::default().with_text("user:mallory"), &admin(), &mut session)
        .await
        .unwrap();

    let results = found(outcome);
    assert!(results.is_empty());
    assert_eq!(results.total, 0);
}

#[tokio::test]
async fn test_empty_tag_value_matches_nothing() {
    let db = setup().await;
    let service = service(&db);
    let mut session = SearchSession::api();

    for text in ["user:", "group: ", "tag:", "file:"] {
        let results = found(
            service
                .execute(SearchCriteria::default().with_text(text), &admin(), &mut session)
                .await
                .unwrap(),
        );
        assert!(results.is_empty(), "{text}");
        assert_eq!(results.total, 0, "{text}");
    }
}

#[tokio::test]
async fn test_pagination_total_is_unpaginated() {
    let db = setup().await;
    let mut session = SearchSession::api();

    let criteria = SearchCriteria::default()
        .with_sort(SortKey::Name, SortOrder::Asc)
        .with_page(2, 2);
    let results = found(service(&db).execute(criteria, &admin(), &mut session).await.unwrap());

    let names: Vec<&str> = results.rows.iter().map(|r| r.account.name.as_str()).collect();
    assert_eq!(results.total, 6);
    assert_eq!(names, vec!["Intranet", "Mail server"]);
}

#[tokio::test]
async fn test_category_and_customer_filters() {
    let db = setup().await;
    let mut session = SearchSession::api();

    let criteria = SearchCriteria::default().with_category(1).with_customer(1);
    let results = found(service(&db).execute(criteria, &admin(), &mut session).await.unwrap());

    assert_eq!(ids(&results), vec![1, 3]);
}

#[tokio::test]
async fn test_sort_by_views_orders_most_viewed_first() {
    let db = setup().await;
    let service = service(&db);
    let mut session = SearchSession::interactive(UserPreferences {
        results_per_page: 3,
        sort_by_views: true,
    });

    let criteria = service.default_criteria(&session);
    assert_eq!(criteria.limit_count, 3);

    let results = found(service.execute(criteria, &admin(), &mut session).await.unwrap());
    let views: Vec<i64> = results.rows.iter().map(|r| r.account.count_view).collect();

    assert_eq!(views, vec![40, 12, 7]);
    assert_eq!(
        session.last_criteria().map(|c| c.sort_order),
        Some(SortOrder::Desc)
    );
}

#[tokio::test]
async fn test_favorites_apply_to_admins() {
    let db = setup().await;
    let service = service(&db);
    let mut session = SearchSession::api();

    let admin_favs = found(
        service
            .execute(SearchCriteria::default().with_favorites_only(true), &admin(), &mut session)
            .await
            .unwrap(),
    );
    assert_eq!(ids(&admin_favs), vec![3]);

    let alice_favs = found(
        service
            .execute(
                SearchCriteria::default()
                    .with_favorites_only(true)
                    .with_text("console"),
                &alice(),
                &mut session,
            )
            .await
            .unwrap(),
    );
    assert_eq!(ids(&alice_favs), vec![5]);
}

#[tokio::test]
async fn test_favorites_do_not_widen_visibility() {
    let db = setup().await;
    let service = service(&db);
    let mut session = SearchSession::api();

    let visible = found(
        service
            .execute(SearchCriteria::default().with_favorites_only(true), &alice(), &mut session)
            .await
            .unwrap(),
    );
    assert_eq!(ids(&visible), vec![5]);

    let global = found(
        service
            .execute(
                SearchCriteria::default()
                    .with_favorites_only(true)
                    .with_global_search(true),
                &alice(),
                &mut session,
            )
            .await
            .unwrap(),
    );
    assert_eq!(ids(&global), vec![1, 5]);
}

#[tokio::test]
async fn test_query_failure_is_not_an_empty_result() {
    let db = setup().await;
    let service = service(&db);
    let mut session = SearchSession::api();

    sqlx::raw_sql("DROP VIEW account_search_v")
        .execute(db.pool())
        .await
        .unwrap();

    let outcome = service
        .execute(SearchCriteria::default(), &admin(), &mut session)
        .await
        .unwrap();
    assert!(outcome.is_failure());
    assert!(session.last_criteria().is_none());
}

#[tokio::test]
async fn test_repeat_last_search() {
    let db = setup().await;
    let service = service(&db);
    let mut session = SearchSession::api();

    let err = service.repeat_last(&admin(), &mut session).await.unwrap_err();
    assert!(matches!(err, Error::NoLastSearch));

    service
        .execute(SearchCriteria::default().with_text("replica"), &admin(), &mut session)
        .await
        .unwrap();
    let repeated = found(service.repeat_last(&admin(), &mut session).await.unwrap());
    assert_eq!(ids(&repeated), vec![2]);
}

#[tokio::test]
async fn test_auth_against_store() {
    let db = setup().await;
    let digest = hash_password("pepper", "hunter2");
    sqlx::query("UPDATE users SET pass_hash = ?, hash_salt = 'pepper' WHERE login = 'bob'")
        .bind(&digest)
        .execute(db.pool())
        .await
        .unwrap();

    let auth = AuthService::new(db.pool().clone(), Default::default());
    assert!(auth.authenticate_local("bob", "hunter2").await.unwrap());
    assert!(!auth.authenticate_local("bob", "hunter3").await.unwrap());
    assert!(!auth.authenticate_local("alice", "").await.unwrap());

    let carol = auth.principal_for("carol").await.unwrap();
    assert!(carol.belongs_to(3));
    assert!(!carol.is_admin());
}

#[tokio::test]
async fn test_descriptor_params_follow_binding_order() {
    use lockbox_core::domain::search::{QueryBuilder, VisibilityFilter};

    let criteria = SearchCriteria::default()
        .with_text("mail")
        .with_category(1)
        .with_favorites_only(true)
        .with_page(12, 12);
    let principal = alice();

    let groups = QueryBuilder::search_groups(
        &criteria,
        Vec::new(),
        VisibilityFilter::favorites(&principal, true),
        VisibilityFilter::build(&principal, false),
    );
    let query = QueryBuilder::default().build(&criteria, groups, Vec::new());
    let params = query.params();

    assert_eq!(params.len(), 4 + 1 + 1 + 4 + 2);
    assert_eq!(params[4], QueryParam::Int(1));
    assert_eq!(params[5], QueryParam::Int(2));
    assert_eq!(&params[10..], &[QueryParam::Int(12), QueryParam::Int(12)]);
    assert!(query.is_consistent());
}

#[tokio::test]
async fn test_sql_visibility_agrees_with_in_memory_rules() {
    use lockbox_core::domain::search::{VisibilityFacts, VisibilityFilter};
    use lockbox_core::domain::specification::Specification;

    let db = setup().await;
    let service = service(&db);
    let mut session = SearchSession::api();

    let everything = found(
        service
            .execute(SearchCriteria::default().with_page(0, 0), &admin(), &mut session)
            .await
            .unwrap(),
    );

    let principals = [
        alice(),
        Principal::new(3, "bob", 3),
        Principal::new(4, "carol", 4).with_secondary_groups(vec![3]),
    ];

    for principal in principals {
        let rules = VisibilityFilter::specification(&principal, false);
        let mut expected: Vec<i64> = everything
            .rows
            .iter()
            .filter(|row| {
                rules.is_satisfied_by(&VisibilityFacts {
                    owner_user_id: row.account.user_id,
                    owner_group_id: row.account.user_group_id,
                    granted_user_ids: row.users_id.clone(),
                })
            })
            .map(|row| row.account.id)
            .collect();
        expected.sort();

        let visible = found(
            service
                .execute(SearchCriteria::default().with_page(0, 0), &principal, &mut session)
                .await
                .unwrap(),
        );

        assert_eq!(ids(&visible), expected, "principal {}", principal.login);
    }
}
