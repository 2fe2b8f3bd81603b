use chrono::{Duration, NaiveDate};
use storage::repository::{
    NewUserRecord, PracticeRepository, StorageError, TimelineRepository, UserRepository,
};
use storage::sqlite::SqliteRepository;
use wellness_core::catalog::default_tree;
use wellness_core::model::{
    Focus, Intensity, NodeId, PosePath, PracticeEntry, PracticeTree, Prop, SubCategoryContent,
    SunburstNode, TreeError, UserId, YogaStyle,
};
use wellness_core::time::fixed_now;

async fn connect(name: &str) -> SqliteRepository {
    let repo = SqliteRepository::connect(&format!("sqlite:file:{name}?mode=memory&cache=shared"))
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

async fn register(repo: &SqliteRepository, email: &str) -> UserId {
    repo.insert_user(NewUserRecord {
        email: email.into(),
        name: "Ana".into(),
        password_hash: "$argon2id$stub".into(),
        created_at: fixed_now(),
    })
    .await
    .expect("insert user")
}

fn plank_path(tree: &PracticeTree) -> PosePath {
    let hatha = &tree.categories()[0];
    let strength = &hatha.sub_categories[0];
    let SubCategoryContent::SubCategories(groups) = &strength.content else {
        panic!("strength has sub-subcategories");
    };
    let upper_body = &groups[0];
    PosePath::new(
        hatha.id.clone(),
        strength.id.clone(),
        upper_body.poses[1].id.clone(),
    )
    .within(upper_body.id.clone())
}

#[tokio::test]
async fn sqlite_users_are_unique_by_email() {
    let repo = connect("memdb_users").await;
    let id = register(&repo, "ana@example.com").await;

    let err = repo
        .insert_user(NewUserRecord {
            email: "Ana@Example.com".into(),
            name: "Other".into(),
            password_hash: "x".into(),
            created_at: fixed_now(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Conflict));

    let user = repo.get_user(id).await.unwrap().expect("user");
    assert_eq!(user.email(), "ana@example.com");
    let creds = repo
        .find_credentials("ANA@example.com")
        .await
        .unwrap()
        .expect("credentials");
    assert_eq!(creds.user.id(), id);
    assert_eq!(creds.password_hash, "$argon2id$stub");
    assert!(repo.get_user(UserId::new(999)).await.unwrap().is_none());
}

#[tokio::test]
async fn sqlite_tree_and_projection_round_trip() {
    let repo = connect("memdb_tree_roundtrip").await;
    let user = register(&repo, "ana@example.com").await;
    let tree = default_tree(user, fixed_now(), NodeId::generate).unwrap();

    repo.save_tree(&tree).await.unwrap();

    assert_eq!(repo.load_tree(user).await.unwrap(), tree);
    assert_eq!(
        repo.load_projection(user).await.unwrap(),
        SunburstNode::from_tree(&tree)
    );
}

#[tokio::test]
async fn sqlite_increment_is_atomic_over_both_documents() {
    let repo = connect("memdb_increment").await;
    let user = register(&repo, "ana@example.com").await;
    let tree = default_tree(user, fixed_now(), NodeId::generate).unwrap();
    repo.save_tree(&tree).await.unwrap();
    let path = plank_path(&tree);
    let later = fixed_now() + Duration::minutes(30);

    let outcome = repo.apply_increment(user, &path, later).await.unwrap();
    assert_eq!(outcome.added_minutes, 2);
    assert_eq!(outcome.frequency, 1);
    assert_eq!(outcome.practice_time_minutes, 102);

    let stored = repo.load_tree(user).await.unwrap();
    assert_eq!(stored.last_updated(), later);
    assert_eq!(stored.categories()[0].practice_time_minutes, 602);
    stored.verify_aggregates().unwrap();
    let projection = repo.load_projection(user).await.unwrap();
    assert_eq!(projection, SunburstNode::from_tree(&stored));

    let mut missing = path.clone();
    missing.pose_id = NodeId::new("nope").unwrap();
    let err = repo.apply_increment(user, &missing, later).await.unwrap_err();
    assert!(matches!(err, StorageError::Tree(TreeError::PathNotFound)));
    assert_eq!(repo.load_tree(user).await.unwrap(), stored);
    assert_eq!(repo.load_projection(user).await.unwrap(), projection);
}

#[tokio::test]
async fn sqlite_missing_tree_is_not_found() {
    let repo = connect("memdb_missing_tree").await;
    let user = register(&repo, "ana@example.com").await;
    let template = default_tree(user, fixed_now(), NodeId::generate).unwrap();

    assert!(matches!(
        repo.load_tree(user).await,
        Err(StorageError::NotFound)
    ));
    assert!(matches!(
        repo.load_projection(user).await,
        Err(StorageError::NotFound)
    ));
    assert!(matches!(
        repo.apply_increment(user, &plank_path(&template), fixed_now())
            .await,
        Err(StorageError::NotFound)
    ));
    assert!(matches!(
        repo.save_projection(user, &SunburstNode::leaf("x", 1)).await,
        Err(StorageError::NotFound)
    ));
}

#[tokio::test]
async fn sqlite_delete_practice_clears_documents() {
    let repo = connect("memdb_delete_practice").await;
    let user = register(&repo, "ana@example.com").await;
    let tree = default_tree(user, fixed_now(), NodeId::generate).unwrap();
    repo.save_tree(&tree).await.unwrap();

    repo.delete_practice(user).await.unwrap();

    assert!(matches!(
        repo.load_tree(user).await,
        Err(StorageError::NotFound)
    ));
    assert!(matches!(
        repo.load_projection(user).await,
        Err(StorageError::NotFound)
    ));
}

#[tokio::test]
async fn sqlite_timeline_replaces_and_filters_entries() {
    let repo = connect("memdb_timeline").await;
    let user = register(&repo, "ana@example.com").await;
    let day = |d| NaiveDate::from_ymd_opt(2024, 3, d).unwrap();
    let entry = |d, style, minutes| {
        PracticeEntry::new(
            day(d),
            style,
            minutes,
            Focus::Flexibility,
            Intensity::Moderate,
            Prop::Strap,
        )
        .unwrap()
    };

    repo.replace_entries(user, &[entry(1, YogaStyle::Yin, 50)])
        .await
        .unwrap();
    repo.replace_entries(
        user,
        &[
            entry(2, YogaStyle::Hatha, 30),
            entry(4, YogaStyle::Vinyasa, 45),
            entry(4, YogaStyle::Hatha, 25),
        ],
    )
    .await
    .unwrap();

    let all = repo.list_entries(user, None).await.unwrap();
    let ids: Vec<&str> = all.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["2024-03-04-hatha", "2024-03-04-vinyasa", "2024-03-02-hatha"]);
    assert_eq!(all[1].focus, Focus::Flexibility);
    assert_eq!(all[1].props, Prop::Strap);

    let recent = repo.list_entries(user, Some(day(3))).await.unwrap();
    assert_eq!(recent.len(), 2);

    let err = repo
        .replace_entries(
            user,
            &[entry(5, YogaStyle::Yin, 40), entry(5, YogaStyle::Yin, 40)],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Conflict));
    assert_eq!(repo.list_entries(user, None).await.unwrap().len(), 3);
}
