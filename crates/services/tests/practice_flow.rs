use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use services::{AppServices, Clock, PracticeService, PracticeServiceError, TreeInit};
use storage::repository::{PracticeRepository, StorageError};
use wellness_core::model::{
    IncrementOutcome, PosePath, PracticeTree, SubCategoryContent, SunburstNode, TimeRange, UserId,
};
use wellness_core::time::fixed_now;

fn plank_path(tree: &PracticeTree) -> PosePath {
    let hatha = &tree.categories()[0];
    let strength = &hatha.sub_categories[0];
    let SubCategoryContent::SubCategories(groups) = &strength.content else {
        panic!("strength has groups");
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
async fn register_seed_and_record_over_sqlite() {
    let app = AppServices::new_sqlite(
        "sqlite:file:memdb_practice_flow?mode=memory&cache=shared",
        Clock::fixed(fixed_now()),
        "flow-secret",
    )
    .await
    .unwrap();

    let session = app
        .auth()
        .register("yogi@example.com", "namaste", "Yogi")
        .await
        .unwrap();
    let user = app.auth().authenticate(&session.token).unwrap();
    assert_eq!(user, session.user.id());

    let practice = app.practice();
    assert_eq!(practice.initialize(user, false).await.unwrap(), TreeInit::Created);
    let tree = practice.tree(user).await.unwrap();

    let outcome = practice.record_practice(user, &plank_path(&tree)).await.unwrap();
    assert_eq!(outcome.added_minutes, 2);
    assert_eq!(outcome.frequency, 1);
    assert_eq!(outcome.practice_time_minutes, 102);

    let sunburst = practice.sunburst(user).await.unwrap();
    assert_eq!(sunburst.find("Hatha").unwrap().value, Some(602));
    assert_eq!(sunburst.find("Strength").unwrap().value, Some(402));
    assert_eq!(sunburst, SunburstNode::from_tree(&practice.tree(user).await.unwrap()));

    let today = fixed_now().date_naive();
    let entries = services::synthesize_entries(&mut StdRng::seed_from_u64(11), today, 14);
    app.timeline().replace(user, &entries).await.unwrap();
    let (week, summary) = app.timeline().list(user, TimeRange::Week).await.unwrap();
    assert!(week.windows(2).all(|pair| pair[0].date >= pair[1].date));
    assert_eq!(summary.current_streak, 7);
    assert_eq!(summary.total_practices as usize, week.len());
}

struct UnavailableStore;

#[async_trait]
impl PracticeRepository for UnavailableStore {
    async fn load_tree(&self, _user_id: UserId) -> Result<PracticeTree, StorageError> {
        Err(StorageError::Connection("store offline".into()))
    }

    async fn save_tree(&self, _tree: &PracticeTree) -> Result<(), StorageError> {
        Err(StorageError::Connection("store offline".into()))
    }

    async fn load_projection(&self, _user_id: UserId) -> Result<SunburstNode, StorageError> {
        Err(StorageError::Connection("store offline".into()))
    }

    async fn save_projection(
        &self,
        _user_id: UserId,
        _projection: &SunburstNode,
    ) -> Result<(), StorageError> {
        Err(StorageError::Connection("store offline".into()))
    }

    async fn apply_increment(
        &self,
        _user_id: UserId,
        _path: &PosePath,
        _now: DateTime<Utc>,
    ) -> Result<IncrementOutcome, StorageError> {
        Err(StorageError::Connection("store offline".into()))
    }

    async fn delete_practice(&self, _user_id: UserId) -> Result<(), StorageError> {
        Err(StorageError::Connection("store offline".into()))
    }
}

#[tokio::test]
async fn store_failures_surface_as_storage_errors() {
    let service = PracticeService::new(Clock::fixed(fixed_now()), Arc::new(UnavailableStore));
    let user = UserId::new(1);

    assert!(matches!(
        service.sunburst(user).await,
        Err(PracticeServiceError::Storage(StorageError::Connection(_)))
    ));
    assert!(matches!(
        service.initialize(user, false).await,
        Err(PracticeServiceError::Storage(_))
    ));
}
