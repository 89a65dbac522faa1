// File: bonushub-core/tests/turnover_tests.rs
//
// Turnover folding, the converted transition, and the expiry sweep.

use uuid::Uuid;

use bonushub_common::models::bonus::{BonusStatus, BonusType, UserBonus};
use bonushub_common::models::context::{ActivityEvent, DepositEvent};
use bonushub_common::traits::repository_traits::{
    BonusTemplateRepository, UserBonusRepository,
};
use bonushub_core::config::EngineConfig;
use bonushub_core::test_utils::{TestEngine, build_test_engine, sample_template};

async fn award_first_deposit(harness: &TestEngine, tenant_id: Uuid, user_id: Uuid) -> UserBonus {
    let template = sample_template(tenant_id, BonusType::FirstDeposit);
    harness.templates.create_template(&template).await.unwrap();

    let event = DepositEvent {
        user_id,
        tenant_id,
        amount: 100.0,
        currency: "USD".to_string(),
        transaction_id: Some(Uuid::new_v4().to_string()),
        deposit_id: None,
        wallet_id: None,
    };
    let awarded = harness.engine.handle_deposit(&event).await.unwrap();
    assert_eq!(awarded.len(), 1);
    awarded.into_iter().next().unwrap()
}

fn activity(tenant_id: Uuid, user_id: Uuid, amount: f64) -> ActivityEvent {
    ActivityEvent {
        user_id,
        tenant_id,
        amount,
        currency: "USD".to_string(),
        category: None,
        transaction_id: None,
    }
}

#[tokio::test]
async fn turnover_progress_is_monotonic_and_converts_once() {
    let harness = build_test_engine(EngineConfig::default());
    let tenant_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();

    // 25.0 fixed value * 3.0 multiplier = 75.0 required turnover.
    let bonus = award_first_deposit(&harness, tenant_id, user_id).await;
    assert_eq!(bonus.turnover_required, 75.0);

    let mut rx = harness.event_bus.subscribe(Some(16)).await;
    // Drain nothing: the award event predates the subscription.

    harness
        .engine
        .handle_activity(&activity(tenant_id, user_id, 30.0))
        .await
        .unwrap();
    harness
        .engine
        .handle_activity(&activity(tenant_id, user_id, 30.0))
        .await
        .unwrap();

    let mid = harness
        .bonuses
        .get_user_bonus(bonus.user_bonus_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(mid.turnover_progress, 60.0);
    assert_eq!(mid.status, BonusStatus::Active);

    // Crosses the requirement; progress clamps at the requirement.
    harness
        .engine
        .handle_activity(&activity(tenant_id, user_id, 40.0))
        .await
        .unwrap();

    let done = harness
        .bonuses
        .get_user_bonus(bonus.user_bonus_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(done.turnover_progress, 75.0);
    assert_eq!(done.status, BonusStatus::Converted);
    assert!(done.history.iter().any(|h| h.action == "requirements_met"));
    assert!(done.history.iter().any(|h| h.action == "converted"));

    // Further activity must not mutate the converted bonus.
    harness
        .engine
        .handle_activity(&activity(tenant_id, user_id, 50.0))
        .await
        .unwrap();
    let after = harness
        .bonuses
        .get_user_bonus(bonus.user_bonus_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.turnover_progress, 75.0);
    assert_eq!(after.history.len(), done.history.len());

    // requirements_met, then converted, exactly once each.
    let evt1 = rx.recv().await.unwrap();
    let evt2 = rx.recv().await.unwrap();
    assert_eq!(evt1.event_type(), "bonus.requirements_met");
    assert_eq!(evt2.event_type(), "bonus.converted");
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn activity_in_other_currency_does_not_count() {
    let harness = build_test_engine(EngineConfig::default());
    let tenant_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();

    let bonus = award_first_deposit(&harness, tenant_id, user_id).await;

    let mut event = activity(tenant_id, user_id, 30.0);
    event.currency = "EUR".to_string();
    harness.engine.handle_activity(&event).await.unwrap();

    let after = harness
        .bonuses
        .get_user_bonus(bonus.user_bonus_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.turnover_progress, 0.0);
}

#[tokio::test]
async fn restricted_categories_filter_activity() {
    let harness = build_test_engine(EngineConfig::default());
    let tenant_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();

    let mut template = sample_template(tenant_id, BonusType::FirstDeposit);
    template.eligible_categories = vec!["slots".to_string()];
    harness.templates.create_template(&template).await.unwrap();

    let event = DepositEvent {
        user_id,
        tenant_id,
        amount: 100.0,
        currency: "USD".to_string(),
        transaction_id: Some(Uuid::new_v4().to_string()),
        deposit_id: None,
        wallet_id: None,
    };
    let bonus = harness
        .engine
        .handle_deposit(&event)
        .await
        .unwrap()
        .into_iter()
        .next()
        .unwrap();

    let mut table_play = activity(tenant_id, user_id, 30.0);
    table_play.category = Some("table".to_string());
    harness.engine.handle_activity(&table_play).await.unwrap();

    let mut slots_play = activity(tenant_id, user_id, 30.0);
    slots_play.category = Some("slots".to_string());
    harness.engine.handle_activity(&slots_play).await.unwrap();

    let after = harness
        .bonuses
        .get_user_bonus(bonus.user_bonus_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.turnover_progress, 30.0);
}

#[tokio::test]
async fn expired_bonus_is_swept_and_frozen() {
    let harness = build_test_engine(EngineConfig::default());
    let tenant_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();

    // Expires immediately: the validity window is fine but the awarded
    // bonus's lifetime is in the past.
    let mut template = sample_template(tenant_id, BonusType::FirstDeposit);
    template.expiration_days = Some(-1);
    harness.templates.create_template(&template).await.unwrap();

    let event = DepositEvent {
        user_id,
        tenant_id,
        amount: 100.0,
        currency: "USD".to_string(),
        transaction_id: Some(Uuid::new_v4().to_string()),
        deposit_id: None,
        wallet_id: None,
    };
    let bonus = harness
        .engine
        .handle_deposit(&event)
        .await
        .unwrap()
        .into_iter()
        .next()
        .unwrap();

    let swept = harness.engine.expire_old_bonuses().await.unwrap();
    assert_eq!(swept, 1);

    let expired = harness
        .bonuses
        .get_user_bonus(bonus.user_bonus_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(expired.status, BonusStatus::Expired);

    // Turnover updates are no-ops once the bonus left 'active'.
    harness
        .engine
        .handle_activity(&activity(tenant_id, user_id, 100.0))
        .await
        .unwrap();
    let after = harness
        .bonuses
        .get_user_bonus(bonus.user_bonus_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.turnover_progress, 0.0);
    assert_eq!(after.status, BonusStatus::Expired);

    // A second sweep finds nothing.
    assert_eq!(harness.engine.expire_old_bonuses().await.unwrap(), 0);
}

#[tokio::test]
async fn forfeit_only_touches_active_bonuses() {
    let harness = build_test_engine(EngineConfig::default());
    let tenant_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();

    let bonus = award_first_deposit(&harness, tenant_id, user_id).await;

    let ok = harness
        .engine
        .forfeit(bonus.user_bonus_id, "ops@tenant", "deposit reversed")
        .await
        .unwrap();
    assert!(ok);

    let forfeited = harness
        .bonuses
        .get_user_bonus(bonus.user_bonus_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(forfeited.status, BonusStatus::Forfeited);

    // Second forfeit and a cancel both refuse: no longer active.
    assert!(
        !harness
            .engine
            .forfeit(bonus.user_bonus_id, "ops@tenant", "again")
            .await
            .unwrap()
    );
    assert!(
        !harness
            .engine
            .cancel(bonus.user_bonus_id, "ops@tenant", "cleanup")
            .await
            .unwrap()
    );
}
