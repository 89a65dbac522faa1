// File: bonushub-core/tests/approval_tests.rs
//
// The human-in-the-loop gate: token issuance, single redemption, and the
// approve/reject race contract.

use uuid::Uuid;

use bonushub_common::models::bonus::{BonusStatus, BonusType};
use bonushub_common::models::context::{AwardOutcome, BonusContext};
use bonushub_common::traits::repository_traits::BonusTemplateRepository;
use bonushub_core::config::EngineConfig;
use bonushub_core::test_utils::{TestEngine, build_test_engine, sample_template};

/// Seeds a 5000-value template against the default 1000 threshold and
/// requests the award, returning the pending token.
async fn request_high_value_award(harness: &TestEngine, tenant_id: Uuid, user_id: Uuid) -> String {
    let mut template = sample_template(tenant_id, BonusType::Birthday);
    template.value = 5000.0;
    harness.templates.create_template(&template).await.unwrap();

    let mut ctx = BonusContext::new(user_id, tenant_id);
    ctx.currency = Some("USD".to_string());
    ctx.requested_by = Some("vip-desk".to_string());
    ctx.reason = Some("vip retention".to_string());

    let outcome = harness
        .engine
        .award(BonusType::Birthday, &ctx)
        .await
        .unwrap();
    match outcome {
        AwardOutcome::PendingApproval { token } => token,
        other => panic!("expected pending approval, got {other:?}"),
    }
}

#[tokio::test]
async fn high_value_award_round_trip() {
    let harness = build_test_engine(EngineConfig::default());
    let tenant_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();

    let token = request_high_value_award(&harness, tenant_id, user_id).await;

    // No bonus yet; the request is inspectable.
    let pending = harness.engine.get_pending(&token).expect("pending visible");
    assert_eq!(pending.user_id, user_id);
    assert_eq!(pending.calculated_value, 5000.0);
    assert_eq!(pending.requested_by.as_deref(), Some("vip-desk"));
    assert_eq!(harness.engine.list_pending(Some(tenant_id)).len(), 1);

    let approver_id = Uuid::new_v4();
    let outcome = harness
        .engine
        .approve(&token, "risk-team", Some(approver_id))
        .await
        .unwrap();
    let AwardOutcome::Awarded(bonus) = outcome else {
        panic!("expected award, got {outcome:?}");
    };
    assert_eq!(bonus.user_id, user_id);
    assert_eq!(bonus.original_value, 5000.0);
    assert_eq!(bonus.status, BonusStatus::Active);
    // The approver is on the audit trail.
    assert_eq!(bonus.history[0].triggered_by, "risk-team");

    // The token is spent: approve and reject both lose now.
    let again = harness
        .engine
        .approve(&token, "risk-team", Some(approver_id))
        .await
        .unwrap();
    let AwardOutcome::Ineligible { reason } = again else {
        panic!("expected ineligible, got {again:?}");
    };
    assert_eq!(reason, "Pending approval not found or already processed");
    assert!(
        !harness
            .engine
            .reject(&token, "risk-team", Some(approver_id), "late")
            .await
            .unwrap()
    );
    assert!(harness.engine.get_pending(&token).is_none());
}

#[tokio::test]
async fn rejection_creates_no_bonus_and_spends_the_token() {
    let harness = build_test_engine(EngineConfig::default());
    let tenant_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();

    let token = request_high_value_award(&harness, tenant_id, user_id).await;

    let rejected = harness
        .engine
        .reject(&token, "risk-team", None, "exceeds weekly budget")
        .await
        .unwrap();
    assert!(rejected);

    // Nothing was awarded, and a late approve loses.
    let outcome = harness
        .engine
        .approve(&token, "risk-team", None)
        .await
        .unwrap();
    assert!(matches!(outcome, AwardOutcome::Ineligible { .. }));
    assert!(harness.engine.list_pending(None).is_empty());
}

#[tokio::test]
async fn below_threshold_awards_skip_the_gate() {
    let harness = build_test_engine(EngineConfig::default());
    let tenant_id = Uuid::new_v4();

    let mut template = sample_template(tenant_id, BonusType::Birthday);
    template.value = 999.0; // just under the default 1000 threshold
    harness.templates.create_template(&template).await.unwrap();

    let mut ctx = BonusContext::new(Uuid::new_v4(), tenant_id);
    ctx.currency = Some("USD".to_string());

    let outcome = harness
        .engine
        .award(BonusType::Birthday, &ctx)
        .await
        .unwrap();
    assert!(outcome.is_awarded());
}

#[tokio::test]
async fn template_threshold_overrides_tenant_default() {
    let harness = build_test_engine(EngineConfig::default());
    let tenant_id = Uuid::new_v4();

    let mut template = sample_template(tenant_id, BonusType::Achievement);
    template.value = 50.0;
    template.approval_threshold = Some(10.0);
    harness.templates.create_template(&template).await.unwrap();

    let mut ctx = BonusContext::new(Uuid::new_v4(), tenant_id);
    ctx.currency = Some("USD".to_string());
    ctx.achievement_code = Some("first_win".to_string());

    let outcome = harness
        .engine
        .award(BonusType::Achievement, &ctx)
        .await
        .unwrap();
    assert!(matches!(outcome, AwardOutcome::PendingApproval { .. }));
}

#[tokio::test]
async fn approved_award_consumes_a_global_cap_slot() {
    let harness = build_test_engine(EngineConfig::default());
    let tenant_id = Uuid::new_v4();

    let mut template = sample_template(tenant_id, BonusType::Birthday);
    template.value = 5000.0;
    template.max_uses_total = Some(1);
    harness.templates.create_template(&template).await.unwrap();

    let mut ctx_a = BonusContext::new(Uuid::new_v4(), tenant_id);
    ctx_a.currency = Some("USD".to_string());
    let mut ctx_b = BonusContext::new(Uuid::new_v4(), tenant_id);
    ctx_b.currency = Some("USD".to_string());

    let AwardOutcome::PendingApproval { token: token_a } =
        harness.engine.award(BonusType::Birthday, &ctx_a).await.unwrap()
    else {
        panic!("expected pending approval");
    };
    let AwardOutcome::PendingApproval { token: token_b } =
        harness.engine.award(BonusType::Birthday, &ctx_b).await.unwrap()
    else {
        panic!("expected pending approval");
    };

    // Only the first approval fits the cap; the second is refused at the
    // atomic increment, not by a duplicate award.
    let first = harness
        .engine
        .approve(&token_a, "risk-team", None)
        .await
        .unwrap();
    assert!(first.is_awarded());

    let second = harness
        .engine
        .approve(&token_b, "risk-team", None)
        .await
        .unwrap();
    let AwardOutcome::Ineligible { reason } = second else {
        panic!("expected ineligible, got {second:?}");
    };
    assert_eq!(reason, "Bonus no longer available");
}
