//! Orchestrates the two-phase transaction pipeline: a synchronous ingress
//! path that completes as soon as the transaction is durably stored, and an
//! independent asynchronous evaluation path drained by a bounded worker
//! pool.
//!
//! `TRANSACTION_CREATED` and every event appended during evaluation are
//! filed under the user's aggregate (`aggregate_id = user_id`,
//! `aggregate_type = USER`), not the transaction's own id — this is what
//! makes `ProfileProjection::build`'s per-user fold (and therefore replay)
//! well-defined; see DESIGN.md for the full reasoning.

use chrono::Utc;
use riskguard_bus::{payloads::*, topics, MessageBus};
use riskguard_engine::RuleEngine;
use riskguard_projection::{ProfileProjection, TransactionCreatedData, UserProfileUpdatedData};
use riskguard_store::{EventLogStore, MerchantFrequencyStore, ProfileStore, TransactionStore};
use riskguard_types::{
    AggregateType, EventLogEntry, EventType, RiskGuardError, RiskGuardResult, RiskProfile, Transaction,
    TransactionRequest,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::config::RiskGuardConfig;
use crate::stripe_lock::StripeLock;

struct WorkflowContext {
    transactions: Arc<dyn TransactionStore>,
    events: Arc<dyn EventLogStore>,
    profiles: Arc<dyn ProfileStore>,
    merchant_frequency: Arc<dyn MerchantFrequencyStore>,
    bus: Arc<dyn MessageBus>,
    engine: Arc<RuleEngine>,
    stripe_lock: StripeLock,
    config: RiskGuardConfig,
}

pub struct TransactionWorkflow {
    ctx: Arc<WorkflowContext>,
    evaluation_tx: mpsc::Sender<PendingEvaluation>,
}

/// What's enqueued for the async evaluation path: the saved transaction plus
/// the `sequence_number` its own `TRANSACTION_CREATED` event was assigned
/// during ingress. Carrying the real sequence number (rather than
/// reconstructing a throwaway one in `evaluate_transaction`) is what lets the
/// live profile fold and a later `replay_incremental_since` over the same
/// window agree on what's already been applied.
struct PendingEvaluation {
    transaction: Transaction,
    created_sequence: i64,
}

impl TransactionWorkflow {
    /// Builds the workflow and immediately spawns its worker pool, sized to
    /// the host's available parallelism, each draining the shared bounded
    /// evaluation queue.
    pub fn new(
        transactions: Arc<dyn TransactionStore>,
        events: Arc<dyn EventLogStore>,
        profiles: Arc<dyn ProfileStore>,
        merchant_frequency: Arc<dyn MerchantFrequencyStore>,
        bus: Arc<dyn MessageBus>,
        engine: Arc<RuleEngine>,
        config: RiskGuardConfig,
    ) -> Self {
        let pool_size = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4);
        let capacity = config.evaluation_queue_capacity(pool_size);
        let stripe_lock = StripeLock::new(config.mutex_stripe_count);

        let ctx = Arc::new(WorkflowContext {
            transactions,
            events,
            profiles,
            merchant_frequency,
            bus,
            engine,
            stripe_lock,
            config,
        });

        let (evaluation_tx, rx) = mpsc::channel::<PendingEvaluation>(capacity);
        let rx = Arc::new(tokio::sync::Mutex::new(rx));

        info!(pool_size, capacity, "spawning evaluation worker pool");
        for worker_id in 0..pool_size {
            let ctx = ctx.clone();
            let rx = rx.clone();
            tokio::spawn(async move {
                loop {
                    let next = rx.lock().await.recv().await;
                    match next {
                        Some(pending) => {
                            if let Err(e) = evaluate_transaction(&ctx, pending).await {
                                error!(worker_id, error = %e, "evaluation task failed");
                            }
                        }
                        None => break,
                    }
                }
            });
        }

        Self { ctx, evaluation_tx }
    }

    /// The synchronous ingress path: save, append, publish, return. The
    /// async evaluation is enqueued but not awaited — this call completes
    /// once the transaction is durably stored.
    #[instrument(skip(self, request), fields(user_id = %request.user_id))]
    pub async fn process(&self, request: TransactionRequest) -> RiskGuardResult<Transaction> {
        let saved = self.ctx.transactions.save(request).await?;

        let created_payload = TransactionCreatedData {
            amount: saved.amount.clone(),
            is_international: saved.is_international,
            risk_score: self.ctx.config.baseline_fraud_probability,
        };
        let created_entry = self
            .ctx
            .events
            .append(
                EventType::TransactionCreated,
                &saved.user_id,
                AggregateType::User,
                serde_json::to_value(&created_payload).map_err(|e| RiskGuardError::Storage(e.to_string()))?,
                HashMap::new(),
                saved.created_at,
            )
            .await?;

        let bus_payload = TransactionCreatedPayload {
            transaction_id: saved.id,
            user_id: saved.user_id.clone(),
            amount: saved.amount.clone(),
            currency: saved.currency.clone(),
            created_at: saved.created_at,
            transaction_type: saved.transaction_type,
            merchant_category: saved.merchant_category.clone(),
            merchant_name: saved.merchant_name.clone(),
            is_international: saved.is_international,
            latitude: saved.latitude,
            longitude: saved.longitude,
            country: saved.country.clone(),
            city: saved.city.clone(),
            ip_address: saved.ip_address.clone(),
            event_timestamp: Utc::now(),
            event_id: Uuid::new_v4(),
            event_source: TransactionCreatedPayload::EVENT_SOURCE,
        };
        self.publish_best_effort(topics::TRANSACTION_CREATED, &saved.user_id, &bus_payload).await;

        let pending = PendingEvaluation {
            transaction: saved.clone(),
            created_sequence: created_entry.sequence_number,
        };
        if let Err(e) = self.evaluation_tx.try_send(pending) {
            warn!(user_id = %saved.user_id, error = %e, "evaluation queue full, dropping enqueue (backpressure)");
        }

        Ok(saved)
    }

    async fn publish_best_effort<T: serde::Serialize>(&self, topic: &str, key: &str, payload: &T) {
        let Ok(value) = serde_json::to_value(payload) else {
            warn!(topic, "failed to serialize bus payload");
            return;
        };
        let timeout = Duration::from_millis(self.ctx.config.bus_publish_timeout_ms);
        if let Err(e) = self.ctx.bus.publish(topic, key, value, timeout).await {
            warn!(topic, key, error = %e, "bus publish failed, relying on replay to reconcile");
        }
    }
}

/// Retries steps 1-3 of the evaluation task (load profile, load frequency,
/// evaluate rules) with exponential backoff. Nothing is appended to the
/// event log until this returns `Ok`, so a retry never risks a partial
/// fraud-event sequence.
async fn load_and_assess_with_retry(
    ctx: &WorkflowContext,
    transaction: &Transaction,
) -> RiskGuardResult<(RiskProfile, riskguard_types::MerchantCategoryFrequency, riskguard_types::FraudAssessment)> {
    let mut delay_ms = ctx.config.evaluation_retry_base_delay_ms;
    let mut last_error = None;

    for attempt in 1..=ctx.config.evaluation_max_attempts {
        match try_load_and_assess(ctx, transaction).await {
            Ok(result) => return Ok(result),
            Err(e) => {
                warn!(
                    transaction_id = %transaction.id,
                    attempt,
                    max_attempts = ctx.config.evaluation_max_attempts,
                    error = %e,
                    "fraud evaluation attempt failed"
                );
                last_error = Some(e);
                if attempt < ctx.config.evaluation_max_attempts {
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    delay_ms = (delay_ms * 2).min(ctx.config.evaluation_retry_max_delay_ms);
                }
            }
        }
    }

    let error = last_error.unwrap_or_else(|| RiskGuardError::Evaluation("unknown evaluation failure".to_string()));
    error!(transaction_id = %transaction.id, error = %error, "FRAUD_EVALUATION_FAILED: retries exhausted, no event stored");
    Err(error)
}

async fn try_load_and_assess(
    ctx: &WorkflowContext,
    transaction: &Transaction,
) -> RiskGuardResult<(RiskProfile, riskguard_types::MerchantCategoryFrequency, riskguard_types::FraudAssessment)> {
    let now = Utc::now();
    let profile = ctx
        .profiles
        .get(&transaction.user_id)
        .await?
        .unwrap_or_else(|| RiskProfile::initial(&transaction.user_id, now));

    let frequency = ctx
        .merchant_frequency
        .get(&transaction.user_id)
        .await?
        .unwrap_or_else(|| riskguard_types::MerchantCategoryFrequency::empty(&transaction.user_id, now));

    let rule_ctx = riskguard_engine::RuleContext {
        transaction,
        profile: &profile,
        merchant_frequency: &frequency,
        transaction_store: ctx.transactions.clone(),
    };
    let violations = ctx.engine.evaluate(&rule_ctx).await?;
    let assessment = riskguard_engine::assess(&profile, violations, ctx.config.scoring_thresholds());

    Ok((profile, frequency, assessment))
}

#[instrument(skip(ctx, pending), fields(transaction_id = %pending.transaction.id, user_id = %pending.transaction.user_id))]
async fn evaluate_transaction(ctx: &Arc<WorkflowContext>, pending: PendingEvaluation) -> RiskGuardResult<()> {
    let PendingEvaluation { transaction, created_sequence } = pending;
    let _guard = ctx.stripe_lock.lock(&transaction.user_id).await;

    let (profile, _frequency, assessment) = match load_and_assess_with_retry(ctx, &transaction).await {
        Ok(result) => result,
        Err(_) => return Ok(()), // FRAUD_EVALUATION_FAILED already logged; transaction stays CLEAR-unknown.
    };

    // The persisted profile is folded incrementally from this transaction's
    // own events, never rebuilt from the full log (that's what replay is
    // for). TRANSACTION_CREATED's contribution has to be folded in here too,
    // not just FRAUD_DETECTED/FRAUD_CLEARED, or total_transactions,
    // total_transaction_value, average_transaction_amount, and
    // international_transactions never move past their initial values. This
    // entry mirrors the TRANSACTION_CREATED event `process` already appended
    // during ingress field-for-field, reusing its real `sequence_number`
    // (not re-appending it) so `ProfileProjection::apply`'s watermark agrees
    // with what a later `replay_incremental_since` over the same aggregate
    // will see on the log.
    let mut transaction_created_entry = EventLogEntry::new(
        EventType::TransactionCreated,
        &transaction.user_id,
        AggregateType::User,
        serde_json::to_value(&TransactionCreatedData {
            amount: transaction.amount.clone(),
            is_international: transaction.is_international,
            risk_score: ctx.config.baseline_fraud_probability,
        })
        .map_err(|e| RiskGuardError::Storage(e.to_string()))?,
        HashMap::new(),
        transaction.created_at,
    );
    transaction_created_entry.sequence_number = created_sequence;
    let mut new_events = vec![transaction_created_entry];
    let severity = severity_for_assessment(&assessment);

    if assessment.should_block {
        let fraud_detected = build_fraud_detected(&transaction, &assessment, FraudAction::Block);
        let fraud_event = ctx
            .events
            .append(
                EventType::FraudDetected,
                &transaction.user_id,
                AggregateType::User,
                serde_json::to_value(&fraud_detected).map_err(|e| RiskGuardError::Storage(e.to_string()))?,
                HashMap::new(),
                Utc::now(),
            )
            .await?;
        new_events.push(fraud_event);
        ctx.publish_best_effort(topics::FRAUD_DETECTED, &transaction.user_id, &fraud_detected).await;

        let blocked = build_transaction_blocked(&transaction, &assessment, severity);
        let blocked_event = ctx
            .events
            .append(
                EventType::TransactionBlocked,
                &transaction.user_id,
                AggregateType::User,
                serde_json::to_value(&blocked).map_err(|e| RiskGuardError::Storage(e.to_string()))?,
                HashMap::new(),
                Utc::now(),
            )
            .await?;
        new_events.push(blocked_event);
        ctx.publish_best_effort(topics::TRANSACTION_BLOCKED, &transaction.user_id, &blocked).await;
    } else {
        let cleared = build_fraud_cleared(&transaction, &assessment);
        let cleared_event = ctx
            .events
            .append(
                EventType::FraudCleared,
                &transaction.user_id,
                AggregateType::User,
                serde_json::to_value(&cleared).map_err(|e| RiskGuardError::Storage(e.to_string()))?,
                HashMap::new(),
                Utc::now(),
            )
            .await?;
        new_events.push(cleared_event);
        ctx.publish_best_effort(topics::FRAUD_CLEARED, &transaction.user_id, &cleared).await;
    }

    let updated_profile = ProfileProjection::apply(profile.clone(), new_events);
    ctx.profiles.upsert(updated_profile.clone()).await?;

    if let Some(category) = &transaction.merchant_category {
        ctx.merchant_frequency.increment(&transaction.user_id, category, Utc::now()).await?;
    }

    let update_reason = if assessment.should_block { "fraud_detected" } else { "fraud_cleared" };
    let profile_updated = UserProfileUpdatedPayload {
        user_id: transaction.user_id.clone(),
        previous_overall_risk_score: profile.overall_risk_score,
        new_overall_risk_score: updated_profile.overall_risk_score,
        total_transactions: updated_profile.total_transactions,
        total_transaction_value: updated_profile.total_transaction_value.clone(),
        high_risk_transactions: updated_profile.high_risk_transactions,
        update_reason: update_reason.to_string(),
        triggering_transaction_id: transaction.id,
        event_timestamp: Utc::now(),
        event_id: Uuid::new_v4(),
        event_source: UserProfileUpdatedPayload::EVENT_SOURCE,
    };
    // The event log stores the full snapshot (every field replay's fold can
    // touch), not the narrower bus payload below. A second incremental
    // replay over the same window would otherwise re-fold TRANSACTION_CREATED
    // on top of fields the first replay already advanced, drifting fields
    // this event never pins back down.
    let snapshot = UserProfileUpdatedData {
        average_transaction_amount: Some(updated_profile.average_transaction_amount.clone()),
        total_transactions: Some(updated_profile.total_transactions),
        total_transaction_value: Some(updated_profile.total_transaction_value.clone()),
        high_risk_transactions: Some(updated_profile.high_risk_transactions),
        international_transactions: Some(updated_profile.international_transactions),
        behavioral_risk_score: Some(updated_profile.behavioral_risk_score),
        transaction_risk_score: Some(updated_profile.transaction_risk_score),
        overall_risk_score: Some(updated_profile.overall_risk_score),
    };
    ctx.events
        .append(
            EventType::UserProfileUpdated,
            &transaction.user_id,
            AggregateType::User,
            serde_json::to_value(&snapshot).map_err(|e| RiskGuardError::Storage(e.to_string()))?,
            HashMap::new(),
            Utc::now(),
        )
        .await?;
    ctx.publish_best_effort(topics::USER_PROFILE_UPDATED, &transaction.user_id, &profile_updated).await;

    maybe_publish_high_risk_alert(ctx, &transaction, &profile, &updated_profile).await?;

    Ok(())
}

async fn maybe_publish_high_risk_alert(
    ctx: &Arc<WorkflowContext>,
    transaction: &Transaction,
    previous_profile: &RiskProfile,
    updated_profile: &RiskProfile,
) -> RiskGuardResult<()> {
    let threshold = ctx.config.high_risk_alert_threshold;
    let crossed = previous_profile.overall_risk_score < threshold && updated_profile.overall_risk_score >= threshold;
    if !crossed {
        return Ok(());
    }

    let account_age_days = (Utc::now() - updated_profile.first_transaction_date).num_days();
    if account_age_days > ctx.config.high_risk_alert_account_age_days {
        return Ok(());
    }

    let alert = HighRiskUserIdentifiedPayload {
        user_id: transaction.user_id.clone(),
        overall_risk_score: updated_profile.overall_risk_score,
        risk_threshold: threshold,
        risk_factors: vec!["rapid_risk_escalation".to_string()],
        alert_severity: HighRiskUserIdentifiedPayload::severity_for_score(updated_profile.overall_risk_score),
        recommended_action: "manual_review".to_string(),
        event_timestamp: Utc::now(),
        event_id: Uuid::new_v4(),
        event_source: HighRiskUserIdentifiedPayload::EVENT_SOURCE,
    };
    ctx.publish_best_effort(topics::HIGH_RISK_USER, &transaction.user_id, &alert).await;
    Ok(())
}

fn severity_for_assessment(assessment: &riskguard_types::FraudAssessment) -> BlockSeverity {
    if assessment.fraud_probability >= 0.95 {
        BlockSeverity::Critical
    } else if assessment.fraud_probability >= 0.85 {
        BlockSeverity::High
    } else {
        BlockSeverity::Medium
    }
}

fn build_fraud_detected(
    transaction: &Transaction,
    assessment: &riskguard_types::FraudAssessment,
    action: FraudAction,
) -> FraudDetectedPayload {
    FraudDetectedPayload {
        transaction_id: transaction.id,
        user_id: transaction.user_id.clone(),
        amount: transaction.amount.clone(),
        currency: transaction.currency.clone(),
        merchant_category: transaction.merchant_category.clone(),
        is_international: transaction.is_international,
        fraud_probability: assessment.fraud_probability,
        violated_rules: assessment.violations.iter().map(|v| v.rule_id.clone()).collect(),
        risk_level: format!("{:?}", riskguard_types::RiskLevel::from_score(assessment.fraud_probability)).to_uppercase(),
        action,
        event_timestamp: Utc::now(),
        event_id: Uuid::new_v4(),
        event_source: FraudDetectedPayload::EVENT_SOURCE,
    }
}

fn build_transaction_blocked(
    transaction: &Transaction,
    assessment: &riskguard_types::FraudAssessment,
    severity: BlockSeverity,
) -> TransactionBlockedPayload {
    TransactionBlockedPayload {
        transaction_id: transaction.id,
        user_id: transaction.user_id.clone(),
        amount: transaction.amount.clone(),
        currency: transaction.currency.clone(),
        merchant_category: transaction.merchant_category.clone(),
        is_international: transaction.is_international,
        block_reason: assessment.violation_summary(),
        violated_rules: assessment.violations.iter().map(|v| v.rule_id.clone()).collect(),
        fraud_probability: assessment.fraud_probability,
        severity,
        event_timestamp: Utc::now(),
        event_id: Uuid::new_v4(),
        event_source: TransactionBlockedPayload::EVENT_SOURCE,
    }
}

fn build_fraud_cleared(transaction: &Transaction, assessment: &riskguard_types::FraudAssessment) -> FraudClearedPayload {
    FraudClearedPayload {
        transaction_id: transaction.id,
        user_id: transaction.user_id.clone(),
        amount: transaction.amount.clone(),
        currency: transaction.currency.clone(),
        merchant_category: transaction.merchant_category.clone(),
        fraud_probability: assessment.fraud_probability,
        risk_level: FraudClearedPayload::RISK_LEVEL,
        checks_performed: 8,
        event_timestamp: Utc::now(),
        event_id: Uuid::new_v4(),
        event_source: FraudClearedPayload::EVENT_SOURCE,
    }
}

