use bigdecimal::{BigDecimal, ToPrimitive};
use riskguard_types::{EventLogEntry, EventType, RiskProfile};

use crate::payload::{parse, TransactionCreatedData, UserProfileUpdatedData};

/// Pure function from an ordered event stream to a `RiskProfile`. Never
/// reads wall time or touches a store — every input is the event stream
/// itself.
pub struct ProfileProjection;

impl ProfileProjection {
    /// `build`: start from the initial snapshot, sort by `sequence_number`,
    /// fold in order.
    pub fn build(user_id: &str, mut events: Vec<EventLogEntry>, now: chrono::DateTime<chrono::Utc>) -> RiskProfile {
        events.sort_by_key(|e| e.sequence_number);
        let initial = RiskProfile::initial(user_id, now);
        let mut profile = events.iter().fold(initial, |profile, event| fold_event(profile, event));
        if let Some(last) = events.last() {
            profile.last_applied_sequence = last.sequence_number;
        }
        profile
    }

    /// `apply`: the same fold, starting from an existing snapshot instead of
    /// the initial one, enabling incremental updates. Events whose
    /// `sequence_number` is not greater than `profile.last_applied_sequence`
    /// are skipped rather than re-folded, so calling `apply` twice with a
    /// batch that overlaps what was already applied is a no-op for the
    /// overlap — this is what makes `replay_incremental_since` idempotent.
    pub fn apply(mut profile: RiskProfile, mut new_events: Vec<EventLogEntry>) -> RiskProfile {
        new_events.sort_by_key(|e| e.sequence_number);
        new_events.retain(|e| e.sequence_number > profile.last_applied_sequence);
        for event in &new_events {
            profile = fold_event(profile, event);
        }
        if let Some(last) = new_events.last() {
            profile.last_applied_sequence = last.sequence_number;
        }
        profile
    }
}

fn fold_event(profile: RiskProfile, event: &EventLogEntry) -> RiskProfile {
    match event.event_type {
        EventType::TransactionCreated => fold_transaction_created(profile, event),
        EventType::FraudDetected => fold_fraud_detected(profile),
        EventType::FraudCleared => fold_fraud_cleared(profile),
        EventType::UserProfileUpdated => fold_profile_updated(profile, event),
        EventType::TransactionBlocked | EventType::HighRiskUserIdentified => profile,
    }
}

fn fold_transaction_created(mut profile: RiskProfile, event: &EventLogEntry) -> RiskProfile {
    let data: TransactionCreatedData = parse(&event.event_data);

    let was_first = profile.total_transactions == 0;
    let total_tx = profile.total_transactions + 1;
    let total_value = &profile.total_transaction_value + &data.amount;
    let avg = &total_value / BigDecimal::from(total_tx);
    let intl_tx = profile.international_transactions + if data.is_international { 1 } else { 0 };

    let avg_f = avg.to_f64().unwrap_or(0.0);
    let amount_f = data.amount.to_f64().unwrap_or(0.0);
    let tx_risk = if total_tx <= 2 {
        data.risk_score
    } else {
        let deviation_ratio = if avg_f.abs() > f64::EPSILON {
            ((amount_f - avg_f) / avg_f).abs().min(1.0)
        } else {
            0.0
        };
        0.7 * data.risk_score + 0.3 * deviation_ratio
    };

    let intl_ratio = intl_tx as f64 / total_tx as f64;
    let behavioral = if data.is_international && intl_ratio < 0.1 {
        (profile.behavioral_risk_score + 0.15).min(1.0)
    } else {
        profile.behavioral_risk_score * 0.98
    };

    let overall = (tx_risk + behavioral) / 2.0;

    profile.total_transactions = total_tx;
    profile.total_transaction_value = total_value;
    profile.average_transaction_amount = avg;
    profile.international_transactions = intl_tx;
    profile.transaction_risk_score = tx_risk;
    profile.behavioral_risk_score = behavioral;
    profile.overall_risk_score = overall;
    if was_first {
        profile.first_transaction_date = event.created_at;
    }
    profile.last_transaction_date = event.created_at;
    profile
}

fn fold_fraud_detected(mut profile: RiskProfile) -> RiskProfile {
    profile.high_risk_transactions += 1;
    profile.behavioral_risk_score = (profile.behavioral_risk_score + 0.2).min(1.0);
    profile.overall_risk_score = (profile.transaction_risk_score + profile.behavioral_risk_score) / 2.0;
    profile
}

fn fold_fraud_cleared(mut profile: RiskProfile) -> RiskProfile {
    profile.behavioral_risk_score = (profile.behavioral_risk_score - 0.1).max(0.0);
    profile.overall_risk_score = (profile.transaction_risk_score + profile.behavioral_risk_score) / 2.0;
    profile
}

fn fold_profile_updated(mut profile: RiskProfile, event: &EventLogEntry) -> RiskProfile {
    let overrides: UserProfileUpdatedData = parse(&event.event_data);
    if let Some(v) = overrides.average_transaction_amount {
        profile.average_transaction_amount = v;
    }
    if let Some(v) = overrides.total_transactions {
        profile.total_transactions = v;
    }
    if let Some(v) = overrides.total_transaction_value {
        profile.total_transaction_value = v;
    }
    if let Some(v) = overrides.high_risk_transactions {
        profile.high_risk_transactions = v;
    }
    if let Some(v) = overrides.international_transactions {
        profile.international_transactions = v;
    }
    if let Some(v) = overrides.behavioral_risk_score {
        profile.behavioral_risk_score = v;
    }
    if let Some(v) = overrides.transaction_risk_score {
        profile.transaction_risk_score = v;
    }
    if let Some(v) = overrides.overall_risk_score {
        profile.overall_risk_score = v;
    }
    profile
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use riskguard_types::AggregateType;
    use serde_json::json;
    use std::collections::HashMap;
    use std::str::FromStr;

    fn created_event(seq: i64, amount: &str, is_international: bool) -> EventLogEntry {
        let data = TransactionCreatedData {
            amount: BigDecimal::from_str(amount).unwrap(),
            is_international,
            risk_score: 0.05,
        };
        EventLogEntry {
            event_id: uuid::Uuid::new_v4(),
            event_type: EventType::TransactionCreated,
            aggregate_id: "u1".to_string(),
            aggregate_type: AggregateType::User,
            event_data: serde_json::to_value(&data).unwrap(),
            metadata: HashMap::new(),
            created_at: Utc::now(),
            sequence_number: seq,
            version: 1,
        }
    }

    #[test]
    fn first_transaction_sets_counters() {
        let profile = ProfileProjection::build("u1", vec![created_event(1, "50.00", false)], Utc::now());
        assert_eq!(profile.total_transactions, 1);
        assert_eq!(profile.total_transaction_value, BigDecimal::from_str("50.00").unwrap());
    }

    #[test]
    fn fraud_detected_increments_high_risk_count() {
        let now = Utc::now();
        let mut events = vec![created_event(1, "50.00", false)];
        events.push(EventLogEntry {
            event_id: uuid::Uuid::new_v4(),
            event_type: EventType::FraudDetected,
            aggregate_id: "u1".to_string(),
            aggregate_type: AggregateType::User,
            event_data: json!({}),
            metadata: HashMap::new(),
            created_at: now,
            sequence_number: 2,
            version: 1,
        });
        let profile = ProfileProjection::build("u1", events, now);
        assert_eq!(profile.high_risk_transactions, 1);
    }

    #[test]
    fn replay_is_order_independent_of_invocation_but_sorted_by_sequence() {
        let now = Utc::now();
        let mut events = vec![created_event(2, "100.00", false), created_event(1, "50.00", false)];
        let profile_a = ProfileProjection::build("u1", events.clone(), now);
        events.reverse();
        let profile_b = ProfileProjection::build("u1", events, now);
        assert_eq!(profile_a.total_transactions, profile_b.total_transactions);
        assert_eq!(profile_a.total_transaction_value, profile_b.total_transaction_value);
    }

    #[test]
    fn apply_continues_from_existing_snapshot() {
        let now = Utc::now();
        let base = ProfileProjection::build("u1", vec![created_event(1, "50.00", false)], now);
        let updated = ProfileProjection::apply(base, vec![created_event(2, "60.00", false)]);
        assert_eq!(updated.total_transactions, 2);
    }

    #[test]
    fn profile_updated_overrides_only_present_fields() {
        let now = Utc::now();
        let base = ProfileProjection::build("u1", vec![created_event(1, "50.00", false)], now);
        let override_event = EventLogEntry {
            event_id: uuid::Uuid::new_v4(),
            event_type: EventType::UserProfileUpdated,
            aggregate_id: "u1".to_string(),
            aggregate_type: AggregateType::User,
            event_data: json!({"overall_risk_score": 0.9}),
            metadata: HashMap::new(),
            created_at: now,
            sequence_number: 2,
            version: 1,
        };
        let updated = ProfileProjection::apply(base.clone(), vec![override_event]);
        assert_eq!(updated.overall_risk_score, 0.9);
        assert_eq!(updated.total_transactions, base.total_transactions);
    }
}
