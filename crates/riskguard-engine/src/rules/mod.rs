mod amount_spike;
mod geographic_hopping;
mod geographic_new_user;
mod high_amount;
mod high_risk_merchant;
mod impossible_travel;
mod unusual_hour;
mod velocity;

#[cfg(test)]
mod test_support;

pub use amount_spike::AmountSpikeRule;
pub use geographic_hopping::GeographicCountryHoppingRule;
pub use geographic_new_user::GeographicNewUserNewCountryRule;
pub use high_amount::HighAmountRule;
pub use high_risk_merchant::HighRiskMerchantRule;
pub use impossible_travel::ImpossibleTravelRule;
pub use unusual_hour::UnusualHourRule;
pub use velocity::Velocity5MinRule;
