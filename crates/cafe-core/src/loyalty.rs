//! # Loyalty Program
//!
//! Points ledger and tier derivation attached to a customer.
//!
//! ## Tiers
//! ```text
//! ┌──────────┬──────────────────┐
//! │ Tier     │ Points required  │
//! ├──────────┼──────────────────┤
//! │ BRONZE   │   0              │
//! │ SILVER   │ 100              │
//! │ GOLD     │ 300              │
//! │ PLATINUM │ 500              │
//! └──────────┴──────────────────┘
//! ```
//! The tier is never set on its own: every points change recomputes it as
//! the highest tier whose threshold does not exceed the balance.

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{impl_entity, AuditInfo};

/// Window in which points count as "expiring soon".
pub const EXPIRY_WARNING_DAYS: i64 = 30;

/// Points stay valid this many months after the last accrual.
pub const POINTS_VALIDITY_MONTHS: u32 = 12;

// =============================================================================
// Tier
// =============================================================================

/// Loyalty rank derived from the points balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tier {
    #[default]
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl Tier {
    /// All tiers in ascending threshold order.
    pub const ALL: [Tier; 4] = [Tier::Bronze, Tier::Silver, Tier::Gold, Tier::Platinum];

    pub const fn points_required(&self) -> i32 {
        match self {
            Tier::Bronze => 0,
            Tier::Silver => 100,
            Tier::Gold => 300,
            Tier::Platinum => 500,
        }
    }

    pub fn next(&self) -> Option<Tier> {
        match self {
            Tier::Bronze => Some(Tier::Silver),
            Tier::Silver => Some(Tier::Gold),
            Tier::Gold => Some(Tier::Platinum),
            Tier::Platinum => None,
        }
    }

    /// Highest tier whose threshold is ≤ `points`.
    pub fn for_points(points: i32) -> Tier {
        Tier::ALL
            .iter()
            .take_while(|t| points >= t.points_required())
            .last()
            .copied()
            .unwrap_or_default()
    }
}

// =============================================================================
// Loyalty Program
// =============================================================================

/// A customer's loyalty membership.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LoyaltyProgram {
    pub id: Option<i64>,

    /// Owning customer (one-to-one).
    pub customer_id: Option<i64>,

    points: i32,

    tier: Tier,

    #[ts(as = "String")]
    pub enrollment_date: DateTime<Utc>,

    #[ts(as = "Option<String>")]
    last_points_earned_date: Option<DateTime<Utc>>,

    #[ts(as = "Option<String>")]
    last_points_redeemed_date: Option<DateTime<Utc>>,

    #[ts(as = "Option<String>")]
    points_expiration_date: Option<DateTime<Utc>>,

    pub active: bool,

    /// `LP-%08d` of the customer id; unique (enforced by the store).
    member_number: Option<String>,

    pub eligible_for_special_offers: bool,

    pub version: i64,

    pub audit: AuditInfo,
}

impl_entity!(LoyaltyProgram, "loyalty_program");

impl LoyaltyProgram {
    /// A fresh BRONZE membership with zero points.
    pub fn enroll(customer_id: Option<i64>) -> Self {
        let mut program = LoyaltyProgram {
            id: None,
            customer_id,
            points: 0,
            tier: Tier::Bronze,
            enrollment_date: Utc::now(),
            last_points_earned_date: None,
            last_points_redeemed_date: None,
            points_expiration_date: None,
            active: true,
            member_number: None,
            eligible_for_special_offers: true,
            version: 0,
            audit: AuditInfo::default(),
        };
        program.generate_member_number();
        program
    }

    pub fn points(&self) -> i32 {
        self.points
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn member_number(&self) -> Option<&str> {
        self.member_number.as_deref()
    }

    pub fn last_points_earned_date(&self) -> Option<DateTime<Utc>> {
        self.last_points_earned_date
    }

    pub fn last_points_redeemed_date(&self) -> Option<DateTime<Utc>> {
        self.last_points_redeemed_date
    }

    pub fn points_expiration_date(&self) -> Option<DateTime<Utc>> {
        self.points_expiration_date
    }

    /// Credits points; expiration moves to one year out.
    ///
    /// Returns the new balance.
    pub fn add_points(&mut self, points: i32) -> CoreResult<i32> {
        self.add_points_at(points, Utc::now())
    }

    /// [`LoyaltyProgram::add_points`] with an explicit clock.
    pub fn add_points_at(&mut self, points: i32, now: DateTime<Utc>) -> CoreResult<i32> {
        if points <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "points".to_string(),
            }
            .into());
        }

        let balance = self.points.checked_add(points).ok_or_else(|| {
            ValidationError::OutOfRange {
                field: "points".to_string(),
                min: "1".to_string(),
                max: (i32::MAX - self.points).to_string(),
            }
        })?;

        self.points = balance;
        self.last_points_earned_date = Some(now);
        self.points_expiration_date =
            Some(now.checked_add_months(Months::new(POINTS_VALIDITY_MONTHS)).unwrap_or(now));
        self.update_tier();

        debug!(member = ?self.member_number, points, balance, tier = ?self.tier, "Loyalty points added");
        Ok(self.points)
    }

    /// Debits points. Returns the remaining balance.
    ///
    /// ## Errors
    /// - `points` ≤ 0
    /// - `points` > balance (balance unchanged)
    pub fn redeem_points(&mut self, points: i32) -> CoreResult<i32> {
        if points <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "points".to_string(),
            }
            .into());
        }

        if points > self.points {
            return Err(CoreError::InsufficientPoints {
                available: self.points,
                requested: points,
            });
        }

        self.points -= points;
        self.last_points_redeemed_date = Some(Utc::now());
        self.update_tier();

        debug!(member = ?self.member_number, points, balance = self.points, tier = ?self.tier, "Loyalty points redeemed");
        Ok(self.points)
    }

    fn update_tier(&mut self) {
        self.tier = Tier::for_points(self.points);
    }

    /// Points missing to reach the next tier, 0 at PLATINUM.
    pub fn points_to_next_tier(&self) -> i32 {
        match self.tier.next() {
            Some(next) => (next.points_required() - self.points).max(0),
            None => 0,
        }
    }

    /// True iff an expiration is set and falls within the next 30 days.
    pub fn is_points_expiring_soon(&self) -> bool {
        self.is_points_expiring_soon_at(Utc::now())
    }

    /// [`LoyaltyProgram::is_points_expiring_soon`] relative to `now`.
    pub fn is_points_expiring_soon_at(&self, now: DateTime<Utc>) -> bool {
        let horizon = now + Duration::days(EXPIRY_WARNING_DAYS);
        self.points_expiration_date
            .is_some_and(|expires| expires > now && expires < horizon)
    }

    /// Sets the member number from the customer id, if one is known.
    pub fn generate_member_number(&mut self) -> Option<&str> {
        if let Some(customer_id) = self.customer_id {
            self.member_number = Some(format!("LP-{customer_id:08}"));
        }
        self.member_number.as_deref()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn program_with(points: i32) -> LoyaltyProgram {
        let mut p = LoyaltyProgram::enroll(Some(42));
        if points > 0 {
            p.add_points(points).unwrap();
        }
        p
    }

    #[test]
    fn test_enroll_defaults() {
        let p = LoyaltyProgram::enroll(Some(42));
        assert_eq!(p.points(), 0);
        assert_eq!(p.tier(), Tier::Bronze);
        assert_eq!(p.member_number(), Some("LP-00000042"));
        assert!(p.active);

        let anonymous = LoyaltyProgram::enroll(None);
        assert!(anonymous.member_number().is_none());
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(program_with(99).tier(), Tier::Bronze);
        assert_eq!(program_with(100).tier(), Tier::Silver);
        assert_eq!(program_with(299).tier(), Tier::Silver);
        assert_eq!(program_with(300).tier(), Tier::Gold);
        assert_eq!(program_with(499).tier(), Tier::Gold);
        assert_eq!(program_with(500).tier(), Tier::Platinum);
        assert_eq!(program_with(5000).tier(), Tier::Platinum);
    }

    #[test]
    fn test_redeem_recomputes_tier_downwards() {
        let mut p = program_with(300);
        assert_eq!(p.tier(), Tier::Gold);

        assert_eq!(p.redeem_points(201).unwrap(), 99);
        assert_eq!(p.tier(), Tier::Bronze);
        assert!(p.last_points_redeemed_date().is_some());
    }

    #[test]
    fn test_invalid_point_amounts() {
        let mut p = program_with(50);
        assert!(p.add_points(0).is_err());
        assert!(p.add_points(-5).is_err());
        assert!(p.redeem_points(0).is_err());

        let err = p.redeem_points(51).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientPoints { available: 50, requested: 51 }
        ));
        assert_eq!(p.points(), 50);
    }

    #[test]
    fn test_points_to_next_tier() {
        assert_eq!(program_with(0).points_to_next_tier(), 100);
        assert_eq!(program_with(250).points_to_next_tier(), 50);
        assert_eq!(program_with(300).points_to_next_tier(), 200);
        assert_eq!(program_with(650).points_to_next_tier(), 0);
    }

    #[test]
    fn test_add_points_sets_one_year_expiration() {
        let mut p = LoyaltyProgram::enroll(Some(1));
        let now = Utc::now();
        p.add_points_at(10, now).unwrap();

        let expires = p.points_expiration_date().unwrap();
        assert!(expires > now + Duration::days(364));
        assert!(expires <= now + Duration::days(366));
        assert_eq!(p.last_points_earned_date(), Some(now));
    }

    #[test]
    fn test_expiring_soon_window() {
        let mut p = LoyaltyProgram::enroll(Some(1));
        let now = Utc::now();
        assert!(!p.is_points_expiring_soon_at(now));

        p.add_points_at(10, now).unwrap();
        let expires = p.points_expiration_date().unwrap();

        assert!(!p.is_points_expiring_soon_at(now));
        assert!(p.is_points_expiring_soon_at(expires - Duration::days(10)));
        assert!(!p.is_points_expiring_soon_at(expires - Duration::days(30)));
        assert!(!p.is_points_expiring_soon_at(expires));
        assert!(!p.is_points_expiring_soon_at(expires + Duration::days(1)));
    }

    #[test]
    fn test_tier_for_points_helper() {
        assert_eq!(Tier::for_points(-10), Tier::Bronze);
        assert_eq!(Tier::for_points(0), Tier::Bronze);
        assert_eq!(Tier::Gold.next(), Some(Tier::Platinum));
        assert_eq!(Tier::Platinum.next(), None);
    }
}
