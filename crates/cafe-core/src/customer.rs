//! # Customers
//!
//! A café customer with contact details and an optional owned
//! [`LoyaltyProgram`]. Orders point at customers by id; the customer does not
//! list its orders (the order store indexes them by customer).

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreResult;
use crate::loyalty::LoyaltyProgram;
use crate::types::{impl_entity, AuditInfo};
use crate::validation::{validate_email, validate_name, validate_phone_number};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Customer {
    pub id: Option<i64>,

    pub first_name: String,

    pub last_name: String,

    /// Unique when present (enforced by the store).
    pub email: Option<String>,

    /// Unique when present (enforced by the store).
    pub phone_number: Option<String>,

    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,

    #[ts(as = "Option<String>")]
    pub date_of_birth: Option<NaiveDate>,

    #[ts(as = "String")]
    pub registration_date: DateTime<Utc>,

    pub dietary_preferences: Option<String>,

    pub favorite_products: Option<String>,

    pub marketing_consent: bool,

    pub active: bool,

    loyalty_program: Option<LoyaltyProgram>,

    pub version: i64,

    pub audit: AuditInfo,
}

impl_entity!(Customer, "customer");

impl Customer {
    /// Creates an active customer registered now.
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> CoreResult<Self> {
        let first_name = first_name.into();
        let last_name = last_name.into();
        validate_name("first_name", &first_name, 50)?;
        validate_name("last_name", &last_name, 50)?;

        Ok(Customer {
            id: None,
            first_name,
            last_name,
            email: None,
            phone_number: None,
            address: None,
            city: None,
            state: None,
            postal_code: None,
            country: None,
            date_of_birth: None,
            registration_date: Utc::now(),
            dietary_preferences: None,
            favorite_products: None,
            marketing_consent: false,
            active: true,
            loyalty_program: None,
            version: 0,
            audit: AuditInfo::default(),
        })
    }

    /// Sets the email after validating its shape.
    pub fn with_email(mut self, email: impl Into<String>) -> CoreResult<Self> {
        let email = email.into();
        validate_email(&email)?;
        self.email = Some(email);
        Ok(self)
    }

    /// Sets the phone number after validating it (`+` optional, 10-15 digits).
    pub fn with_phone_number(mut self, phone: impl Into<String>) -> CoreResult<Self> {
        let phone = phone.into();
        validate_phone_number(&phone)?;
        self.phone_number = Some(phone);
        Ok(self)
    }

    /// "First Last".
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Enrolls the customer, or returns the existing program untouched.
    pub fn enroll_in_loyalty_program(&mut self) -> &mut LoyaltyProgram {
        let customer_id = self.id;
        self.loyalty_program
            .get_or_insert_with(|| LoyaltyProgram::enroll(customer_id))
    }

    pub fn loyalty_program(&self) -> Option<&LoyaltyProgram> {
        self.loyalty_program.as_ref()
    }

    pub fn loyalty_program_mut(&mut self) -> Option<&mut LoyaltyProgram> {
        self.loyalty_program.as_mut()
    }

    pub fn is_enrolled(&self) -> bool {
        self.loyalty_program.is_some()
    }

    /// Month and day of birth match `date`.
    pub fn is_birthday_on(&self, date: NaiveDate) -> bool {
        self.date_of_birth
            .is_some_and(|dob| dob.month() == date.month() && dob.day() == date.day())
    }

    pub fn is_birthday_today(&self) -> bool {
        self.is_birthday_on(Utc::now().date_naive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_customer() {
        let c = Customer::new("Ada", "Lovelace").unwrap();
        assert_eq!(c.full_name(), "Ada Lovelace");
        assert!(c.active);
        assert!(!c.marketing_consent);
        assert!(c.loyalty_program().is_none());

        assert!(Customer::new("", "Lovelace").is_err());
        assert!(Customer::new("Ada", "x".repeat(51)).is_err());
    }

    #[test]
    fn test_contact_validation() {
        let c = Customer::new("Ada", "Lovelace")
            .unwrap()
            .with_email("ada@example.com")
            .unwrap()
            .with_phone_number("+441234567890")
            .unwrap();
        assert_eq!(c.email.as_deref(), Some("ada@example.com"));

        let bad = Customer::new("Ada", "Lovelace").unwrap().with_phone_number("123");
        assert!(bad.is_err());
        let bad = Customer::new("Ada", "Lovelace").unwrap().with_email("nope");
        assert!(bad.is_err());
    }

    #[test]
    fn test_enroll_is_idempotent() {
        let mut c = Customer::new("Ada", "Lovelace").unwrap();
        c.id = Some(7);

        c.enroll_in_loyalty_program().add_points(40).unwrap();
        let program = c.enroll_in_loyalty_program();
        assert_eq!(program.points(), 40);
        assert_eq!(program.member_number(), Some("LP-00000007"));
        assert!(c.is_enrolled());
    }

    #[test]
    fn test_birthday() {
        let mut c = Customer::new("Ada", "Lovelace").unwrap();
        let day = NaiveDate::from_ymd_opt(2026, 12, 10).unwrap();
        assert!(!c.is_birthday_on(day));

        c.date_of_birth = NaiveDate::from_ymd_opt(1815, 12, 10);
        assert!(c.is_birthday_on(day));
        assert!(!c.is_birthday_on(NaiveDate::from_ymd_opt(2026, 12, 11).unwrap()));
    }
}
