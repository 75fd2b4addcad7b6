//! # Customer Repository
//!
//! Customers and their owned loyalty programs.
//!
//! ## Loyalty Membership
//! ```text
//! customer.enroll_in_loyalty_program()   (in memory, no member number yet
//!      │                                  if the customer was never saved)
//!      ▼
//! repo.save(&mut customer)
//!      ├── customer id assigned (first save)
//!      ├── program.customer_id = customer id
//!      ├── member number = LP-%08d(customer id), must be unique
//!      └── program id assigned, program version bumped
//! ```
//! Deleting a customer deletes the program with it. Orders are not touched.

use cafe_core::{Customer, Entity, LoyaltyProgram};
use chrono::Utc;
use tracing::{debug, info};

use super::{Table, UniqueIndex};
use crate::error::DbResult;

#[derive(Debug, Clone)]
pub struct CustomerRepository {
    table: Table<Customer>,
    emails: UniqueIndex,
    phones: UniqueIndex,
    member_numbers: UniqueIndex,
    last_program_id: i64,
    actor: String,
}

/// Unique keys of one stored customer.
struct Keys {
    email: Option<String>,
    phone: Option<String>,
    member_number: Option<String>,
}

impl Keys {
    fn of(customer: &Customer) -> Self {
        Keys {
            email: customer.email.clone(),
            phone: customer.phone_number.clone(),
            member_number: customer
                .loyalty_program()
                .and_then(LoyaltyProgram::member_number)
                .map(str::to_string),
        }
    }
}

impl CustomerRepository {
    pub fn new(actor: impl Into<String>) -> Self {
        let actor = actor.into();
        CustomerRepository {
            table: Table::new(actor.clone()),
            emails: UniqueIndex::new("email"),
            phones: UniqueIndex::new("phone number"),
            member_numbers: UniqueIndex::new("member number"),
            last_program_id: 0,
            actor,
        }
    }

    /// Inserts or updates a customer together with its loyalty program.
    ///
    /// ## Errors
    /// - `VersionConflict` if `customer` is a stale copy
    /// - `UniqueViolation` on email, phone number or member number
    pub fn save(&mut self, customer: &mut Customer) -> DbResult<i64> {
        let old = self.table.check_version(customer)?.map(Keys::of);

        let owner = customer.id;
        let id = owner.unwrap_or_else(|| self.table.peek_next_id());
        let member_number = customer
            .loyalty_program()
            .map(|_| format!("LP-{id:08}"));

        self.emails.ensure_free(customer.email.as_deref(), owner)?;
        self.phones
            .ensure_free(customer.phone_number.as_deref(), owner)?;
        self.member_numbers
            .ensure_free(member_number.as_deref(), owner)?;

        // Checks passed; the program follows its owner.
        let actor = self.actor.clone();
        let next_program_id = self.last_program_id + 1;
        let mut new_program = false;
        if let Some(program) = customer.loyalty_program_mut() {
            program.customer_id = Some(id);
            program.generate_member_number();
            if program.id.is_none() {
                program.set_id(next_program_id);
                new_program = true;
            }
            program.set_version(program.version + 1);
            program.audit_mut().touch(&actor, Utc::now());
        }
        if new_program {
            self.last_program_id = next_program_id;
        }

        let id = self.table.write(customer);

        let new = Keys::of(customer);
        let old = old.unwrap_or(Keys {
            email: None,
            phone: None,
            member_number: None,
        });
        self.emails
            .replace(old.email.as_deref(), new.email.as_deref(), id);
        self.phones
            .replace(old.phone.as_deref(), new.phone.as_deref(), id);
        self.member_numbers.replace(
            old.member_number.as_deref(),
            new.member_number.as_deref(),
            id,
        );

        if owner.is_none() {
            info!(id, name = %customer.full_name(), "Customer created");
        } else {
            debug!(id, version = customer.version, "Customer updated");
        }
        if new_program {
            info!(customer = id, member = ?new.member_number, "Loyalty program enrolled");
        }
        Ok(id)
    }

    pub fn get(&self, id: i64) -> Option<&Customer> {
        self.table.get(id)
    }

    pub fn load(&self, id: i64) -> DbResult<Customer> {
        self.table.load(id)
    }

    pub fn find_by_email(&self, email: &str) -> Option<&Customer> {
        self.emails.get(email).and_then(|id| self.table.get(id))
    }

    pub fn find_by_phone(&self, phone: &str) -> Option<&Customer> {
        self.phones.get(phone).and_then(|id| self.table.get(id))
    }

    pub fn find_by_member_number(&self, member_number: &str) -> Option<&Customer> {
        self.member_numbers
            .get(member_number)
            .and_then(|id| self.table.get(id))
    }

    pub fn list(&self) -> impl Iterator<Item = &Customer> {
        self.table.iter()
    }

    pub fn count(&self) -> usize {
        self.table.len()
    }

    /// Deletes a customer and its loyalty program.
    pub fn delete(&mut self, id: i64) -> DbResult<Customer> {
        let removed = self.table.remove(id)?;
        let keys = Keys::of(&removed);
        self.emails.remove(keys.email.as_deref(), id);
        self.phones.remove(keys.phone.as_deref(), id);
        self.member_numbers.remove(keys.member_number.as_deref(), id);

        info!(id, "Customer deleted");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;

    fn customer(first: &str, email: &str) -> Customer {
        Customer::new(first, "Tester")
            .unwrap()
            .with_email(email)
            .unwrap()
    }

    #[test]
    fn test_member_number_generated_on_first_save() {
        let mut repo = CustomerRepository::new("test");
        let mut c = customer("Ana", "ana@example.com");
        c.enroll_in_loyalty_program();
        assert!(c.loyalty_program().unwrap().member_number().is_none());

        let id = repo.save(&mut c).unwrap();
        let program = c.loyalty_program().unwrap();
        assert_eq!(program.customer_id, Some(id));
        assert_eq!(program.member_number(), Some("LP-00000001"));
        assert_eq!(program.id, Some(1));
        assert_eq!(
            repo.find_by_member_number("LP-00000001").unwrap().id,
            Some(id)
        );
    }

    #[test]
    fn test_enrolling_later_keeps_customer_id() {
        let mut repo = CustomerRepository::new("test");
        repo.save(&mut customer("First", "first@example.com")).unwrap();

        let mut c = customer("Ben", "ben@example.com");
        let id = repo.save(&mut c).unwrap();
        c.enroll_in_loyalty_program();
        repo.save(&mut c).unwrap();

        assert_eq!(id, 2);
        assert_eq!(
            c.loyalty_program().unwrap().member_number(),
            Some("LP-00000002")
        );
        assert_eq!(c.version, 2);
    }

    #[test]
    fn test_unique_contacts() {
        let mut repo = CustomerRepository::new("test");
        let mut a = customer("Ana", "shared@example.com")
            .with_phone_number("0123456789")
            .unwrap();
        repo.save(&mut a).unwrap();

        let mut b = customer("Ben", "shared@example.com");
        assert!(matches!(
            repo.save(&mut b).unwrap_err(),
            DbError::UniqueViolation { .. }
        ));

        let mut c = customer("Cy", "cy@example.com")
            .with_phone_number("0123456789")
            .unwrap();
        assert!(repo.save(&mut c).is_err());
        assert_eq!(repo.count(), 1);

        // Re-saving the owner with its own keys is fine.
        repo.save(&mut a).unwrap();
    }

    #[test]
    fn test_delete_frees_keys() {
        let mut repo = CustomerRepository::new("test");
        let mut a = customer("Ana", "ana@example.com");
        a.enroll_in_loyalty_program();
        let id = repo.save(&mut a).unwrap();

        let removed = repo.delete(id).unwrap();
        assert!(removed.loyalty_program().is_some());
        assert!(repo.find_by_email("ana@example.com").is_none());
        assert!(repo.find_by_member_number("LP-00000001").is_none());
    }
}
