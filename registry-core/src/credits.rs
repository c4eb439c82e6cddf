//! Credit model: issue → (transfer)* → retire
//!
//! Issuance is gated on registration plus issuer authorization, so every
//! credit is verified at creation; there is no pending state. Purchases move
//! value through the settlement engine before any state is written, and a
//! failed leg aborts the whole operation. Retirement is terminal.

use crate::error::{Error, Result};
use crate::events::{EventEnvelope, RegistryEvent};
use crate::settlement::{execute_atomically, SettlementEngine, TransferLeg};
use crate::state::RegistryState;
use crate::types::{Address, CarbonCredit, CreditId};
use chrono::Utc;
use rust_decimal::Decimal;

impl RegistryState {
    /// Issue a new credit to the issuer's own account.
    ///
    /// The issuer must be a registered participant and an authorized issuer.
    /// Counters are untouched on any failure.
    #[allow(clippy::too_many_arguments)]
    pub fn issue_credit(
        &mut self,
        issuer: Address,
        project_name: String,
        amount_tonnes: u64,
        price_per_tonne: Decimal,
        verification_hash: String,
        methodology: String,
    ) -> Result<(CreditId, EventEnvelope)> {
        self.require_registered(&issuer)?;
        if !self.is_authorized_issuer(&issuer) {
            return Err(Error::Unauthorized(format!(
                "{issuer} is not an authorized issuer"
            )));
        }

        if amount_tonnes == 0 {
            return Err(Error::InvalidInput("credit amount is zero".to_string()));
        }
        if price_per_tonne <= Decimal::ZERO {
            return Err(Error::InvalidInput(
                "price per tonne must be positive".to_string(),
            ));
        }
        if project_name.is_empty() {
            return Err(Error::InvalidInput("project name is empty".to_string()));
        }
        if verification_hash.is_empty() {
            return Err(Error::InvalidInput(
                "verification hash is empty".to_string(),
            ));
        }
        if Decimal::from(amount_tonnes)
            .checked_mul(price_per_tonne)
            .is_none()
        {
            return Err(Error::InvalidInput(
                "total price exceeds the representable range".to_string(),
            ));
        }
        let new_balance = self
            .participant(&issuer)?
            .credits_owned
            .checked_add(amount_tonnes)
            .ok_or_else(|| {
                Error::InvalidInput(format!("tonnage balance of {issuer} would overflow"))
            })?;

        self.counters.credits_issued += 1;
        let credit_id = self.counters.credits_issued;

        let credit = CarbonCredit {
            id: credit_id,
            issuer: issuer.clone(),
            project_name: project_name.clone(),
            amount_tonnes,
            price_per_tonne,
            verified: true,
            retired: false,
            current_owner: issuer.clone(),
            issued_at: Utc::now(),
            verification_hash,
            methodology,
        };
        self.credits.insert(credit_id, credit);

        let holder = self.participant_mut(&issuer)?;
        holder.owned_credits.insert(credit_id);
        holder.credits_owned = new_balance;

        let envelope = self.events.append(RegistryEvent::CreditIssued {
            credit_id,
            issuer,
            project_name,
            amount_tonnes,
            price_per_tonne,
        });
        Ok((credit_id, envelope))
    }

    /// Purchase a credit at its full price, refunding any excess payment.
    ///
    /// Payment and refund settle atomically with the ownership change: all
    /// three legs (buyer→ledger payment, ledger→seller price, ledger→buyer
    /// refund) must complete before any registry state moves, and a failed
    /// leg reverses the completed ones.
    pub fn purchase_credit(
        &mut self,
        buyer: Address,
        credit_id: CreditId,
        payment: Decimal,
        engine: &dyn SettlementEngine,
    ) -> Result<EventEnvelope> {
        self.require_registered(&buyer)?;

        let credit = self.credit(credit_id)?;
        if credit.retired {
            return Err(Error::AlreadyRetired(credit_id));
        }
        if credit.current_owner == buyer {
            return Err(Error::SelfTransfer(credit_id));
        }

        let seller = credit.current_owner.clone();
        let amount_tonnes = credit.amount_tonnes;
        let total_price = credit.total_price().ok_or_else(|| {
            Error::InvalidInput("total price exceeds the representable range".to_string())
        })?;
        if payment < total_price {
            return Err(Error::InsufficientPayment {
                required: total_price,
                offered: payment,
            });
        }
        let refund = payment - total_price;

        let buyer_balance = self
            .participant(&buyer)?
            .credits_owned
            .checked_add(amount_tonnes)
            .ok_or_else(|| {
                Error::InvalidInput(format!("tonnage balance of {buyer} would overflow"))
            })?;

        let ledger = self.settlement_account.clone();
        let legs = [
            TransferLeg::new(buyer.clone(), ledger.clone(), payment),
            TransferLeg::new(ledger.clone(), seller.clone(), total_price),
            TransferLeg::new(ledger, buyer.clone(), refund),
        ];
        execute_atomically(engine, &legs)?;

        // Settlement committed; the in-memory writes below cannot fail.
        let seller_record = self.participant_mut(&seller)?;
        seller_record.owned_credits.remove(&credit_id);
        seller_record.credits_owned -= amount_tonnes;

        let buyer_record = self.participant_mut(&buyer)?;
        buyer_record.owned_credits.insert(credit_id);
        buyer_record.credits_owned = buyer_balance;

        if let Some(credit) = self.credits.get_mut(&credit_id) {
            credit.current_owner = buyer.clone();
        }

        Ok(self.events.append(RegistryEvent::CreditTransferred {
            credit_id,
            from: seller,
            to: buyer,
            total_price,
            refund,
        }))
    }

    /// Retire a credit, taking its tonnes out of circulation permanently.
    ///
    /// Only the current owner may retire; a second attempt fails with
    /// `AlreadyRetired`.
    pub fn retire_credit(&mut self, caller: &Address, credit_id: CreditId) -> Result<EventEnvelope> {
        let credit = self.credit(credit_id)?;
        if credit.retired {
            return Err(Error::AlreadyRetired(credit_id));
        }
        if &credit.current_owner != caller {
            return Err(Error::Unauthorized(format!(
                "{caller} does not own credit {credit_id}"
            )));
        }

        let amount_tonnes = credit.amount_tonnes;
        let retired_balance = self
            .participant(caller)?
            .credits_retired
            .checked_add(amount_tonnes)
            .ok_or_else(|| {
                Error::InvalidInput(format!("retired balance of {caller} would overflow"))
            })?;

        if let Some(credit) = self.credits.get_mut(&credit_id) {
            credit.retired = true;
        }

        let owner = self.participant_mut(caller)?;
        owner.owned_credits.remove(&credit_id);
        owner.credits_owned -= amount_tonnes;
        owner.credits_retired = retired_balance;

        Ok(self.events.append(RegistryEvent::CreditRetired {
            credit_id,
            owner: caller.clone(),
            amount_tonnes,
        }))
    }
}
