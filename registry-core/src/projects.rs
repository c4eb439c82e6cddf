//! Project model: create → (fund)* → (verify, progress-update)*
//!
//! Funding forwards value to the project owner immediately through the
//! settlement engine; the ledger holds nothing in escrow. Reaching the
//! funding goal is deliberately inert: the hook below exists so a future
//! implementation trigger has a single place to land, and the `ProjectFunded`
//! event reports the milestone to observers.

use crate::error::{Error, Result};
use crate::events::{EventEnvelope, RegistryEvent};
use crate::settlement::{execute_atomically, SettlementEngine, TransferLeg};
use crate::state::RegistryState;
use crate::types::{Address, ClimateProject, ProjectId};
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

impl RegistryState {
    /// Create a new climate project owned by a registered participant.
    #[allow(clippy::too_many_arguments)]
    pub fn create_project(
        &mut self,
        owner: Address,
        name: String,
        description: String,
        location: String,
        target_co2_tonnes: u64,
        funding_goal: Decimal,
    ) -> Result<(ProjectId, EventEnvelope)> {
        self.require_registered(&owner)?;

        if name.is_empty() {
            return Err(Error::InvalidInput("project name is empty".to_string()));
        }
        if target_co2_tonnes == 0 {
            return Err(Error::InvalidInput(
                "target CO2 reduction is zero".to_string(),
            ));
        }
        if funding_goal <= Decimal::ZERO {
            return Err(Error::InvalidInput(
                "funding goal must be positive".to_string(),
            ));
        }

        self.counters.projects_created += 1;
        let project_id = self.counters.projects_created;

        let project = ClimateProject {
            id: project_id,
            owner: owner.clone(),
            name: name.clone(),
            description,
            location,
            target_co2_tonnes,
            current_co2_tonnes: 0,
            funding_goal,
            current_funding: Decimal::ZERO,
            active: true,
            verified: false,
            created_at: Utc::now(),
            milestones: Vec::new(),
            contributions: BTreeMap::new(),
            contributor_list: Vec::new(),
        };
        self.projects.insert(project_id, project);

        let envelope = self.events.append(RegistryEvent::ProjectCreated {
            project_id,
            owner,
            name,
            target_co2_tonnes,
            funding_goal,
        });
        Ok((project_id, envelope))
    }

    /// Fund a project, forwarding the amount to the project owner.
    ///
    /// The project must be active and not yet fully funded. The owner may
    /// fund their own project. Settlement (contributor→ledger, ledger→owner)
    /// commits before any state is written and rolls back on failure.
    pub fn fund_project(
        &mut self,
        contributor: Address,
        project_id: ProjectId,
        amount: Decimal,
        engine: &dyn SettlementEngine,
    ) -> Result<EventEnvelope> {
        self.require_registered(&contributor)?;

        let project = self.project(project_id)?;
        if !project.active || project.fully_funded() {
            return Err(Error::InactiveOrFullyFunded(project_id));
        }
        if amount <= Decimal::ZERO {
            return Err(Error::InvalidInput(
                "contribution amount must be positive".to_string(),
            ));
        }

        let project_owner = project.owner.clone();
        let new_funding = project.current_funding.checked_add(amount).ok_or_else(|| {
            Error::InvalidInput("project funding exceeds the representable range".to_string())
        })?;
        let new_total_contributed = self
            .participant(&contributor)?
            .total_contributed
            .checked_add(amount)
            .ok_or_else(|| {
                Error::InvalidInput(format!("contribution total of {contributor} would overflow"))
            })?;

        let ledger = self.settlement_account.clone();
        let legs = [
            TransferLeg::new(contributor.clone(), ledger.clone(), amount),
            TransferLeg::new(ledger, project_owner, amount),
        ];
        execute_atomically(engine, &legs)?;

        let project = self
            .projects
            .get_mut(&project_id)
            .ok_or_else(|| Error::NotFound(format!("project {project_id}")))?;

        let first_contribution = !project.contributions.contains_key(&contributor);
        if first_contribution {
            project.contributor_list.push(contributor.clone());
        }
        // Bounded by new_funding: each entry is at most the checked total.
        *project
            .contributions
            .entry(contributor.clone())
            .or_insert(Decimal::ZERO) += amount;
        project.current_funding = new_funding;
        let total_funding = new_funding;
        let goal_reached = project.fully_funded();

        let participant = self.participant_mut(&contributor)?;
        participant.total_contributed = new_total_contributed;
        if first_contribution {
            participant.projects_supported += 1;
        }

        if goal_reached {
            self.funding_goal_reached(project_id);
        }

        Ok(self.events.append(RegistryEvent::ProjectFunded {
            project_id,
            contributor,
            amount,
            total_funding,
            goal_reached,
        }))
    }

    /// Extension point invoked once a project's funding goal is reached.
    ///
    /// Intentionally a no-op: reaching the goal changes no ledger state.
    fn funding_goal_reached(&mut self, project_id: ProjectId) {
        tracing::info!(project_id, "funding goal reached");
    }

    /// Mark a project as verified. Administrator-only.
    pub fn verify_project(&mut self, caller: &Address, project_id: ProjectId) -> Result<EventEnvelope> {
        self.access.require_owner(caller)?;

        let project = self
            .projects
            .get_mut(&project_id)
            .ok_or_else(|| Error::NotFound(format!("project {project_id}")))?;
        project.verified = true;

        Ok(self
            .events
            .append(RegistryEvent::ProjectVerified { project_id }))
    }

    /// Overwrite a project's progress. Administrator-only.
    ///
    /// The new value is absolute, not an increment, and may not exceed the
    /// target.
    pub fn update_project_progress(
        &mut self,
        caller: &Address,
        project_id: ProjectId,
        co2_reduced_tonnes: u64,
    ) -> Result<EventEnvelope> {
        self.access.require_owner(caller)?;

        let project = self
            .projects
            .get_mut(&project_id)
            .ok_or_else(|| Error::NotFound(format!("project {project_id}")))?;
        if co2_reduced_tonnes > project.target_co2_tonnes {
            return Err(Error::InvalidInput(format!(
                "progress {co2_reduced_tonnes} exceeds target {}",
                project.target_co2_tonnes
            )));
        }
        project.current_co2_tonnes = co2_reduced_tonnes;

        Ok(self.events.append(RegistryEvent::ProjectProgressUpdated {
            project_id,
            co2_reduced_tonnes,
        }))
    }
}
