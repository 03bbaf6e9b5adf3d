//! Attach/detach mutation core over a profile store.

use crate::policy::is_allowed;
use mentor_types::{
    EdgeSlotMut, Operation, Profile, ProfileId, ProfileStore, RelationshipError, RelationshipGraph,
    RelationshipRequest,
};
use std::str::FromStr;

/// Relationship engine that composes a profile store.
///
/// Every mutation loads both endpoints, consults the role policy, rewrites
/// the edge fields on both documents and saves them one by one. There is no
/// multi-document transaction underneath: a save that fails after an
/// earlier one succeeded leaves the graph asymmetric. That outcome surfaces
/// as a persistence error and is logged with the ids already committed so
/// it can be reconciled by hand.
pub struct RelationshipEngine<S> {
    store: S,
}

impl<S> RelationshipEngine<S>
where
    S: ProfileStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Malformed ids report the same way as absent ones so the response
    /// never reveals whether an id was syntactically plausible.
    fn parse_id(raw: &str) -> Result<ProfileId, RelationshipError> {
        ProfileId::from_str(raw)
            .map_err(|_| RelationshipError::NotFound(format!("no profile with id {}", raw)))
    }

    async fn load(&self, id: &ProfileId) -> Result<Profile, RelationshipError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| RelationshipError::NotFound(format!("no profile with id {}", id)))
    }

    /// Resolves both endpoints, then checks the actor against the policy.
    /// Resolution runs first: unresolvable ids report not-found even when
    /// the actor would have been denied anyway.
    async fn prepare(
        &self,
        request: &RelationshipRequest,
        actor: &Profile,
        operation: Operation,
    ) -> Result<(Profile, Profile), RelationshipError> {
        let student_id = Self::parse_id(&request.student_id)?;
        let counterpart_id = Self::parse_id(&request.counterpart_id)?;
        let student = self.load(&student_id).await?;
        let counterpart = self.load(&counterpart_id).await?;

        if !is_allowed(actor.role, request.support_role, operation) {
            return Err(RelationshipError::Unauthorized(format!(
                "role {} may not {} a {} relationship",
                actor.role, operation, request.support_role
            )));
        }
        Ok((student, counterpart))
    }

    /// Saves the rewritten documents in order, stopping at the first
    /// failure. The failure log names what was already committed.
    async fn persist(
        &self,
        operation: Operation,
        actor: &Profile,
        request: &RelationshipRequest,
        profiles: Vec<Profile>,
    ) -> Result<(), RelationshipError> {
        let mut committed: Vec<String> = Vec::with_capacity(profiles.len());
        for profile in profiles {
            let id = profile.id;
            if let Err(err) = self.store.save(profile).await {
                tracing::error!(
                    %operation,
                    support_role = %request.support_role,
                    student = %request.student_id,
                    counterpart = %request.counterpart_id,
                    failed = %id,
                    committed = ?committed,
                    error = %err,
                    "partial relationship write, graph may be asymmetric"
                );
                return Err(RelationshipError::Persistence(err));
            }
            committed.push(id.to_string());
        }
        tracing::info!(
            %operation,
            actor = %actor.id,
            support_role = %request.support_role,
            student = %request.student_id,
            counterpart = %request.counterpart_id,
            "relationship updated"
        );
        Ok(())
    }
}

#[async_trait::async_trait]
impl<S> RelationshipGraph for RelationshipEngine<S>
where
    S: ProfileStore,
{
    async fn attach(
        &self,
        request: &RelationshipRequest,
        actor: &Profile,
    ) -> Result<(), RelationshipError> {
        let (mut student, mut counterpart) =
            self.prepare(request, actor, Operation::Attach).await?;
        let student_id = student.id;
        let counterpart_id = counterpart.id;

        let data = student.student_data.as_mut().ok_or_else(|| {
            RelationshipError::BadRequest(format!("profile {} is not a student", student_id))
        })?;
        let prior_mentor = match data.edge_slot_mut(request.support_role) {
            EdgeSlotMut::Single(slot) => slot.replace(counterpart_id),
            EdgeSlotMut::Multi(list) => {
                list.push(counterpart_id);
                None
            }
        };
        counterpart.students.push(student_id);

        // Reassigning the mentor slot orphans the previous mentor's reverse
        // edge; clear it in the same mutation. Re-attaching the same mentor
        // skips this and simply appends to their students again.
        let displaced = match prior_mentor {
            Some(prior) if prior != counterpart_id => {
                match self.store.find_by_id(&prior).await? {
                    Some(mut previous) => {
                        previous.students.retain(|id| *id != student_id);
                        Some(previous)
                    }
                    None => {
                        tracing::warn!(
                            prior_mentor = %prior,
                            student = %student_id,
                            "previous mentor no longer resolves, reverse edge left as is"
                        );
                        None
                    }
                }
            }
            _ => None,
        };

        let mut batch = vec![student, counterpart];
        if let Some(previous) = displaced {
            batch.push(previous);
        }
        self.persist(Operation::Attach, actor, request, batch).await
    }

    async fn detach(
        &self,
        request: &RelationshipRequest,
        actor: &Profile,
    ) -> Result<(), RelationshipError> {
        let (mut student, mut counterpart) =
            self.prepare(request, actor, Operation::Detach).await?;
        let student_id = student.id;
        let counterpart_id = counterpart.id;

        let data = student.student_data.as_mut().ok_or_else(|| {
            RelationshipError::BadRequest(format!("profile {} is not a student", student_id))
        })?;
        // Detaching an edge that is not there still succeeds; both removals
        // below are simply no-ops then.
        match data.edge_slot_mut(request.support_role) {
            EdgeSlotMut::Single(slot) => {
                if *slot == Some(counterpart_id) {
                    *slot = None;
                }
            }
            EdgeSlotMut::Multi(list) => list.retain(|id| *id != counterpart_id),
        }
        counterpart.students.retain(|id| *id != student_id);

        self.persist(Operation::Detach, actor, request, vec![student, counterpart])
            .await
    }
}
