//! Role authorization policy for relationship mutations.

use mentor_types::{Operation, Role, SupportRole};

/// Decides whether a profile with `actor_role` may run `operation` against
/// an edge of `support_role`. Attach and detach share one matrix: admins
/// and mentors manage every support role (a mentor may hand a student to
/// another mentor); nobody else manages anything.
pub fn is_allowed(actor_role: Role, support_role: SupportRole, _operation: Operation) -> bool {
    match actor_role {
        Role::Admin => true,
        // Listed per role so a new support role starts out denied here.
        Role::Mentor => matches!(
            support_role,
            SupportRole::Mentor | SupportRole::Coach | SupportRole::Teacher | SupportRole::Family
        ),
        Role::Student | Role::Coach | Role::Teacher | Role::Family => false,
    }
}
