//! Profile documents and the relationship edge model.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Opaque profile identity. Serializes as the inner UUID string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProfileId(pub Uuid);

impl ProfileId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ProfileId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ProfileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ProfileId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

impl From<Uuid> for ProfileId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

/// Role carried by a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Mentor,
    Coach,
    Teacher,
    Family,
    Student,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Mentor => "mentor",
            Role::Coach => "coach",
            Role::Teacher => "teacher",
            Role::Family => "family",
            Role::Student => "student",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role of the non-student endpoint of a relationship edge. Doubles as the
/// query-parameter key that names the edge on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupportRole {
    Mentor,
    Coach,
    Teacher,
    Family,
}

impl SupportRole {
    pub const ALL: [SupportRole; 4] = [
        SupportRole::Mentor,
        SupportRole::Coach,
        SupportRole::Teacher,
        SupportRole::Family,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SupportRole::Mentor => "mentor",
            SupportRole::Coach => "coach",
            SupportRole::Teacher => "teacher",
            SupportRole::Family => "family",
        }
    }

    /// Maps a query-parameter key to its support role. Keys are
    /// case-sensitive; anything unrecognized returns None.
    pub fn from_param(key: &str) -> Option<Self> {
        match key {
            "mentor" => Some(SupportRole::Mentor),
            "coach" => Some(SupportRole::Coach),
            "teacher" => Some(SupportRole::Teacher),
            "family" => Some(SupportRole::Family),
            _ => None,
        }
    }

    /// A student holds at most one mentor; every other support role is an
    /// append-only list.
    pub fn cardinality(self) -> EdgeCardinality {
        match self {
            SupportRole::Mentor => EdgeCardinality::Single,
            SupportRole::Coach | SupportRole::Teacher | SupportRole::Family => EdgeCardinality::Multi,
        }
    }
}

impl std::fmt::Display for SupportRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a support role occupies a single slot or a list on the student
/// document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeCardinality {
    Single,
    Multi,
}

/// Mutable view of the edge field a support role maps to.
pub enum EdgeSlotMut<'a> {
    Single(&'a mut Option<ProfileId>),
    Multi(&'a mut Vec<ProfileId>),
}

/// Student-side relationship edges. Lists are not deduplicated: repeated
/// attaches append repeated entries, and detach removes every occurrence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentData {
    #[serde(default)]
    pub mentor: Option<ProfileId>,
    #[serde(default)]
    pub coaches: Vec<ProfileId>,
    #[serde(default)]
    pub teachers: Vec<ProfileId>,
    #[serde(default)]
    pub family: Vec<ProfileId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_point_tracker: Option<String>,
}

impl StudentData {
    /// Mutable slot for the given support role.
    pub fn edge_slot_mut(&mut self, role: SupportRole) -> EdgeSlotMut<'_> {
        match role {
            SupportRole::Mentor => EdgeSlotMut::Single(&mut self.mentor),
            SupportRole::Coach => EdgeSlotMut::Multi(&mut self.coaches),
            SupportRole::Teacher => EdgeSlotMut::Multi(&mut self.teachers),
            SupportRole::Family => EdgeSlotMut::Multi(&mut self.family),
        }
    }

    /// How many times `id` appears under the given role.
    pub fn edge_count(&self, role: SupportRole, id: &ProfileId) -> usize {
        match role {
            SupportRole::Mentor => usize::from(self.mentor.as_ref() == Some(id)),
            SupportRole::Coach => self.coaches.iter().filter(|c| *c == id).count(),
            SupportRole::Teacher => self.teachers.iter().filter(|t| *t == id).count(),
            SupportRole::Family => self.family.iter().filter(|f| *f == id).count(),
        }
    }

    pub fn has_edge(&self, role: SupportRole, id: &ProfileId) -> bool {
        self.edge_count(role, id) > 0
    }
}

/// A person record. `students` is the reverse edge kept on supervising
/// profiles; `student_data` is present only when the role is Student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: ProfileId,
    pub role: Role,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    #[serde(default)]
    pub students: Vec<ProfileId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_data: Option<StudentData>,
}

impl Profile {
    /// Fresh profile with a random id. Students start with empty edge data;
    /// everyone else starts without a `studentData` document at all.
    pub fn new(
        role: Role,
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            id: ProfileId::new(),
            role,
            email: email.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            picture: None,
            students: Vec::new(),
            student_data: match role {
                Role::Student => Some(StudentData::default()),
                _ => None,
            },
        }
    }
}

/// Normalized attach/detach triple produced by the query normalizer.
///
/// Ids stay raw strings here: whether they parse and resolve is decided by
/// the engine, which reports both failures as not-found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipRequest {
    pub student_id: String,
    pub support_role: SupportRole,
    pub counterpart_id: String,
}

/// The two relationship mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Attach,
    Detach,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Attach => "attach",
            Operation::Detach => "detach",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
