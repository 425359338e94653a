//! Candidate profile models.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

use crate::id::CandidateId;

/// Stored field names, shared by the JSON API, the document store and the report.
pub mod fields {
    pub const FIRST_NAME: &str = "first_name";
    pub const LAST_NAME: &str = "last_name";
    pub const EMAIL: &str = "email";
    pub const UUID: &str = "UUID";
    pub const CAREER_LEVEL: &str = "career_level";
    pub const JOB_MAJOR: &str = "job_major";
    pub const YEARS_OF_EXPERIENCE: &str = "years_of_experience";
    pub const DEGREE_TYPE: &str = "degree_type";
    pub const SKILLS: &str = "skills";
    pub const NATIONALITY: &str = "nationality";
    pub const CITY: &str = "city";
    pub const SALARY: &str = "salary";
    pub const GENDER: &str = "gender";
}

/// Gender value outside the accepted set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Gender must be Male, Female, or Not Specific (got '{0}')")]
pub struct UnknownGender(pub String);

/// Candidate gender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Gender {
    Male,
    Female,
    #[serde(rename = "Not Specific")]
    NotSpecific,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::NotSpecific => "Not Specific",
        }
    }
}

impl FromStr for Gender {
    type Err = UnknownGender;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Male" => Ok(Gender::Male),
            "Female" => Ok(Gender::Female),
            "Not Specific" => Ok(Gender::NotSpecific),
            other => Err(UnknownGender(other.to_string())),
        }
    }
}

impl TryFrom<String> for Gender {
    type Error = UnknownGender;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A job applicant profile as submitted by clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Candidate {
    pub first_name: String,
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    /// Client-supplied external identifier.
    #[serde(rename = "UUID")]
    pub uuid: String,
    pub career_level: String,
    pub job_major: String,
    pub years_of_experience: u32,
    pub degree_type: String,
    pub skills: Vec<String>,
    pub nationality: String,
    pub city: String,
    #[validate(range(min = 0.0))]
    pub salary: f64,
    pub gender: Gender,
}

/// A stored candidate together with its internal identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    #[serde(rename = "_id")]
    pub id: CandidateId,
    #[serde(flatten)]
    pub candidate: Candidate,
}

/// Partial candidate update.
///
/// Absent fields are left untouched. Unknown keys are rejected so that the
/// stored document never picks up fields outside the candidate schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CandidatePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(email)]
    pub email: Option<String>,
    #[serde(rename = "UUID", default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub career_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_major: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub years_of_experience: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degree_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0))]
    pub salary: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
}

fn set_if_changed<T: PartialEq + Clone>(
    target: &mut T,
    value: &Option<T>,
    name: &'static str,
    changed: &mut Vec<&'static str>,
) {
    if let Some(v) = value {
        if target != v {
            *target = v.clone();
            changed.push(name);
        }
    }
}

impl CandidatePatch {
    /// True if the patch carries no field at all.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the patch in place.
    ///
    /// Returns the stored names of the fields whose value actually changed.
    pub fn apply(&self, candidate: &mut Candidate) -> Vec<&'static str> {
        let mut changed = Vec::new();
        set_if_changed(&mut candidate.first_name, &self.first_name, fields::FIRST_NAME, &mut changed);
        set_if_changed(&mut candidate.last_name, &self.last_name, fields::LAST_NAME, &mut changed);
        set_if_changed(&mut candidate.email, &self.email, fields::EMAIL, &mut changed);
        set_if_changed(&mut candidate.uuid, &self.uuid, fields::UUID, &mut changed);
        set_if_changed(&mut candidate.career_level, &self.career_level, fields::CAREER_LEVEL, &mut changed);
        set_if_changed(&mut candidate.job_major, &self.job_major, fields::JOB_MAJOR, &mut changed);
        set_if_changed(
            &mut candidate.years_of_experience,
            &self.years_of_experience,
            fields::YEARS_OF_EXPERIENCE,
            &mut changed,
        );
        set_if_changed(&mut candidate.degree_type, &self.degree_type, fields::DEGREE_TYPE, &mut changed);
        set_if_changed(&mut candidate.skills, &self.skills, fields::SKILLS, &mut changed);
        set_if_changed(&mut candidate.nationality, &self.nationality, fields::NATIONALITY, &mut changed);
        set_if_changed(&mut candidate.city, &self.city, fields::CITY, &mut changed);
        set_if_changed(&mut candidate.salary, &self.salary, fields::SALARY, &mut changed);
        set_if_changed(&mut candidate.gender, &self.gender, fields::GENDER, &mut changed);
        changed
    }
}

/// Result of applying a patch to a stored candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The listed fields were written.
    Updated(Vec<&'static str>),
    /// The record exists but every patched value matched the stored one.
    Unchanged,
}

impl UpdateOutcome {
    pub fn from_changed(changed: Vec<&'static str>) -> Self {
        if changed.is_empty() {
            Self::Unchanged
        } else {
            Self::Updated(changed)
        }
    }
}
