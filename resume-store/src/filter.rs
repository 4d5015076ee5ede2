use resume_model::{BucketParseError, ExperienceBucket, ResumePayload};

/// Malformed filter input, rejected before any index access.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FilterError {
    #[error(transparent)]
    Bucket(#[from] BucketParseError),
}

/// Conjunctive filter over stored payload fields: exact department equality
/// AND experience-bucket membership.
///
/// Both the index-native SQL predicate and the in-process re-check read the
/// same [`ExperienceBucket`] bounds, so a record passes both or neither.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchFilter {
    department: Option<String>,
    experience: ExperienceBucket,
}

impl SearchFilter {
    /// Compile a declarative filter request. Empty or `Any` inputs mean no
    /// constraint on that axis; `Ok(None)` when both axes are unconstrained.
    pub fn compile(department: &str, experience: &str) -> Result<Option<Self>, FilterError> {
        let bucket = ExperienceBucket::parse(experience)?;
        let dept = department.trim();
        let department = if dept.is_empty() || dept.eq_ignore_ascii_case("any") {
            None
        } else {
            Some(dept.to_string())
        };
        if department.is_none() && bucket.is_any() {
            return Ok(None);
        }
        Ok(Some(Self { department, experience: bucket }))
    }

    pub fn department(&self) -> Option<&str> {
        self.department.as_deref()
    }

    pub fn experience(&self) -> ExperienceBucket {
        self.experience
    }

    /// Index-native predicate: SQL fragment plus positional params, ANDed
    /// onto the candidate query.
    pub(crate) fn sql_predicate(&self) -> (String, Vec<rusqlite::types::Value>) {
        let mut clauses: Vec<&str> = Vec::new();
        let mut params: Vec<rusqlite::types::Value> = Vec::new();
        if let Some(d) = &self.department {
            clauses.push("department = ?");
            params.push(d.clone().into());
        }
        let (min, max) = self.experience.bounds();
        if let Some(m) = min {
            clauses.push("experience_years >= ?");
            params.push(i64::from(m).into());
        }
        if let Some(m) = max {
            clauses.push("experience_years <= ?");
            params.push(i64::from(m).into());
        }
        (clauses.join(" AND "), params)
    }

    /// In-process re-check applied to every candidate the index returns.
    pub fn matches(&self, payload: &ResumePayload) -> bool {
        if let Some(d) = &self.department {
            if payload.department != *d {
                return false;
            }
        }
        self.experience.contains(payload.experience_years)
    }
}
