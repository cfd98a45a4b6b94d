use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::StoreError;

const COURSE_V1_PREFIX: &str = "course-v1:";

/// Identity of a course, e.g. `course-v1:edX+DemoX+2024` or `edX/DemoX/2024`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CourseKey {
    org: String,
    course: String,
    run: String,
    legacy: bool,
}

impl CourseKey {
    pub fn parse(input: &str) -> Result<Self, StoreError> {
        let invalid = || StoreError::InvalidCourseKey(input.to_string());

        let (body, sep, legacy) = match input.strip_prefix(COURSE_V1_PREFIX) {
            Some(rest) => (rest, '+', false),
            None => (input, '/', true),
        };

        let parts: Vec<&str> = body.split(sep).collect();
        if parts.len() != 3 {
            return Err(invalid());
        }
        if parts
            .iter()
            .any(|p| p.is_empty() || p.chars().any(char::is_whitespace))
        {
            return Err(invalid());
        }

        Ok(Self {
            org: parts[0].to_string(),
            course: parts[1].to_string(),
            run: parts[2].to_string(),
            legacy,
        })
    }

    pub fn org(&self) -> &str {
        &self.org
    }

    pub fn course(&self) -> &str {
        &self.course
    }

    pub fn run(&self) -> &str {
        &self.run
    }
}

impl fmt::Display for CourseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.legacy {
            write!(f, "{}/{}/{}", self.org, self.course, self.run)
        } else {
            write!(f, "{}{}+{}+{}", COURSE_V1_PREFIX, self.org, self.course, self.run)
        }
    }
}

impl FromStr for CourseKey {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CourseKey {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CourseKey> for String {
    fn from(key: CourseKey) -> Self {
        key.to_string()
    }
}
