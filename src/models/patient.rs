use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::enums::Gender;
use super::lenient;

/// Display sentinel for absent values.
pub const NOT_AVAILABLE: &str = "N/A";

/// Patient identity as collected by the intake form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientRecord {
    pub name: String,
    pub age: Option<u32>,
    pub gender: Option<Gender>,
}

impl PatientRecord {
    pub fn new(name: impl Into<String>, age: Option<u32>, gender: Option<Gender>) -> Self {
        Self {
            name: name.into(),
            age,
            gender,
        }
    }

    pub fn name_display(&self) -> &str {
        let name = self.name.trim();
        if name.is_empty() {
            NOT_AVAILABLE
        } else {
            name
        }
    }

    pub fn age_display(&self) -> String {
        self.age
            .map(|a| a.to_string())
            .unwrap_or_else(|| NOT_AVAILABLE.into())
    }

    pub fn gender_display(&self) -> &'static str {
        self.gender.map(|g| g.label()).unwrap_or(NOT_AVAILABLE)
    }

    /// Label/value rows in the order both views print them.
    pub fn rows(&self) -> [(&'static str, String); 3] {
        [
            ("Name:", self.name_display().to_string()),
            ("Age:", self.age_display()),
            ("Gender:", self.gender_display().to_string()),
        ]
    }
}

/// `user_details` object echoed back by the detection service.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserDetails {
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub age: Option<u64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub gender: Option<String>,
}

impl From<UserDetails> for PatientRecord {
    fn from(details: UserDetails) -> Self {
        let gender = details.gender.as_deref().and_then(|g| match Gender::from_str(g) {
            Ok(g) => Some(g),
            Err(e) => {
                debug!("Ignoring patient gender: {e}");
                None
            }
        });
        Self {
            name: details.name.unwrap_or_default(),
            age: details.age.and_then(|a| u32::try_from(a).ok()),
            gender,
        }
    }
}
