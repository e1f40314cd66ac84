//! Unique identifiers for Pulse entities.

use serde::{Deserialize, Serialize};
use ulid::Ulid;

macro_rules! ulid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(Ulid);

        impl $name {
            /// Generate a new identifier.
            pub fn new() -> Self {
                Self(Ulid::new())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = ulid::DecodeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }
    };
}

ulid_id!(
    /// Unique identifier for a Survey
    SurveyId
);
ulid_id!(
    /// Unique identifier for a Question
    QuestionId
);
ulid_id!(
    /// Unique identifier for a SurveyResponse
    ResponseId
);
ulid_id!(
    /// Unique identifier for a University
    UniversityId
);
ulid_id!(
    /// Locally generated identifier for an analysis record.
    ///
    /// Not globally meaningful; only used to address a record inside one
    /// survey's analysis history.
    AnalysisId
);
ulid_id!(
    /// Unique identifier for a prize draw
    PrizeDrawId
);
