use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Server-generated opaque identifier for an exported artifact.
///
/// Never chosen by the caller, so ids can be exposed publicly without
/// collisions or guessable names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactId(pub Uuid);

impl ArtifactId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
