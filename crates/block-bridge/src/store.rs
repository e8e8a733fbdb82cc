use std::collections::HashMap;

use block_export::Artifact;
use block_types::ArtifactId;

/// Produced artifacts keyed by their server-generated id.
#[derive(Debug, Default)]
pub struct ArtifactStore {
    artifacts: HashMap<ArtifactId, Artifact>,
}

impl ArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, artifact: Artifact) -> ArtifactId {
        let id = artifact.id;
        self.artifacts.insert(id, artifact);
        id
    }

    pub fn get(&self, id: &ArtifactId) -> Option<&Artifact> {
        self.artifacts.get(id)
    }

    pub fn remove(&mut self, id: &ArtifactId) -> Option<Artifact> {
        self.artifacts.remove(id)
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}
