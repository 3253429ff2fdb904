//! Scene and instance handles

use std::fmt;

use void_core::Id;

/// How a scene joins the set of loaded scenes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneLoadMode {
    /// Replace every loaded scene
    Single,
    /// Load alongside the scenes already present
    Additive,
}

/// Host-assigned scene identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SceneId(pub Id);

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scene{}", self.0)
    }
}

/// Host-assigned spawned-instance identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(pub Id);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "instance{}", self.0)
    }
}

/// A loaded scene
///
/// Scene handles are not shared through the asset cache; whoever loaded the
/// scene owns its lifetime and unloads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneHandle {
    id: SceneId,
    key: String,
    mode: SceneLoadMode,
}

impl SceneHandle {
    pub fn new(id: SceneId, key: impl Into<String>, mode: SceneLoadMode) -> Self {
        Self {
            id,
            key: key.into(),
            mode,
        }
    }

    /// Host scene id
    pub fn id(&self) -> SceneId {
        self.id
    }

    /// Key the scene was loaded from
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Mode the scene was loaded with
    pub fn mode(&self) -> SceneLoadMode {
        self.mode
    }
}

impl fmt::Display for SceneHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' ({})", self.key, self.id)
    }
}
