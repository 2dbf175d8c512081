//! Unique identifiers for cameras and IPA contexts

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a camera
///
/// Cameras are long-lived entities owned by the pipeline controller. Each
/// camera binds at most one IPA context at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CameraId(Uuid);

impl CameraId {
    /// Creates a new random camera ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a camera ID from a UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for CameraId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CameraId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Camera({})", self.0)
    }
}

/// Unique identifier for an IPA context
///
/// One context exists per open camera. Contexts are created when a camera is
/// acquired and destroyed when it is released; a broken context is never
/// reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextId(Uuid);

impl ContextId {
    /// Creates a new random context ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a context ID from a UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ContextId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IpaContext({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_id_creation() {
        let id1 = CameraId::new();
        let id2 = CameraId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_camera_id_from_uuid() {
        let uuid = Uuid::new_v4();
        let id = CameraId::from_uuid(uuid);
        assert_eq!(id.as_uuid(), uuid);
    }

    #[test]
    fn test_context_id_creation() {
        let id1 = ContextId::new();
        let id2 = ContextId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_camera_id_display() {
        let id = CameraId::new();
        let display = format!("{}", id);
        assert!(display.starts_with("Camera("));
    }

    #[test]
    fn test_context_id_display() {
        let id = ContextId::new();
        let display = format!("{}", id);
        assert!(display.starts_with("IpaContext("));
    }
}
