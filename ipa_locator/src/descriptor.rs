//! Module descriptors and execution mode resolution

use camera_types::ProtocolVersion;
use ipa_proxy::IpaModule;
use std::fmt;
use std::sync::Arc;

/// Factory producing a fresh module instance per camera
pub type ModuleFactory = Arc<dyn Fn() -> Box<dyn IpaModule> + Send + Sync>;

/// How a module prefers to execute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionPreference {
    /// In a supervised, separate execution context
    Isolated,
    /// Inside the controller's own call path
    InProcess,
}

/// Controller-side override of module execution preferences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IsolationPolicy {
    /// Honor each module's declared preference
    #[default]
    ModulePreference,
    /// Isolate every module regardless of preference
    ForceIsolated,
    /// Run every module in-process regardless of preference
    ForceInProcess,
}

/// The execution mode actually used for a context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    Isolated,
    InProcess,
}

impl IsolationPolicy {
    /// Resolves the effective execution mode for a module
    pub fn resolve(&self, preference: ExecutionPreference) -> ExecutionMode {
        match self {
            IsolationPolicy::ForceIsolated => ExecutionMode::Isolated,
            IsolationPolicy::ForceInProcess => ExecutionMode::InProcess,
            IsolationPolicy::ModulePreference => match preference {
                ExecutionPreference::Isolated => ExecutionMode::Isolated,
                ExecutionPreference::InProcess => ExecutionMode::InProcess,
            },
        }
    }
}

/// One discoverable IPA module
///
/// Created at discovery time and immutable thereafter. The factory is
/// the module's single entry point; each invocation yields a new
/// instance bound to nothing, ready for its own per-camera context.
#[derive(Clone)]
pub struct ModuleDescriptor {
    /// Module artifact name, unique within a registry
    pub name: String,
    /// Pipeline type the module implements
    pub pipeline: String,
    /// Protocol version the module was built against
    pub version: ProtocolVersion,
    /// Declared execution preference
    pub preference: ExecutionPreference,
    factory: ModuleFactory,
}

impl ModuleDescriptor {
    pub fn new(
        name: impl Into<String>,
        pipeline: impl Into<String>,
        version: ProtocolVersion,
        preference: ExecutionPreference,
        factory: ModuleFactory,
    ) -> Self {
        Self {
            name: name.into(),
            pipeline: pipeline.into(),
            version,
            preference,
            factory,
        }
    }

    /// Instantiates the module through its entry point
    pub fn instantiate(&self) -> Box<dyn IpaModule> {
        (self.factory)()
    }
}

impl fmt::Debug for ModuleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDescriptor")
            .field("name", &self.name)
            .field("pipeline", &self.pipeline)
            .field("version", &self.version)
            .field("preference", &self.preference)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipa_proxy::{ModuleCall, WirePayload};

    struct NullModule;

    impl IpaModule for NullModule {
        fn invoke(&mut self, _call: ModuleCall) -> Result<WirePayload, String> {
            Ok(WirePayload::empty())
        }

        fn notify(&mut self, _call: ModuleCall) {}
    }

    #[test]
    fn test_policy_resolution() {
        let policy = IsolationPolicy::ModulePreference;
        assert_eq!(
            policy.resolve(ExecutionPreference::Isolated),
            ExecutionMode::Isolated
        );
        assert_eq!(
            policy.resolve(ExecutionPreference::InProcess),
            ExecutionMode::InProcess
        );

        assert_eq!(
            IsolationPolicy::ForceIsolated.resolve(ExecutionPreference::InProcess),
            ExecutionMode::Isolated
        );
        assert_eq!(
            IsolationPolicy::ForceInProcess.resolve(ExecutionPreference::Isolated),
            ExecutionMode::InProcess
        );
    }

    #[test]
    fn test_descriptor_instantiates_fresh_modules() {
        let descriptor = ModuleDescriptor::new(
            "soft-null",
            "soft",
            ProtocolVersion::new(1, 0),
            ExecutionPreference::InProcess,
            Arc::new(|| Box::new(NullModule)),
        );

        // Two instances, not one shared.
        let _a = descriptor.instantiate();
        let _b = descriptor.instantiate();
    }
}
