//! The module registry and its selection policy

use crate::descriptor::ModuleDescriptor;
use crate::error::LocatorError;
use camera_types::ProtocolVersion;

/// Registry of discovered IPA modules
///
/// Selection policy: a module is compatible when its pipeline type
/// matches, its major version equals the requested major, and its minor
/// version is at least the requested minor. Among compatible modules the
/// highest minor version wins; an exact tie at the top is an error
/// rather than an arbitrary pick.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules: Vec<ModuleDescriptor>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a discovered module
    pub fn register(&mut self, descriptor: ModuleDescriptor) {
        log::debug!(
            "registered module '{}' for pipeline '{}' at {}",
            descriptor.name,
            descriptor.pipeline,
            descriptor.version
        );
        self.modules.push(descriptor);
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Selects the module for a pipeline type and requested version
    pub fn locate(
        &self,
        pipeline: &str,
        requested: ProtocolVersion,
    ) -> Result<&ModuleDescriptor, LocatorError> {
        let mut best: Option<&ModuleDescriptor> = None;
        let mut tied: Option<&ModuleDescriptor> = None;

        for module in self.modules.iter().filter(|m| {
            m.pipeline == pipeline && m.version.satisfies(&requested)
        }) {
            match best {
                None => best = Some(module),
                Some(current) if module.version.minor > current.version.minor => {
                    best = Some(module);
                    tied = None;
                }
                Some(current) if module.version.minor == current.version.minor => {
                    tied = Some(module);
                }
                Some(_) => {}
            }
        }

        match (best, tied) {
            (Some(module), None) => {
                log::info!(
                    "pipeline '{}' ({} requested) resolved to module '{}' ({})",
                    pipeline,
                    requested,
                    module.name,
                    module.version
                );
                Ok(module)
            }
            (Some(first), Some(second)) => Err(LocatorError::AmbiguousModule {
                pipeline: pipeline.to_string(),
                version: first.version,
                first: first.name.clone(),
                second: second.name.clone(),
            }),
            (None, _) => Err(LocatorError::NoCompatibleModule {
                pipeline: pipeline.to_string(),
                requested,
            }),
        }
    }
}
