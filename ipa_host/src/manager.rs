//! The controller-side manager that assembles contexts

use crate::context::IpaContext;
use crate::error::HostError;
use crate::inline::InlineChannel;
use camera_types::CameraId;
use ipa_locator::{ExecutionMode, IsolationPolicy, ModuleDescriptor, ModuleRegistry};
use ipa_proxy::{ClientStub, ServerStub};
use ipa_schema::ProtocolSchema;
use ipa_supervisor::IsolatedWorker;
use ipa_transport::MessageChannel;
use std::collections::HashMap;
use std::time::Duration;

/// Owns the module registry, schemas, and context-construction policy
///
/// One manager per controller. Not a singleton: tests construct as many
/// independent managers as they need.
pub struct IpaManager {
    schemas: HashMap<&'static str, ProtocolSchema>,
    registry: ModuleRegistry,
    policy: IsolationPolicy,
    call_timeout: Option<Duration>,
}

impl IpaManager {
    pub fn new(policy: IsolationPolicy) -> Self {
        Self {
            schemas: HashMap::new(),
            registry: ModuleRegistry::new(),
            policy,
            call_timeout: None,
        }
    }

    /// Bounds every synchronous call issued through contexts built by
    /// this manager
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    /// Registers a pipeline type's protocol schema, validating it first
    pub fn register_schema(&mut self, schema: ProtocolSchema) -> Result<(), HostError> {
        schema.validate()?;
        self.schemas.insert(schema.pipeline, schema);
        Ok(())
    }

    /// Registers a discovered module
    pub fn register_module(&mut self, descriptor: ModuleDescriptor) {
        self.registry.register(descriptor);
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// Resolves a module for the camera and builds its context
    ///
    /// Resolution failures surface here, before any context exists.
    pub fn create_context(
        &self,
        camera: CameraId,
        pipeline: &str,
    ) -> Result<IpaContext, HostError> {
        let schema = *self
            .schemas
            .get(pipeline)
            .ok_or_else(|| HostError::UnknownPipeline(pipeline.to_string()))?;
        let descriptor = self.registry.locate(pipeline, schema.version)?.clone();
        let mode = self.policy.resolve(descriptor.preference);
        let module = descriptor.instantiate();

        let (channel, worker): (Box<dyn MessageChannel>, Option<IsolatedWorker>) = match mode {
            ExecutionMode::Isolated => {
                let (worker, channel) =
                    IsolatedWorker::spawn(descriptor.name.clone(), schema, module)?;
                (Box::new(channel), Some(worker))
            }
            ExecutionMode::InProcess => {
                let server = ServerStub::new(schema, module);
                (Box::new(InlineChannel::new(server)), None)
            }
        };

        let mut client = ClientStub::new(schema, channel);
        if let Some(timeout) = self.call_timeout {
            client = client.with_call_timeout(timeout);
        }

        log::info!(
            "camera {} bound to module '{}' ({:?})",
            camera,
            descriptor.name,
            mode
        );
        Ok(IpaContext::new(camera, descriptor.name, mode, client, worker))
    }
}
