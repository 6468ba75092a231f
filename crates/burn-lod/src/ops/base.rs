use alloc::sync::Arc;

use super::{Attributes, Device, KernelRegistry, OpDesc, OpSchema, Scope, ShapeMap};
use crate::{Element, OpError, ValidationError};

/// The kernel of an operator for one device and one element type.
///
/// Kernels are stateless: everything they need is read from the operator description and the
/// scope on each call.
pub trait OpKernel<E: Element>: Send + Sync + core::fmt::Debug {
    /// The declaration of the operator.
    fn schema(&self) -> OpSchema;

    /// Checks the attributes, before any shape or LoD is computed.
    fn check_attributes(&self, _attrs: &Attributes) -> Result<(), ValidationError> {
        Ok(())
    }

    /// Computes the shapes of the outputs from the shapes of the inputs, without touching data.
    fn infer_shape(&self, desc: &OpDesc, shapes: &ShapeMap) -> Result<ShapeMap, OpError>;

    /// Computes the outputs and stores them in the scope.
    fn compute(&self, desc: &OpDesc, scope: &mut Scope<E>) -> Result<(), OpError>;
}

/// An operator ready to run: a validated description bound to its kernel.
#[derive(Debug, Clone)]
pub struct Operator<E: Element> {
    desc: OpDesc,
    kernel: Arc<dyn OpKernel<E>>,
}

impl<E: Element> Operator<E> {
    /// Creates an operator, resolving its kernel in the registry.
    ///
    /// Fails if a slot declared by the operator schema is not bound or if an attribute is invalid,
    /// so a malformed graph is rejected before anything runs.
    pub fn new(desc: OpDesc, registry: &KernelRegistry, device: Device) -> Result<Self, OpError> {
        let kernel = registry.get::<E>(&desc.op_type, device)?;
        let schema = kernel.schema();

        schema.validate(&desc)?;

        let attrs = schema.with_defaults(&desc.attrs);
        kernel.check_attributes(&attrs)?;

        log::debug!(
            "Created operator `{}` on {device:?} for {:?}",
            desc.op_type,
            E::dtype()
        );

        Ok(Self {
            desc: OpDesc { attrs, ..desc },
            kernel,
        })
    }

    /// The description of the operator, with default attributes filled.
    pub fn desc(&self) -> &OpDesc {
        &self.desc
    }

    /// Computes the shapes of the outputs.
    pub fn infer_shape(&self, shapes: &ShapeMap) -> Result<ShapeMap, OpError> {
        self.kernel.infer_shape(&self.desc, shapes)
    }

    /// Runs the operator on the tensors of the scope.
    pub fn run(&self, scope: &mut Scope<E>) -> Result<(), OpError> {
        self.kernel.compute(&self.desc, scope)
    }
}
