use alloc::boxed::Box;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use core::any::Any;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use super::{OpKernel, SequenceConcat, SequenceConcatGrad};
use crate::{DType, Element, ValidationError};

/// The device a kernel runs on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Device {
    /// General purpose processor.
    #[default]
    Cpu,
}

/// Identifies a kernel: an operator type specialized for a device and an element type.
#[derive(new, Debug, Clone, PartialEq, Eq, Hash)]
pub struct KernelKey {
    /// The operator type.
    pub op_type: String,
    /// The device.
    pub device: Device,
    /// The element type.
    pub dtype: DType,
}

impl core::fmt::Display for KernelKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "operator `{}` on {:?} with {:?}",
            self.op_type, self.device, self.dtype
        )
    }
}

type KernelBox = Box<dyn Any + Send + Sync>;

/// Kernels by operator type, device and element type.
///
/// Kernels of different element types are stored type-erased and recovered by their key, which
/// includes the element [data type](DType).
#[derive(Default)]
pub struct KernelRegistry {
    kernels: HashMap<KernelKey, KernelBox>,
}

impl KernelRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the sequence concatenation kernels for the CPU and float elements.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        registry
            .register::<f32, _>(Device::Cpu, SequenceConcat)
            .register::<f32, _>(Device::Cpu, SequenceConcatGrad)
            .register::<f64, _>(Device::Cpu, SequenceConcat)
            .register::<f64, _>(Device::Cpu, SequenceConcatGrad);

        registry
    }

    /// Registers a kernel for the operator type declared by its schema.
    ///
    /// A kernel already registered with the same key is replaced.
    pub fn register<E, K>(&mut self, device: Device, kernel: K) -> &mut Self
    where
        E: Element,
        K: OpKernel<E> + 'static,
    {
        let key = KernelKey::new(kernel.schema().op_type.to_string(), device, E::dtype());
        let kernel: Arc<dyn OpKernel<E>> = Arc::new(kernel);

        log::debug!("Registering kernel for {key}");

        if self.kernels.insert(key, Box::new(kernel)).is_some() {
            log::warn!("A kernel was already registered with the same key, it was replaced");
        }

        self
    }

    /// Returns the kernel of an operator for the given device and element type.
    pub fn get<E: Element>(
        &self,
        op_type: &str,
        device: Device,
    ) -> Result<Arc<dyn OpKernel<E>>, ValidationError> {
        let key = KernelKey::new(op_type.to_string(), device, E::dtype());

        self.kernels
            .get(&key)
            .and_then(|kernel| kernel.downcast_ref::<Arc<dyn OpKernel<E>>>())
            .cloned()
            .ok_or_else(|| ValidationError::KernelNotFound(key.to_string()))
    }

    /// Whether a kernel is registered with this key.
    pub fn contains(&self, key: &KernelKey) -> bool {
        self.kernels.contains_key(key)
    }
}

impl core::fmt::Debug for KernelRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_set().entries(self.kernels.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{SEQUENCE_CONCAT, SEQUENCE_CONCAT_GRAD};

    #[test]
    fn defaults_should_register_float_cpu_kernels() {
        let registry = KernelRegistry::with_defaults();

        for op_type in [SEQUENCE_CONCAT, SEQUENCE_CONCAT_GRAD] {
            assert!(registry.get::<f32>(op_type, Device::Cpu).is_ok());
            assert!(registry.get::<f64>(op_type, Device::Cpu).is_ok());
            assert!(registry.contains(&KernelKey::new(
                op_type.to_string(),
                Device::Cpu,
                DType::F32
            )));
        }
    }

    #[test]
    fn should_not_find_unregistered_element_type() {
        let registry = KernelRegistry::with_defaults();

        let error = registry.get::<i32>(SEQUENCE_CONCAT, Device::Cpu).unwrap_err();

        assert_eq!(
            error,
            ValidationError::KernelNotFound(
                "operator `sequence_concat` on Cpu with I32".to_string()
            )
        );
    }

    #[test]
    fn should_register_additional_element_types() {
        let mut registry = KernelRegistry::new();

        registry.register::<i64, _>(Device::Cpu, SequenceConcat);

        assert!(registry.get::<i64>(SEQUENCE_CONCAT, Device::Cpu).is_ok());
        assert!(registry.get::<f32>(SEQUENCE_CONCAT, Device::Cpu).is_err());
    }
}
