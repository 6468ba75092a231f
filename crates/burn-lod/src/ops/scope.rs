use alloc::string::{String, ToString};
use hashbrown::HashMap;

use crate::{Element, LodTensor, Shape, ValidationError};

/// Shapes of variables, by name.
pub type ShapeMap = HashMap<String, Shape>;

/// Owns the tensors of a graph, by variable name.
///
/// Operators borrow their inputs from the scope for the duration of a single run and store their
/// outputs back into it.
#[derive(Debug, Clone)]
pub struct Scope<E> {
    vars: HashMap<String, LodTensor<E>>,
}

impl<E> Default for Scope<E> {
    fn default() -> Self {
        Self {
            vars: HashMap::new(),
        }
    }
}

impl<E: Element> Scope<E> {
    /// Creates an empty scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a tensor, returning the tensor previously stored under the same name.
    pub fn insert<S: Into<String>>(
        &mut self,
        name: S,
        tensor: LodTensor<E>,
    ) -> Option<LodTensor<E>> {
        self.vars.insert(name.into(), tensor)
    }

    /// Returns a tensor.
    pub fn get(&self, name: &str) -> Result<&LodTensor<E>, ValidationError> {
        self.vars
            .get(name)
            .ok_or_else(|| ValidationError::MissingVariable(name.to_string()))
    }

    /// Whether a tensor is stored under this name.
    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Shapes of every stored tensor.
    pub fn shapes(&self) -> ShapeMap {
        self.vars
            .iter()
            .map(|(name, tensor)| (name.clone(), tensor.shape()))
            .collect()
    }
}
