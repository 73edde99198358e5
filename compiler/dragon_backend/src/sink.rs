//! Hand-off of a finished compilation unit.
//!
//! [`Backend::write_global_definitions`](crate::Backend::write_global_definitions)
//! collects the unit's declarations into one [`GlobalDefinitions`] batch and
//! passes it to an [`EmissionSink`]. What the sink does with it (object
//! emission, serialization, inspection in tests) is outside this crate.

use dragon_types::{TypeCache, TypeId};

use crate::function::Function;
use crate::llir::InstStore;
use crate::variable::{GlobalData, GlobalInit};

/// Everything a compilation unit defines, borrowed from the backend.
pub struct GlobalDefinitions<'a> {
    /// Declared types, in declaration order.
    pub types: Vec<TypeId>,
    /// Values of package-level constants.
    pub constants: Vec<GlobalInit>,
    /// Functions, lowered or declared only.
    pub functions: Vec<&'a Function>,
    pub variables: Vec<&'a GlobalData>,
    /// Instructions referenced by the function bodies.
    pub insts: &'a InstStore,
    pub type_cache: &'a TypeCache,
}

impl GlobalDefinitions<'_> {
    /// Number of functions with a lowered body.
    pub fn defined_function_count(&self) -> usize {
        self.functions.iter().filter(|f| f.body().is_some()).count()
    }
}

/// Consumer of a finished compilation unit.
pub trait EmissionSink {
    fn accept(&mut self, defs: &GlobalDefinitions<'_>);
}
