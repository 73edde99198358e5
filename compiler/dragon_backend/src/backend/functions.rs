//! Function declaration, body lowering and the final hand-off.

use dragon_ir::Span;
use dragon_types::TypeId;

use super::Backend;
use crate::arena::DestroyMode;
use crate::function::{Function, FunctionFlags, SplitStack};
use crate::integrity::check_tree_integrity;
use crate::llir::{next_raw, FuncId, Value};
use crate::lower::lower_function_body;
use crate::node::NodeId;
use crate::sink::{EmissionSink, GlobalDefinitions};
use crate::variable::{GlobalData, GlobalInit, VarId};

impl Backend {
    /// Declare a function of type `fntype`. An empty `asm_name` means the
    /// plain name.
    ///
    /// # Panics
    /// Panics if `fntype` is not a function type.
    pub fn function(
        &mut self,
        fntype: TypeId,
        name: &str,
        asm_name: &str,
        flags: FunctionFlags,
        split_stack: SplitStack,
        span: Span,
    ) -> FuncId {
        if self.types.is_error(fntype) {
            return self.error_function();
        }
        assert!(
            self.types.function_result(fntype).is_some(),
            "function {name} declared with non-function type {}",
            self.type_name(fntype)
        );
        let id = FuncId::new(next_raw(self.functions.len(), "functions"));
        let name = self.interner.intern(name);
        let asm_name = self.interner.intern(asm_name);
        self.functions.push(Function::new(
            id,
            name,
            asm_name,
            fntype,
            flags,
            split_stack,
            span,
        ));
        id
    }

    /// Replace the parameter list of `func`. Returns `false` if any input
    /// is an error.
    pub fn function_set_parameters(&mut self, func: FuncId, params: &[VarId]) -> bool {
        if func == self.error_function() || params.iter().any(|&p| self.variables[p.index()].is_error()) {
            return false;
        }
        self.functions[func.index()].set_params(params.to_vec());
        true
    }

    /// Lower `body` into the basic blocks of `func`.
    ///
    /// Runs the integrity check first when enabled, then lowers, then
    /// destroys the tree's wrappers (its instructions now live in the
    /// blocks). Returns `false` if `func` or `body` is an error.
    ///
    /// # Panics
    /// Panics if the integrity check fails or `func` already has a body.
    pub fn function_set_body(&mut self, func: FuncId, body: NodeId) -> bool {
        if func == self.error_function() || self.is_error_stmt(body) {
            return false;
        }
        let name = self.interner.lookup(self.functions[func.index()].name());

        if self.config.integrity_checks {
            let report = check_tree_integrity(&self.arena, body);
            if !report.ok() {
                panic!("tree integrity check failed for function {name}:\n{report}");
            }
        }
        if self.config.dump_trees {
            tracing::debug!(function = name, tree = %self.dump_tree(body), "function body tree");
        }

        let fntype = self.functions[func.index()].fntype();
        let result_is_void = self.types.function_result(fntype) == Some(TypeId::VOID);
        let entry = self.functions[func.index()].materialize_entry(&mut self.insts);
        let lowered = lower_function_body(func, &mut self.arena, &mut self.insts, body, entry, result_is_void);
        tracing::debug!(function = name, blocks = lowered.blocks.len(), "function body set");

        self.functions[func.index()].set_body(lowered);
        self.arena.destroy(body, DestroyMode::Wrappers, &mut self.insts);
        true
    }

    /// Pass the unit's definitions to `sink`.
    ///
    /// `constants` are constant expressions and are consumed. Sentinels in
    /// any list are skipped.
    ///
    /// # Panics
    /// Panics if a constant is not built from constants or a variable is not
    /// a global.
    pub fn write_global_definitions(
        &mut self,
        types: &[TypeId],
        constants: &[NodeId],
        functions: &[FuncId],
        variables: &[VarId],
        sink: &mut dyn EmissionSink,
    ) {
        let mut values: Vec<GlobalInit> = Vec::with_capacity(constants.len());
        for &constant in constants {
            if self.is_error_expr(constant) {
                continue;
            }
            values.push(self.const_init(constant));
            self.arena.destroy(constant, DestroyMode::All, &mut self.insts);
        }

        let globals: Vec<&GlobalData> = variables
            .iter()
            .map(|&v| &self.variables[v.index()])
            .filter(|var| !var.is_error())
            .map(|var| match var.storage {
                Value::Global(global) => &self.globals[global.index()],
                _ => panic!("variable {} is not a global", self.interner.lookup(var.name)),
            })
            .collect();

        let defs = GlobalDefinitions {
            types: types.iter().copied().filter(|&ty| !self.types.is_error(ty)).collect(),
            constants: values,
            functions: functions
                .iter()
                .filter(|&&f| f != self.error_function())
                .map(|&f| &self.functions[f.index()])
                .collect(),
            variables: globals,
            insts: &self.insts,
            type_cache: &self.types,
        };
        tracing::debug!(
            types = defs.types.len(),
            constants = defs.constants.len(),
            functions = defs.functions.len(),
            variables = defs.variables.len(),
            "writing global definitions"
        );
        sink.accept(&defs);
    }
}
