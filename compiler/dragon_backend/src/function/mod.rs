//! Functions under construction.
//!
//! A [`Function`] collects everything the facade learns about a function
//! before its body is lowered: labels and their definitions, parameter
//! spill slots, local stack slots waiting to be placed in the entry block,
//! and the blocks created for it.

use bitflags::bitflags;
use dragon_ir::{Name, Span};
use dragon_types::TypeId;

use crate::llir::{next_raw, FuncId, FunctionBody, InstId, InstKind, InstStore, Value};
use crate::node::NodeId;
use crate::variable::VarId;

/// Label ID, scoped to one function.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct LabelId(u32);

impl LabelId {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A label together with the function it belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Label {
    pub func: FuncId,
    pub id: LabelId,
    pub span: Span,
}

bitflags! {
    /// Linkage and code-generation attributes of a function.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct FunctionFlags: u8 {
        /// Visible outside the compilation unit.
        const VISIBLE = 1 << 0;
        /// Declared here, defined elsewhere.
        const DECLARATION = 1 << 1;
        const INLINABLE = 1 << 2;
        /// Place in its own section.
        const UNIQUE_SECTION = 1 << 3;
    }
}

/// Whether the function runs the split-stack prologue.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum SplitStack {
    #[default]
    Yes,
    No,
}

/// A function under construction.
#[derive(Debug)]
pub struct Function {
    id: FuncId,
    name: Name,
    asm_name: Name,
    fntype: TypeId,
    flags: FunctionFlags,
    split_stack: SplitStack,
    span: Span,
    /// Parameter variables, in parameter order.
    params: Vec<VarId>,
    /// Definition statement of each label, indexed by `LabelId`.
    label_defs: Vec<Option<NodeId>>,
    /// Spill slot of each parameter, indexed by parameter position.
    spill_slots: Vec<Option<InstId>>,
    /// Parameters whose spill slot has not been placed in the entry block.
    pending_spills: Vec<u32>,
    /// Local stack slots not yet placed in the entry block.
    pending_locals: Vec<InstId>,
    /// Block statements created for this function, with the variables
    /// whose lifetime starts in each.
    blocks: Vec<(NodeId, Vec<VarId>)>,
    body: Option<FunctionBody>,
}

impl Function {
    pub(crate) fn new(
        id: FuncId,
        name: Name,
        asm_name: Name,
        fntype: TypeId,
        flags: FunctionFlags,
        split_stack: SplitStack,
        span: Span,
    ) -> Self {
        Function {
            id,
            name,
            asm_name,
            fntype,
            flags,
            split_stack,
            span,
            params: Vec::new(),
            label_defs: Vec::new(),
            spill_slots: Vec::new(),
            pending_spills: Vec::new(),
            pending_locals: Vec::new(),
            blocks: Vec::new(),
            body: None,
        }
    }

    #[inline]
    pub fn id(&self) -> FuncId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> Name {
        self.name
    }

    /// Assembler (symbol) name; the plain name when none was given.
    #[inline]
    pub fn asm_name(&self) -> Name {
        if self.asm_name.is_empty() {
            self.name
        } else {
            self.asm_name
        }
    }

    #[inline]
    pub fn fntype(&self) -> TypeId {
        self.fntype
    }

    #[inline]
    pub fn flags(&self) -> FunctionFlags {
        self.flags
    }

    #[inline]
    pub fn split_stack(&self) -> SplitStack {
        self.split_stack
    }

    #[inline]
    pub fn span(&self) -> Span {
        self.span
    }

    #[inline]
    pub fn params(&self) -> &[VarId] {
        &self.params
    }

    pub(crate) fn push_param(&mut self, var: VarId) -> u32 {
        let index = next_raw(self.params.len(), "parameters");
        self.params.push(var);
        index
    }

    pub(crate) fn set_params(&mut self, params: Vec<VarId>) {
        self.params = params;
    }

    /// Lowered body, once `function_set_body` has run.
    #[inline]
    pub fn body(&self) -> Option<&FunctionBody> {
        self.body.as_ref()
    }

    pub(crate) fn set_body(&mut self, body: FunctionBody) {
        assert!(
            self.body.is_none(),
            "function {} already has a body",
            self.id.raw()
        );
        self.body = Some(body);
    }

    #[inline]
    pub fn blocks(&self) -> &[(NodeId, Vec<VarId>)] {
        &self.blocks
    }

    pub(crate) fn add_block(&mut self, block: NodeId, vars: Vec<VarId>) {
        self.blocks.push((block, vars));
    }

    /// Record that `var`'s lifetime starts in `block`.
    ///
    /// # Panics
    /// Panics if `block` was not created for this function.
    pub(crate) fn add_block_var(&mut self, block: NodeId, var: VarId) {
        let Some((_, vars)) = self.blocks.iter_mut().find(|(b, _)| *b == block) else {
            panic!("block node {} does not belong to function {}", block.raw(), self.id.raw());
        };
        vars.push(var);
    }

    // Labels

    /// Allocate a fresh label.
    pub fn new_label(&mut self, span: Span) -> Label {
        let id = LabelId::new(next_raw(self.label_defs.len(), "labels"));
        self.label_defs.push(None);
        Label {
            func: self.id,
            id,
            span,
        }
    }

    /// Number of labels allocated so far.
    #[inline]
    pub fn label_count(&self) -> usize {
        self.label_defs.len()
    }

    /// Record the definition statement of `label`.
    ///
    /// # Panics
    /// Panics if the label belongs to another function or is already
    /// defined.
    pub fn define_label(&mut self, label: Label, stmt: NodeId) {
        assert_eq!(
            label.func, self.id,
            "label {} belongs to another function",
            label.id.raw()
        );
        let slot = &mut self.label_defs[label.id.index()];
        assert!(slot.is_none(), "label {} defined twice", label.id.raw());
        *slot = Some(stmt);
    }

    /// Definition statement of `label`, if it has been defined.
    pub fn label_definition(&self, label: LabelId) -> Option<NodeId> {
        self.label_defs.get(label.index()).copied().flatten()
    }

    // Stack slots

    /// Spill slot for parameter `index`, created with `make` on first use.
    ///
    /// Later calls for the same parameter return the cached slot.
    pub fn spill_slot_for(&mut self, index: u32, make: impl FnOnce() -> InstId) -> InstId {
        let i = index as usize;
        if self.spill_slots.len() <= i {
            self.spill_slots.resize(i + 1, None);
        }
        if let Some(slot) = self.spill_slots[i] {
            return slot;
        }
        let slot = make();
        self.spill_slots[i] = Some(slot);
        self.pending_spills.push(index);
        slot
    }

    /// Cached spill slot of parameter `index`, if one was created.
    pub fn spill_slot(&self, index: u32) -> Option<InstId> {
        self.spill_slots.get(index as usize).copied().flatten()
    }

    /// Queue a local's stack slot for placement in the entry block.
    pub fn add_pending_local(&mut self, slot: InstId) {
        self.pending_locals.push(slot);
    }

    /// Whether any slot is still waiting for the entry block.
    pub fn has_pending_slots(&self) -> bool {
        !self.pending_spills.is_empty() || !self.pending_locals.is_empty()
    }

    /// Drain pending slots into the instruction list for the entry block.
    ///
    /// Returns the parameter spill slots in parameter order, then the local
    /// slots in creation order, then one store per spilled parameter that
    /// copies the incoming argument into its slot. The pending lists are
    /// left empty, so a second call returns nothing.
    pub fn materialize_entry(&mut self, insts: &mut InstStore) -> Vec<InstId> {
        let mut spills = std::mem::take(&mut self.pending_spills);
        spills.sort_unstable();
        let locals = std::mem::take(&mut self.pending_locals);

        let mut entry = Vec::with_capacity(spills.len() * 2 + locals.len());
        let mut stores = Vec::with_capacity(spills.len());
        for index in spills {
            let Some(slot) = self.spill_slot(index) else {
                continue;
            };
            entry.push(slot);
            let store = insts.create(
                InstKind::Store {
                    ptr: Value::Inst(slot),
                    value: Value::Param(index),
                },
                TypeId::VOID,
            );
            stores.push(store);
        }
        entry.extend(locals);
        entry.extend(stores);
        entry
    }
}
