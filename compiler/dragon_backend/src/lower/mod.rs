//! Node tree → basic-block lowering.
//!
//! Turns a function's statement tree (structured control flow, with each
//! expression carrying its own instructions) into a [`FunctionBody`]
//! (explicit control flow).
//!
//! # Entry Point
//!
//! [`lower_function_body`] walks the tree once, depth first, carrying a
//! cursor (the block currently receiving instructions). Instructions are
//! moved out of the nodes into blocks, so afterwards the tree only needs
//! its wrappers destroyed.
//!
//! # Block names
//!
//! Blocks get diagnostic names (`entry`, `then.N`, `else.N`,
//! `fallthrough.N`, `label.N`, `orphan.N`, `switch.test.N`, `case.N`,
//! `switch.exit.N`). Names carry no meaning.

mod builder;

use dragon_ir::Operator;
use dragon_types::TypeId;
use rustc_hash::FxHashMap;

use crate::arena::NodeArena;
use crate::function::LabelId;
use crate::llir::{BlockId, FuncId, FunctionBody, InstId, InstKind, InstStore, Value};
use crate::node::{NodeId, NodeKind, SwitchCase};
use crate::stack::ensure_sufficient_stack;

use self::builder::IrBuilder;

/// Per-function lowering state.
struct BlockLowerer<'a> {
    func: FuncId,
    arena: &'a mut NodeArena,
    insts: &'a mut InstStore,
    builder: IrBuilder,
    /// Block of each label, created on first mention (definition or goto).
    label_blocks: FxHashMap<LabelId, BlockId>,
    next_if: u32,
    next_orphan: u32,
    next_switch: u32,
    next_case: u32,
    next_test: u32,
}

/// Lower the statement tree rooted at `root` into basic blocks of `func`.
///
/// # Panics
/// Panics if a label or goto in the tree belongs to another function.
///
/// `entry_insts` (stack slots and parameter spills) open the entry block.
/// `result_is_void` decides how blocks left open by the walk are closed.
pub fn lower_function_body(
    func: FuncId,
    arena: &mut NodeArena,
    insts: &mut InstStore,
    root: NodeId,
    entry_insts: Vec<InstId>,
    result_is_void: bool,
) -> FunctionBody {
    let mut lowerer = BlockLowerer {
        func,
        arena,
        insts,
        builder: IrBuilder::new(),
        label_blocks: FxHashMap::default(),
        next_if: 0,
        next_orphan: 0,
        next_switch: 0,
        next_case: 0,
        next_test: 0,
    };

    lowerer.builder.append(entry_insts);
    lowerer.walk(root);

    tracing::debug!(
        blocks = lowerer.builder.block_count(),
        labels = lowerer.label_blocks.len(),
        "function body lowered"
    );
    lowerer.builder.finish(result_is_void)
}

impl BlockLowerer<'_> {
    // Statements

    fn walk(&mut self, stmt: NodeId) {
        ensure_sufficient_stack(|| {
            let kind = self.arena.get(stmt).kind().clone();
            match kind {
                NodeKind::BlockStmt => {
                    let kids = self.arena.get(stmt).kids().to_vec();
                    for kid in kids {
                        self.walk(kid);
                    }
                }
                NodeKind::ExprStmt => {
                    let expr = self.arena.get(stmt).kids()[0];
                    self.emit_expr(expr);
                }
                NodeKind::IfStmt => self.walk_if(stmt),
                NodeKind::LabelStmt(owner, label) => {
                    let block = self.label_block(owner, label);
                    self.builder.terminate_jump(block);
                    self.builder.position_at(block);
                }
                NodeKind::GotoStmt(owner, label) => {
                    let block = self.label_block(owner, label);
                    self.builder.terminate_jump(block);
                    self.start_orphan();
                }
                NodeKind::SwitchStmt(desc) => self.walk_switch(stmt, &desc.cases().to_vec()),
                NodeKind::EmptyStmt | NodeKind::ErrorStmt => {}
                other => panic!("unsupported node kind in lowering: {}", other.flavor()),
            }
        });
    }

    fn walk_if(&mut self, stmt: NodeId) {
        let [cond, then_stmt, else_stmt] = self.kids3(stmt);
        let cond_value = self.emit_value(cond);

        let n = self.next_if;
        self.next_if += 1;
        let then_block = self.builder.new_block(format!("then.{n}"));
        let has_else = *self.arena.get(else_stmt).kind() != NodeKind::EmptyStmt;
        let else_block = has_else.then(|| self.builder.new_block(format!("else.{n}")));
        let fallthrough = self.builder.new_block(format!("fallthrough.{n}"));

        self.builder
            .terminate_branch(cond_value, then_block, else_block.unwrap_or(fallthrough));

        self.builder.position_at(then_block);
        self.walk(then_stmt);
        self.builder.terminate_jump(fallthrough);

        if let Some(else_block) = else_block {
            self.builder.position_at(else_block);
            self.walk(else_stmt);
            self.builder.terminate_jump(fallthrough);
        }

        self.builder.position_at(fallthrough);
    }

    /// Compare ladder: every case value is tested in order against the
    /// switch value; a failed final test goes to the default body, or to
    /// the exit when there is none. Bodies fall through to the next body.
    fn walk_switch(&mut self, stmt: NodeId, cases: &[SwitchCase]) {
        let kids = self.arena.get(stmt).kids().to_vec();
        let scrutinee = self.emit_value(kids[0]);

        let n = self.next_switch;
        self.next_switch += 1;
        let bodies: Vec<BlockId> = cases
            .iter()
            .map(|_| {
                let c = self.next_case;
                self.next_case += 1;
                self.builder.new_block(format!("case.{c}"))
            })
            .collect();
        let exit = self.builder.new_block(format!("switch.exit.{n}"));

        let mut default = None;
        for (case, &body) in cases.iter().zip(&bodies) {
            if case.is_default() {
                default = Some(body);
                continue;
            }
            for &value in &kids[case.value_index..case.value_index + case.value_count] {
                let rhs = self.emit_value(value);
                let test = self.insts.create(
                    InstKind::Compare {
                        op: Operator::EqEq,
                        lhs: scrutinee,
                        rhs,
                    },
                    TypeId::BOOL,
                );
                self.builder.append([test]);
                let t = self.next_test;
                self.next_test += 1;
                let next = self.builder.new_block(format!("switch.test.{t}"));
                self.builder.terminate_branch(Value::Inst(test), body, next);
                self.builder.position_at(next);
            }
        }
        self.builder.terminate_jump(default.unwrap_or(exit));

        for (i, case) in cases.iter().enumerate() {
            self.builder.position_at(bodies[i]);
            self.walk(kids[case.stmt_index]);
            self.builder
                .terminate_jump(bodies.get(i + 1).copied().unwrap_or(exit));
        }

        self.builder.position_at(exit);
    }

    fn label_block(&mut self, owner: FuncId, label: LabelId) -> BlockId {
        assert!(
            owner == self.func,
            "label L{} of function {} used in function {}",
            label.raw(),
            owner.raw(),
            self.func.raw()
        );
        if let Some(&block) = self.label_blocks.get(&label) {
            return block;
        }
        let block = self.builder.new_block(format!("label.{}", label.raw()));
        self.label_blocks.insert(label, block);
        block
    }

    /// Continue in a fresh block with no predecessors.
    fn start_orphan(&mut self) {
        let n = self.next_orphan;
        self.next_orphan += 1;
        let block = self.builder.new_block(format!("orphan.{n}"));
        self.builder.position_at(block);
    }

    // Expressions

    /// Move the instructions of `expr` into the cursor, children first.
    fn emit_expr(&mut self, expr: NodeId) {
        ensure_sufficient_stack(|| {
            let kids = self.arena.get(expr).kids().to_vec();
            for kid in kids {
                if self.arena.get(kid).is_stmt() {
                    self.walk(kid);
                } else {
                    self.emit_expr(kid);
                }
            }

            for inst in self.arena.take_instructions(expr) {
                if let InstKind::Ret { value } = self.insts.get(inst).kind {
                    self.insts.free(inst);
                    self.builder.terminate_return(value);
                    self.start_orphan();
                } else {
                    self.builder.append([inst]);
                }
            }
        });
    }

    fn emit_value(&mut self, expr: NodeId) -> Value {
        self.emit_expr(expr);
        match self.arena.get(expr).value() {
            Some(value) => value,
            None => panic!(
                "{} node {} has no value to lower",
                self.arena.get(expr).kind().flavor(),
                expr.raw()
            ),
        }
    }

    fn kids3(&self, stmt: NodeId) -> [NodeId; 3] {
        match *self.arena.get(stmt).kids() {
            [a, b, c] => [a, b, c],
            ref kids => panic!("expected 3 children, got {}", kids.len()),
        }
    }
}
