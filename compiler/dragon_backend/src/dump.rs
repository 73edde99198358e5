//! Indented text rendering of a node tree, for debugging.
//!
//! One line per node: flavor, kind payload, type and constant value for
//! expressions, then one line per owned instruction, then the children one
//! level deeper.

use std::fmt;

use dragon_ir::StringInterner;
use dragon_types::TypeCache;

use crate::arena::NodeArena;
use crate::llir::{Constant, InstStore, Value};
use crate::node::{CompositeState, NodeId, NodeKind};
use crate::stack::ensure_sufficient_stack;

struct TreeDump<'a> {
    arena: &'a NodeArena,
    insts: &'a InstStore,
    types: &'a TypeCache,
    interner: &'a StringInterner,
    root: NodeId,
}

fn write_indent(f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
    for _ in 0..indent {
        f.write_str("  ")?;
    }
    Ok(())
}

impl TreeDump<'_> {
    fn write_constant(&self, f: &mut fmt::Formatter<'_>, c: Constant) -> fmt::Result {
        match c {
            Constant::Int { value, .. } => write!(f, "{value}"),
            Constant::Float { bits, .. } => write!(f, "{}", f64::from_bits(bits)),
            Constant::Bool(b) => write!(f, "{b}"),
            Constant::Null(_) => f.write_str("nil"),
            Constant::Zero(_) => f.write_str("zero"),
            Constant::Str(s) => write!(f, "{:?}", self.interner.lookup(s)),
            Constant::Void => f.write_str("void"),
        }
    }

    fn write_node(&self, f: &mut fmt::Formatter<'_>, id: NodeId, indent: usize) -> fmt::Result {
        write_indent(f, indent)?;
        let Some(node) = self.arena.try_get(id) else {
            return writeln!(f, "<destroyed {}>", id.raw());
        };

        f.write_str(node.kind().flavor())?;
        match node.kind() {
            NodeKind::Var(var) => write!(f, " v{}", var.raw())?,
            NodeKind::FcnAddress(func) => write!(f, " f{}", func.raw())?,
            NodeKind::UnaryOp(op) | NodeKind::BinaryOp(op) => write!(f, " {op}")?,
            NodeKind::StructField(index) => write!(f, " .{index}")?,
            NodeKind::LabelStmt(_, label) | NodeKind::GotoStmt(_, label) => {
                write!(f, " L{}", label.raw())?;
            }
            NodeKind::Composite(CompositeState::Building) => f.write_str(" building")?,
            NodeKind::Composite(CompositeState::Finalized) => f.write_str(" finalized")?,
            NodeKind::SwitchStmt(desc) => write!(f, " cases={}", desc.cases().len())?,
            _ => {}
        }
        if node.is_expr() {
            write!(f, " : {}", self.types.display(node.ty(), self.interner))?;
            if let Some(Value::Const(c)) = node.value() {
                f.write_str(" = ")?;
                self.write_constant(f, c)?;
            }
            if node.is_address() {
                f.write_str(" [addr]")?;
            }
        }
        writeln!(f)?;

        for &inst in node.insts() {
            write_indent(f, indent + 1)?;
            match self.insts.try_get(inst) {
                Some(data) => writeln!(f, "%{} = {:?}", inst.raw(), data.kind)?,
                None => writeln!(f, "%{} <freed>", inst.raw())?,
            }
        }
        for &kid in node.kids() {
            ensure_sufficient_stack(|| self.write_node(f, kid, indent + 1))?;
        }
        Ok(())
    }
}

impl fmt::Display for TreeDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_node(f, self.root, 0)
    }
}

/// Render the tree under `root`.
pub fn dump_tree(
    arena: &NodeArena,
    insts: &InstStore,
    types: &TypeCache,
    interner: &StringInterner,
    root: NodeId,
) -> String {
    TreeDump {
        arena,
        insts,
        types,
        interner,
        root,
    }
    .to_string()
}
