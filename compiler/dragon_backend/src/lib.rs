//! Dragon Backend - code-generation core.
//!
//! A front end hands this crate typed declarations, expressions and
//! structured statements through the [`Backend`] facade. The backend stages
//! them as a node tree whose expressions already carry their low-level
//! instructions, checks the tree, and lowers each function body into an
//! explicit basic-block graph. The finished unit goes to an
//! [`EmissionSink`].
//!
//! # Architecture
//!
//! - **Node model** (`node`, `arena`, `integrity`): arena-owned tree with
//!   single-parent ownership and three destruction modes
//! - **Function/variable model** (`function`, `variable`): labels, spill
//!   slots and pending stack slots per function
//! - **Lowering** (`lower`): statement tree to [`FunctionBody`]
//! - **Facade** (`backend`): one method per front-end operation
//! - **Low-level IR** (`llir`): instructions, values and blocks
//!
//! Types live in [`dragon_types`]; names, spans and operators in
//! [`dragon_ir`].
//!
//! # Debugging
//!
//! - `RUST_LOG=dragon_backend=debug`: per-function lowering summaries
//!   (after [`init_tracing`])
//! - `DRAGON_DUMP_TREES=1`: log every function body tree before lowering
//!   (with [`BackendConfig::from_env`])
//! - `DRAGON_INTEGRITY_CHECKS=0|1`: force the tree integrity check off or
//!   on

pub mod arena;
pub mod function;
pub mod integrity;
pub mod llir;
pub mod lower;
pub mod node;
pub mod sink;
pub mod variable;

mod backend;
mod dump;
mod graph;
mod stack;

pub use arena::{DestroyMode, EditError, NodeArena};
pub use backend::{Backend, BackendConfig};
pub use dump::dump_tree;
pub use function::{Function, FunctionFlags, Label, LabelId, SplitStack};
pub use integrity::{check_tree_integrity, IntegrityReport, Violation};
pub use llir::{
    BasicBlock, BlockId, Constant, FuncId, FunctionBody, GlobalId, InstId, InstKind, InstStore,
    Terminator, Value,
};
pub use node::{Node, NodeFlags, NodeId, NodeKind, SwitchDescriptor};
pub use sink::{EmissionSink, GlobalDefinitions};
pub use stack::ensure_sufficient_stack;
pub use variable::{GlobalFlags, GlobalInit, VarId, VarKind, Variable};

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Call this once at startup. Safe to call multiple times.
/// Enable with `RUST_LOG=dragon_backend=debug` or `RUST_LOG=dragon_backend=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
