//! Expression operators.

use std::fmt;

/// Operator of a unary or binary expression node.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Operator {
    /// `||`
    OrOr,
    /// `&&`
    AndAnd,
    /// `==`
    EqEq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `|`
    Or,
    /// `^`
    Xor,
    /// `*`
    Mult,
    /// `/`
    Div,
    /// `%`
    Mod,
    /// `<<`
    LShift,
    /// `>>`
    RShift,
    /// `&`
    And,
    /// `!`
    Not,
    /// `=`
    Eq,
    /// `&^`
    BitClear,
}

/// Coarse grouping of operators, used to pick result types and
/// instruction shapes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum OperatorClass {
    /// Produces a `bool` from two operands of the same type.
    Comparison,
    /// Short-circuit boolean connective.
    Logical,
    /// Arithmetic or bitwise; result has the operand type.
    Arithmetic,
    /// Shift; result has the left operand type.
    Shift,
    /// Only meaningful in prefix position or as an assignment.
    Other,
}

impl Operator {
    /// Source spelling of the operator.
    pub const fn as_str(self) -> &'static str {
        match self {
            Operator::OrOr => "||",
            Operator::AndAnd => "&&",
            Operator::EqEq => "==",
            Operator::NotEq => "!=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Plus => "+",
            Operator::Minus => "-",
            Operator::Or => "|",
            Operator::Xor => "^",
            Operator::Mult => "*",
            Operator::Div => "/",
            Operator::Mod => "%",
            Operator::LShift => "<<",
            Operator::RShift => ">>",
            Operator::And => "&",
            Operator::Not => "!",
            Operator::Eq => "=",
            Operator::BitClear => "&^",
        }
    }

    pub const fn class(self) -> OperatorClass {
        match self {
            Operator::EqEq
            | Operator::NotEq
            | Operator::Lt
            | Operator::Le
            | Operator::Gt
            | Operator::Ge => OperatorClass::Comparison,
            Operator::OrOr | Operator::AndAnd => OperatorClass::Logical,
            Operator::Plus
            | Operator::Minus
            | Operator::Or
            | Operator::Xor
            | Operator::Mult
            | Operator::Div
            | Operator::Mod
            | Operator::And
            | Operator::BitClear => OperatorClass::Arithmetic,
            Operator::LShift | Operator::RShift => OperatorClass::Shift,
            Operator::Not | Operator::Eq => OperatorClass::Other,
        }
    }

    /// Whether the operator is accepted by unary expression nodes.
    pub const fn is_unary(self) -> bool {
        matches!(self, Operator::Minus | Operator::Not | Operator::Xor)
    }

    /// Whether the operator is accepted by binary expression nodes.
    pub const fn is_binary(self) -> bool {
        !matches!(self, Operator::Not | Operator::Eq)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
