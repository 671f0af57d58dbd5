//! The trip-condition predicate AST: a tagged sum type evaluated by a pure
//! function (see [`super::evaluate`]). Adding a new builtin is a single new
//! [`Call`] variant plus a dispatch arm in `evaluate` and `parser` — no
//! evaluator subclassing required.

use std::fmt;

/// A boolean-valued predicate expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Compare(Call, CompareOp, f64),
}

/// Comparison operators accepted by the grammar's `cmp` production.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Gt,
    Lt,
    Eq,
    Neq,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompareOp::Gt => ">",
            CompareOp::Lt => "<",
            CompareOp::Eq => "==",
            CompareOp::Neq => "!=",
        };
        f.write_str(s)
    }
}

/// The three metric builtins the grammar exposes. Each has a fixed arity and
/// numeric argument types.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Call {
    NetworkErrorRatio,
    LatencyAtQuantile(f64),
    ResponseCodeRatio(u16, u16, u16, u16),
}

impl Call {
    pub fn name(&self) -> &'static str {
        match self {
            Call::NetworkErrorRatio => "NetworkErrorRatio",
            Call::LatencyAtQuantile(_) => "LatencyAtQuantile",
            Call::ResponseCodeRatio(..) => "ResponseCodeRatio",
        }
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Call::NetworkErrorRatio => write!(f, "NetworkErrorRatio()"),
            Call::LatencyAtQuantile(q) => write!(f, "LatencyAtQuantile({q})"),
            Call::ResponseCodeRatio(a, b, c, d) => write!(f, "ResponseCodeRatio({a},{b},{c},{d})"),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::And(lhs, rhs) => write!(f, "{lhs} && {rhs}"),
            Expr::Or(lhs, rhs) => write!(f, "{lhs} || {rhs}"),
            Expr::Compare(call, op, rhs) => {
                // LatencyAtQuantile's right-hand side is always written as a
                // bare integer nanosecond count, never in scientific notation.
                if matches!(call, Call::LatencyAtQuantile(_)) {
                    write!(f, "{call} {op} {}", *rhs as i64)
                } else {
                    write!(f, "{call} {op} {rhs}")
                }
            }
        }
    }
}
