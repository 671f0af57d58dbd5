//! The trip-condition predicate language: a small boolean expression grammar
//! over three round-trip metric builtins.
//!
//! # Module Organization
//!
//! - [`ast`] - the `Expr`/`Call`/`CompareOp` tagged sum type
//! - [`parser`] - recursive-descent parser from source text to [`ast::Expr`]
//!
//! [`evaluate`] is the single pure dispatch function that walks an [`ast::Expr`]
//! against a live [`crate::metrics::RTMetrics`] snapshot. There is no trait
//! hierarchy to extend: a new builtin is one [`ast::Call`] variant, one parser
//! arm, and one `evaluate` arm.

pub mod ast;
pub mod parser;

pub use ast::{Call, CompareOp, Expr};
pub use parser::parse;

use crate::metrics::RTMetrics;
use std::time::Duration;

/// Evaluates a compiled predicate against the current metrics snapshot.
///
/// `LatencyAtQuantile`'s right-hand side is interpreted as a nanosecond
/// count; every other builtin compares against a plain ratio or count.
pub fn evaluate(expr: &Expr, metrics: &mut RTMetrics) -> bool {
    match expr {
        Expr::And(lhs, rhs) => evaluate(lhs, metrics) && evaluate(rhs, metrics),
        Expr::Or(lhs, rhs) => evaluate(lhs, metrics) || evaluate(rhs, metrics),
        Expr::Compare(call, op, rhs) => compare(call, *op, *rhs, metrics),
    }
}

fn compare(call: &Call, op: CompareOp, rhs: f64, metrics: &mut RTMetrics) -> bool {
    let lhs = match call {
        Call::NetworkErrorRatio => metrics.network_error_ratio(),
        Call::LatencyAtQuantile(q) => {
            metrics.latency_at_quantile(*q).as_nanos() as f64
        }
        Call::ResponseCodeRatio(low1, high1, low2, high2) => {
            metrics.response_code_ratio(*low1, *high1, *low2, *high2)
        }
    };

    let rhs = if matches!(call, Call::LatencyAtQuantile(_)) {
        Duration::from_nanos(rhs.max(0.0) as u64).as_nanos() as f64
    } else {
        rhs
    };

    match op {
        CompareOp::Gt => lhs > rhs,
        CompareOp::Lt => lhs < rhs,
        CompareOp::Eq => (lhs - rhs).abs() < f64::EPSILON,
        CompareOp::Neq => (lhs - rhs).abs() >= f64::EPSILON,
    }
}
