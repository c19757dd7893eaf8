//! Display formatting for expressions, in the host expression syntax used by
//! the abbreviation record and artifact streams.

use std::fmt;

use num_rational::BigRational;
use num_traits::Signed;

use crate::core::expr::{Expr, ExprKind};

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Number(n) => write_rational(f, n),

            ExprKind::Symbol(s) => write!(f, "{s}"),

            ExprKind::Bracket { head, arg } => write!(f, "{head}({arg})"),

            ExprKind::Sum(terms) => {
                for (i, term) in terms.iter().enumerate() {
                    if i == 0 {
                        write!(f, "{term}")?;
                    } else if let Some(positive) = strip_negation(term) {
                        write!(f, " - {positive}")?;
                    } else {
                        write!(f, " + {term}")?;
                    }
                }
                Ok(())
            }

            ExprKind::Product(factors) => {
                // A leading -1 coefficient renders as a sign, not a factor.
                let mut rest = &factors[..];
                if let ExprKind::Number(n) = &factors[0].kind {
                    if is_neg_one(n) && factors.len() > 1 {
                        write!(f, "-")?;
                        rest = &factors[1..];
                    }
                }
                for (i, factor) in rest.iter().enumerate() {
                    if i > 0 {
                        write!(f, "*")?;
                    }
                    write_mul_operand(f, factor)?;
                }
                Ok(())
            }

            ExprKind::Pow(base, exp) => {
                match &base.kind {
                    ExprKind::Symbol(_) | ExprKind::Bracket { .. } => write!(f, "{base}")?,
                    _ => write!(f, "({base})")?,
                }
                match &exp.kind {
                    ExprKind::Number(n) if !n.is_negative() && n.is_integer() => {
                        write!(f, "^{exp}")
                    }
                    ExprKind::Symbol(_) => write!(f, "^{exp}"),
                    _ => write!(f, "^({exp})"),
                }
            }
        }
    }
}

fn write_rational(f: &mut fmt::Formatter<'_>, n: &BigRational) -> fmt::Result {
    if n.is_integer() {
        write!(f, "{}", n.numer())
    } else {
        write!(f, "{}/{}", n.numer(), n.denom())
    }
}

fn is_neg_one(n: &BigRational) -> bool {
    n.is_integer() && *n.numer() == num_bigint::BigInt::from(-1)
}

/// Format a multiplication operand, parenthesizing sums.
fn write_mul_operand(f: &mut fmt::Formatter<'_>, expr: &Expr) -> fmt::Result {
    match &expr.kind {
        ExprKind::Sum(_) => write!(f, "({expr})"),
        _ => write!(f, "{expr}"),
    }
}

/// If `term` is a negated term (negative number, or product with a negative
/// leading coefficient), return a displayable positive counterpart.
fn strip_negation(term: &Expr) -> Option<Expr> {
    match &term.kind {
        ExprKind::Number(n) if n.is_negative() => Some(Expr::number(-n.clone())),
        ExprKind::Product(factors) => {
            if let ExprKind::Number(n) = &factors[0].kind {
                if n.is_negative() {
                    let mut flipped: Vec<Expr> = Vec::with_capacity(factors.len());
                    flipped.push(Expr::number(-n.clone()));
                    for factor in &factors[1..] {
                        flipped.push((**factor).clone());
                    }
                    return Some(Expr::product(flipped));
                }
            }
            None
        }
        _ => None,
    }
}
