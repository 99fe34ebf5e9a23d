//! Formulas plotted by function nodes.
//!
//! A formula is an expression in the single variable `x`, parsed once with
//! the `formula.pest` grammar and a Pratt parser, then evaluated per sample.

use std::fmt;
use std::sync::LazyLock;

use pest::Parser;
use pest::iterators::Pairs;
use pest::pratt_parser::{Assoc, Op, PrattParser};
use pest_derive::Parser;

use crate::errors::PropertyError;

#[derive(Parser)]
#[grammar = "formula.pest"]
struct FormulaParser;

static PRATT: LazyLock<PrattParser<Rule>> = LazyLock::new(|| {
    PrattParser::new()
        .op(Op::infix(Rule::add, Assoc::Left) | Op::infix(Rule::sub, Assoc::Left))
        .op(Op::infix(Rule::mul, Assoc::Left) | Op::infix(Rule::div, Assoc::Left))
        .op(Op::prefix(Rule::neg))
        .op(Op::infix(Rule::pow, Assoc::Right))
});

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Func {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sqrt,
    Exp,
    Ln,
    Log10,
    Abs,
    Floor,
    Ceil,
}

impl Func {
    fn from_name(name: &str) -> Option<Func> {
        Some(match name {
            "sin" => Func::Sin,
            "cos" => Func::Cos,
            "tan" => Func::Tan,
            "asin" => Func::Asin,
            "acos" => Func::Acos,
            "atan" => Func::Atan,
            "sqrt" => Func::Sqrt,
            "exp" => Func::Exp,
            "ln" => Func::Ln,
            "log" | "log10" => Func::Log10,
            "abs" => Func::Abs,
            "floor" => Func::Floor,
            "ceil" => Func::Ceil,
            _ => return None,
        })
    }

    fn apply(self, v: f64) -> f64 {
        match self {
            Func::Sin => v.sin(),
            Func::Cos => v.cos(),
            Func::Tan => v.tan(),
            Func::Asin => v.asin(),
            Func::Acos => v.acos(),
            Func::Atan => v.atan(),
            Func::Sqrt => v.sqrt(),
            Func::Exp => v.exp(),
            Func::Ln => v.ln(),
            Func::Log10 => v.log10(),
            Func::Abs => v.abs(),
            Func::Floor => v.floor(),
            Func::Ceil => v.ceil(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Expr {
    Num(f64),
    X,
    Neg(Box<Expr>),
    Bin(BinOp, Box<Expr>, Box<Expr>),
    Call(Func, Box<Expr>),
}

impl Expr {
    fn eval(&self, x: f64) -> f64 {
        match self {
            Expr::Num(n) => *n,
            Expr::X => x,
            Expr::Neg(e) => -e.eval(x),
            Expr::Bin(op, a, b) => {
                let (a, b) = (a.eval(x), b.eval(x));
                match op {
                    BinOp::Add => a + b,
                    BinOp::Sub => a - b,
                    BinOp::Mul => a * b,
                    BinOp::Div => a / b,
                    BinOp::Pow => a.powf(b),
                }
            }
            Expr::Call(f, arg) => f.apply(arg.eval(x)),
        }
    }
}

fn build(pairs: Pairs<'_, Rule>) -> Result<Expr, String> {
    PRATT
        .map_primary(|p| match p.as_rule() {
            Rule::number => p
                .as_str()
                .parse::<f64>()
                .map(Expr::Num)
                .map_err(|e| e.to_string()),
            Rule::ident => match p.as_str() {
                "x" => Ok(Expr::X),
                "pi" => Ok(Expr::Num(std::f64::consts::PI)),
                "e" => Ok(Expr::Num(std::f64::consts::E)),
                other => Err(format!("unknown variable `{other}`")),
            },
            Rule::call => {
                let mut inner = p.into_inner();
                let (Some(name), Some(arg)) = (inner.next(), inner.next()) else {
                    return Err("malformed call".to_string());
                };
                let func = Func::from_name(name.as_str())
                    .ok_or_else(|| format!("unknown function `{}`", name.as_str()))?;
                Ok(Expr::Call(func, Box::new(build(arg.into_inner())?)))
            }
            Rule::expr => build(p.into_inner()),
            rule => Err(format!("unexpected {rule:?}")),
        })
        .map_prefix(|op, rhs| match op.as_rule() {
            Rule::neg => Ok(Expr::Neg(Box::new(rhs?))),
            rule => Err(format!("unexpected prefix {rule:?}")),
        })
        .map_infix(|lhs, op, rhs| {
            let op = match op.as_rule() {
                Rule::add => BinOp::Add,
                Rule::sub => BinOp::Sub,
                Rule::mul => BinOp::Mul,
                Rule::div => BinOp::Div,
                Rule::pow => BinOp::Pow,
                rule => return Err(format!("unexpected operator {rule:?}")),
            };
            Ok(Expr::Bin(op, Box::new(lhs?), Box::new(rhs?)))
        })
        .parse(pairs)
}

/// A parsed formula `f(x)`; two formulas are equal when their text is
#[derive(Clone, Debug)]
pub struct Formula {
    source: String,
    expr: Expr,
}

impl Formula {
    pub fn parse(source: &str) -> Result<Formula, PropertyError> {
        let invalid = |message: String| PropertyError::InvalidFormula { message };
        let mut pairs =
            FormulaParser::parse(Rule::formula, source).map_err(|e| invalid(e.to_string()))?;
        let expr = pairs
            .next()
            .and_then(|formula| formula.into_inner().next())
            .ok_or_else(|| invalid("empty formula".to_string()))?;
        let expr = build(expr.into_inner()).map_err(invalid)?;
        Ok(Formula { source: source.trim().to_string(), expr })
    }

    /// `f(x) = x`
    pub fn identity() -> Formula {
        Formula { source: "x".to_string(), expr: Expr::X }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluate at `x`; domain errors come back as NaN or infinity
    pub fn eval(&self, x: f64) -> f64 {
        self.expr.eval(x)
    }
}

impl PartialEq for Formula {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(src: &str, x: f64) -> f64 {
        Formula::parse(src).unwrap().eval(x)
    }

    #[test]
    fn arithmetic_and_precedence() {
        assert_eq!(eval("1 + 2 * 3", 0.0), 7.0);
        assert_eq!(eval("(1 + 2) * 3", 0.0), 9.0);
        assert_eq!(eval("2 ^ 3 ^ 2", 0.0), 512.0);
        assert_eq!(eval("-x^2", 3.0), -9.0);
        assert_eq!(eval("10 - 4 - 3", 0.0), 3.0);
        assert_eq!(eval("1.5e2 / x", 3.0), 50.0);
    }

    #[test]
    fn functions_and_constants() {
        assert!((eval("sin(pi/2)", 0.0) - 1.0).abs() < 1e-12);
        assert!((eval("ln(e)", 0.0) - 1.0).abs() < 1e-12);
        assert!((eval("log(1000)", 0.0) - 3.0).abs() < 1e-12);
        assert_eq!(eval("abs(x) + sqrt(16)", -2.0), 6.0);
        assert!(eval("sqrt(x)", -1.0).is_nan());
    }

    #[test]
    fn rejects_bad_formulas() {
        for bad in ["", "x +", "y * 2", "foo(x)", "2 3", "(x"] {
            assert!(
                matches!(Formula::parse(bad), Err(PropertyError::InvalidFormula { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn equality_is_by_text() {
        assert_eq!(Formula::parse("x*2").unwrap(), Formula::parse(" x*2 ").unwrap());
        assert_ne!(Formula::parse("x*2").unwrap(), Formula::parse("2*x").unwrap());
    }
}
