//! Symbolic expressions over model variables and parameters.
//!
//! Expressions are plain trees. They can be evaluated against any
//! [`Valuation`], rewritten by replacing parameters with variables, and
//! analyzed for the components they reference.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

use crate::error::EvalError;

/// Index of a variable inside its owning model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VarId(pub usize);

/// Index of a parameter inside its owning model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParamId(pub usize);

/// Source of numeric values for expression evaluation.
pub trait Valuation {
    /// Current value of a variable.
    fn var_value(&self, var: VarId) -> Result<f64, EvalError>;

    /// Current value of a parameter.
    fn param_value(&self, param: ParamId) -> Result<f64, EvalError>;
}

/// A symbolic expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric constant.
    Const(f64),

    /// Reference to a variable.
    Var(VarId),

    /// Reference to a (mutable) parameter.
    Param(ParamId),

    /// Sum of terms.
    Sum(Vec<Expr>),

    /// Product of two factors.
    Product(Box<Expr>, Box<Expr>),

    /// Numerator divided by denominator.
    Quotient(Box<Expr>, Box<Expr>),

    /// Negation.
    Neg(Box<Expr>),

    /// Base raised to a constant exponent.
    Powf(Box<Expr>, f64),

    /// Natural logarithm.
    Log(Box<Expr>),

    /// Natural exponential.
    Exp(Box<Expr>),
}

/// Components referenced by an expression.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExprAnalysis {
    /// Variables appearing in the expression.
    pub variables: BTreeSet<VarId>,

    /// Parameters appearing in the expression.
    pub parameters: BTreeSet<ParamId>,
}

impl ExprAnalysis {
    /// True if any of `vars` is referenced.
    pub fn references_any(&self, vars: &[VarId]) -> bool {
        vars.iter().any(|v| self.variables.contains(v))
    }

    /// True if any of `params` is referenced.
    pub fn references_any_param(&self, params: &[ParamId]) -> bool {
        params.iter().any(|p| self.parameters.contains(p))
    }

    fn merge(&mut self, other: ExprAnalysis) {
        self.variables.extend(other.variables);
        self.parameters.extend(other.parameters);
    }
}

impl Expr {
    /// Constant expression.
    pub fn constant(value: f64) -> Self {
        Expr::Const(value)
    }

    /// Natural logarithm of this expression.
    pub fn ln(self) -> Self {
        Expr::Log(Box::new(self))
    }

    /// Natural exponential of this expression.
    pub fn exp(self) -> Self {
        Expr::Exp(Box::new(self))
    }

    /// This expression raised to a constant power.
    pub fn powf(self, exponent: f64) -> Self {
        Expr::Powf(Box::new(self), exponent)
    }

    /// Evaluate against the given values.
    ///
    /// Domain violations (log of a non-positive number, division by zero,
    /// fractional power of a negative base) are reported as
    /// [`EvalError::Domain`] instead of producing NaN.
    pub fn eval<V: Valuation + ?Sized>(&self, values: &V) -> Result<f64, EvalError> {
        match self {
            Expr::Const(c) => Ok(*c),
            Expr::Var(v) => values.var_value(*v),
            Expr::Param(p) => values.param_value(*p),
            Expr::Sum(terms) => {
                let mut total = 0.0;
                for term in terms {
                    total += term.eval(values)?;
                }
                Ok(total)
            }
            Expr::Product(a, b) => Ok(a.eval(values)? * b.eval(values)?),
            Expr::Quotient(num, den) => {
                let n = num.eval(values)?;
                let d = den.eval(values)?;
                if d == 0.0 {
                    return Err(EvalError::Domain { op: "div", arg: d });
                }
                Ok(n / d)
            }
            Expr::Neg(a) => Ok(-a.eval(values)?),
            Expr::Powf(base, exponent) => {
                let b = base.eval(values)?;
                if b < 0.0 && exponent.fract() != 0.0 {
                    return Err(EvalError::Domain { op: "pow", arg: b });
                }
                if b == 0.0 && *exponent < 0.0 {
                    return Err(EvalError::Domain { op: "pow", arg: b });
                }
                finite("pow", b.powf(*exponent))
            }
            Expr::Log(a) => {
                let x = a.eval(values)?;
                if x <= 0.0 {
                    return Err(EvalError::Domain { op: "log", arg: x });
                }
                Ok(x.ln())
            }
            Expr::Exp(a) => finite("exp", a.eval(values)?.exp()),
        }
    }

    /// Replace every parameter in `map` by the corresponding variable.
    ///
    /// Parameters not present in the map are left untouched.
    pub fn substitute_params(&self, map: &HashMap<ParamId, VarId>) -> Expr {
        match self {
            Expr::Param(p) => match map.get(p) {
                Some(v) => Expr::Var(*v),
                None => Expr::Param(*p),
            },
            Expr::Const(_) | Expr::Var(_) => self.clone(),
            Expr::Sum(terms) => Expr::Sum(terms.iter().map(|t| t.substitute_params(map)).collect()),
            Expr::Product(a, b) => Expr::Product(
                Box::new(a.substitute_params(map)),
                Box::new(b.substitute_params(map)),
            ),
            Expr::Quotient(a, b) => Expr::Quotient(
                Box::new(a.substitute_params(map)),
                Box::new(b.substitute_params(map)),
            ),
            Expr::Neg(a) => Expr::Neg(Box::new(a.substitute_params(map))),
            Expr::Powf(a, e) => Expr::Powf(Box::new(a.substitute_params(map)), *e),
            Expr::Log(a) => Expr::Log(Box::new(a.substitute_params(map))),
            Expr::Exp(a) => Expr::Exp(Box::new(a.substitute_params(map))),
        }
    }

    /// Variables and parameters referenced by this expression.
    pub fn analyze(&self) -> ExprAnalysis {
        let mut out = ExprAnalysis::default();
        self.collect(&mut out);
        out
    }

    fn collect(&self, out: &mut ExprAnalysis) {
        match self {
            Expr::Const(_) => {}
            Expr::Var(v) => {
                out.variables.insert(*v);
            }
            Expr::Param(p) => {
                out.parameters.insert(*p);
            }
            Expr::Sum(terms) => terms.iter().for_each(|t| t.collect(out)),
            Expr::Product(a, b) | Expr::Quotient(a, b) => {
                a.collect(out);
                b.collect(out);
            }
            Expr::Neg(a) | Expr::Powf(a, _) | Expr::Log(a) | Expr::Exp(a) => a.collect(out),
        }
    }
}

/// Analyze several expressions at once (e.g. a constraint's bounds and body).
pub fn analyze_all<'a>(exprs: impl IntoIterator<Item = &'a Expr>) -> ExprAnalysis {
    let mut out = ExprAnalysis::default();
    for expr in exprs {
        out.merge(expr.analyze());
    }
    out
}

fn finite(op: &'static str, value: f64) -> Result<f64, EvalError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EvalError::NonFinite { op })
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Const(c) => write!(f, "{}", c),
            Expr::Var(v) => write!(f, "x{}", v.0),
            Expr::Param(p) => write!(f, "p{}", p.0),
            Expr::Sum(terms) => {
                write!(f, "(")?;
                for (i, t) in terms.iter().enumerate() {
                    if i > 0 {
                        write!(f, " + ")?;
                    }
                    write!(f, "{}", t)?;
                }
                write!(f, ")")
            }
            Expr::Product(a, b) => write!(f, "({} * {})", a, b),
            Expr::Quotient(a, b) => write!(f, "({} / {})", a, b),
            Expr::Neg(a) => write!(f, "(-{})", a),
            Expr::Powf(a, e) => write!(f, "({} ^ {})", a, e),
            Expr::Log(a) => write!(f, "log({})", a),
            Expr::Exp(a) => write!(f, "exp({})", a),
        }
    }
}

// === Conversions and operators ===

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::Const(value)
    }
}

impl From<VarId> for Expr {
    fn from(var: VarId) -> Self {
        Expr::Var(var)
    }
}

impl From<ParamId> for Expr {
    fn from(param: ParamId) -> Self {
        Expr::Param(param)
    }
}

impl<T: Into<Expr>> Add<T> for Expr {
    type Output = Expr;

    fn add(self, rhs: T) -> Expr {
        match (self, rhs.into()) {
            (Expr::Sum(mut a), Expr::Sum(b)) => {
                a.extend(b);
                Expr::Sum(a)
            }
            (Expr::Sum(mut a), r) => {
                a.push(r);
                Expr::Sum(a)
            }
            (l, Expr::Sum(mut b)) => {
                b.insert(0, l);
                Expr::Sum(b)
            }
            (l, r) => Expr::Sum(vec![l, r]),
        }
    }
}

impl<T: Into<Expr>> Sub<T> for Expr {
    type Output = Expr;

    fn sub(self, rhs: T) -> Expr {
        self + (-rhs.into())
    }
}

impl<T: Into<Expr>> Mul<T> for Expr {
    type Output = Expr;

    fn mul(self, rhs: T) -> Expr {
        Expr::Product(Box::new(self), Box::new(rhs.into()))
    }
}

impl<T: Into<Expr>> Div<T> for Expr {
    type Output = Expr;

    fn div(self, rhs: T) -> Expr {
        Expr::Quotient(Box::new(self), Box::new(rhs.into()))
    }
}

impl Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        match self {
            Expr::Const(c) => Expr::Const(-c),
            Expr::Neg(inner) => *inner,
            other => Expr::Neg(Box::new(other)),
        }
    }
}

macro_rules! id_ops {
    ($id:ty) => {
        impl<T: Into<Expr>> Add<T> for $id {
            type Output = Expr;

            fn add(self, rhs: T) -> Expr {
                Expr::from(self) + rhs
            }
        }

        impl<T: Into<Expr>> Sub<T> for $id {
            type Output = Expr;

            fn sub(self, rhs: T) -> Expr {
                Expr::from(self) - rhs
            }
        }

        impl<T: Into<Expr>> Mul<T> for $id {
            type Output = Expr;

            fn mul(self, rhs: T) -> Expr {
                Expr::from(self) * rhs
            }
        }

        impl<T: Into<Expr>> Div<T> for $id {
            type Output = Expr;

            fn div(self, rhs: T) -> Expr {
                Expr::from(self) / rhs
            }
        }

        impl Neg for $id {
            type Output = Expr;

            fn neg(self) -> Expr {
                -Expr::from(self)
            }
        }
    };
}

id_ops!(VarId);
id_ops!(ParamId);

macro_rules! scalar_lhs_ops {
    ($rhs:ty) => {
        impl Add<$rhs> for f64 {
            type Output = Expr;

            fn add(self, rhs: $rhs) -> Expr {
                Expr::Const(self) + rhs
            }
        }

        impl Sub<$rhs> for f64 {
            type Output = Expr;

            fn sub(self, rhs: $rhs) -> Expr {
                Expr::Const(self) - rhs
            }
        }

        impl Mul<$rhs> for f64 {
            type Output = Expr;

            fn mul(self, rhs: $rhs) -> Expr {
                Expr::Const(self) * rhs
            }
        }

        impl Div<$rhs> for f64 {
            type Output = Expr;

            fn div(self, rhs: $rhs) -> Expr {
                Expr::Const(self) / rhs
            }
        }
    };
}

scalar_lhs_ops!(Expr);
scalar_lhs_ops!(VarId);
scalar_lhs_ops!(ParamId);
