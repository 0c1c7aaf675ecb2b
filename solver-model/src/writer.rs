//! BARON (`.bar`) export.
//!
//! Writes the active part of a model with symbolic labels: fixed variables
//! become variables with equal bounds, parameters are inlined at their
//! current values.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::error::ModelResult;
use crate::expr::Expr;
use crate::model::{Model, ObjectiveSense};

/// Write the model to `path` in BARON format.
pub fn write_bar(model: &Model, path: impl AsRef<Path>) -> ModelResult<()> {
    fs::write(path, to_bar_string(model))?;
    Ok(())
}

/// Render the model in BARON format.
pub fn to_bar_string(model: &Model) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "// Model: {}", model.name());
    out.push_str("OPTIONS {\n}\n\n");

    let mut used = HashSet::new();
    let labels: Vec<String> = model
        .variables()
        .map(|(_, v)| unique_label(&v.name, &mut used))
        .collect();

    if !labels.is_empty() {
        let _ = writeln!(out, "VARIABLES {};\n", labels.join(", "));
    }

    let mut lower = Vec::new();
    let mut upper = Vec::new();
    for (id, var) in model.variables() {
        let label = &labels[id.0];
        let (lb, ub) = match (var.fixed, var.value) {
            (true, Some(v)) => (Some(v), Some(v)),
            _ => (var.lower, var.upper),
        };
        if let Some(lb) = lb {
            lower.push(format!("{}: {};", label, lb));
        }
        if let Some(ub) = ub {
            upper.push(format!("{}: {};", label, ub));
        }
    }
    write_section(&mut out, "LOWER_BOUNDS", &lower);
    write_section(&mut out, "UPPER_BOUNDS", &upper);

    let active: Vec<_> = model.active_constraints().collect();
    if !active.is_empty() {
        let names: Vec<String> = active
            .iter()
            .map(|(_, c)| unique_label(&c.name, &mut used))
            .collect();
        let _ = writeln!(out, "EQUATIONS {};\n", names.join(", "));
        for ((_, con), name) in active.iter().zip(&names) {
            let body = render(&con.body, model, &labels);
            let line = match (&con.lower, &con.upper, con.equality) {
                (_, Some(rhs), true) => format!("{} == {}", body, render(rhs, model, &labels)),
                (Some(lb), Some(ub), false) => format!(
                    "{} <= {} <= {}",
                    render(lb, model, &labels),
                    body,
                    render(ub, model, &labels)
                ),
                (Some(lb), None, _) => format!("{} >= {}", body, render(lb, model, &labels)),
                (None, Some(ub), _) => format!("{} <= {}", body, render(ub, model, &labels)),
                _ => continue,
            };
            let _ = writeln!(out, "{}: {};", name, line);
        }
        out.push('\n');
    }

    match model.active_objectives().next() {
        Some((_, obj)) => {
            let sense = match obj.sense {
                ObjectiveSense::Minimize => "minimize",
                ObjectiveSense::Maximize => "maximize",
            };
            let _ = writeln!(out, "OBJ: {} {};\n", sense, render(&obj.expr, model, &labels));
        }
        None => out.push_str("OBJ: minimize 0;\n\n"),
    }

    let start: Vec<String> = model
        .variables()
        .filter_map(|(id, v)| v.value.map(|val| format!("{}: {};", labels[id.0], val)))
        .collect();
    write_section(&mut out, "STARTING_POINT", &start);

    out
}

fn write_section(out: &mut String, header: &str, lines: &[String]) {
    if lines.is_empty() {
        return;
    }
    let _ = writeln!(out, "{}{{", header);
    for line in lines {
        let _ = writeln!(out, "{}", line);
    }
    out.push_str("}\n\n");
}

/// Turn a qualified component name into a BARON identifier.
fn symbolic_label(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// [`symbolic_label`] with a numeric suffix appended until it is not in `used`.
fn unique_label(name: &str, used: &mut HashSet<String>) -> String {
    let base = symbolic_label(name);
    let mut label = base.clone();
    let mut suffix = 2;
    while used.contains(&label) {
        label = format!("{}_{}", base, suffix);
        suffix += 1;
    }
    used.insert(label.clone());
    label
}

fn render(expr: &Expr, model: &Model, labels: &[String]) -> String {
    match expr {
        Expr::Const(c) => format!("{}", c),
        Expr::Var(v) => labels[v.0].clone(),
        Expr::Param(p) => format!("{}", model.param(*p).value),
        Expr::Sum(terms) => {
            let parts: Vec<String> = terms.iter().map(|t| render(t, model, labels)).collect();
            format!("({})", parts.join(" + "))
        }
        Expr::Product(a, b) => format!("({} * {})", render(a, model, labels), render(b, model, labels)),
        Expr::Quotient(a, b) => format!("({} / {})", render(a, model, labels), render(b, model, labels)),
        Expr::Neg(a) => format!("(-{})", render(a, model, labels)),
        Expr::Powf(a, e) => format!("({} ^ {})", render(a, model, labels), e),
        Expr::Log(a) => format!("log({})", render(a, model, labels)),
        Expr::Exp(a) => format!("exp({})", render(a, model, labels)),
    }
}
