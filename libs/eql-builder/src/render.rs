//! Query text rendering
//!
//! Rendering is a pure recursive walk over a frozen expression tree. Nested
//! expressions are parenthesized at every composition point rather than by
//! precedence analysis, so the output is unambiguous without an operator
//! table. Path chains render via the parent back-references.

use crate::expr::{ExprKind, ExpressionNode, OrderDirection, SelectModifiers};
use sigil_schema::FuncopKind;
use std::fmt::Write;

impl ExpressionNode {
    /// Render this expression as query text.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        render(self, &mut out);
        out
    }
}

fn render(node: &ExpressionNode, out: &mut String) {
    match node.kind() {
        ExprKind::Literal(value) => {
            out.push_str(&value.to_query_text(node.element().name()));
        }

        ExprKind::PathNode { parent: None } => {
            out.push_str(node.element().name());
        }
        ExprKind::PathNode { parent: Some(parent) } | ExprKind::PathLeaf { parent } => {
            render(&parent.owner, out);
            out.push('.');
            out.push_str(&parent.link_name);
        }

        ExprKind::FunctionCall { name, args, named_args } => {
            out.push_str(name);
            out.push('(');
            let mut first = true;
            for arg in args {
                if !first {
                    out.push_str(", ");
                }
                first = false;
                render_grouped(arg, out);
            }
            for (key, arg) in named_args {
                if !first {
                    out.push_str(", ");
                }
                first = false;
                out.push_str(key);
                out.push_str(" := ");
                render_grouped(arg, out);
            }
            out.push(')');
        }

        ExprKind::Operator { name, operator_kind, args } => {
            // operator names carry a module prefix; the token is the suffix
            let token = name.rsplit("::").next().unwrap_or(name);
            match operator_kind {
                FuncopKind::Infix if args.len() == 2 => {
                    out.push('(');
                    render(&args[0], out);
                    out.push(' ');
                    out.push_str(token);
                    out.push(' ');
                    render(&args[1], out);
                    out.push(')');
                }
                FuncopKind::Prefix if args.len() == 1 => {
                    out.push('(');
                    out.push_str(token);
                    out.push(' ');
                    render(&args[0], out);
                    out.push(')');
                }
                FuncopKind::Postfix if args.len() == 1 => {
                    out.push('(');
                    render(&args[0], out);
                    out.push_str(token);
                    out.push(')');
                }
                FuncopKind::Ternary if args.len() == 3 => {
                    out.push('(');
                    render(&args[0], out);
                    out.push_str(" IF ");
                    render(&args[1], out);
                    out.push_str(" ELSE ");
                    render(&args[2], out);
                    out.push(')');
                }
                // operators registered with function syntax
                _ => {
                    out.push_str(token);
                    out.push('(');
                    for (index, arg) in args.iter().enumerate() {
                        if index > 0 {
                            out.push_str(", ");
                        }
                        render(arg, out);
                    }
                    out.push(')');
                }
            }
        }

        ExprKind::TypeIntersection { expr } => {
            render(expr, out);
            let _ = write!(out, "[is {}]", node.element().name());
        }

        ExprKind::Set { exprs } => {
            if exprs.is_empty() {
                let _ = write!(out, "<{}>{{}}", node.element().name());
            } else {
                out.push_str("{ ");
                for (index, expr) in exprs.iter().enumerate() {
                    if index > 0 {
                        out.push_str(", ");
                    }
                    render(expr, out);
                }
                out.push_str(" }");
            }
        }

        ExprKind::Tuple { items } => {
            out.push_str("( ");
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    out.push_str(", ");
                }
                render(item, out);
            }
            out.push_str(" )");
        }

        ExprKind::NamedTuple { items } => {
            out.push_str("( ");
            let mut first = true;
            for (key, item) in items {
                if !first {
                    out.push_str(", ");
                }
                first = false;
                out.push_str(key);
                out.push_str(" := ");
                render(item, out);
            }
            out.push_str(" )");
        }

        ExprKind::Array { items } => {
            out.push('[');
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    out.push_str(", ");
                }
                render(item, out);
            }
            out.push(']');
        }

        ExprKind::Select { subject, modifiers } => {
            out.push_str("SELECT (");
            render(subject, out);
            out.push(')');
            render_modifiers(modifiers, out);
        }

        ExprKind::Insert { shape } => {
            let _ = write!(out, "INSERT {} {{ ", node.element().name());
            let mut first = true;
            for (key, value) in shape {
                if !first {
                    out.push_str(", ");
                }
                first = false;
                out.push_str(key);
                out.push_str(" := ");
                render_grouped(value, out);
            }
            out.push_str(" }");
        }

        ExprKind::Update { subject, shape } => {
            out.push_str("UPDATE (");
            render(subject, out);
            out.push_str(") SET { ");
            let mut first = true;
            for (key, value) in shape {
                if !first {
                    out.push_str(", ");
                }
                first = false;
                out.push_str(key);
                out.push_str(" := ");
                render_grouped(value, out);
            }
            out.push_str(" }");
        }

        ExprKind::Delete { subject } => {
            out.push_str("DELETE (");
            render(subject, out);
            out.push(')');
        }

        ExprKind::Global { name } => {
            let _ = write!(out, "GLOBAL {name}");
        }

        ExprKind::Parameter { name, optional } => {
            if *optional {
                let _ = write!(out, "<optional {}>${name}", node.element().name());
            } else {
                let _ = write!(out, "<{}>${name}", node.element().name());
            }
        }

        ExprKind::Detached { expr } => {
            out.push_str("DETACHED ");
            render(expr, out);
        }
    }
}

/// Wrap an argument or shape value in parentheses unless it is an atom that
/// reads unambiguously on its own.
fn render_grouped(node: &ExpressionNode, out: &mut String) {
    let atomic = matches!(
        node.kind(),
        ExprKind::Literal(_)
            | ExprKind::PathNode { .. }
            | ExprKind::PathLeaf { .. }
            | ExprKind::Parameter { .. }
            | ExprKind::Global { .. }
    );
    if atomic {
        render(node, out);
    } else {
        out.push('(');
        render(node, out);
        out.push(')');
    }
}

fn render_modifiers(modifiers: &SelectModifiers, out: &mut String) {
    for predicate in &modifiers.filter {
        out.push_str(" FILTER ");
        render(predicate, out);
    }
    for order in &modifiers.order_by {
        out.push_str(" ORDER BY ");
        render(&order.expr, out);
        match order.direction {
            Some(OrderDirection::Asc) => out.push_str(" ASC"),
            Some(OrderDirection::Desc) => out.push_str(" DESC"),
            None => {}
        }
    }
    if let Some(offset) = &modifiers.offset {
        out.push_str(" OFFSET ");
        render(offset, out);
    }
    if let Some(limit) = &modifiers.limit {
        out.push_str(" LIMIT ");
        render(limit, out);
    }
}
