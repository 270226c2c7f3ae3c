//! Arithmetic expressions over nodes.
//!
//! Width and offset arithmetic is kept symbolic: expression nodes form a
//! binary tree over literals, parameters and other expressions, and are
//! minimized algebraically just before rendering so that emitted VHDL
//! shows `7 downto 0` rather than `8-1 downto 0`, and `W-1` when the
//! width is parametric.

use crate::database::{Database, NodeId};
use crate::node::{LitValue, Node, NodeKind};
use crate::traits::Identify;

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
}

impl Operator {
    /// Infix token.
    pub fn token(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
        }
    }

    /// Binding strength for parenthesization.
    fn precedence(self) -> u8 {
        match self {
            Operator::Add | Operator::Sub => 1,
            Operator::Mul | Operator::Div => 2,
        }
    }

    /// True for operators where `a op (b op c) != (a op b) op c`.
    fn right_sensitive(self) -> bool {
        matches!(self, Operator::Sub | Operator::Div)
    }
}

impl Database {
    /// Create an expression node.
    pub fn expression(&mut self, op: Operator, lhs: NodeId, rhs: NodeId) -> NodeId {
        let integer = self.integer();
        self.add_node(Node::new("expr", NodeKind::Expression { op, lhs, rhs }, integer))
    }

    /// Create an addition node.
    pub fn add(&mut self, lhs: NodeId, rhs: NodeId) -> NodeId {
        self.expression(Operator::Add, lhs, rhs)
    }

    /// Create a subtraction node.
    pub fn sub(&mut self, lhs: NodeId, rhs: NodeId) -> NodeId {
        self.expression(Operator::Sub, lhs, rhs)
    }

    /// Create a multiplication node.
    pub fn mul(&mut self, lhs: NodeId, rhs: NodeId) -> NodeId {
        self.expression(Operator::Mul, lhs, rhs)
    }

    /// Create a division node.
    pub fn div(&mut self, lhs: NodeId, rhs: NodeId) -> NodeId {
        self.expression(Operator::Div, lhs, rhs)
    }

    /// Minimize an expression tree: fold integer constants and absorb
    /// the unit and zero elements. Non-expression nodes are returned
    /// unchanged, and minimization is idempotent.
    pub fn minimize(&mut self, node: NodeId) -> NodeId {
        let (op, lhs, rhs) = match self.node(node).kind() {
            NodeKind::Expression { op, lhs, rhs } => (*op, *lhs, *rhs),
            _ => return node,
        };
        let l = self.minimize(lhs);
        let r = self.minimize(rhs);
        let li = self.node(l).int_value();
        let ri = self.node(r).int_value();
        match op {
            Operator::Add => {
                if li == Some(0) {
                    return r;
                }
                if ri == Some(0) {
                    return l;
                }
                if let (Some(a), Some(b)) = (li, ri) {
                    return self.int_lit(a + b);
                }
            }
            Operator::Sub => {
                if ri == Some(0) {
                    return l;
                }
                if l == r {
                    return self.zero();
                }
                if let (Some(a), Some(b)) = (li, ri) {
                    return self.int_lit(a - b);
                }
            }
            Operator::Mul => {
                if li == Some(0) || ri == Some(0) {
                    return self.zero();
                }
                if li == Some(1) {
                    return r;
                }
                if ri == Some(1) {
                    return l;
                }
                if let (Some(a), Some(b)) = (li, ri) {
                    return self.int_lit(a * b);
                }
            }
            Operator::Div => {
                if ri == Some(1) {
                    return l;
                }
                if li == Some(0) {
                    return self.zero();
                }
                if let (Some(a), Some(b)) = (li, ri) {
                    if b != 0 {
                        return self.int_lit(a / b);
                    }
                }
            }
        }
        if l == lhs && r == rhs {
            node
        } else {
            self.expression(op, l, r)
        }
    }

    /// Render a node as it appears in emitted text, without minimizing.
    ///
    /// Literals render their value, parameters and wires their name, and
    /// expressions render infix with parentheses dictated by operator
    /// precedence.
    pub fn node_to_string(&self, node: NodeId) -> String {
        match self.node(node).kind() {
            NodeKind::Literal(LitValue::Int(value)) => value.to_string(),
            NodeKind::Literal(LitValue::Bool(value)) => value.to_string(),
            NodeKind::Literal(LitValue::Str(value)) => value.clone(),
            NodeKind::Expression { op, lhs, rhs } => {
                let op = *op;
                let lhs_str = self.operand_to_string(*lhs, op, false);
                let rhs_str = self.operand_to_string(*rhs, op, true);
                format!("{}{}{}", lhs_str, op.token(), rhs_str)
            }
            _ => self.node(node).identifier().to_string(),
        }
    }

    fn operand_to_string(&self, operand: NodeId, parent: Operator, is_rhs: bool) -> String {
        let rendered = self.node_to_string(operand);
        if let NodeKind::Expression { op, .. } = self.node(operand).kind() {
            let needs_parens = op.precedence() < parent.precedence()
                || (is_rhs && op.precedence() == parent.precedence() && parent.right_sensitive());
            if needs_parens {
                return format!("({})", rendered);
            }
        }
        rendered
    }

    /// Minimize a node and render it.
    pub fn render_node(&mut self, node: NodeId) -> String {
        let minimized = self.minimize(node);
        self.node_to_string(minimized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_folding() {
        let mut db = Database::new();
        let a = db.int_lit(8);
        let b = db.int_lit(1);
        let e = db.sub(a, b);
        assert_eq!(db.render_node(e), "7");

        let f = db.mul(a, a);
        assert_eq!(db.render_node(f), "64");
    }

    #[test]
    fn identities() {
        let mut db = Database::new();
        let int = db.integer();
        let w = db.parameter("w", int, None).unwrap();
        let zero = db.zero();
        let one = db.one();

        let e = db.add(w, zero);
        assert_eq!(db.minimize(e), w);
        let e = db.add(zero, w);
        assert_eq!(db.minimize(e), w);
        let e = db.sub(w, zero);
        assert_eq!(db.minimize(e), w);
        let e = db.sub(w, w);
        assert_eq!(db.minimize(e), zero);
        let e = db.mul(w, one);
        assert_eq!(db.minimize(e), w);
        let e = db.mul(zero, w);
        assert_eq!(db.minimize(e), zero);
        let e = db.div(w, one);
        assert_eq!(db.minimize(e), w);
    }

    #[test]
    fn minimize_idempotent() {
        let mut db = Database::new();
        let int = db.integer();
        let w = db.parameter("w", int, None).unwrap();
        let two = db.int_lit(2);
        let one = db.one();
        let e = db.mul(w, two);
        let e = db.sub(e, one);
        let m1 = db.minimize(e);
        let m2 = db.minimize(m1);
        assert_eq!(m1, m2);
    }

    #[test]
    fn rendering_precedence() {
        let mut db = Database::new();
        let int = db.integer();
        let a = db.parameter("a", int, None).unwrap();
        let b = db.parameter("b", int, None).unwrap();
        let c = db.parameter("c", int, None).unwrap();

        // (a+b)*c needs parentheses, a*b+c does not.
        let sum = db.add(a, b);
        let e = db.mul(sum, c);
        assert_eq!(db.node_to_string(e), "(a+b)*c");

        let prod = db.mul(a, b);
        let e = db.add(prod, c);
        assert_eq!(db.node_to_string(e), "a*b+c");

        // Right operands of - and / keep parentheses at equal precedence.
        let sum = db.add(b, c);
        let e = db.sub(a, sum);
        assert_eq!(db.node_to_string(e), "a-(b+c)");
    }

    #[test]
    fn long_chain_renders_flat() {
        let mut db = Database::new();
        let int = db.integer();
        let a = db.parameter("a", int, None).unwrap();
        let b = db.parameter("b", int, None).unwrap();
        let c = db.parameter("c", int, None).unwrap();
        let d = db.parameter("d", int, None).unwrap();
        let ten = db.int_lit(10);

        // a+b-c*d/10+a*b-c/d+10
        let e1 = db.add(a, b);
        let e2 = db.mul(c, d);
        let e3 = db.div(e2, ten);
        let e4 = db.sub(e1, e3);
        let e5 = db.mul(a, b);
        let e6 = db.add(e4, e5);
        let e7 = db.div(c, d);
        let e8 = db.sub(e6, e7);
        let e9 = db.add(e8, ten);
        assert_eq!(db.node_to_string(e9), "a+b-c*d/10+a*b-c/d+10");
    }

    #[test]
    fn parametric_width_rendering() {
        let mut db = Database::new();
        let int = db.integer();
        let dflt = db.int_lit(32);
        let w = db.parameter("W", int, Some(dflt)).unwrap();
        let one = db.one();
        let e = db.sub(w, one);
        assert_eq!(db.render_node(e), "W-1");
    }
}
