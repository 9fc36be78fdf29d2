//! Graphviz digraph of the expression tree

use crate::expression::{Constant, Expression};

pub fn to_dot(expr: &Expression) -> String {
    let mut graph = Graph::default();
    graph.visit(expr);

    let mut out = String::from("digraph{\n\n# Graph style\n\"ordering\"=\"out\"\n\"rankdir\"=\"TD\"\n\n");
    out.push_str("#########\n# Nodes #\n#########\n\n");
    for node in &graph.nodes {
        out.push_str(node);
        out.push('\n');
    }
    out.push_str("\n#########\n# Edges #\n#########\n\n");
    for (from, to) in &graph.edges {
        out.push_str(&format!("\"n{}\" -> \"n{}\";\n", from, to));
    }
    out.push('}');
    out.push('\n');
    out
}

#[derive(Default)]
struct Graph {
    nodes: Vec<String>,
    edges: Vec<(usize, usize)>,
}

impl Graph {
    fn visit(&mut self, expr: &Expression) -> usize {
        let id = self.nodes.len();
        let (label, leaf) = label(expr);
        let color = if leaf { "blue" } else { "black" };
        self.nodes.push(format!(
            "\"n{}\" [\"color\"=\"{}\", \"label\"=\"{}\", \"shape\"=\"ellipse\"];",
            id, color, label
        ));

        let children: Vec<&Expression> = match expr {
            Expression::Number(_) | Expression::Symbol(_) | Expression::Constant(_) => vec![],
            Expression::Add(l, r)
            | Expression::Sub(l, r)
            | Expression::Mul(l, r)
            | Expression::Div(l, r)
            | Expression::Pow(l, r) => vec![l.as_ref(), r.as_ref()],
            Expression::Neg(e) | Expression::Func(_, e) => vec![e.as_ref()],
        };
        for child in children {
            let child_id = self.visit(child);
            self.edges.push((id, child_id));
        }
        id
    }
}

fn label(expr: &Expression) -> (String, bool) {
    match expr {
        Expression::Number(n) => (n.to_string(), true),
        Expression::Symbol(name) => (name.replace('"', "\\\""), true),
        Expression::Constant(Constant::Pi) => ("pi".to_string(), true),
        Expression::Constant(Constant::E) => ("E".to_string(), true),
        Expression::Add(..) => ("Add".to_string(), false),
        Expression::Sub(..) => ("Sub".to_string(), false),
        Expression::Mul(..) => ("Mul".to_string(), false),
        Expression::Div(..) => ("Div".to_string(), false),
        Expression::Pow(..) => ("Pow".to_string(), false),
        Expression::Neg(_) => ("Neg".to_string(), false),
        Expression::Func(f, _) => (f.name().to_string(), false),
    }
}
