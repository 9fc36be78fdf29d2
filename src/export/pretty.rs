//! Two-dimensional layout: stacked fractions, raised exponents and drawn radicals

use crate::expression::{Constant, Expression, Function};

struct Glyphs {
    times: &'static str,
    rule: char,
    pi: &'static str,
    e: &'static str,
    // top, middle, bottom
    left_paren: [char; 3],
    right_paren: [char; 3],
    bar: char,
    root_rise: char,
    root_tick: char,
}

const ASCII: Glyphs = Glyphs {
    times: "*",
    rule: '-',
    pi: "pi",
    e: "E",
    left_paren: ['/', '|', '\\'],
    right_paren: ['\\', '|', '/'],
    bar: '|',
    root_rise: '/',
    root_tick: '\\',
};

const UNICODE: Glyphs = Glyphs {
    times: "⋅",
    rule: '─',
    pi: "π",
    e: "ℯ",
    left_paren: ['⎛', '⎜', '⎝'],
    right_paren: ['⎞', '⎟', '⎠'],
    bar: '│',
    root_rise: '╱',
    root_tick: '╲',
};

pub fn to_pretty(expr: &Expression, unicode: bool) -> String {
    let glyphs = if unicode { &UNICODE } else { &ASCII };
    layout(expr, glyphs).render()
}

/// Rectangle of text with the row that lines up with its neighbours
#[derive(Debug, Clone)]
struct Block {
    lines: Vec<String>,
    width: usize,
    baseline: usize,
}

fn pad_right(line: &str, width: usize) -> String {
    let len = line.chars().count();
    format!("{}{}", line, " ".repeat(width.saturating_sub(len)))
}

fn center(line: &str, width: usize) -> String {
    let len = line.chars().count();
    let left = width.saturating_sub(len) / 2;
    pad_right(&format!("{}{}", " ".repeat(left), line), width)
}

impl Block {
    fn text(text: impl Into<String>) -> Self {
        let line = text.into();
        Self {
            width: line.chars().count(),
            lines: vec![line],
            baseline: 0,
        }
    }

    fn height(&self) -> usize {
        self.lines.len()
    }

    /// Row `row` of a canvas where this block starts at row `top`
    fn row_at(&self, row: usize, top: usize) -> String {
        match row.checked_sub(top).and_then(|i| self.lines.get(i)) {
            Some(line) => pad_right(line, self.width),
            None => " ".repeat(self.width),
        }
    }

    fn beside(self, other: Block) -> Block {
        let above = self.baseline.max(other.baseline);
        let below = (self.height() - self.baseline).max(other.height() - other.baseline);
        let top_left = above - self.baseline;
        let top_right = above - other.baseline;

        let lines = (0..above + below)
            .map(|row| {
                let mut line = self.row_at(row, top_left);
                line.push_str(&other.row_at(row, top_right));
                line
            })
            .collect();

        Block {
            lines,
            width: self.width + other.width,
            baseline: above,
        }
    }

    fn row(blocks: Vec<Block>) -> Block {
        blocks
            .into_iter()
            .reduce(Block::beside)
            .unwrap_or_else(|| Block::text(""))
    }

    fn fraction(numerator: Block, denominator: Block, glyphs: &Glyphs) -> Block {
        let width = numerator.width.max(denominator.width);
        let baseline = numerator.height();

        let mut lines: Vec<String> = numerator
            .lines
            .iter()
            .map(|line| center(&pad_right(line, numerator.width), width))
            .collect();
        lines.push(glyphs.rule.to_string().repeat(width));
        lines.extend(
            denominator
                .lines
                .iter()
                .map(|line| center(&pad_right(line, denominator.width), width)),
        );

        Block {
            lines,
            width,
            baseline,
        }
    }

    fn power(base: Block, exponent: Block) -> Block {
        let mut lines: Vec<String> = exponent
            .lines
            .iter()
            .map(|line| {
                format!(
                    "{}{}",
                    " ".repeat(base.width),
                    pad_right(line, exponent.width)
                )
            })
            .collect();
        lines.extend(base.lines.iter().map(|line| {
            format!(
                "{}{}",
                pad_right(line, base.width),
                " ".repeat(exponent.width)
            )
        }));

        Block {
            lines,
            width: base.width + exponent.width,
            baseline: exponent.height() + base.baseline,
        }
    }

    fn enclosed(self, left: [char; 3], right: [char; 3]) -> Block {
        let height = self.height();
        let lines = (0..height)
            .map(|row| {
                let pick = |glyphs: [char; 3]| {
                    if row == 0 {
                        glyphs[0]
                    } else if row + 1 == height {
                        glyphs[2]
                    } else {
                        glyphs[1]
                    }
                };
                format!("{}{}{}", pick(left), self.row_at(row, 0), pick(right))
            })
            .collect();

        Block {
            lines,
            width: self.width + 2,
            baseline: self.baseline,
        }
    }

    fn parens(self, glyphs: &Glyphs) -> Block {
        if self.height() == 1 {
            return self.enclosed(['('; 3], [')'; 3]);
        }
        self.enclosed(glyphs.left_paren, glyphs.right_paren)
    }

    fn bars(self, glyphs: &Glyphs) -> Block {
        self.enclosed([glyphs.bar; 3], [glyphs.bar; 3])
    }

    fn radical(self, glyphs: &Glyphs) -> Block {
        let height = self.height();
        let mut lines = vec![format!(
            "{}{}",
            " ".repeat(height + 1),
            "_".repeat(self.width)
        )];

        for row in 0..height {
            let mut prefix = vec![' '; height + 1];
            prefix[height - row] = glyphs.root_rise;
            if row + 1 == height {
                prefix[0] = glyphs.root_tick;
            }
            let prefix: String = prefix.into_iter().collect();
            lines.push(format!("{}{}", prefix, self.row_at(row, 0)));
        }

        Block {
            lines,
            width: self.width + height + 1,
            baseline: self.baseline + 1,
        }
    }

    fn render(&self) -> String {
        self.lines
            .iter()
            .map(|line| line.trim_end())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn level(expr: &Expression) -> u8 {
    match expr {
        Expression::Add(_, _) | Expression::Sub(_, _) => 1,
        Expression::Mul(l, _) if l.as_number() == Some(-1.0) => 3,
        Expression::Mul(_, _) => 2,
        Expression::Neg(_) => 3,
        Expression::Number(n) if *n < 0.0 => 3,
        Expression::Div(_, _) => 4,
        Expression::Pow(_, _) => 5,
        Expression::Number(_)
        | Expression::Symbol(_)
        | Expression::Constant(_)
        | Expression::Func(_, _) => 6,
    }
}

fn grouped(expr: &Expression, wrap: bool, glyphs: &Glyphs) -> Block {
    let block = layout(expr, glyphs);
    if wrap { block.parens(glyphs) } else { block }
}

fn negated(expr: &Expression, glyphs: &Glyphs) -> Block {
    Block::row(vec![
        Block::text("-"),
        grouped(expr, level(expr) <= 3, glyphs),
    ])
}

fn layout(expr: &Expression, glyphs: &Glyphs) -> Block {
    match expr {
        Expression::Number(n) => Block::text(n.to_string()),
        Expression::Symbol(name) => Block::text(name.as_str()),
        Expression::Constant(Constant::Pi) => Block::text(glyphs.pi),
        Expression::Constant(Constant::E) => Block::text(glyphs.e),
        Expression::Add(l, r) => match r.as_ref() {
            Expression::Neg(inner) => Block::row(vec![
                layout(l, glyphs),
                Block::text(" - "),
                grouped(inner, level(inner) <= 1, glyphs),
            ]),
            _ => Block::row(vec![
                layout(l, glyphs),
                Block::text(" + "),
                grouped(r, level(r) == 3, glyphs),
            ]),
        },
        Expression::Sub(l, r) => {
            let wrap = matches!(level(r), 1 | 3);
            Block::row(vec![
                layout(l, glyphs),
                Block::text(" - "),
                grouped(r, wrap, glyphs),
            ])
        }
        Expression::Mul(l, r) if l.as_number() == Some(-1.0) => negated(r, glyphs),
        Expression::Mul(l, r) => {
            let wrap_right = matches!(level(r), 1 | 3);
            Block::row(vec![
                grouped(l, level(l) < 2, glyphs),
                Block::text(format!(" {} ", glyphs.times)),
                grouped(r, wrap_right, glyphs),
            ])
        }
        Expression::Div(l, r) => Block::fraction(layout(l, glyphs), layout(r, glyphs), glyphs),
        Expression::Pow(base, exponent) => Block::power(
            grouped(base, level(base) < 6, glyphs),
            layout(exponent, glyphs),
        ),
        Expression::Neg(e) => negated(e, glyphs),
        Expression::Func(Function::Sqrt, arg) => layout(arg, glyphs).radical(glyphs),
        Expression::Func(Function::Abs, arg) => layout(arg, glyphs).bars(glyphs),
        Expression::Func(f, arg) => Block::row(vec![
            Block::text(f.name()),
            layout(arg, glyphs).parens(glyphs),
        ]),
    }
}
