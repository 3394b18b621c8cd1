//! Serializes a [`Dialog`] back into script text.
//!
//! Nodes that remember their source line are written on that line (blank
//! lines fill the gaps), so the output parses back into an equal tree.

use std::fmt::Write as _;

use crate::ast::{
    Command, Condition, Cue, CueExpr, Dialog, Expr, KnotExpr, Literal, Sentence, UnaryOp,
};

struct Writer {
    out: String,
    line: usize,
}

impl Writer {
    fn emit(&mut self, line: Option<usize>, indent: usize, text: &str) {
        if let Some(line) = line {
            while self.line < line {
                self.out.push('\n');
                self.line += 1;
            }
        }
        for _ in 0..indent {
            self.out.push('\t');
        }
        self.out.push_str(text);
        self.out.push('\n');
        self.line += 1;
    }

    fn knot_expr(&mut self, expr: &KnotExpr, indent: usize) {
        match expr {
            KnotExpr::Command(c) => self.emit(None, indent, &command(c)),
            KnotExpr::Cue(c) => self.cue(c, indent),
            KnotExpr::Condition(c) => self.condition(c, indent, Self::knot_expr),
        }
    }

    fn cue_expr(&mut self, expr: &CueExpr, indent: usize) {
        match expr {
            CueExpr::Sentence(s) => self.emit(Some(s.line), indent, &sentence(s)),
            CueExpr::Choice(c) => {
                let text = format!("- {} -> {}", c.text, c.target);
                self.emit(Some(c.line), indent, &text);
            }
            CueExpr::Command(c) => self.emit(None, indent, &command(c)),
            CueExpr::Condition(c) => self.condition(c, indent, Self::cue_expr),
        }
    }

    fn condition<T>(&mut self, cond: &Condition<T>, indent: usize, item: fn(&mut Self, &T, usize)) {
        self.emit(Some(cond.line), indent, &format!("#if {}", expr(&cond.guard)));
        for child in &cond.then_branch {
            item(self, child, indent + 1);
        }
        if !cond.else_branch.is_empty() {
            self.emit(None, indent, "#else");
            for child in &cond.else_branch {
                item(self, child, indent + 1);
            }
        }
    }

    fn cue(&mut self, cue: &Cue, indent: usize) {
        let mut header = String::from(">");
        if let Some(speaker) = &cue.speaker {
            let _ = write!(header, " {} {}", quote(&speaker.name), speaker.position);
        }
        let mut body = cue.body.iter();
        if cue.synthesized_sprite {
            if let Some(CueExpr::Command(Command::SetCharacter { character, animation, .. })) =
                body.next()
            {
                let _ = write!(header, " {}::{}", quote(character), quote(animation));
            }
        }
        self.emit(Some(cue.line), indent, &header);
        for child in body {
            self.cue_expr(child, indent + 1);
        }
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if matches!(c, '"' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

fn sentence(s: &Sentence) -> String {
    let escape = if s.text.starts_with(['@', '>', '#', '-']) { "\\" } else { "" };
    let auto = if s.auto { " AUTO" } else { "" };
    format!("{escape}{}{auto}", s.text)
}

/// Renders a command line, including its leading `#`.
pub fn command(c: &Command) -> String {
    let keyword = c.kind().keyword();
    match c {
        Command::SetBackground { pack, name } => {
            format!("#{keyword} {}::{}", quote(pack), quote(name))
        }
        Command::SetCharacter { position, character, animation } => {
            format!("#{keyword} {position} {}::{}", quote(character), quote(animation))
        }
        Command::ClearCharacterPosition(position) => format!("#{keyword} {position}"),
        Command::Assign { name, value } => format!("#{keyword} {name} {}", expr(value)),
        Command::GoTo(target) => format!("#{keyword} {target}"),
        Command::PlaySound(s) | Command::PlayMusic(s) | Command::NextDialog(s) => {
            format!("#{keyword} {}", quote(s))
        }
        Command::ClearBackground
        | Command::ClearCharacterPositions
        | Command::End
        | Command::HideUi
        | Command::ShowUi
        | Command::StopMusic => format!("#{keyword}"),
    }
}

/// Renders an expression with single spaces around binary operators.
pub fn expr(e: &Expr) -> String {
    match e {
        Expr::Literal(Literal::Number(n)) => n.to_string(),
        Expr::Literal(Literal::Str(s)) => quote(s),
        Expr::Literal(Literal::Ident(name)) => name.clone(),
        Expr::Unary { op: UnaryOp::Negate, operand } => format!("-{}", expr(operand)),
        Expr::Binary { op, lhs, rhs } => format!("{} {op} {}", expr(lhs), expr(rhs)),
        Expr::Grouping(inner) => format!("({})", expr(inner)),
    }
}

/// Writes `dialog` as script source.
pub fn to_source(dialog: &Dialog) -> String {
    let mut w = Writer { out: String::new(), line: 1 };
    for (i, knot) in dialog.knots.iter().enumerate() {
        if i > 0 {
            w.emit(Some(knot.line), 0, &format!("@{}", knot.name));
        }
        for expr in &knot.body {
            w.knot_expr(expr, 0);
        }
    }
    w.out
}
