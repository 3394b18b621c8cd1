use std::sync::LazyLock;

use regex::Regex;

use crate::anim;
use crate::ast::{
    Assets, BinaryOp, Choice, Command, Condition, Cue, CueExpr, Dialog, Expr, Knot, KnotExpr,
    Literal, Position, Sentence, Speaker, UnaryOp,
};
use crate::command::CommandKind;
use crate::error::{CompileError, ErrorKind, Result};
use crate::lexer::{Span, Tok, TokKind};
use crate::source::{AnimationSource, AssetKind};

static EOF: Tok = Tok {
    tok: TokKind::Eof,
    span: Span { line: 0, indent: 0 },
};

static AUTO_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" AUTO$").expect("static pattern"));

/// Strips a trailing ` AUTO` marker, reporting whether it was present.
fn split_auto(text: &str) -> (String, bool) {
    if AUTO_SUFFIX.is_match(text) {
        (AUTO_SUFFIX.replace(text, "").into_owned(), true)
    } else {
        (text.to_string(), false)
    }
}

/// Per-cue parsing state: choice mode is sticky once entered.
#[derive(Default)]
struct CueState {
    choices: bool,
}

pub struct Parser<'a> {
    file: &'a str,
    toks: &'a [Tok],
    cursor: usize,
    prev_line: usize,
    source: &'a mut dyn AnimationSource,
    assets: Assets,
    /// Knot names referenced by `GO_TO`s and choices, with their lines.
    jumps: Vec<(String, usize)>,
}

impl<'a> Parser<'a> {
    pub fn new(file: &'a str, toks: &'a [Tok], source: &'a mut dyn AnimationSource) -> Self {
        Self {
            file,
            toks,
            cursor: 0,
            prev_line: 0,
            source,
            assets: Assets::default(),
            jumps: Vec::new(),
        }
    }

    fn peek(&self) -> &'a Tok {
        self.toks.get(self.cursor).unwrap_or(&EOF)
    }

    fn bump(&mut self) -> &'a Tok {
        let tok = self.peek();
        if self.cursor < self.toks.len() {
            self.cursor += 1;
        }
        self.prev_line = tok.span.line;
        tok
    }

    fn error(&self, line: usize, kind: ErrorKind) -> CompileError {
        CompileError::new(self.file, line, kind)
    }

    /// Whether the next token continues `line`.
    fn inline(&self, line: usize) -> bool {
        let tok = self.peek();
        tok.tok != TokKind::Eof && tok.span.line == line
    }

    fn at_inline(&self, line: usize, kind: &TokKind) -> bool {
        self.inline(line) && self.peek().tok == *kind
    }

    fn expected(&self, line: usize, what: &str) -> CompileError {
        let found = if self.inline(line) {
            self.peek().tok.to_string()
        } else {
            "end of line".to_string()
        };
        self.error(line, ErrorKind::Expected { expected: what.to_string(), found })
    }

    fn end_of_line(&self, line: usize) -> Result<()> {
        if self.inline(line) {
            return Err(self.expected(line, "end of line"));
        }
        Ok(())
    }

    fn ident(&mut self, line: usize, what: &str) -> Result<String> {
        if self.inline(line) {
            if let TokKind::Ident(s) = &self.peek().tok {
                self.bump();
                return Ok(s.clone());
            }
        }
        Err(self.expected(line, what))
    }

    fn string(&mut self, line: usize, what: &str) -> Result<String> {
        if self.inline(line) {
            if let TokKind::Str(s) = &self.peek().tok {
                self.bump();
                return Ok(s.clone());
            }
        }
        Err(self.expected(line, what))
    }

    fn position(&mut self, line: usize) -> Result<Position> {
        if self.inline(line) {
            if let TokKind::Position(p) = self.peek().tok {
                self.bump();
                return Ok(p);
            }
        }
        Err(self.expected(line, "position"))
    }

    /// `"a"::"b"`
    fn scoped_pair(&mut self, line: usize) -> Result<(String, String)> {
        let owner = self.string(line, "string")?;
        if !self.at_inline(line, &TokKind::Scope) {
            return Err(self.expected(line, "'::'"));
        }
        self.bump();
        let name = self.string(line, "string")?;
        Ok((owner, name))
    }

    pub fn parse(mut self) -> Result<Dialog> {
        let mut knots = vec![Knot::new("start", 1, self.knot_body()?)];

        while self.peek().tok == TokKind::Knot {
            let tok = self.bump();
            let line = tok.span.line;
            if tok.span.indent != 0 {
                return Err(self.error(line, ErrorKind::IndentedKnot));
            }
            let name = self.ident(line, "knot name")?;
            self.end_of_line(line)?;
            if knots.iter().any(|k| k.name == name) {
                return Err(self.error(line, ErrorKind::DuplicateKnot(name)));
            }
            let body = self.knot_body()?;
            knots.push(Knot::new(name, line, body));
        }

        if let Some((target, line)) = self
            .jumps
            .iter()
            .find(|(target, _)| !knots.iter().any(|k| &k.name == target))
        {
            return Err(self.error(*line, ErrorKind::UnknownKnot(target.clone())));
        }

        log::debug!("{}: parsed {} knot(s)", self.file, knots.len());
        Ok(Dialog::new(self.file, knots, self.assets))
    }

    fn knot_body(&mut self) -> Result<Vec<KnotExpr>> {
        self.block(0, |p, level| p.knot_expr(level))
    }

    /// Parses the maximal run of items indented exactly `level` tabs.
    fn block<T>(
        &mut self,
        level: usize,
        mut item: impl FnMut(&mut Self, usize) -> Result<T>,
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        loop {
            let tok = self.peek();
            if matches!(tok.tok, TokKind::Eof | TokKind::Knot) || tok.span.indent < level {
                break;
            }
            if tok.span.indent > level {
                return Err(self.error(
                    tok.span.line,
                    ErrorKind::BadIndent { expected: level, found: tok.span.indent },
                ));
            }
            if tok.span.line == self.prev_line {
                return Err(self.error(tok.span.line, ErrorKind::NotOnFreshLine("each statement")));
            }
            items.push(item(self, level)?);
        }
        Ok(items)
    }

    fn knot_expr(&mut self, level: usize) -> Result<KnotExpr> {
        let tok = self.peek();
        match tok.tok {
            TokKind::Speaker => Ok(KnotExpr::Cue(self.cue(level)?)),
            TokKind::Hash => Ok(KnotExpr::Command(self.command()?)),
            TokKind::If => Ok(KnotExpr::Condition(
                self.condition(level, |p, l| p.knot_expr(l))?,
            )),
            TokKind::Else => Err(self.error(tok.span.line, ErrorKind::StrayElse)),
            _ => Err(self.expected(tok.span.line, "cue, command or #if")),
        }
    }

    fn condition<T>(
        &mut self,
        level: usize,
        mut item: impl FnMut(&mut Self, usize) -> Result<T>,
    ) -> Result<Condition<T>> {
        let line = self.bump().span.line;
        let guard = self.expression(line)?;
        self.end_of_line(line)?;

        let then_branch = self.block(level + 1, &mut item)?;
        if then_branch.is_empty() {
            return Err(self.error(line, ErrorKind::EmptyBranch));
        }

        let mut else_branch = Vec::new();
        let next = self.peek();
        if next.tok == TokKind::Else && next.span.indent == level {
            let else_line = self.bump().span.line;
            if self.inline(else_line) {
                return Err(self.error(else_line, ErrorKind::ElseNotAlone));
            }
            else_branch = self.block(level + 1, &mut item)?;
            if else_branch.is_empty() {
                return Err(self.error(else_line, ErrorKind::EmptyBranch));
            }
        }

        Ok(Condition::new(line, guard, then_branch, else_branch))
    }

    fn cue(&mut self, level: usize) -> Result<Cue> {
        let line = self.bump().span.line;
        let mut speaker = None;
        let mut sprite = None;

        if self.inline(line) {
            let name = self.string(line, "speaker name")?;
            let position = self.position(line)?;
            if self.inline(line) {
                let (character, animation) = self.scoped_pair(line)?;
                self.register(AssetKind::Character, &character, line)?;
                sprite = Some(Command::SetCharacter { position, character, animation });
            }
            self.end_of_line(line)?;
            speaker = Some(Speaker { name, position });
        }

        let synthesized_sprite = sprite.is_some();
        let mut body: Vec<CueExpr> = sprite.into_iter().map(CueExpr::Command).collect();
        let mut state = CueState::default();
        let exprs = self.block(level + 1, |p, l| p.cue_expr(l, &mut state))?;
        if exprs.is_empty() {
            return Err(self.error(line, ErrorKind::EmptyCue));
        }
        body.extend(exprs);

        let choice_start = body.iter().position(opens_menu);
        Ok(Cue::new(line, speaker, synthesized_sprite, body, choice_start))
    }

    fn cue_expr(&mut self, level: usize, state: &mut CueState) -> Result<CueExpr> {
        let tok = self.peek();
        let line = tok.span.line;
        match &tok.tok {
            TokKind::Sentence(text) => {
                if state.choices {
                    return Err(self.error(line, ErrorKind::AfterChoice("text")));
                }
                self.bump();
                let (text, auto) = split_auto(text);
                Ok(CueExpr::Sentence(Sentence::new(line, text, auto)))
            }
            TokKind::Hash => {
                if state.choices {
                    return Err(self.error(line, ErrorKind::AfterChoice("a command")));
                }
                Ok(CueExpr::Command(self.command()?))
            }
            TokKind::ChoiceMarker => {
                state.choices = true;
                Ok(CueExpr::Choice(self.choice(level)?))
            }
            TokKind::If => {
                let cond = self.condition(level, |p, l| p.cue_expr(l, state))?;
                let branches = || cond.then_branch.iter().chain(&cond.else_branch);
                if branches().any(opens_menu) && !branches().all(opens_menu) {
                    return Err(self.error(line, ErrorKind::MixedChoices));
                }
                Ok(CueExpr::Condition(cond))
            }
            TokKind::Else => Err(self.error(line, ErrorKind::StrayElse)),
            _ => Err(self.expected(line, "text, choice, command or #if")),
        }
    }

    fn choice(&mut self, level: usize) -> Result<Choice> {
        let line = self.bump().span.line;
        let text = match &self.peek().tok {
            TokKind::Sentence(text) if self.inline(line) => {
                self.bump();
                split_auto(text).0
            }
            _ => return Err(self.expected(line, "choice text")),
        };
        if !self.at_inline(line, &TokKind::GoTo) {
            return Err(self.expected(line, "'->'"));
        }
        let go_to = self.bump();
        if go_to.span.indent != level {
            return Err(self.error(
                line,
                ErrorKind::BadIndent { expected: level, found: go_to.span.indent },
            ));
        }
        let target = self.ident(line, "knot name")?;
        self.end_of_line(line)?;
        self.jumps.push((target.clone(), line));
        Ok(Choice { line, text, target })
    }

    fn command(&mut self) -> Result<Command> {
        let line = self.bump().span.line;
        let word = self.ident(line, "command keyword")?;
        let kind = CommandKind::from_keyword(&word)
            .ok_or_else(|| self.error(line, ErrorKind::UnknownCommand(word)))?;

        let usage = |p: &Self| {
            p.error(line, ErrorKind::Usage { command: kind.keyword(), usage: kind.usage() })
        };
        let command = match self.command_args(kind, line) {
            Ok(command) => command,
            Err(e) if e.file == self.file && matches!(e.kind, ErrorKind::Expected { .. }) => {
                return Err(usage(self));
            }
            Err(e) => return Err(e),
        };
        if self.inline(line) {
            return Err(usage(self));
        }
        Ok(command)
    }

    fn command_args(&mut self, kind: CommandKind, line: usize) -> Result<Command> {
        let command = match kind {
            CommandKind::SetBackground => {
                let (pack, name) = self.scoped_pair(line)?;
                self.register(AssetKind::Background, &pack, line)?;
                Command::SetBackground { pack, name }
            }
            CommandKind::ClearBackground => Command::ClearBackground,
            CommandKind::SetCharacter => {
                let position = self.position(line)?;
                let (character, animation) = self.scoped_pair(line)?;
                self.register(AssetKind::Character, &character, line)?;
                Command::SetCharacter { position, character, animation }
            }
            CommandKind::ClearCharacterPosition => {
                Command::ClearCharacterPosition(self.position(line)?)
            }
            CommandKind::ClearCharacterPositions => Command::ClearCharacterPositions,
            CommandKind::End => Command::End,
            CommandKind::Assign => {
                let name = self.ident(line, "variable name")?;
                let value = self.expression(line)?;
                Command::Assign { name, value }
            }
            CommandKind::GoTo => {
                let target = self.ident(line, "knot name")?;
                self.jumps.push((target.clone(), line));
                Command::GoTo(target)
            }
            CommandKind::HideUi => Command::HideUi,
            CommandKind::ShowUi => Command::ShowUi,
            CommandKind::PlaySound => Command::PlaySound(self.string(line, "sound name")?),
            CommandKind::PlayMusic => Command::PlayMusic(self.string(line, "music name")?),
            CommandKind::StopMusic => Command::StopMusic,
            CommandKind::NextDialog => Command::NextDialog(self.string(line, "script name")?),
        };
        Ok(command)
    }

    /// Loads and registers an animation definition the first time `name` is seen.
    fn register(&mut self, kind: AssetKind, name: &str, line: usize) -> Result<()> {
        let known = match kind {
            AssetKind::Background => self.assets.backgrounds.contains_key(name),
            AssetKind::Character => self.assets.characters.contains_key(name),
        };
        if known {
            return Ok(());
        }

        let text = self.source.load(kind, name).map_err(|reason| {
            self.error(line, ErrorKind::Asset { kind: kind.label(), name: name.to_string(), reason })
        })?;
        let set = anim::parse(&text.path, &text.source)?;
        log::debug!("registered {} '{}' from {}", kind.label(), name, text.path);

        let table = match kind {
            AssetKind::Background => &mut self.assets.backgrounds,
            AssetKind::Character => &mut self.assets.characters,
        };
        table.insert(name.to_string(), set);
        Ok(())
    }

    fn expression(&mut self, line: usize) -> Result<Expr> {
        self.or(line)
    }

    fn binary(
        &mut self,
        line: usize,
        ops: &[(TokKind, BinaryOp)],
        operand: fn(&mut Self, usize) -> Result<Expr>,
    ) -> Result<Expr> {
        let mut lhs = operand(self, line)?;
        while self.inline(line) {
            let Some(op) = ops
                .iter()
                .find(|(tok, _)| *tok == self.peek().tok)
                .map(|(_, op)| *op)
            else {
                break;
            };
            self.bump();
            let rhs = operand(self, line)?;
            lhs = Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) };
        }
        Ok(lhs)
    }

    fn or(&mut self, line: usize) -> Result<Expr> {
        self.binary(line, &[(TokKind::Or, BinaryOp::Or)], Self::and)
    }

    fn and(&mut self, line: usize) -> Result<Expr> {
        self.binary(line, &[(TokKind::And, BinaryOp::And)], Self::comparison)
    }

    fn comparison(&mut self, line: usize) -> Result<Expr> {
        self.binary(
            line,
            &[
                (TokKind::EqEq, BinaryOp::Eq),
                (TokKind::NotEq, BinaryOp::Ne),
                (TokKind::Le, BinaryOp::Le),
                (TokKind::Lt, BinaryOp::Lt),
                (TokKind::Ge, BinaryOp::Ge),
                (TokKind::Gt, BinaryOp::Gt),
            ],
            Self::additive,
        )
    }

    fn additive(&mut self, line: usize) -> Result<Expr> {
        self.binary(
            line,
            &[(TokKind::Plus, BinaryOp::Add), (TokKind::Minus, BinaryOp::Sub)],
            Self::multiplicative,
        )
    }

    fn multiplicative(&mut self, line: usize) -> Result<Expr> {
        self.binary(
            line,
            &[(TokKind::Star, BinaryOp::Mul), (TokKind::Slash, BinaryOp::Div)],
            Self::unary,
        )
    }

    fn unary(&mut self, line: usize) -> Result<Expr> {
        if self.at_inline(line, &TokKind::Minus) {
            self.bump();
            let operand = self.unary(line)?;
            return Ok(Expr::Unary { op: UnaryOp::Negate, operand: Box::new(operand) });
        }
        self.primary(line)
    }

    fn primary(&mut self, line: usize) -> Result<Expr> {
        if !self.inline(line) {
            return Err(self.expected(line, "expression"));
        }
        let literal = match &self.peek().tok {
            TokKind::Num(n) => Literal::Number(*n),
            TokKind::Str(s) => Literal::Str(s.clone()),
            TokKind::Ident(s) => Literal::Ident(s.clone()),
            TokKind::Position(p) => Literal::Ident(p.keyword().to_string()),
            TokKind::LParen => {
                self.bump();
                let inner = self.expression(line)?;
                if !self.at_inline(line, &TokKind::RParen) {
                    return Err(self.expected(line, "')'"));
                }
                self.bump();
                return Ok(Expr::Grouping(Box::new(inner)));
            }
            _ => return Err(self.expected(line, "expression")),
        };
        self.bump();
        Ok(Expr::Literal(literal))
    }
}

/// Whether an expression belongs to a cue's choice menu.
fn opens_menu(expr: &CueExpr) -> bool {
    match expr {
        CueExpr::Choice(_) => true,
        CueExpr::Condition(c) => c.then_branch.iter().chain(&c.else_branch).any(opens_menu),
        CueExpr::Sentence(_) | CueExpr::Command(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_suffix_needs_the_leading_space() {
        assert_eq!(split_auto("Hurry AUTO"), ("Hurry".to_string(), true));
        assert_eq!(split_auto("AUTO"), ("AUTO".to_string(), false));
        assert_eq!(split_auto("AUTOMATIC"), ("AUTOMATIC".to_string(), false));
    }
}
