//! Syntax tree of a compiled dialogue script.
//!
//! The tree doubles as the interpreter's execution state: every node that
//! owns a sequence also owns a resumption cursor into it, and conditions
//! cache their guard once per entry. Cursor mutation only happens through
//! the [`Track`] trait and the per-node accessors below.

use std::fmt;

use rustc_hash::FxHashMap;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::anim::AnimationSet;
use crate::command::CommandKind;

/// Horizontal stage slot for a character sprite or speaker box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Position {
    FullLeft,
    Left,
    CenterLeft,
    Center,
    CenterRight,
    Right,
    FullRight,
}

impl Position {
    pub const ALL: [Position; 7] = [
        Position::FullLeft,
        Position::Left,
        Position::CenterLeft,
        Position::Center,
        Position::CenterRight,
        Position::Right,
        Position::FullRight,
    ];

    /// Accepts both the script form (`center-left`) and the command form
    /// (`CENTER_LEFT`).
    pub fn from_keyword(word: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.keyword() == word || p.command_form() == word)
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Position::FullLeft => "full-left",
            Position::Left => "left",
            Position::CenterLeft => "center-left",
            Position::Center => "center",
            Position::CenterRight => "center-right",
            Position::Right => "right",
            Position::FullRight => "full-right",
        }
    }

    pub fn command_form(self) -> &'static str {
        match self {
            Position::FullLeft => "FULL_LEFT",
            Position::Left => "LEFT",
            Position::CenterLeft => "CENTER_LEFT",
            Position::Center => "CENTER",
            Position::CenterRight => "CENTER_RIGHT",
            Position::Right => "RIGHT",
            Position::FullRight => "FULL_RIGHT",
        }
    }

    /// Horizontal anchor in `0.0..=1.0`, slots evenly spread across the screen.
    pub fn anchor_x(self) -> f32 {
        self as usize as f32 / (Self::ALL.len() - 1) as f32
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A node owning an ordered run of children plus a cursor into it.
///
/// A cursor equal to the run length means the node is exhausted.
pub trait Track {
    type Item;

    fn cursor(&self) -> usize;
    fn current_mut(&mut self) -> Option<&mut Self::Item>;
    fn advance(&mut self);
    /// Resets the cursor (and any per-entry state) for the next entry.
    fn rewind(&mut self);

    fn is_exhausted(&self) -> bool;
}

/// Background packs and characters referenced by a script, keyed by name.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Assets {
    pub backgrounds: FxHashMap<String, AnimationSet>,
    pub characters: FxHashMap<String, AnimationSet>,
}

/// The compiled unit: one script file.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Dialog {
    pub file: String,
    pub knots: Vec<Knot>,
    pub assets: Assets,
    index: FxHashMap<String, usize>,
    current_knot: usize,
    end: bool,
}

impl Dialog {
    pub fn new(file: impl Into<String>, knots: Vec<Knot>, assets: Assets) -> Self {
        let index = knots
            .iter()
            .enumerate()
            .map(|(i, k)| (k.name.clone(), i))
            .collect();
        Self {
            file: file.into(),
            knots,
            assets,
            index,
            current_knot: 0,
            end: false,
        }
    }

    pub fn knot_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn knot(&self, name: &str) -> Option<&Knot> {
        self.knot_index(name).map(|i| &self.knots[i])
    }

    pub fn current_knot(&self) -> usize {
        self.current_knot
    }

    /// Moves on to the following knot; ends the dialog after the last one.
    pub fn advance_knot(&mut self) -> bool {
        self.current_knot += 1;
        if self.current_knot >= self.knots.len() {
            self.end = true;
        }
        !self.end
    }

    pub fn jump_to(&mut self, index: usize) {
        debug_assert!(index < self.knots.len());
        self.current_knot = index;
    }

    pub fn finish(&mut self) {
        self.end = true;
    }

    pub fn is_ended(&self) -> bool {
        self.end || self.current_knot >= self.knots.len()
    }
}

/// A named top-level section of a script.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Knot {
    pub name: String,
    pub line: usize,
    pub body: Vec<KnotExpr>,
    cursor: usize,
}

impl Knot {
    pub fn new(name: impl Into<String>, line: usize, body: Vec<KnotExpr>) -> Self {
        Self { name: name.into(), line, body, cursor: 0 }
    }
}

impl Track for Knot {
    type Item = KnotExpr;

    fn cursor(&self) -> usize {
        self.cursor
    }

    fn current_mut(&mut self) -> Option<&mut KnotExpr> {
        self.body.get_mut(self.cursor)
    }

    fn advance(&mut self) {
        self.cursor = (self.cursor + 1).min(self.body.len());
    }

    fn rewind(&mut self) {
        self.cursor = 0;
    }

    fn is_exhausted(&self) -> bool {
        self.cursor >= self.body.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum KnotExpr {
    Command(Command),
    Cue(Cue),
    Condition(Condition<KnotExpr>),
}

/// `#if` / `#else` block. Shared by knots and cues through `T`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Condition<T> {
    pub line: usize,
    pub guard: Expr,
    pub then_branch: Vec<T>,
    /// Empty when the block has no `#else`.
    pub else_branch: Vec<T>,
    cursor: usize,
    resolved: bool,
    result: bool,
}

impl<T> Condition<T> {
    pub fn new(line: usize, guard: Expr, then_branch: Vec<T>, else_branch: Vec<T>) -> Self {
        Self {
            line,
            guard,
            then_branch,
            else_branch,
            cursor: 0,
            resolved: false,
            result: false,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Cached guard result; only meaningful while [`Self::is_resolved`].
    pub fn result(&self) -> bool {
        self.result
    }

    pub fn resolve(&mut self, result: bool) {
        self.resolved = true;
        self.result = result;
    }

    pub fn branch(&self, result: bool) -> &[T] {
        if result { &self.then_branch } else { &self.else_branch }
    }

    fn active_len(&self) -> usize {
        self.branch(self.result).len()
    }
}

impl<T> Track for Condition<T> {
    type Item = T;

    fn cursor(&self) -> usize {
        self.cursor
    }

    fn current_mut(&mut self) -> Option<&mut T> {
        if !self.resolved {
            return None;
        }
        let branch = if self.result { &mut self.then_branch } else { &mut self.else_branch };
        branch.get_mut(self.cursor)
    }

    fn advance(&mut self) {
        self.cursor = (self.cursor + 1).min(self.active_len());
    }

    fn rewind(&mut self) {
        self.cursor = 0;
        self.resolved = false;
        self.result = false;
    }

    fn is_exhausted(&self) -> bool {
        !self.resolved || self.cursor >= self.active_len()
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Speaker {
    pub name: String,
    pub position: Position,
}

/// A single dialogue turn.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Cue {
    pub line: usize,
    pub speaker: Option<Speaker>,
    /// `body[0]` is a `SET_CHARACTER` generated from the cue header.
    pub synthesized_sprite: bool,
    pub body: Vec<CueExpr>,
    /// Index of the first expression belonging to the choice menu.
    pub choice_start: Option<usize>,
    cursor: usize,
    entered: bool,
    menu: Option<ChoiceMenu>,
}

impl Cue {
    pub fn new(
        line: usize,
        speaker: Option<Speaker>,
        synthesized_sprite: bool,
        body: Vec<CueExpr>,
        choice_start: Option<usize>,
    ) -> Self {
        Self {
            line,
            speaker,
            synthesized_sprite,
            body,
            choice_start,
            cursor: 0,
            entered: false,
            menu: None,
        }
    }

    /// Marks the cue as entered; returns `true` only on the first call of an entry.
    pub fn enter(&mut self) -> bool {
        !std::mem::replace(&mut self.entered, true)
    }

    pub fn is_entered(&self) -> bool {
        self.entered
    }

    /// Whether the cursor has reached the choice menu.
    pub fn at_choices(&self) -> bool {
        self.choice_start.is_some_and(|start| self.cursor >= start) && !self.is_exhausted()
    }

    pub fn choices(&self) -> &[CueExpr] {
        match self.choice_start {
            Some(start) => &self.body[start.min(self.body.len())..],
            None => &[],
        }
    }

    pub fn menu(&self) -> Option<&ChoiceMenu> {
        self.menu.as_ref()
    }

    pub fn menu_mut(&mut self) -> Option<&mut ChoiceMenu> {
        self.menu.as_mut()
    }

    pub fn open_menu(&mut self, menu: ChoiceMenu) {
        self.menu = Some(menu);
    }
}

impl Track for Cue {
    type Item = CueExpr;

    fn cursor(&self) -> usize {
        self.cursor
    }

    fn current_mut(&mut self) -> Option<&mut CueExpr> {
        self.body.get_mut(self.cursor)
    }

    fn advance(&mut self) {
        self.cursor = (self.cursor + 1).min(self.body.len());
    }

    fn rewind(&mut self) {
        self.cursor = 0;
        self.entered = false;
        self.menu = None;
    }

    fn is_exhausted(&self) -> bool {
        self.cursor >= self.body.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CueExpr {
    Sentence(Sentence),
    Choice(Choice),
    Command(Command),
    Condition(Condition<CueExpr>),
}

/// A line of displayable text, revealed one character per tick.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sentence {
    pub line: usize,
    pub text: String,
    /// Completes on its own once fully revealed.
    pub auto: bool,
    staged: bool,
    current_char: usize,
}

impl Sentence {
    pub fn new(line: usize, text: impl Into<String>, auto: bool) -> Self {
        Self {
            line,
            text: text.into(),
            auto,
            staged: false,
            current_char: 0,
        }
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_staged(&self) -> bool {
        self.staged
    }

    pub fn current_char(&self) -> usize {
        self.current_char
    }

    pub fn stage(&mut self) {
        self.staged = true;
        self.current_char = 0;
    }

    pub fn reveal_next(&mut self) {
        self.current_char = (self.current_char + 1).min(self.char_count());
    }

    pub fn reveal_all(&mut self) {
        self.current_char = self.char_count();
    }

    pub fn is_revealed(&self) -> bool {
        self.staged && self.current_char >= self.char_count()
    }

    /// The prefix of `text` revealed so far.
    pub fn revealed(&self) -> &str {
        match self.text.char_indices().nth(self.current_char) {
            Some((byte, _)) => &self.text[..byte],
            None => &self.text,
        }
    }

    pub fn reset(&mut self) {
        self.staged = false;
        self.current_char = 0;
    }
}

/// A selectable menu entry that jumps to another knot.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Choice {
    pub line: usize,
    pub text: String,
    pub target: String,
}

impl Choice {
    /// The `GO_TO` this choice performs when confirmed.
    pub fn go_to(&self) -> Command {
        Command::GoTo(self.target.clone())
    }
}

/// An open choice menu: the options visible when it was shown.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChoiceMenu {
    pub options: Vec<Choice>,
    selected: usize,
}

impl ChoiceMenu {
    pub fn new(options: Vec<Choice>) -> Self {
        Self { options, selected: 0 }
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_choice(&self) -> Option<&Choice> {
        self.options.get(self.selected)
    }

    pub fn up(&mut self) {
        if !self.options.is_empty() {
            self.selected = (self.selected + self.options.len() - 1) % self.options.len();
        }
    }

    pub fn down(&mut self) {
        if !self.options.is_empty() {
            self.selected = (self.selected + 1) % self.options.len();
        }
    }
}

/// A side-effecting directive with a fixed argument shape.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Command {
    SetBackground { pack: String, name: String },
    ClearBackground,
    SetCharacter { position: Position, character: String, animation: String },
    ClearCharacterPosition(Position),
    ClearCharacterPositions,
    End,
    Assign { name: String, value: Expr },
    GoTo(String),
    HideUi,
    ShowUi,
    PlaySound(String),
    PlayMusic(String),
    StopMusic,
    NextDialog(String),
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::SetBackground { .. } => CommandKind::SetBackground,
            Command::ClearBackground => CommandKind::ClearBackground,
            Command::SetCharacter { .. } => CommandKind::SetCharacter,
            Command::ClearCharacterPosition(_) => CommandKind::ClearCharacterPosition,
            Command::ClearCharacterPositions => CommandKind::ClearCharacterPositions,
            Command::End => CommandKind::End,
            Command::Assign { .. } => CommandKind::Assign,
            Command::GoTo(_) => CommandKind::GoTo,
            Command::HideUi => CommandKind::HideUi,
            Command::ShowUi => CommandKind::ShowUi,
            Command::PlaySound(_) => CommandKind::PlaySound,
            Command::PlayMusic(_) => CommandKind::PlayMusic,
            Command::StopMusic => CommandKind::StopMusic,
            Command::NextDialog(_) => CommandKind::NextDialog,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Expr {
    Literal(Literal),
    Unary { op: UnaryOp, operand: Box<Expr> },
    Binary { op: BinaryOp, lhs: Box<Expr>, rhs: Box<Expr> },
    Grouping(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Literal {
    Number(f64),
    Str(String),
    Ident(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum UnaryOp {
    /// Logical negation (`-x`).
    Negate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Or => "or",
            BinaryOp::And => "and",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
