use weave_script::ast::{
    BinaryOp, Command, CueExpr, Dialog, Expr, KnotExpr, Literal, Position, Track, UnaryOp,
};
use weave_script::error::{CompileError, ErrorKind};
use weave_script::source::{AnimationSource, AssetKind, AssetText, MemorySource};
use weave_script::{compile, compile_str, writer};

const SCRIPT: &str = "\
#SET_BACKGROUND \"forest\"::\"dawn\"
#ASSIGN gold 10
> \"Alice\" left \"alice\"::\"idle\"
\tGood morning!
\t#PLAY_SOUND \"birds\"
\tIt's a fine day AUTO
>
\tThe wind picks up.
\t#if gold >= 10
\t\t- Buy a map -> shop
\t- Walk on -> road

// the shop
@shop
> \"Bob\" right
\tWelcome, traveller.
\t#if gold > 5 and met_bob == 0
\t\tTake this.
\t#else
\t\tBack again?
#GO_TO road
@road
/* a
   multi-line comment */
#ASSIGN message \"it's \\\"late\\\"\"
#ASSIGN neg -(gold - 3) / 2
#CLEAR_CHARACTER_POSITION LEFT
#END
";

fn assets() -> MemorySource {
    MemorySource::new()
        .with(AssetKind::Character, "alice", "sheet \"alice.png\" 64 128\nidle 0 4 8\n")
        .with(AssetKind::Background, "forest", "sheet \"forest.png\" 320 180\ndawn 0 1 1\n")
}

fn parse_code(src: &str) -> Result<Dialog, CompileError> {
    compile_str("test.weave", src, &mut assets())
}

fn parse_error(src: &str) -> (usize, ErrorKind) {
    let err = parse_code(src).expect_err("compilation should fail");
    (err.line, err.kind)
}

fn num(n: f64) -> Box<Expr> {
    Box::new(Expr::Literal(Literal::Number(n)))
}

fn ident(name: &str) -> Box<Expr> {
    Box::new(Expr::Literal(Literal::Ident(name.into())))
}

#[test]
fn knots_and_lines() {
    let dialog = parse_code(SCRIPT).unwrap_or_else(|e| panic!("Parse failed: {e}"));
    let names: Vec<_> = dialog.knots.iter().map(|k| (k.name.as_str(), k.line)).collect();
    assert_eq!(names, vec![("start", 1), ("shop", 14), ("road", 22)]);
    assert_eq!(dialog.knot_index("road"), Some(2));
    assert_eq!(dialog.knots[0].body.len(), 4);
    assert_eq!(dialog.knots[2].body.len(), 4);
}

#[test]
fn cue_header_stages_the_speaker_sprite() {
    let dialog = parse_code(SCRIPT).unwrap();
    let KnotExpr::Cue(cue) = &dialog.knots[0].body[2] else {
        panic!("expected a cue");
    };
    let speaker = cue.speaker.as_ref().unwrap();
    assert_eq!((speaker.name.as_str(), speaker.position), ("Alice", Position::Left));
    assert!(cue.synthesized_sprite);
    assert_eq!(
        cue.body[0],
        CueExpr::Command(Command::SetCharacter {
            position: Position::Left,
            character: "alice".into(),
            animation: "idle".into(),
        })
    );
    assert_eq!(cue.body.len(), 4);
    assert_eq!(cue.choice_start, None);

    let CueExpr::Sentence(last) = &cue.body[3] else {
        panic!("expected a sentence");
    };
    assert_eq!(last.text, "It's a fine day");
    assert!(last.auto);
    assert_eq!(last.line, 6);
}

#[test]
fn narration_cue_with_choices() {
    let dialog = parse_code(SCRIPT).unwrap();
    let KnotExpr::Cue(cue) = &dialog.knots[0].body[3] else {
        panic!("expected a cue");
    };
    assert!(cue.speaker.is_none());
    assert!(!cue.synthesized_sprite);
    assert_eq!(cue.choice_start, Some(1));
    assert_eq!(cue.choices().len(), 2);

    let CueExpr::Condition(cond) = &cue.body[1] else {
        panic!("expected a condition");
    };
    assert_eq!(
        cond.guard,
        Expr::Binary { op: BinaryOp::Ge, lhs: ident("gold"), rhs: num(10.0) }
    );
    let CueExpr::Choice(choice) = &cond.then_branch[0] else {
        panic!("expected a choice");
    };
    assert_eq!((choice.text.as_str(), choice.target.as_str()), ("Buy a map", "shop"));
    assert_eq!(choice.go_to(), Command::GoTo("shop".into()));
    assert!(cond.else_branch.is_empty());
}

#[test]
fn else_branch() {
    let dialog = parse_code(SCRIPT).unwrap();
    let KnotExpr::Cue(cue) = &dialog.knots[1].body[0] else {
        panic!("expected a cue");
    };
    let CueExpr::Condition(cond) = &cue.body[1] else {
        panic!("expected a condition");
    };
    assert_eq!(cond.line, 17);
    assert_eq!(cond.then_branch.len(), 1);
    assert_eq!(cond.else_branch.len(), 1);
    assert!(!cond.is_resolved());
    assert!(cond.is_exhausted());
}

#[test]
fn expressions() {
    let dialog = parse_code("#ASSIGN x 2 + 3 * 4\n#ASSIGN y -(a - 1) / 2\n#ASSIGN z a or b and c == center\n").unwrap();
    let values: Vec<_> = dialog.knots[0]
        .body
        .iter()
        .map(|e| match e {
            KnotExpr::Command(Command::Assign { value, .. }) => value.clone(),
            other => panic!("unexpected {other:?}"),
        })
        .collect();

    assert_eq!(
        values[0],
        Expr::Binary {
            op: BinaryOp::Add,
            lhs: num(2.0),
            rhs: Box::new(Expr::Binary { op: BinaryOp::Mul, lhs: num(3.0), rhs: num(4.0) }),
        }
    );
    assert_eq!(
        values[1],
        Expr::Binary {
            op: BinaryOp::Div,
            lhs: Box::new(Expr::Unary {
                op: UnaryOp::Negate,
                operand: Box::new(Expr::Grouping(Box::new(Expr::Binary {
                    op: BinaryOp::Sub,
                    lhs: ident("a"),
                    rhs: num(1.0),
                }))),
            }),
            rhs: num(2.0),
        }
    );
    assert_eq!(
        values[2],
        Expr::Binary {
            op: BinaryOp::Or,
            lhs: ident("a"),
            rhs: Box::new(Expr::Binary {
                op: BinaryOp::And,
                lhs: ident("b"),
                rhs: Box::new(Expr::Binary { op: BinaryOp::Eq, lhs: ident("c"), rhs: ident("center") }),
            }),
        }
    );
}

#[test]
fn commands_are_case_insensitive() {
    let dialog = parse_code("#set_character CENTER_RIGHT \"alice\"::\"idle\"\n#Stop_Music\n").unwrap();
    assert_eq!(
        dialog.knots[0].body,
        vec![
            KnotExpr::Command(Command::SetCharacter {
                position: Position::CenterRight,
                character: "alice".into(),
                animation: "idle".into(),
            }),
            KnotExpr::Command(Command::StopMusic),
        ]
    );
}

#[test]
fn assets_are_registered() {
    let dialog = parse_code(SCRIPT).unwrap();
    assert_eq!(dialog.assets.backgrounds["forest"].sheet, "forest.png");
    let alice = &dialog.assets.characters["alice"];
    assert_eq!(alice.get("idle").map(|a| a.frame_count), Some(4));
}

struct CountingSource {
    inner: MemorySource,
    loads: usize,
}

impl AnimationSource for CountingSource {
    fn load(&mut self, kind: AssetKind, name: &str) -> Result<AssetText, String> {
        self.loads += 1;
        self.inner.load(kind, name)
    }
}

#[test]
fn assets_load_once_per_name() {
    let mut source = CountingSource { inner: assets(), loads: 0 };
    let src = "#SET_BACKGROUND \"forest\"::\"dawn\"\n> \"Alice\" left \"alice\"::\"idle\"\n\tHi\n#SET_BACKGROUND \"forest\"::\"dawn\"\n#SET_CHARACTER right \"alice\"::\"idle\"\n";
    compile_str("test.weave", src, &mut source).unwrap();
    assert_eq!(source.loads, 2);
}

#[test]
fn missing_and_broken_assets() {
    let err = parse_code("#SET_BACKGROUND \"castle\"::\"hall\"\n").unwrap_err();
    assert_eq!(
        err.kind,
        ErrorKind::Asset {
            kind: "background pack",
            name: "castle".into(),
            reason: "no such definition".into(),
        }
    );

    let mut source = assets().with(AssetKind::Character, "ghost", "idle 0 1 1\n");
    let err = compile_str("test.weave", "#SET_CHARACTER left \"ghost\"::\"idle\"\n", &mut source)
        .unwrap_err();
    assert_eq!(err.file, "characters/ghost");
    assert_eq!(err.kind, ErrorKind::MissingSheet);
}

#[test]
fn command_usage_errors() {
    let (line, kind) = parse_error("#HIDE_UI\n#SET_BACKGROUND \"forest\" \"dawn\"\n");
    assert_eq!(line, 2);
    assert_eq!(
        kind,
        ErrorKind::Usage {
            command: "SET_BACKGROUND",
            usage: "#SET_BACKGROUND \"pack\"::\"background\"",
        }
    );
    assert!(kind.to_string().contains("#SET_BACKGROUND \"pack\"::\"background\""));

    assert!(matches!(parse_error("#END now\n").1, ErrorKind::Usage { command: "END", .. }));
    assert!(matches!(parse_error("#GO_TO\n").1, ErrorKind::Usage { command: "GO_TO", .. }));
    assert!(matches!(parse_error("#ASSIGN x\n").1, ErrorKind::Usage { command: "ASSIGN", .. }));
    assert_eq!(parse_error("#TELEPORT\n"), (1, ErrorKind::UnknownCommand("TELEPORT".into())));
}

#[test]
fn structural_errors() {
    assert_eq!(parse_error("#if 1\n#END\n"), (1, ErrorKind::EmptyBranch));
    assert_eq!(ErrorKind::EmptyBranch.to_string(), "condition has no effect");
    assert_eq!(parse_error("#if 1\n\t#END\n#else\n"), (3, ErrorKind::EmptyBranch));
    assert_eq!(parse_error("#END\n#else\n\t#END\n"), (2, ErrorKind::StrayElse));
    assert_eq!(parse_error("#if 1\n\t#END\n#else x\n\t#END\n"), (3, ErrorKind::ElseNotAlone));
    assert_eq!(parse_error(">\n#END\n"), (1, ErrorKind::EmptyCue));
    assert_eq!(
        parse_error("#END\n\t\t#END\n"),
        (2, ErrorKind::BadIndent { expected: 0, found: 2 })
    );
}

#[test]
fn knot_errors() {
    assert_eq!(parse_error("#END\n\t@foo\n"), (2, ErrorKind::IndentedKnot));
    assert_eq!(parse_error("@a\n#END\n@a\n"), (3, ErrorKind::DuplicateKnot("a".into())));
    assert_eq!(parse_error("#END\n#GO_TO nowhere\n"), (2, ErrorKind::UnknownKnot("nowhere".into())));
    assert_eq!(
        parse_error(">\n\t- Leave -> exit\n"),
        (2, ErrorKind::UnknownKnot("exit".into()))
    );
}

#[test]
fn choice_mode_is_exclusive() {
    assert_eq!(
        parse_error(">\n\t- Go -> start\n\tToo late\n"),
        (3, ErrorKind::AfterChoice("text"))
    );
    assert_eq!(
        parse_error(">\n\t- Go -> start\n\t#END\n"),
        (3, ErrorKind::AfterChoice("a command"))
    );
    assert_eq!(
        parse_error(">\n\tHi\n\t#if 1\n\t\tHello\n\t\t- Go -> start\n"),
        (3, ErrorKind::MixedChoices)
    );
}

#[test]
fn invalid_encoding_reports_its_line() {
    let err = compile("bad.weave", b"Hello\n\xff\n", &mut assets()).unwrap_err();
    assert_eq!((err.line, err.kind), (2, ErrorKind::InvalidEncoding));
}

#[test]
fn writer_round_trip() {
    let first = parse_code(SCRIPT).unwrap();
    let text = writer::to_source(&first);
    let second = parse_code(&text).unwrap_or_else(|e| panic!("reparse failed: {e}\n{text}"));
    assert_eq!(first, second);
    assert_eq!(writer::to_source(&second), text);
}

#[test]
fn writer_preserves_indentation() {
    let dialog = parse_code(SCRIPT).unwrap();
    let text = writer::to_source(&dialog);
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines[2], "> \"Alice\" left \"alice\"::\"idle\"");
    assert_eq!(lines[9], "\t\t- Buy a map -> shop");
    assert_eq!(lines[13], "@shop");
    assert_eq!(lines[18], "\t#else");
}
