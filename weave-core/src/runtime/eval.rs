//! Expression evaluation against the variable store.

use weave_script::ast::{BinaryOp, Expr, Literal, UnaryOp};

use crate::runtime::{RuntimeError, Value, VariableStore};

pub fn eval(expr: &Expr, vars: &VariableStore) -> Result<Value, RuntimeError> {
    match expr {
        Expr::Literal(Literal::Number(n)) => Ok(Value::Number(*n)),
        Expr::Literal(Literal::Str(s)) => Ok(Value::Str(s.clone())),
        Expr::Literal(Literal::Ident(name)) => vars.lookup(name).cloned(),
        Expr::Grouping(inner) => eval(inner, vars),
        Expr::Unary { op: UnaryOp::Negate, operand } => {
            Ok(Value::bool(!eval(operand, vars)?.is_truthy()))
        }
        Expr::Binary { op, lhs, rhs } => {
            // both sides are always evaluated, `and`/`or` included
            let lhs = eval(lhs, vars)?;
            let rhs = eval(rhs, vars)?;
            binary(*op, lhs, rhs)
        }
    }
}

/// Evaluates a guard down to its truth value.
pub fn truthy(expr: &Expr, vars: &VariableStore) -> Result<bool, RuntimeError> {
    eval(expr, vars).map(|v| v.is_truthy())
}

fn binary(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, RuntimeError> {
    let mismatch = |lhs: &Value, rhs: &Value| RuntimeError::TypeMismatch {
        op: op.symbol(),
        lhs: lhs.type_name(),
        rhs: rhs.type_name(),
    };

    match op {
        BinaryOp::Or => Ok(Value::bool(lhs.is_truthy() || rhs.is_truthy())),
        BinaryOp::And => Ok(Value::bool(lhs.is_truthy() && rhs.is_truthy())),
        BinaryOp::Add => match (lhs, rhs) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),
            (a, b) => Err(mismatch(&a, &b)),
        },
        BinaryOp::Eq | BinaryOp::Ne => {
            let equal = match (&lhs, &rhs) {
                (Value::Number(a), Value::Number(b)) => a == b,
                (Value::Str(a), Value::Str(b)) => a == b,
                (a, b) => return Err(mismatch(a, b)),
            };
            Ok(Value::bool(equal == (op == BinaryOp::Eq)))
        }
        BinaryOp::Sub
        | BinaryOp::Mul
        | BinaryOp::Div
        | BinaryOp::Lt
        | BinaryOp::Le
        | BinaryOp::Gt
        | BinaryOp::Ge => {
            let (Value::Number(a), Value::Number(b)) = (&lhs, &rhs) else {
                return Err(mismatch(&lhs, &rhs));
            };
            let (a, b) = (*a, *b);
            Ok(match op {
                BinaryOp::Sub => Value::Number(a - b),
                BinaryOp::Mul => Value::Number(a * b),
                BinaryOp::Div if b == 0.0 => return Err(RuntimeError::DivisionByZero),
                BinaryOp::Div => Value::Number(a / b),
                BinaryOp::Lt => Value::bool(a < b),
                BinaryOp::Le => Value::bool(a <= b),
                BinaryOp::Gt => Value::bool(a > b),
                _ => Value::bool(a >= b),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use weave_script::ast::{Command, KnotExpr};
    use weave_script::{compile_str, MemorySource};

    use super::*;

    fn expr(src: &str) -> Expr {
        let dialog = compile_str("expr.weave", &format!("#ASSIGN r {src}\n"), &mut MemorySource::new())
            .unwrap_or_else(|e| panic!("{e}"));
        match &dialog.knots[0].body[0] {
            KnotExpr::Command(Command::Assign { value, .. }) => value.clone(),
            other => panic!("unexpected {other:?}"),
        }
    }

    fn run(src: &str) -> Result<Value, RuntimeError> {
        let mut vars = VariableStore::new();
        vars.assign("gold", Value::Number(7.0));
        vars.assign("name", Value::Str("Ann".into()));
        eval(&expr(src), &vars)
    }

    #[test]
    fn arithmetic_precedence() {
        assert_eq!(run("2 + 3 * 4"), Ok(Value::Number(14.0)));
        assert_eq!(run("(2 + 3) * 4"), Ok(Value::Number(20.0)));
        assert_eq!(run("10 - 4 - 3"), Ok(Value::Number(3.0)));
        assert_eq!(run("gold / 2"), Ok(Value::Number(3.5)));
    }

    #[test]
    fn strings() {
        assert_eq!(run("\"a\" + \"b\""), Ok(Value::Str("ab".into())));
        assert_eq!(run("name == \"Ann\""), Ok(Value::Number(1.0)));
        assert_eq!(run("name != \"Bob\""), Ok(Value::Number(1.0)));
    }

    #[test]
    fn comparisons_yield_numbers() {
        assert_eq!(run("5 == 5"), Ok(Value::Number(1.0)));
        assert_eq!(run("gold < 3"), Ok(Value::Number(0.0)));
        assert_eq!(run("gold >= 7 and gold <= 7"), Ok(Value::Number(1.0)));
        assert_eq!(run("0 or name"), Ok(Value::Number(1.0)));
    }

    #[test]
    fn negation_is_logical() {
        assert_eq!(run("-gold"), Ok(Value::Number(0.0)));
        assert_eq!(run("-0"), Ok(Value::Number(1.0)));
        assert_eq!(run("-\"\""), Ok(Value::Number(1.0)));
        assert_eq!(run("--name"), Ok(Value::Number(1.0)));
    }

    #[test]
    fn type_errors() {
        assert_eq!(
            run("\"x\" - 1"),
            Err(RuntimeError::TypeMismatch { op: "-", lhs: "string", rhs: "number" })
        );
        assert_eq!(
            run("1 + \"x\""),
            Err(RuntimeError::TypeMismatch { op: "+", lhs: "number", rhs: "string" })
        );
        assert!(matches!(run("name == 1"), Err(RuntimeError::TypeMismatch { op: "==", .. })));
        assert!(matches!(run("name < 1"), Err(RuntimeError::TypeMismatch { op: "<", .. })));
    }

    #[test]
    fn runtime_failures() {
        assert_eq!(run("gold / (1 - 1)"), Err(RuntimeError::DivisionByZero));
        assert_eq!(run("ghost + 1"), Err(RuntimeError::UndefinedVariable("ghost".into())));
        // no short-circuit: the right operand is still looked up
        assert_eq!(run("0 and ghost"), Err(RuntimeError::UndefinedVariable("ghost".into())));
    }
}
