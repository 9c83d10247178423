// crates/plox-types/src/checker_tests.rs
// Tests for the type checker on hand-built trees

use super::checker::{TypeChecker, TypeError, MAX_EVAL_DEPTH};
use plox_ast::ast::{BinOp, Expr, ExprKind, Ident, Lit, LogicOp, Stmt, TypeTag, UnOp};
use plox_ast::diag::Diagnostics;
use plox_ast::span::Span;

/// Helper to create a dummy span
fn sp() -> Span {
    Span::point(1, 1)
}

/// Helper to create an identifier
fn ident(name: &str) -> Ident {
    Ident {
        text: name.to_string(),
        span: sp(),
    }
}

fn num(n: f64) -> Expr {
    Expr::lit(Lit::Number(n), sp())
}

fn string(s: &str) -> Expr {
    Expr::lit(Lit::Str(s.to_string()), sp())
}

fn boolean(b: bool) -> Expr {
    Expr::lit(Lit::Bool(b), sp())
}

fn var(name: &str) -> Expr {
    Expr::new(ExprKind::Var(ident(name)), sp())
}

fn unary(op: UnOp, expr: Expr) -> Expr {
    Expr::new(
        ExprKind::Unary {
            op,
            expr: Box::new(expr),
        },
        sp(),
    )
}

fn binary(lhs: Expr, op: BinOp, rhs: Expr) -> Expr {
    Expr::new(
        ExprKind::Binary {
            lhs: Box::new(lhs),
            op,
            rhs: Box::new(rhs),
        },
        sp(),
    )
}

fn ternary(cond: Expr, then_: Expr, else_: Expr) -> Expr {
    Expr::new(
        ExprKind::Ternary {
            cond: Box::new(cond),
            then_: Box::new(then_),
            else_: Box::new(else_),
            colon: Some(sp()),
        },
        sp(),
    )
}

fn assign(name: &str, value: Expr) -> Expr {
    Expr::new(
        ExprKind::Assign {
            target: ident(name),
            value: Box::new(value),
        },
        sp(),
    )
}

fn var_decl(name: &str, init: Option<Expr>) -> Stmt {
    Stmt::Var {
        name: ident(name),
        init,
        span: sp(),
    }
}

fn expr_stmt(expr: Expr) -> Stmt {
    Stmt::Expr { expr, span: sp() }
}

/// Check a single expression with a fresh checker.
fn check(mut expr: Expr) -> (TypeTag, Vec<String>) {
    let mut tc = TypeChecker::new();
    let tag = tc.check_expr(&mut expr);
    assert_eq!(tag, expr.ty, "returned tag must match stored tag");
    let mut diags = Diagnostics::new();
    tc.check_program(&mut Vec::<Stmt>::new(), &mut diags);
    (tag, diags.iter().map(|d| d.message.clone()).collect())
}

fn check_stmts(stmts: &mut [Stmt]) -> Vec<String> {
    let mut tc = TypeChecker::new();
    let mut diags = Diagnostics::new();
    tc.check_program(stmts, &mut diags);
    diags.iter().map(|d| d.message.clone()).collect()
}

// ============================================================================
// POSITIVE TESTS - well-typed expressions
// ============================================================================

#[test]
fn test_literals() {
    assert_eq!(check(num(42.0)).0, TypeTag::Number);
    assert_eq!(check(string("hi")).0, TypeTag::String);
    assert_eq!(check(boolean(true)).0, TypeTag::Bool);
    assert_eq!(check(Expr::lit(Lit::Nil, sp())).0, TypeTag::Nil);
}

#[test]
fn test_arithmetic_on_numbers() {
    for op in [BinOp::Add, BinOp::Sub, BinOp::Mul, BinOp::Div] {
        let (tag, errs) = check(binary(num(1.0), op, num(2.0)));
        assert_eq!(tag, TypeTag::Number, "{op:?}");
        assert!(errs.is_empty());
    }
}

#[test]
fn test_string_concatenation() {
    let (tag, errs) = check(binary(string("1"), BinOp::Add, string("2")));
    assert_eq!(tag, TypeTag::String);
    assert!(errs.is_empty());
}

#[test]
fn test_comparison_yields_bool() {
    for op in [BinOp::Lt, BinOp::Le, BinOp::Gt, BinOp::Ge] {
        assert_eq!(check(binary(num(1.0), op, num(2.0))).0, TypeTag::Bool);
    }
}

#[test]
fn test_equality_accepts_any_pair() {
    let (tag, errs) = check(binary(num(1.0), BinOp::Eq, string("1")));
    assert_eq!(tag, TypeTag::Bool);
    assert!(errs.is_empty());
    assert_eq!(
        check(binary(boolean(true), BinOp::Ne, Expr::lit(Lit::Nil, sp()))).0,
        TypeTag::Bool
    );
}

#[test]
fn test_comma_takes_right_tag() {
    assert_eq!(
        check(binary(num(1.0), BinOp::Comma, string("x"))).0,
        TypeTag::String
    );
}

#[test]
fn test_unary() {
    assert_eq!(check(unary(UnOp::Neg, num(1.0))).0, TypeTag::Number);
    assert_eq!(check(unary(UnOp::Not, string("s"))).0, TypeTag::Bool);
    assert_eq!(check(unary(UnOp::Not, num(0.0))).0, TypeTag::Bool);
}

#[test]
fn test_logical_yields_bool() {
    let e = Expr::new(
        ExprKind::Logical {
            lhs: Box::new(num(1.0)),
            op: LogicOp::Or,
            rhs: Box::new(string("a")),
        },
        sp(),
    );
    assert_eq!(check(e).0, TypeTag::Bool);
}

#[test]
fn test_grouping_passes_through() {
    let e = Expr::new(ExprKind::Grouping(Box::new(string("a"))), sp());
    assert_eq!(check(e).0, TypeTag::String);
}

#[test]
fn test_ternary_same_arms() {
    let (tag, errs) = check(ternary(boolean(true), num(1.0), num(2.0)));
    assert_eq!(tag, TypeTag::Number);
    assert!(errs.is_empty());
}

#[test]
fn test_every_subexpression_is_tagged() {
    let mut e = binary(
        unary(UnOp::Neg, num(1.0)),
        BinOp::Lt,
        binary(num(2.0), BinOp::Mul, num(3.0)),
    );
    let mut tc = TypeChecker::new();
    tc.check_expr(&mut e);
    let ExprKind::Binary { lhs, rhs, .. } = &e.kind else {
        unreachable!()
    };
    assert_eq!(e.ty, TypeTag::Bool);
    assert_eq!(lhs.ty, TypeTag::Number);
    assert_eq!(rhs.ty, TypeTag::Number);
}

// ============================================================================
// NEGATIVE TESTS - type errors
// ============================================================================

#[test]
fn test_negating_string_is_error() {
    let (tag, errs) = check(unary(UnOp::Neg, string("a")));
    assert_eq!(tag, TypeTag::Error);
    assert_eq!(errs, vec!["Bad type for negation: 'STRING'"]);
}

#[test]
fn test_mixed_addition_is_error() {
    let (tag, errs) = check(binary(num(1.0), BinOp::Add, string("2")));
    assert_eq!(tag, TypeTag::Error);
    assert_eq!(errs, vec!["Bad operand types for '+': 'NUMBER' and 'STRING'"]);
}

#[test]
fn test_string_subtraction_is_error() {
    let (_, errs) = check(binary(string("a"), BinOp::Sub, string("b")));
    assert_eq!(errs, vec!["Bad operand types for '-': 'STRING' and 'STRING'"]);
}

#[test]
fn test_comparing_bools_is_error() {
    let (_, errs) = check(binary(boolean(true), BinOp::Lt, boolean(false)));
    assert_eq!(errs, vec!["Bad operand types for '<': 'BOOL' and 'BOOL'"]);
}

#[test]
fn test_ternary_mismatch() {
    let (tag, errs) = check(ternary(boolean(true), num(1.0), string("a")));
    assert_eq!(tag, TypeTag::Error);
    assert_eq!(
        errs,
        vec!["Operands of ternary have different types: 'NUMBER' and 'STRING'"]
    );
}

#[test]
fn test_ternary_without_colon_is_malformed() {
    let e = Expr::new(
        ExprKind::Ternary {
            cond: Box::new(boolean(true)),
            then_: Box::new(num(1.0)),
            else_: Box::new(num(2.0)),
            colon: None,
        },
        sp(),
    );
    let (tag, errs) = check(e);
    assert_eq!(tag, TypeTag::Error);
    assert_eq!(errs, vec!["Malformed ternary operator"]);
}

#[test]
fn test_undefined_variable() {
    let (tag, errs) = check(var("nope"));
    assert_eq!(tag, TypeTag::Error);
    assert_eq!(errs, vec!["Undefined variable 'nope'"]);
}

#[test]
fn test_assignment_to_undefined_variable() {
    let mut stmts = [expr_stmt(assign("x", num(1.0)))];
    assert_eq!(check_stmts(&mut stmts), vec!["Undefined variable 'x'"]);
}

// ============================================================================
// ERROR PROPAGATION
// ============================================================================

#[test]
fn test_error_operand_is_silent() {
    // -"a" + 1: only the negation is reported
    let (tag, errs) = check(binary(unary(UnOp::Neg, string("a")), BinOp::Add, num(1.0)));
    assert_eq!(tag, TypeTag::Error);
    assert_eq!(errs.len(), 1);
}

#[test]
fn test_error_placeholder_is_silent() {
    let (tag, errs) = check(binary(Expr::error(sp()), BinOp::Mul, num(2.0)));
    assert_eq!(tag, TypeTag::Error);
    assert!(errs.is_empty());
}

#[test]
fn test_error_initializer_silences_later_uses() {
    let mut stmts = [
        var_decl("x", Some(binary(num(1.0), BinOp::Add, boolean(true)))),
        expr_stmt(binary(var("x"), BinOp::Mul, num(2.0))),
    ];
    assert_eq!(
        check_stmts(&mut stmts),
        vec!["Bad operand types for '+': 'NUMBER' and 'BOOL'"]
    );
}

#[test]
fn test_malformed_ternary_with_failed_operand_reports_once() {
    let e = Expr::new(
        ExprKind::Ternary {
            cond: Box::new(boolean(true)),
            then_: Box::new(unary(UnOp::Neg, string("a"))),
            else_: Box::new(Expr::error(sp())),
            colon: None,
        },
        sp(),
    );
    let (tag, errs) = check(e);
    assert_eq!(tag, TypeTag::Error);
    assert_eq!(errs, vec!["Bad type for negation: 'STRING'"]);
}

#[test]
fn test_error_statement_is_skipped() {
    let mut stmts = [Stmt::Error { span: sp() }, expr_stmt(num(1.0))];
    assert!(check_stmts(&mut stmts).is_empty());
}

// ============================================================================
// SCOPES
// ============================================================================

#[test]
fn test_var_without_initializer_is_nil() {
    let mut tc = TypeChecker::new();
    let mut diags = Diagnostics::new();
    tc.check_program(&mut [var_decl("x", None)], &mut diags);
    assert_eq!(tc.lookup("x"), Some(TypeTag::Nil));
}

#[test]
fn test_block_scope_is_dropped() {
    let mut stmts = [
        Stmt::Block {
            stmts: vec![var_decl("inner", Some(num(1.0)))],
            span: sp(),
        },
        expr_stmt(var("inner")),
    ];
    assert_eq!(check_stmts(&mut stmts), vec!["Undefined variable 'inner'"]);
}

#[test]
fn test_shadowing_uses_inner_tag() {
    let mut tc = TypeChecker::new();
    let mut diags = Diagnostics::new();
    let mut stmts = [
        var_decl("x", Some(num(1.0))),
        Stmt::Block {
            stmts: vec![
                var_decl("x", Some(string("s"))),
                expr_stmt(binary(var("x"), BinOp::Add, string("t"))),
            ],
            span: sp(),
        },
        expr_stmt(binary(var("x"), BinOp::Add, num(1.0))),
    ];
    tc.check_program(&mut stmts, &mut diags);
    assert!(diags.is_empty());
    assert_eq!(tc.lookup("x"), Some(TypeTag::Number));
}

#[test]
fn test_reassignment_retypes_binding() {
    let mut tc = TypeChecker::new();
    let mut diags = Diagnostics::new();
    let mut stmts = [
        var_decl("x", Some(num(1.0))),
        expr_stmt(assign("x", string("now a string"))),
    ];
    tc.check_program(&mut stmts, &mut diags);
    assert!(diags.is_empty());
    assert_eq!(tc.lookup("x"), Some(TypeTag::String));
}

#[test]
fn test_if_checks_both_branches() {
    let mut stmts = [Stmt::If {
        cond: boolean(true),
        then_: Box::new(expr_stmt(var("a"))),
        else_: Some(Box::new(expr_stmt(var("b")))),
        span: sp(),
    }];
    assert_eq!(
        check_stmts(&mut stmts),
        vec!["Undefined variable 'a'", "Undefined variable 'b'"]
    );
}

#[test]
fn test_environment_persists_between_programs() {
    let mut tc = TypeChecker::new();
    let mut diags = Diagnostics::new();
    tc.check_program(&mut [var_decl("x", Some(num(1.0)))], &mut diags);
    tc.check_program(&mut [expr_stmt(var("x"))], &mut diags);
    assert!(diags.is_empty());
}

// ============================================================================
// MEMOIZATION AND LIMITS
// ============================================================================

#[test]
fn test_known_tag_is_not_rechecked() {
    let mut tc = TypeChecker::new();
    let mut e = var("undefined_but_pretagged");
    e.ty = TypeTag::Number;
    assert_eq!(tc.check_expr(&mut e), TypeTag::Number);
    let mut diags = Diagnostics::new();
    tc.check_program(&mut Vec::<Stmt>::new(), &mut diags);
    assert!(diags.is_empty());
}

#[test]
fn test_deep_chain_hits_depth_limit() {
    std::thread::Builder::new()
        .stack_size(64 * 1024 * 1024)
        .spawn(|| {
            let mut e = num(0.0);
            for _ in 0..(MAX_EVAL_DEPTH + 10) {
                e = binary(e, BinOp::Add, num(1.0));
            }
            let (tag, errs) = check(e);
            assert_eq!(tag, TypeTag::Error);
            assert!(!errs.is_empty());
            assert!(errs
                .iter()
                .all(|m| m == "Expression nesting too deep (limit 512)"));
        })
        .unwrap()
        .join()
        .unwrap();
}

#[test]
fn test_type_error_carries_span() {
    let err = TypeError::UndefinedVariable {
        name: "x".into(),
        span: Span::new(2, 3, 2, 3),
    };
    assert_eq!(err.span(), Span::new(2, 3, 2, 3));
    assert_eq!(err.to_string(), "Undefined variable 'x'");
}
