use plox_ast::diag::Diagnostics;
use plox_parse::token::TokKind;
use plox_parse::{parse, scan};
use proptest::prelude::*;

fn eof_count(src: &str) -> (usize, bool) {
    let mut diags = Diagnostics::new();
    let toks = scan(src, &mut diags);
    let count = toks.iter().filter(|t| t.kind == TokKind::Eof).count();
    let last_is_eof = toks.last().map(|t| t.kind) == Some(TokKind::Eof);
    (count, last_is_eof)
}

proptest! {
    #[test]
    fn any_text_scans_to_single_trailing_eof(src in "\\PC{0,80}") {
        let (count, last_is_eof) = eof_count(&src);
        prop_assert_eq!(count, 1);
        prop_assert!(last_is_eof);
    }

    #[test]
    fn lox_like_text_always_parses_to_completion(
        src in "[a-z0-9 (){};=+*/<>!\"?:.,\n-]{0,64}"
    ) {
        let mut diags = Diagnostics::new();
        let toks = scan(&src, &mut diags);
        let stmts = parse(toks, &mut diags);
        // every statement that failed left a diagnostic behind
        if stmts.iter().any(|s| s.is_error()) {
            prop_assert!(!diags.is_empty());
        }
    }
}
