#[cfg(test)]
mod parser_tests {
    use loxwalk as lox;

    use lox::ast_printer::AstPrinter;
    use lox::error::{Diagnostics, LoxError};
    use lox::parser::{Parser, Stmt};
    use lox::scanner::scan_tokens;

    fn parse(source: &str) -> (Vec<Stmt<'_>>, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let tokens = scan_tokens(source, &mut diagnostics);
        let statements = Parser::new(tokens).parse(&mut diagnostics);
        (statements, diagnostics)
    }

    fn printed(source: &str) -> Vec<String> {
        let (statements, diagnostics) = parse(source);
        assert!(
            !diagnostics.had_error(),
            "unexpected errors: {:?}",
            diagnostics.errors()
        );
        statements.iter().map(AstPrinter::print_stmt).collect()
    }

    fn messages(diagnostics: &Diagnostics) -> Vec<String> {
        diagnostics.errors().iter().map(LoxError::message).collect()
    }

    #[test]
    fn test_precedence_and_grouping() {
        assert_eq!(
            printed("1 + 2 * 3 - -4;"),
            vec!["(; (- (+ 1.0 (* 2.0 3.0)) (- 4.0)))"]
        );
        assert_eq!(
            printed("(1 + 2) * 3 >= 4 == !true;"),
            vec!["(; (== (>= (* (group (+ 1.0 2.0)) 3.0) 4.0) (! true)))"]
        );
    }

    #[test]
    fn test_logical_and_assignment_are_right_shaped() {
        assert_eq!(
            printed("a = b = c or d and e;"),
            vec!["(; (= a (= b (or c (and d e)))))"]
        );
    }

    #[test]
    fn test_calls_and_properties() {
        assert_eq!(
            printed("f(1, \"two\")(3); obj.field.inner = nil;"),
            vec![
                "(; (call (call f 1.0 two) 3.0))",
                "(; (= (. (. obj field) inner) nil))",
            ]
        );
    }

    #[test]
    fn test_declarations() {
        assert_eq!(
            printed("var a; var b = 1.5; fun add(x, y) { return x + y; }"),
            vec![
                "(var a)",
                "(var b = 1.5)",
                "(fun add (x y) (return (+ x y)))",
            ]
        );
    }

    #[test]
    fn test_class_declaration() {
        assert_eq!(
            printed("class B < A { init(n) { this.n = n; } get() { return super.get(); } }"),
            vec![
                "(class B < A (method init (n) (; (= (. this n) n))) \
                 (method get () (return (call (super get)))))"
            ]
        );
    }

    #[test]
    fn test_if_else_and_while() {
        assert_eq!(
            printed("if (x) print 1; else { print 2; } while (y) y = false;"),
            vec![
                "(if-else x (print 1.0) (block (print 2.0)))",
                "(while y (; (= y false)))",
            ]
        );
    }

    #[test]
    fn test_for_desugars_to_while() {
        assert_eq!(
            printed("for (var i = 0; i < 3; i = i + 1) print i;"),
            vec!["(block (var i = 0.0) (while (< i 3.0) (block (print i) (; (= i (+ i 1.0))))))"]
        );

        // No clauses at all loops forever on `true`.
        assert_eq!(printed("for (;;) return;"), vec!["(while true (return))"]);
    }

    #[test]
    fn test_invalid_assignment_target_does_not_stop_parsing() {
        let (statements, diagnostics) = parse("1 + 2 = 3; print 4;");

        assert_eq!(messages(&diagnostics), vec!["Invalid assignment target."]);
        assert_eq!(
            diagnostics.errors()[0].to_string(),
            "[line 1] Error at '=': Invalid assignment target."
        );

        // Both statements survive.
        assert_eq!(statements.len(), 2);
    }

    #[test]
    fn test_recovers_and_reports_every_statement_error() {
        let source = "var = 1;\nprint (;\nvar ok = 2;\nprint ok";
        let (statements, diagnostics) = parse(source);

        let rendered: Vec<String> = diagnostics.errors().iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec![
                "[line 1] Error at '=': Expect variable name.",
                "[line 2] Error at ';': Expect expression.",
                "[line 4] Error at end: Expect ';' after value.",
            ]
        );

        assert_eq!(statements.len(), 1);
        assert_eq!(AstPrinter::print_stmt(&statements[0]), "(var ok = 2.0)");
        assert_eq!(diagnostics.exit_code(), 65);
    }

    #[test]
    fn test_too_many_parameters_and_arguments() {
        let params: Vec<String> = (0..256).map(|i| format!("p{}", i)).collect();
        let args: Vec<String> = (0..256).map(|i| i.to_string()).collect();

        let source = format!(
            "fun f({}) {{}}\nf({});",
            params.join(", "),
            args.join(", ")
        );
        let (statements, diagnostics) = parse(&source);

        assert_eq!(
            messages(&diagnostics),
            vec![
                "Can't have more than 255 parameters.",
                "Can't have more than 255 arguments.",
            ]
        );

        // The limits are reported without abandoning the declarations.
        assert_eq!(statements.len(), 2);
    }

    #[test]
    fn test_exactly_255_parameters_is_fine() {
        let params: Vec<String> = (0..255).map(|i| format!("p{}", i)).collect();
        let source = format!("fun f({}) {{}}", params.join(", "));

        let (statements, diagnostics) = parse(&source);

        assert!(!diagnostics.had_error());
        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn test_missing_class_body_brace() {
        let (_, diagnostics) = parse("class A print 1;");

        assert_eq!(messages(&diagnostics), vec!["Expect '{' before class body."]);
    }
}
