#[cfg(test)]
mod interpreter_tests {
    use loxwalk as lox;

    use lox::error::LoxError;
    use lox::run_capture;
    use lox::Lox;

    /// Runs `source` and returns stdout, asserting no error of any kind.
    fn run_ok(source: &str) -> String {
        let (output, diagnostics) = run_capture(source);
        assert_eq!(
            diagnostics.exit_code(),
            0,
            "unexpected errors: {:?}",
            diagnostics.iter().collect::<Vec<_>>()
        );
        output
    }

    /// Runs `source`, expecting a runtime error; returns (stdout, rendered error).
    fn run_failing(source: &str) -> (String, String) {
        let (output, diagnostics) = run_capture(source);
        assert_eq!(diagnostics.exit_code(), 70);

        let error = diagnostics
            .runtime_error()
            .map(ToString::to_string)
            .unwrap_or_default();
        (output, error)
    }

    #[test]
    fn test_arithmetic_and_stringify() {
        let output = run_ok("print 1 + 2; print 7 / 2; print -3 * 2; print 10 - 0.5;");
        assert_eq!(output, "3\n3.5\n-6\n9.5\n");
    }

    #[test]
    fn test_strings_booleans_and_nil() {
        let output = run_ok(
            r#"
            print "foo" + "bar";
            print !nil;
            print !0;
            print nil;
            print "" == "";
            "#,
        );
        assert_eq!(output, "foobar\ntrue\nfalse\nnil\ntrue\n");
    }

    #[test]
    fn test_equality_across_types() {
        let output = run_ok(
            r#"
            print "1" == 1;
            print nil == false;
            print nil == nil;
            print "a" == "a";
            print 1 != "1";
            print 2 >= 2;
            print 1 >= 2;
            "#,
        );
        assert_eq!(output, "false\nfalse\ntrue\ntrue\ntrue\ntrue\nfalse\n");
    }

    #[test]
    fn test_logical_operators_return_operands() {
        let output = run_ok(r#"print nil or "yes"; print "a" and 2; print false and boom;"#);
        assert_eq!(output, "yes\n2\nfalse\n");
    }

    #[test]
    fn test_block_shadowing() {
        let output = run_ok(
            r#"
            var a = 1;
            {
                var a = 2;
                print a;
            }
            print a;
            "#,
        );
        assert_eq!(output, "2\n1\n");
    }

    #[test]
    fn test_closures_capture_their_scope() {
        let output = run_ok(
            r#"
            fun makeCounter() {
                var i = 0;
                fun count() {
                    i = i + 1;
                    print i;
                }
                return count;
            }
            var counter = makeCounter();
            counter();
            counter();
            "#,
        );
        assert_eq!(output, "1\n2\n");
    }

    #[test]
    fn test_resolution_is_static() {
        // The closure keeps seeing the global `a` even after a local shadows it.
        let output = run_ok(
            r#"
            var a = "global";
            {
                fun showA() { print a; }
                showA();
                var a = "block";
                showA();
            }
            "#,
        );
        assert_eq!(output, "global\nglobal\n");
    }

    #[test]
    fn test_control_flow_and_recursion() {
        let output = run_ok(
            r#"
            fun fib(n) {
                if (n < 2) return n;
                return fib(n - 2) + fib(n - 1);
            }
            for (var i = 0; i < 8; i = i + 1) {
                if (i == 7) print fib(i);
            }
            var n = 0;
            while (n < 3) n = n + 1;
            print n;
            "#,
        );
        assert_eq!(output, "13\n3\n");
    }

    #[test]
    fn test_return_unwinds_loops() {
        let output = run_ok(
            r#"
            fun first() {
                while (true) {
                    for (;;) { return "out"; }
                }
            }
            print first();
            fun nothing() {}
            print nothing();
            "#,
        );
        assert_eq!(output, "out\nnil\n");
    }

    #[test]
    fn test_callable_display() {
        let output = run_ok(
            r#"
            fun f() {}
            class C { m() {} }
            print f;
            print clock;
            print C;
            print C();
            print C().m;
            "#,
        );
        assert_eq!(
            output,
            "<fn f>\n<native fn clock>\n<class C>\n<class instance C>\n<fn m>\n"
        );
    }

    #[test]
    fn test_clock_returns_seconds() {
        assert_eq!(run_ok("print clock() > 1000000000;"), "true\n");
    }

    #[test]
    fn test_classes_fields_and_methods() {
        let output = run_ok(
            r#"
            class Point {
                init(x, y) {
                    this.x = x;
                    this.y = y;
                }
                sum() { return this.x + this.y; }
            }
            var p = Point(1, 2);
            print p.sum();
            p.x = 10;
            print p.sum();
            var m = p.sum;
            p.y = 5;
            print m();
            "#,
        );
        assert_eq!(output, "3\n12\n15\n");
    }

    #[test]
    fn test_initializer_returns_this() {
        let output = run_ok(
            r#"
            class Foo {
                init() {
                    this.n = 1;
                    return;
                }
            }
            var foo = Foo();
            print foo.init() == foo;
            print foo.n;
            "#,
        );
        assert_eq!(output, "true\n1\n");
    }

    #[test]
    fn test_inheritance_and_super() {
        let output = run_ok(
            r#"
            class A {
                method() { print "A method"; }
                name() { return "A"; }
            }
            class B < A {
                method() {
                    print "B method";
                    super.method();
                }
            }
            class C < B {}
            C().method();
            print C().name();
            "#,
        );
        assert_eq!(output, "B method\nA method\nA\n");
    }

    #[test]
    fn test_arity_mismatch() {
        let (output, error) = run_failing("fun f(a, b) {}\nprint \"before\";\nf(1);\nprint \"after\";");

        assert_eq!(output, "before\n");
        assert_eq!(error, "Expected 2 arguments but got 1.\n[line 3]");

        let (output, error) = run_failing("fun f(a, b) {}\nf(1, 2, 3);");

        assert_eq!(output, "");
        assert_eq!(error, "Expected 2 arguments but got 3.\n[line 2]");
    }

    #[test]
    fn test_loop_closures_share_one_counter() {
        // The desugared `for` declares `i` once, outside the body, so every
        // closure made in the loop sees its final value.
        let output = run_ok(
            r#"
            var fs;
            var gs;
            for (var i = 0; i < 3; i = i + 1) {
                fun f() { print i; }
                fun g() { print i * 10; }
                if (i == 0) fs = f;
                if (i == 2) gs = g;
            }
            fs();
            gs();
            "#,
        );
        assert_eq!(output, "3\n30\n");
    }

    #[test]
    fn test_non_finite_results_print_lowercase() {
        assert_eq!(run_ok("print 0 / 0; print 1 / 0; print -1 / 0;"), "nan\ninf\n-inf\n");
    }

    struct BrokenPipe;

    impl std::io::Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_output_failure_ends_the_run() {
        let mut session = Lox::with_output(Box::new(BrokenPipe));
        let diagnostics = session.run("print 1;");

        assert!(!diagnostics.had_error());
        assert_eq!(diagnostics.exit_code(), 70);
        assert!(matches!(diagnostics.runtime_error(), Some(LoxError::Io(msg)) if msg == "pipe closed"));
    }

    #[test]
    fn test_class_arity_follows_init() {
        let (_, error) = run_failing("class A { init(x) {} }\nA();");
        assert_eq!(error, "Expected 1 arguments but got 0.\n[line 2]");

        let (_, error) = run_failing("class B {}\nB(1);");
        assert_eq!(error, "Expected 0 arguments but got 1.\n[line 2]");
    }

    #[test]
    fn test_operand_errors() {
        let (_, error) = run_failing("print 1 + \"a\";");
        assert_eq!(error, "Operands must be two numbers or two strings.\n[line 1]");

        let (_, error) = run_failing("print -\"a\";");
        assert_eq!(error, "Operand must be a number.\n[line 1]");

        let (_, error) = run_failing("print 1 < \"2\";");
        assert_eq!(error, "Operands must be numbers.\n[line 1]");
    }

    #[test]
    fn test_undefined_names() {
        let (_, error) = run_failing("print missing;");
        assert_eq!(error, "Undefined variable 'missing'.\n[line 1]");

        let (_, error) = run_failing("missing = 1;");
        assert_eq!(error, "Undefined variable 'missing'.\n[line 1]");

        let (_, error) = run_failing("class A {}\nprint A().nope;");
        assert_eq!(error, "Undefined property 'nope'.\n[line 2]");
    }

    #[test]
    fn test_property_access_on_non_instances() {
        let (_, error) = run_failing("var s = \"str\";\nprint s.length;");
        assert_eq!(error, "Only instances have properties.\n[line 2]");

        let (_, error) = run_failing("var n = 1;\nn.field = 2;");
        assert_eq!(error, "Only instances have fields.\n[line 2]");

        let (_, error) = run_failing("\"not callable\"();");
        assert_eq!(error, "Can only call functions and classes.\n[line 1]");
    }

    #[test]
    fn test_superclass_must_be_a_class() {
        let (_, error) = run_failing("var NotAClass = 1;\nclass A < NotAClass {}");
        assert_eq!(error, "Superclass must be a class.\n[line 2]");
    }

    #[test]
    fn test_static_errors_prevent_execution() {
        let (output, diagnostics) = run_capture("print \"never\";\nprint 1 +;");

        assert_eq!(output, "");
        assert_eq!(diagnostics.exit_code(), 65);

        let (output, diagnostics) = run_capture("print \"never\";\nreturn 1;");

        assert_eq!(output, "");
        assert_eq!(diagnostics.exit_code(), 65);
    }

    #[test]
    fn test_session_keeps_globals_between_runs() {
        let mut buffer: Vec<u8> = Vec::new();

        {
            let mut session = Lox::with_output(Box::new(&mut buffer));

            assert_eq!(session.run("var a = 1; fun inc() { a = a + 1; return a; }").exit_code(), 0);
            assert_eq!(session.run("print inc();").exit_code(), 0);

            // A failing line does not poison the session.
            assert_eq!(session.run("print nope;").exit_code(), 70);
            assert_eq!(session.run("{ var b = inc(); print b; }").exit_code(), 0);
        }

        assert_eq!(String::from_utf8_lossy(&buffer), "2\n3\n");
    }
}
