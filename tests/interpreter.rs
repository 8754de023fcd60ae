#[cfg(test)]
mod interpreter_tests {
    use std::io::{self, Write};
    use std::thread;

    use rox as lox;

    use lox::error::{RunError, RuntimeErrorKind, EXIT_FORMAT_ERROR, EXIT_RUNTIME_ERROR};
    use lox::interpreter::{Interpreter, MAX_CALL_DEPTH};
    use lox::value::Value;

    /// Output target whose every write fails.
    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Run each source in turn on one interpreter, on a thread with room for
    /// deep recursion. Returns each run's output or error.
    fn run_deep(sources: &'static [&'static str]) -> Vec<Result<String, RunError>> {
        thread::Builder::new()
            .stack_size(64 * 1024 * 1024)
            .spawn(move || {
                let mut interpreter = Interpreter::with_output(Vec::new());
                sources
                    .iter()
                    .map(|source| {
                        let result = lox::run(source, &mut interpreter);
                        let output = String::from_utf8(std::mem::take(interpreter.output_mut()))
                            .expect("utf-8 output");
                        result.map(|_| output)
                    })
                    .collect()
            })
            .expect("spawn interpreter thread")
            .join()
            .expect("interpreter thread panicked")
    }

    /// Run `source` and return everything it printed.
    fn run_program(source: &str) -> String {
        let mut interpreter = Interpreter::with_output(Vec::new());
        if let Err(e) = lox::run(source, &mut interpreter) {
            panic!("program failed: {:?}", e);
        }
        String::from_utf8(interpreter.into_output()).expect("Output should be valid UTF-8")
    }

    /// Run `source`, expecting a failure; returns it with the output so far.
    fn run_failing(source: &str) -> (RunError, String) {
        let mut interpreter = Interpreter::with_output(Vec::new());
        let err = match lox::run(source, &mut interpreter) {
            Ok(value) => panic!("expected failure, program returned {}", value),
            Err(e) => e,
        };
        let output = String::from_utf8(interpreter.into_output()).expect("utf-8 output");
        (err, output)
    }

    fn runtime_kind(err: RunError) -> RuntimeErrorKind {
        match err {
            RunError::Runtime(e) => e.kind,
            RunError::Static(errors) => panic!("expected runtime error, got {:?}", errors),
        }
    }

    #[test]
    fn test_empty_program() {
        assert_eq!(run_program(""), "");
    }

    #[test]
    fn test_precedence() {
        assert_eq!(run_program("print 1 + 2 * 3;"), "7\n");
    }

    #[test]
    fn test_block_scoping() {
        assert_eq!(
            run_program("var a = 1; { var a = 2; print a; } print a;"),
            "2\n1\n"
        );
    }

    #[test]
    fn test_closure_counter() {
        let source = r#"
        fun counter() {
            var i = 0;
            fun inc() {
                i = i + 1;
                return i;
            }
            return inc;
        }

        var c = counter();
        print c();
        print c();

        var d = counter();
        print d();
        print c();
        "#;

        assert_eq!(run_program(source), "1\n2\n1\n3\n");
    }

    #[test]
    fn test_closures_share_captured_frame() {
        let source = r#"
        var get;
        var set;
        fun make() {
            var x = "before";
            fun g() { return x; }
            fun s(v) { x = v; }
            get = g;
            set = s;
        }
        make();
        set("after");
        print get();
        "#;

        assert_eq!(run_program(source), "after\n");
    }

    #[test]
    fn test_functions_cant_break_scope() {
        let source = r#"
        var a = "global";
        {
            fun showA() {
                print a;
            }
            showA();
            var a = "block";
            showA();
        }
        "#;

        assert_eq!(run_program(source), "global\nglobal\n");
    }

    #[test]
    fn test_recursion() {
        let source = r#"
        fun fib(n) {
            if (n <= 1) return n;
            return fib(n - 1) + fib(n - 2);
        }

        for (var i = 0; i < 10; i = i + 1) {
            print fib(i);
        }
        "#;

        assert_eq!(run_program(source), "0\n1\n1\n2\n3\n5\n8\n13\n21\n34\n");
    }

    #[test]
    fn test_break_in_for() {
        let source = "for (var i = 0; i < 3; i = i + 1) { if (i == 1) break; print i; }";

        assert_eq!(run_program(source), "0\n");
    }

    #[test]
    fn test_break_only_leaves_innermost_loop() {
        let source = r#"
        var i = 0;
        while (i < 2) {
            while (true) break;
            print i;
            i = i + 1;
        }
        "#;

        assert_eq!(run_program(source), "0\n1\n");
    }

    #[test]
    fn test_return_from_inside_loop() {
        let source = r#"
        fun first() {
            while (true) {
                return "done";
            }
        }
        print first();
        "#;

        assert_eq!(run_program(source), "done\n");
    }

    #[test]
    fn test_function_without_return_yields_nil() {
        assert_eq!(run_program("fun f() {} print f();"), "nil\n");
    }

    #[test]
    fn test_string_concatenation() {
        assert_eq!(run_program("print 1 + \"x\";"), "1x\n");
        assert_eq!(run_program("print \"a\" + true;"), "atrue\n");
        assert_eq!(run_program("print \"a\" + \"b\";"), "ab\n");
    }

    #[test]
    fn test_equality_never_coerces() {
        assert_eq!(run_program("print \"a\" == 1;"), "false\n");
        assert_eq!(run_program("print nil == false;"), "false\n");
        assert_eq!(run_program("print nil == nil;"), "true\n");
        assert_eq!(run_program("print 1 != 2;"), "true\n");
    }

    #[test]
    fn test_logical_short_circuit() {
        let source = r#"
        var called = false;
        fun touch() { called = true; return true; }
        print "left" or touch();
        print nil and touch();
        print called;
        print nil or "right";
        "#;

        assert_eq!(run_program(source), "left\nnil\nfalse\nright\n");
    }

    #[test]
    fn test_ternary_evaluates_one_branch() {
        let source = r#"
        var hits = 0;
        fun hit() { hits = hits + 1; return hits; }
        print true ? "yes" : hit();
        print false ? hit() : "no";
        print hits;
        "#;

        assert_eq!(run_program(source), "yes\nno\n0\n");
    }

    #[test]
    fn test_unary() {
        assert_eq!(run_program("print -3; print !nil; print !0;"), "-3\ntrue\nfalse\n");
    }

    #[test]
    fn test_print_function() {
        assert_eq!(run_program("fun add(a, b) {} print add;"), "<fn add(a, b)>\n");
    }

    #[test]
    fn test_final_expression_value() {
        let mut interpreter = Interpreter::with_output(Vec::new());
        let value = lox::run("var a = 20; a + 1.5;", &mut interpreter).unwrap();

        assert_eq!(value, Value::Number(21.5));
    }

    #[test]
    fn test_globals_persist_across_runs() {
        let mut interpreter = Interpreter::with_output(Vec::new());
        lox::run("fun make() { var n = 10; fun get() { return n; } return get; }", &mut interpreter)
            .unwrap();
        lox::run("var g = make();", &mut interpreter).unwrap();
        let value = lox::run("g();", &mut interpreter).unwrap();

        assert_eq!(value, Value::Number(10.0));
    }

    #[test]
    fn test_runtime_error_restores_enclosing_frame() {
        let mut interpreter = Interpreter::with_output(Vec::new());
        lox::run("var a = \"g\";", &mut interpreter).unwrap();

        let err = lox::run("{ var a = \"local\"; print -a; }", &mut interpreter).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_RUNTIME_ERROR);

        lox::run("print a;", &mut interpreter).unwrap();
        let output = String::from_utf8(interpreter.into_output()).unwrap();
        assert_eq!(output, "g\n");
    }

    #[test]
    fn test_unbounded_recursion_is_a_runtime_error() {
        let results = run_deep(&[
            "fun f(n) {\n  return f(n + 1);\n}\nf(0);",
            "fun down(n) { if (n == 0) return 0; return down(n - 1); } print down(10);",
        ]);

        match &results[0] {
            Err(RunError::Runtime(e)) => {
                assert!(matches!(e.kind, RuntimeErrorKind::StackOverflow));
                assert_eq!(e.line, 2);
                assert_eq!(e.lexeme, ")");
            }
            other => panic!("expected a stack overflow, got {:?}", other),
        }
        assert_eq!(results[0].as_ref().unwrap_err().exit_code(), EXIT_RUNTIME_ERROR);

        // The depth counter unwinds with the error.
        assert_eq!(results[1].as_ref().unwrap(), "0\n");
    }

    #[test]
    fn test_recursion_below_the_depth_limit() {
        assert!(MAX_CALL_DEPTH > 200);

        let results = run_deep(&[
            "fun down(n) { if (n == 0) return \"bottom\"; return down(n - 1); } print down(200);",
        ]);

        assert_eq!(results[0].as_ref().unwrap(), "bottom\n");
    }

    #[test]
    fn test_failed_print_reports_the_print_keyword() {
        let mut interpreter = Interpreter::with_output(BrokenPipe);
        let err = lox::run("var x = 1;\nprint 1;", &mut interpreter).unwrap_err();

        match err {
            RunError::Runtime(e) => {
                assert_eq!(e.line, 2);
                assert_eq!(e.lexeme, "print");
                assert!(matches!(e.kind, RuntimeErrorKind::Output(_)));
            }
            other => panic!("expected an output error, got {:?}", other),
        }
    }

    #[test]
    fn test_division_by_zero() {
        let (err, output) = run_failing("print 1 / 0;");

        assert_eq!(err.exit_code(), EXIT_RUNTIME_ERROR);
        assert_eq!(err.to_string(), "[line 1] Error at '/': Division by zero.");
        assert!(output.is_empty());
    }

    #[test]
    fn test_runtime_error_stops_the_program() {
        let (err, output) = run_failing("print 1;\nprint -\"a\";\nprint 2;");

        assert_eq!(output, "1\n");
        assert_eq!(
            err.to_string(),
            "[line 2] Error at '-': Operand must be a number."
        );
    }

    #[test]
    fn test_operand_type_errors() {
        let (err, _) = run_failing("print 1 < \"2\";");
        assert!(matches!(runtime_kind(err), RuntimeErrorKind::OperandsMustBeNumbers));

        let (err, _) = run_failing("print nil + 1;");
        assert!(matches!(runtime_kind(err), RuntimeErrorKind::InvalidAddition));
    }

    #[test]
    fn test_undefined_variable() {
        let (err, _) = run_failing("print ghost;");
        assert!(matches!(runtime_kind(err), RuntimeErrorKind::UndefinedVariable(ref n) if n == "ghost"));

        let (err, _) = run_failing("ghost = 1;");
        assert!(matches!(runtime_kind(err), RuntimeErrorKind::UndefinedVariable(_)));
    }

    #[test]
    fn test_arity_mismatch() {
        let (err, _) = run_failing("fun f(a, b) {}\nf(1);");

        assert_eq!(
            err.to_string(),
            "[line 2] Error at ')': Expected 2 arguments but got 1."
        );
    }

    #[test]
    fn test_calling_a_non_function() {
        let (err, _) = run_failing("\"nope\"();");

        assert!(matches!(runtime_kind(err), RuntimeErrorKind::NotCallable));
    }

    #[test]
    fn test_static_errors_prevent_execution() {
        let (err, output) = run_failing("print 1;\nbreak;\nvar = 2;");

        assert!(output.is_empty());
        assert_eq!(err.exit_code(), EXIT_FORMAT_ERROR);
        match err {
            RunError::Static(errors) => assert_eq!(errors.len(), 2),
            other => panic!("expected static errors, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_error_prevents_execution() {
        let (err, output) = run_failing("var a = \"x\"; { print a; var a = a; }");

        assert!(output.is_empty());
        assert_eq!(err.exit_code(), EXIT_FORMAT_ERROR);
    }

    #[test]
    fn test_lex_and_parse_errors_reported_together() {
        let (err, _) = run_failing("var x = @;\nprint (;");

        match err {
            RunError::Static(errors) => {
                assert_eq!(errors.len(), 3, "{:?}", errors);
                assert_eq!(errors[0].to_string(), "[line 1] Error: Unexpected character: @");
            }
            other => panic!("expected static errors, got {:?}", other),
        }
    }
}
