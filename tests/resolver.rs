#[cfg(test)]
mod resolver_tests {
    use std::collections::BTreeMap;

    use rox as lox;

    use lox::error::LoxError;
    use lox::interpreter::Interpreter;
    use lox::parser::parse;
    use lox::resolver::resolve;
    use lox::scanner::scan;
    use lox::stmt::Stmt;

    fn parse_source(source: &str) -> Vec<Stmt> {
        let (tokens, lex_errors) = scan(source);
        assert!(lex_errors.is_empty(), "unexpected lex errors: {:?}", lex_errors);
        let (statements, errors) = parse(&tokens);
        assert!(errors.is_empty(), "unexpected parse errors: {:?}", errors);
        statements
    }

    fn resolve_source(source: &str) -> Result<(), Vec<LoxError>> {
        let statements = parse_source(source);
        let mut interpreter = Interpreter::with_output(Vec::new());
        resolve(&mut interpreter, &statements)
    }

    fn messages(errors: &[LoxError]) -> Vec<String> {
        errors.iter().map(|e| e.to_string()).collect()
    }

    /// Hop counts in node order, so two resolutions can be compared.
    fn hop_counts(statements: &[Stmt]) -> Vec<usize> {
        let mut interpreter = Interpreter::with_output(Vec::new());
        resolve(&mut interpreter, statements).expect("program should resolve");

        let ordered: BTreeMap<_, _> = interpreter.locals().iter().collect();
        ordered.into_values().copied().collect()
    }

    #[test]
    fn test_empty_program_resolves() {
        assert!(resolve_source("").is_ok());
    }

    #[test]
    fn test_read_in_own_initializer() {
        let errors = resolve_source("var a = \"x\"; { print a; var a = a; }").unwrap_err();

        assert_eq!(
            messages(&errors),
            vec!["[line 1] Error at 'a': Cannot read local variable in its own initializer"]
        );
    }

    #[test]
    fn test_global_self_reference_is_allowed() {
        assert!(resolve_source("var a = 1; var a = a;").is_ok());
    }

    #[test]
    fn test_redeclaration_in_same_scope() {
        let errors = resolve_source("{ var a = 1; var a = 2; }").unwrap_err();

        assert_eq!(
            messages(&errors),
            vec!["[line 1] Error at 'a': Variable with this name already declared in this scope"]
        );
    }

    #[test]
    fn test_errors_accumulate() {
        let source = "{ var a = 1; var a = 2; }\nfun f(x, x) {}\nreturn 1;";
        let errors = resolve_source(source).unwrap_err();

        assert_eq!(errors.len(), 3);
        assert_eq!(errors[1].line(), 2);
        assert_eq!(errors[2].message(), "Cannot return from top-level code.");
    }

    #[test]
    fn test_hop_counts() {
        let source = "{ var a = 1; { var b = 2; print a; print b; } }";
        let statements = parse_source(source);

        // `a` is one scope out, `b` is in the innermost one.
        assert_eq!(hop_counts(&statements), vec![1, 0]);
    }

    #[test]
    fn test_globals_stay_unresolved() {
        let statements = parse_source("var g = 1; print g; g = 2;");

        assert!(hop_counts(&statements).is_empty());
    }

    #[test]
    fn test_function_params_share_body_scope() {
        let statements = parse_source("fun f(n) { var m = n; return m; }");

        assert_eq!(hop_counts(&statements), vec![0, 0]);
    }

    #[test]
    fn test_closure_reference_counts_function_scope() {
        let source = "fun outer() { var i = 0; fun inner() { i = i + 1; } }";
        let statements = parse_source(source);

        // The assignment to `i` and the read of `i` are both one scope out.
        let counts = hop_counts(&statements);
        assert_eq!(counts.len(), 2);
        assert!(counts.iter().all(|&d| d == 1));
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let source = "fun counter() { var i = 0; fun inc() { i = i + 1; return i; } return inc; }\n\
                      { var x = 1; { var y = x; print y; } }";
        let statements = parse_source(source);

        let mut first = Interpreter::with_output(Vec::new());
        let mut second = Interpreter::with_output(Vec::new());
        resolve(&mut first, &statements).unwrap();
        resolve(&mut second, &statements).unwrap();

        assert_eq!(first.locals(), second.locals());
        assert!(!first.locals().is_empty());
    }
}
