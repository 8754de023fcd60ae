#[cfg(test)]
mod scanner_tests {
    use rox as lox;

    use lox::error::LoxError;
    use lox::scanner::*;
    use lox::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source);
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), expected.len());

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    #[test]
    fn test_scanner_01_symbols() {
        assert_token_sequence(
            "({*.,+*?:})",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::STAR, "*"),
                (TokenType::DOT, "."),
                (TokenType::COMMA, ","),
                (TokenType::PLUS, "+"),
                (TokenType::STAR, "*"),
                (TokenType::QUESTION, "?"),
                (TokenType::COLON, ":"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_arithmetic_statement() {
        let (tokens, errors) = scan("1 + 2 * 3;");

        assert!(errors.is_empty());
        let kinds: Vec<TokenType> = tokens.iter().map(|t| t.token_type).collect();
        assert_eq!(
            kinds,
            vec![
                TokenType::NUMBER,
                TokenType::PLUS,
                TokenType::NUMBER,
                TokenType::STAR,
                TokenType::NUMBER,
                TokenType::SEMICOLON,
                TokenType::EOF,
            ]
        );
        assert_eq!(tokens[0].literal, Some(Literal::Number(1.0)));
        assert_eq!(tokens[2].literal, Some(Literal::Number(2.0)));
        assert_eq!(tokens[4].literal, Some(Literal::Number(3.0)));
        assert_eq!(tokens[1].literal, None);
    }

    #[test]
    fn test_maximal_munch_operators() {
        assert_token_sequence(
            "!= ! == = <= < >= >",
            &[
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::BANG, "!"),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::EQUAL, "="),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::LESS, "<"),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::GREATER, ">"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_keywords_and_identifiers() {
        assert_token_sequence(
            "var breaker = break; fun _f2 while",
            &[
                (TokenType::VAR, "var"),
                (TokenType::IDENTIFIER, "breaker"),
                (TokenType::EQUAL, "="),
                (TokenType::BREAK, "break"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::FUN, "fun"),
                (TokenType::IDENTIFIER, "_f2"),
                (TokenType::WHILE, "while"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_numbers() {
        let (tokens, _) = scan("12 3.5 7.");

        assert_eq!(tokens[0].literal, Some(Literal::Number(12.0)));
        assert_eq!(tokens[1].literal, Some(Literal::Number(3.5)));
        // A trailing dot is not part of the number.
        assert_eq!(tokens[2].lexeme, "7");
        assert_eq!(tokens[3].token_type, TokenType::DOT);
    }

    #[test]
    fn test_multiline_string_tracks_lines() {
        let (tokens, errors) = scan("\"one\ntwo\" x");

        assert!(errors.is_empty());
        assert_eq!(tokens[0].token_type, TokenType::STRING);
        assert_eq!(tokens[0].literal, Some(Literal::Str("one\ntwo".to_string())));
        assert_eq!(tokens[1].lexeme, "x");
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn test_unterminated_string_does_not_abort() {
        let (tokens, errors) = scan("print \"oops");

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message(), "Unterminated string.");
        assert_eq!(tokens.last().map(|t| t.token_type), Some(TokenType::EOF));
    }

    #[test]
    fn test_comments_are_skipped() {
        let source = "a // line comment\n/* block\n comment */ b";
        let (tokens, errors) = scan(source);

        assert!(errors.is_empty());
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].lexeme, "a");
        assert_eq!(tokens[1].lexeme, "b");
        assert_eq!(tokens[1].line, 3);
    }

    #[test]
    fn test_unterminated_block_comment() {
        let (tokens, errors) = scan("a /* never\nclosed");

        assert_eq!(tokens.len(), 2);
        assert_eq!(
            errors,
            vec![LoxError::lex(2, "Unterminated block comment.")]
        );
    }

    #[test]
    fn test_unexpected_chars_token_sequence() {
        let source = ",.$(#";
        let scanner = Scanner::new(source);

        let results: Vec<_> = scanner.collect();

        // 0: COMMA ','
        // 1: DOT '.'
        // 2: Error for '$'
        // 3: LEFT_PAREN '('
        // 4: Error for '#'
        // 5: EOF
        assert_eq!(results.len(), 6, "Expected 6 items in result");

        assert_token_matches(&results[0], TokenType::COMMA, ",");
        assert_token_matches(&results[1], TokenType::DOT, ".");
        assert_token_matches(&results[3], TokenType::LEFT_PAREN, "(");
        assert_token_matches(&results[5], TokenType::EOF, "");

        let error_count = results.iter().filter(|r| r.is_err()).count();
        assert_eq!(error_count, 2, "Expected 2 error messages");

        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert!(
                err.to_string().contains("Unexpected character"),
                "Error message should contain 'Unexpected character', got: {}",
                err
            );
        }

        fn assert_token_matches(
            result: &Result<Token, LoxError>,
            expected_type: TokenType,
            expected_lexeme: &str,
        ) {
            match result {
                Ok(token) => {
                    assert_eq!(
                        token.token_type, expected_type,
                        "Expected token type {:?}, got {:?}",
                        expected_type, token.token_type
                    );
                    assert_eq!(
                        token.lexeme, expected_lexeme,
                        "Expected lexeme '{}', got '{}'",
                        expected_lexeme, token.lexeme
                    );
                }
                Err(e) => panic!("Expected token but got error: {}", e),
            }
        }
    }

    #[test]
    fn test_non_ascii_character_reports_once() {
        let (tokens, errors) = scan("a é b");

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "[line 1] Error: Unexpected character: é");
        assert_eq!(tokens.len(), 3);
    }

    #[test]
    fn test_token_display() {
        let (tokens, _) = scan("x 42 \"hi\"");

        assert_eq!(tokens[0].to_string(), "IDENTIFIER x null");
        assert_eq!(tokens[1].to_string(), "NUMBER 42 42.0");
        assert_eq!(tokens[2].to_string(), "STRING \"hi\" hi");
        assert_eq!(tokens[3].to_string(), "EOF  null");
    }
}
