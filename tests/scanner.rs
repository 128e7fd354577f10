#[cfg(test)]
mod scanner_tests {
    use loxwalk as lox;

    use lox::error::{Diagnostics, LoxError};
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
            "({*.,+*})",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::STAR, "*"),
                (TokenType::DOT, "."),
                (TokenType::COMMA, ","),
                (TokenType::PLUS, "+"),
                (TokenType::STAR, "*"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_02_two_char_operators() {
        assert_token_sequence(
            "! != = == < <= > >=",
            &[
                (TokenType::BANG, "!"),
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::EQUAL, "="),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::LESS, "<"),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::GREATER, ">"),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_03_comments_and_lines() {
        let source = "// nothing here\n/ // trailing\nvar";
        let tokens: Vec<_> = Scanner::new(source).filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].token_type, TokenType::SLASH);
        assert_eq!(tokens[0].line, 2);
        assert_eq!(tokens[1].token_type, TokenType::VAR);
        assert_eq!(tokens[1].line, 3);
        assert_eq!(tokens[2].token_type, TokenType::EOF);
        assert_eq!(tokens[2].line, 3);
    }

    #[test]
    fn test_scanner_04_literals() {
        let tokens: Vec<_> = Scanner::new("123 4.5 \"hi\" 7.")
            .filter_map(Result::ok)
            .collect();

        assert_eq!(tokens[0].token_type, TokenType::NUMBER(123.0));
        assert_eq!(tokens[0].to_string(), "NUMBER 123 123.0");

        assert_eq!(tokens[1].to_string(), "NUMBER 4.5 4.5");

        match &tokens[2].token_type {
            TokenType::STRING(s) => assert_eq!(s, "hi"),
            other => panic!("Expected STRING, got {:?}", other),
        }
        assert_eq!(tokens[2].lexeme, "\"hi\"");

        // A trailing dot is not part of the number.
        assert_eq!(tokens[3].lexeme, "7");
        assert_eq!(tokens[4].token_type, TokenType::DOT);
    }

    #[test]
    fn test_scanner_05_keywords_and_identifiers() {
        assert_token_sequence(
            "class orchid fun _x this",
            &[
                (TokenType::CLASS, "class"),
                (TokenType::IDENTIFIER, "orchid"),
                (TokenType::FUN, "fun"),
                (TokenType::IDENTIFIER, "_x"),
                (TokenType::THIS, "this"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_unexpected_chars_token_sequence() {
        let source = ",.$(#";
        let results: Vec<_> = Scanner::new(source).collect();

        // COMMA, DOT, error, LEFT_PAREN, error, EOF
        assert_eq!(results.len(), 6, "Expected 6 items in result");

        assert_token_matches(&results[0], TokenType::COMMA, ",");
        assert_token_matches(&results[1], TokenType::DOT, ".");
        assert_token_matches(&results[3], TokenType::LEFT_PAREN, "(");
        assert_token_matches(&results[5], TokenType::EOF, "");

        let error_count = results.iter().filter(|r| r.is_err()).count();
        assert_eq!(error_count, 2, "Expected 2 error messages");

        let first = results[2].as_ref().err().map(ToString::to_string);
        assert_eq!(
            first.as_deref(),
            Some("[line 1] Error: Unexpected character: $")
        );

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
    fn test_multibyte_unexpected_char_reported_once() {
        let mut diagnostics = Diagnostics::new();
        let tokens = scan_tokens("é;", &mut diagnostics);

        assert_eq!(diagnostics.errors().len(), 1);
        assert_eq!(diagnostics.errors()[0].message(), "Unexpected character: é");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].token_type, TokenType::SEMICOLON);
    }

    #[test]
    fn test_unterminated_string_reports_start_line() {
        let mut diagnostics = Diagnostics::new();
        let tokens = scan_tokens("1\n\"abc\ndef", &mut diagnostics);

        assert_eq!(diagnostics.errors().len(), 1);

        let error = &diagnostics.errors()[0];
        assert_eq!(error.message(), "Unterminated string.");
        assert_eq!(error.line(), Some(2));
        assert_eq!(error.to_string(), "[line 2] Error: Unterminated string.");

        // The scan still ends with exactly one EOF.
        assert_eq!(tokens.last().map(|t| t.token_type.clone()), Some(TokenType::EOF));
        assert_eq!(diagnostics.exit_code(), 65);
    }

    #[test]
    fn test_multiline_string_counts_lines() {
        let tokens: Vec<_> = Scanner::new("\"a\nb\" x").filter_map(Result::ok).collect();

        assert_eq!(tokens[1].lexeme, "x");
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn test_empty_source_yields_single_eof() {
        let results: Vec<_> = Scanner::new("").collect();

        assert_eq!(results.len(), 1);
        assert!(matches!(&results[0], Ok(t) if t.token_type == TokenType::EOF));
    }
}
