//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing infrastructure,
//! including error types, helper methods, and the main parse entry point.
//!
//! # Parser Architecture
//!
//! The Parser uses a recursive descent approach with the following organization:
//! - This module: Parser struct, helper methods, automatic semicolon insertion
//! - `declarations`: functions, parameters, classes and binding patterns
//! - `statements`: Parsing statements (if, while, for, try, etc.)
//! - `expressions`: Parsing expressions with precedence climbing
//!
//! # Implementation
//!
//! Parser methods are split across multiple files using `impl Parser` blocks,
//! allowing each module to extend the Parser with related functionality while
//! maintaining access to the shared parser state.

use crate::parser::ast::*;
use crate::parser::lexer::{Keyword, LexError, Lexer, Punct, Token};
use std::rc::Rc;
use thiserror::Error;

/// Deepest syntactic nesting accepted before parsing fails
pub const MAX_NESTING_DEPTH: usize = 2000;

/// Parser error type
#[derive(Debug, Clone, Error)]
#[error("{message} (line {}, column {})", location.line, location.column)]
pub struct ParseError {
    pub message: String,
    pub location: SourceLocation,
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        ParseError {
            message: err.message,
            location: err.location,
        }
    }
}

/// Recursive descent parser for the supported JavaScript subset
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) line_breaks: Vec<bool>,
    pub(crate) position: usize,
    /// Nesting depth of function bodies, `return` is only legal above zero
    pub(crate) function_depth: usize,
    /// Set while parsing a `for` initializer, where `in` ends the expression
    pub(crate) no_in: bool,
    /// Current depth of nested expressions, statements and patterns
    pub(crate) nesting: usize,
}

impl Parser {
    pub fn new(source: &str) -> Result<Self, ParseError> {
        Self::from_lexer(Lexer::new(source))
    }

    /// Parser for a source fragment whose first character sits at `location`
    pub(crate) fn new_at(source: &str, location: SourceLocation) -> Result<Self, ParseError> {
        Self::from_lexer(Lexer::starting_at(source, location))
    }

    fn from_lexer(mut lexer: Lexer) -> Result<Self, ParseError> {
        let tokens = lexer.tokenize()?;
        let line_breaks = lexer.into_line_breaks();
        Ok(Self {
            tokens,
            line_breaks,
            position: 0,
            function_depth: 0,
            no_in: false,
            nesting: 0,
        })
    }

    /// Parse the entire program (top-level statements)
    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut program = Program::new();

        while !self.is_at_end() {
            let stmt = self.parse_statement()?;
            program.nodes.push(stmt);
        }

        Ok(program)
    }

    // ===== Helper methods =====

    pub(crate) fn check_punct(&self, punct: Punct) -> bool {
        self.peek().is_punct(punct)
    }

    pub(crate) fn match_punct(&mut self, punct: Punct) -> bool {
        if self.check_punct(punct) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn check_keyword(&self, keyword: Keyword) -> bool {
        self.peek().is_keyword(keyword)
    }

    pub(crate) fn match_keyword(&mut self, keyword: Keyword) -> bool {
        if self.check_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// True when the current token is the contextual identifier `word`
    pub(crate) fn check_contextual(&self, word: &str) -> bool {
        matches!(self.peek(), Token::Ident(name, _) if &**name == word)
    }

    pub(crate) fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.position += 1;
        }
        self.previous()
    }

    pub(crate) fn is_at_end(&self) -> bool {
        matches!(self.peek(), Token::Eof(_))
    }

    pub(crate) fn peek(&self) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[self.position.min(last)]
    }

    pub(crate) fn peek_token(&self) -> Token {
        self.peek().clone()
    }

    pub(crate) fn peek_ahead(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.position + n)
    }

    pub(crate) fn previous(&self) -> &Token {
        &self.tokens[self.position.saturating_sub(1)]
    }

    pub(crate) fn previous_location(&self) -> SourceLocation {
        self.previous().location()
    }

    pub(crate) fn current_location(&self) -> SourceLocation {
        self.peek().location()
    }

    /// Whether a line terminator separates the current token from the previous one
    pub(crate) fn has_line_break_before(&self) -> bool {
        self.line_breaks
            .get(self.position)
            .copied()
            .unwrap_or(false)
    }

    /// Whether the token `n` positions ahead is preceded by a line break
    pub(crate) fn line_break_before_ahead(&self, n: usize) -> bool {
        self.line_breaks
            .get(self.position + n)
            .copied()
            .unwrap_or(false)
    }

    /// Error describing the current token as unexpected
    pub(crate) fn unexpected(&self) -> ParseError {
        let message = match self.peek() {
            Token::Eof(_) => "Unexpected end of input".to_string(),
            Token::Ident(name, _) => format!("Unexpected identifier '{}'", name),
            Token::Number(..) => "Unexpected number".to_string(),
            Token::String(..) => "Unexpected string".to_string(),
            Token::Template(..) => "Unexpected template string".to_string(),
            Token::RegExp(..) => "Unexpected regular expression".to_string(),
            Token::Keyword(Keyword::Async | Keyword::Await, _) => {
                "async functions are not supported".to_string()
            }
            Token::Keyword(Keyword::Yield, _) => "generators are not supported".to_string(),
            Token::Keyword(Keyword::Import | Keyword::Export, _) => {
                "Cannot use import statement outside a module".to_string()
            }
            Token::Keyword(Keyword::With, _) => {
                "with statements are not supported".to_string()
            }
            Token::Keyword(k, _) => format!("Unexpected token '{}'", k.as_str()),
            Token::Punct(p, _) => format!("Unexpected token '{}'", p.as_str()),
        };
        ParseError {
            message,
            location: self.current_location(),
        }
    }

    /// Run `parse` one nesting level deeper
    pub(crate) fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.nesting >= MAX_NESTING_DEPTH {
            return Err(self.error_at(
                "Maximum nesting depth exceeded",
                self.current_location(),
            ));
        }
        self.nesting += 1;
        let result = parse(self);
        self.nesting -= 1;
        result
    }

    pub(crate) fn error_at(&self, message: impl Into<String>, location: SourceLocation) -> ParseError {
        ParseError {
            message: message.into(),
            location,
        }
    }

    pub(crate) fn expect_punct(&mut self, punct: Punct) -> Result<SourceLocation, ParseError> {
        if self.check_punct(punct) {
            let loc = self.current_location();
            self.advance();
            Ok(loc)
        } else {
            Err(self.unexpected())
        }
    }

    pub(crate) fn expect_keyword(&mut self, keyword: Keyword) -> Result<(), ParseError> {
        if self.match_keyword(keyword) {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    pub(crate) fn expect_identifier(&mut self) -> Result<Rc<str>, ParseError> {
        if let Token::Ident(name, loc) = self.peek_token() {
            if name.starts_with('#') {
                return Err(self.error_at("Unexpected private name", loc));
            }
            self.advance();
            Ok(name)
        } else {
            Err(self.unexpected())
        }
    }

    /// Automatic semicolon insertion: a statement ends at `;`, before `}`,
    /// at end of input, or at a line break.
    pub(crate) fn consume_semicolon(&mut self) -> Result<(), ParseError> {
        if self.match_punct(Punct::Semicolon) {
            return Ok(());
        }
        if self.check_punct(Punct::RBrace) || self.is_at_end() || self.has_line_break_before() {
            return Ok(());
        }
        Err(self.unexpected())
    }

    /// Property name after `.`, in object literals and in class bodies.
    /// Reserved words are allowed here.
    pub(crate) fn parse_property_name(&mut self) -> Result<PropertyKey, ParseError> {
        let token = self.peek_token();
        let key = match token {
            Token::Ident(name, _) | Token::String(name, _) => PropertyKey::Named(name),
            Token::Keyword(k, _) => PropertyKey::Named(Rc::from(k.as_str())),
            Token::Number(n, _) => {
                PropertyKey::Named(Rc::from(crate::inspect::number::number_to_string(n)))
            }
            Token::Punct(Punct::LBracket, _) => {
                self.advance();
                let saved = std::mem::replace(&mut self.no_in, false);
                let expr = self.parse_assignment()?;
                self.no_in = saved;
                self.expect_punct(Punct::RBracket)?;
                return Ok(PropertyKey::Computed(Box::new(expr)));
            }
            _ => return Err(self.unexpected()),
        };
        self.advance();
        Ok(key)
    }

    /// Name after `.` or `?.`
    pub(crate) fn parse_member_name(&mut self) -> Result<Rc<str>, ParseError> {
        match self.peek_token() {
            Token::Ident(name, _) => {
                self.advance();
                Ok(name)
            }
            Token::Keyword(k, _) => {
                self.advance();
                Ok(Rc::from(k.as_str()))
            }
            _ => Err(self.unexpected()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Program {
        let mut parser = Parser::new(source).unwrap();
        parser.parse_program().unwrap()
    }

    fn parse_err(source: &str) -> ParseError {
        let mut parser = match Parser::new(source) {
            Ok(p) => p,
            Err(e) => return e,
        };
        parser.parse_program().unwrap_err()
    }

    #[test]
    fn test_parse_simple_function() {
        let program = parse("function add(a, b) { return a + b; }");

        assert_eq!(program.nodes.len(), 1);
        match &program.nodes[0] {
            AstNode::FunctionDecl(f) => {
                assert_eq!(f.name.as_deref(), Some("add"));
                assert_eq!(f.params.len(), 2);
                match &f.body {
                    FunctionBody::Block(body) => assert_eq!(body.len(), 1),
                    _ => panic!("Expected block body"),
                }
            }
            _ => panic!("Expected function declaration"),
        }
    }

    #[test]
    fn test_automatic_semicolon_insertion() {
        let program = parse("let a = 1\nlet b = 2\nconsole.log(a + b)");
        assert_eq!(program.nodes.len(), 3);
    }

    #[test]
    fn test_return_restricted_production() {
        let program = parse("function f() {\n  return\n  42\n}");
        match &program.nodes[0] {
            AstNode::FunctionDecl(f) => match &f.body {
                FunctionBody::Block(body) => {
                    assert!(matches!(body[0], AstNode::Return { expr: None, .. }));
                    assert_eq!(body.len(), 2);
                }
                _ => panic!("Expected block body"),
            },
            _ => panic!("Expected function declaration"),
        }
    }

    #[test]
    fn test_missing_separator_is_error() {
        let err = parse_err("let a = 1 let b = 2");
        assert!(err.message.starts_with("Unexpected token 'let'"));
    }

    #[test]
    fn test_unclosed_call_reports_end_of_input() {
        let err = parse_err("console.log(1");
        assert_eq!(err.message, "Unexpected end of input");
    }

    #[test]
    fn test_top_level_return_is_error() {
        let err = parse_err("return 1;");
        assert_eq!(err.message, "Illegal return statement");
    }

    #[test]
    fn test_parse_if_statement() {
        let program = parse("if (x > 0) y = 1; else { y = 0 }");
        match &program.nodes[0] {
            AstNode::If {
                then_branch,
                else_branch,
                ..
            } => {
                assert_eq!(then_branch.len(), 1);
                assert_eq!(else_branch.as_ref().map(Vec::len), Some(1));
            }
            _ => panic!("Expected if statement"),
        }
    }

    #[test]
    fn test_keyword_member_names() {
        let program = parse("promise.catch(handler); obj.default = 1;");
        assert_eq!(program.nodes.len(), 2);
    }

    #[test]
    fn test_nesting_limit() {
        let mut parser = Parser::new("x = [[[1]]];").unwrap();
        parser.nesting = MAX_NESTING_DEPTH - 4;
        let err = parser.parse_program().unwrap_err();
        assert_eq!(err.message, "Maximum nesting depth exceeded");

        let mut parser = Parser::new("x = 1;").unwrap();
        parser.nesting = MAX_NESTING_DEPTH - 4;
        assert!(parser.parse_program().is_ok());
        assert_eq!(parser.nesting, MAX_NESTING_DEPTH - 4);
    }

    #[test]
    fn test_unsupported_syntax_is_rejected() {
        assert!(parse_err("async function f() {}").message.contains("async"));
        assert!(parse_err("import x from 'y'").message.contains("module"));
        assert!(parse_err("function* g() {}").message.contains("generator"));
    }
}
