//! Statement parsing implementation
//!
//! This module handles parsing of all statement types:
//!
//! - Variable declarations: `let x = 42;`, `const [a, b] = pair;`
//! - Control flow: `if`, `while`, `for`, `for-in`, `for-of`, `do-while`, `switch`
//! - Jump statements: `return`, `break`, `continue`, `throw`
//! - Exception handling: `try` / `catch` / `finally`
//! - Compound statements: `{ ... }` and labeled statements
//! - Expression statements: function calls, assignments
//!
//! # Grammar
//!
//! ```text
//! statement ::= var_decl | function_decl | class_decl | if_stmt | while_stmt
//!             | for_stmt | do_while_stmt | switch_stmt | try_stmt
//!             | return_stmt | break_stmt | continue_stmt | throw_stmt
//!             | labeled_stmt | block | ";" | expr_stmt
//! ```
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::{Keyword, Punct, Token};
use crate::parser::parse::{ParseError, Parser};

impl Parser {
    /// Parse block statements (inside braces, excluding the braces themselves)
    pub(crate) fn parse_block_statements(&mut self) -> Result<Vec<AstNode>, ParseError> {
        let mut statements = Vec::new();

        while !self.check_punct(Punct::RBrace) && !self.is_at_end() {
            statements.push(self.parse_statement()?);
        }

        Ok(statements)
    }

    /// Parse `{ ... }` including the braces
    pub(crate) fn parse_braced_block(&mut self) -> Result<Vec<AstNode>, ParseError> {
        self.expect_punct(Punct::LBrace)?;
        let statements = self.parse_block_statements()?;
        self.expect_punct(Punct::RBrace)?;
        Ok(statements)
    }

    /// Body of a compound statement. A braced block is flattened since the
    /// interpreter opens a block scope for every body anyway.
    fn parse_body(&mut self) -> Result<Vec<AstNode>, ParseError> {
        match self.parse_statement()? {
            AstNode::Block { statements, .. } => Ok(statements),
            stmt => Ok(vec![stmt]),
        }
    }

    /// Parse a statement
    pub(crate) fn parse_statement(&mut self) -> Result<AstNode, ParseError> {
        self.nested(Self::parse_statement_kind)
    }

    fn parse_statement_kind(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.current_location();

        match self.peek_token() {
            Token::Punct(Punct::LBrace, _) => {
                self.advance();
                let statements = self.parse_block_statements()?;
                self.expect_punct(Punct::RBrace)?;
                Ok(AstNode::Block {
                    statements,
                    location: loc,
                })
            }
            Token::Punct(Punct::Semicolon, _) => {
                self.advance();
                Ok(AstNode::Empty { location: loc })
            }
            Token::Keyword(keyword, _) => match keyword {
                Keyword::Var | Keyword::Let | Keyword::Const => {
                    self.advance();
                    let kind = match keyword {
                        Keyword::Var => VarKind::Var,
                        Keyword::Let => VarKind::Let,
                        _ => VarKind::Const,
                    };
                    let decl = self.parse_var_declaration(kind, loc)?;
                    self.consume_semicolon()?;
                    Ok(decl)
                }
                Keyword::Function => {
                    self.advance();
                    let function = self.parse_function_rest(FunctionKind::Normal, true, loc)?;
                    Ok(AstNode::FunctionDecl(function))
                }
                Keyword::Class => {
                    self.advance();
                    let class = self.parse_class_rest(true, loc)?;
                    Ok(AstNode::ClassDecl(class))
                }
                Keyword::If => {
                    self.advance();
                    self.parse_if_statement(loc)
                }
                Keyword::While => {
                    self.advance();
                    self.parse_while_statement(loc)
                }
                Keyword::Do => {
                    self.advance();
                    self.parse_do_while_statement(loc)
                }
                Keyword::For => {
                    self.advance();
                    self.parse_for_statement(loc)
                }
                Keyword::Switch => {
                    self.advance();
                    self.parse_switch_statement(loc)
                }
                Keyword::Try => {
                    self.advance();
                    self.parse_try_statement(loc)
                }
                Keyword::Return => {
                    self.advance();
                    self.parse_return_statement(loc)
                }
                Keyword::Break | Keyword::Continue => {
                    self.advance();
                    let label = match self.peek_token() {
                        Token::Ident(name, _) if !self.has_line_break_before() => {
                            self.advance();
                            Some(name)
                        }
                        _ => None,
                    };
                    self.consume_semicolon()?;
                    if keyword == Keyword::Break {
                        Ok(AstNode::Break {
                            label,
                            location: loc,
                        })
                    } else {
                        Ok(AstNode::Continue {
                            label,
                            location: loc,
                        })
                    }
                }
                Keyword::Throw => {
                    self.advance();
                    if self.has_line_break_before() {
                        return Err(self.error_at("Illegal newline after throw", loc));
                    }
                    let expr = self.parse_expression()?;
                    self.consume_semicolon()?;
                    Ok(AstNode::Throw {
                        expr: Box::new(expr),
                        location: loc,
                    })
                }
                Keyword::Debugger => {
                    self.advance();
                    self.consume_semicolon()?;
                    Ok(AstNode::Empty { location: loc })
                }
                Keyword::Import | Keyword::Export | Keyword::With | Keyword::Async => {
                    Err(self.unexpected())
                }
                _ => self.parse_expression_statement(loc),
            },
            Token::Ident(label, _)
                if self
                    .peek_ahead(1)
                    .is_some_and(|t| t.is_punct(Punct::Colon)) =>
            {
                self.advance();
                self.advance();
                let body = self.parse_statement()?;
                Ok(AstNode::Labeled {
                    label,
                    body: Box::new(body),
                    location: loc,
                })
            }
            _ => self.parse_expression_statement(loc),
        }
    }

    fn parse_expression_statement(&mut self, loc: SourceLocation) -> Result<AstNode, ParseError> {
        let expr = self.parse_expression()?;
        self.consume_semicolon()?;
        Ok(AstNode::ExpressionStatement {
            expr: Box::new(expr),
            location: loc,
        })
    }

    /// Declarators after `var`/`let`/`const` (keyword already consumed)
    pub(crate) fn parse_var_declaration(
        &mut self,
        kind: VarKind,
        loc: SourceLocation,
    ) -> Result<AstNode, ParseError> {
        let mut declarations = Vec::new();

        loop {
            let target = self.parse_binding_target()?;
            let init = if self.match_punct(Punct::Eq) {
                Some(self.parse_assignment()?)
            } else {
                None
            };

            // `for (const x of ...)` declarators are checked by the caller
            let in_for_head = self.no_in
                && (self.check_keyword(Keyword::In) || self.check_contextual("of"));
            if init.is_none() && !in_for_head {
                if !matches!(target, Pattern::Identifier(..)) {
                    return Err(self.error_at(
                        "Missing initializer in destructuring declaration",
                        target.location(),
                    ));
                }
                if kind == VarKind::Const {
                    return Err(self.error_at(
                        "Missing initializer in const declaration",
                        target.location(),
                    ));
                }
            }

            declarations.push(Declarator { target, init });

            if !self.match_punct(Punct::Comma) {
                break;
            }
        }

        Ok(AstNode::VarDecl {
            kind,
            declarations,
            location: loc,
        })
    }

    fn parse_if_statement(&mut self, loc: SourceLocation) -> Result<AstNode, ParseError> {
        self.expect_punct(Punct::LParen)?;
        let condition = self.parse_expression()?;
        self.expect_punct(Punct::RParen)?;

        let then_branch = self.parse_body()?;
        let else_branch = if self.match_keyword(Keyword::Else) {
            Some(self.parse_body()?)
        } else {
            None
        };

        Ok(AstNode::If {
            condition: Box::new(condition),
            then_branch,
            else_branch,
            location: loc,
        })
    }

    fn parse_while_statement(&mut self, loc: SourceLocation) -> Result<AstNode, ParseError> {
        self.expect_punct(Punct::LParen)?;
        let condition = self.parse_expression()?;
        self.expect_punct(Punct::RParen)?;
        let body = self.parse_body()?;

        Ok(AstNode::While {
            condition: Box::new(condition),
            body,
            location: loc,
        })
    }

    fn parse_do_while_statement(&mut self, loc: SourceLocation) -> Result<AstNode, ParseError> {
        let body = self.parse_body()?;
        self.expect_keyword(Keyword::While)?;
        self.expect_punct(Punct::LParen)?;
        let condition = self.parse_expression()?;
        self.expect_punct(Punct::RParen)?;
        // A semicolon after do-while is always optional
        self.match_punct(Punct::Semicolon);

        Ok(AstNode::DoWhile {
            body,
            condition: Box::new(condition),
            location: loc,
        })
    }

    fn parse_for_statement(&mut self, loc: SourceLocation) -> Result<AstNode, ParseError> {
        if self.check_keyword(Keyword::Await) {
            return Err(self.unexpected());
        }
        self.expect_punct(Punct::LParen)?;

        let saved_no_in = std::mem::replace(&mut self.no_in, true);
        let init = self.parse_for_init()?;
        self.no_in = saved_no_in;

        // for-in / for-of heads
        if let Some(head) = init.as_ref() {
            let is_of = self.check_contextual("of");
            if is_of || self.check_keyword(Keyword::In) {
                let binding = self.for_binding(head)?;
                self.advance();
                let subject = if is_of {
                    self.parse_assignment()?
                } else {
                    self.parse_expression()?
                };
                self.expect_punct(Punct::RParen)?;
                let body = self.parse_body()?;
                return Ok(if is_of {
                    AstNode::ForOf {
                        binding,
                        iterable: Box::new(subject),
                        body,
                        location: loc,
                    }
                } else {
                    AstNode::ForIn {
                        binding,
                        object: Box::new(subject),
                        body,
                        location: loc,
                    }
                });
            }
        }

        self.expect_punct(Punct::Semicolon)?;

        let condition = if self.check_punct(Punct::Semicolon) {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        self.expect_punct(Punct::Semicolon)?;

        let increment = if self.check_punct(Punct::RParen) {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        self.expect_punct(Punct::RParen)?;

        let body = self.parse_body()?;

        Ok(AstNode::For {
            init: init.map(Box::new),
            condition,
            increment,
            body,
            location: loc,
        })
    }

    fn parse_for_init(&mut self) -> Result<Option<AstNode>, ParseError> {
        let loc = self.current_location();
        if self.check_punct(Punct::Semicolon) {
            return Ok(None);
        }

        let kind = match self.peek() {
            Token::Keyword(Keyword::Var, _) => Some(VarKind::Var),
            Token::Keyword(Keyword::Let, _) => Some(VarKind::Let),
            Token::Keyword(Keyword::Const, _) => Some(VarKind::Const),
            _ => None,
        };

        if let Some(kind) = kind {
            self.advance();
            return Ok(Some(self.parse_var_declaration(kind, loc)?));
        }

        let expr = self.parse_expression()?;
        Ok(Some(AstNode::ExpressionStatement {
            expr: Box::new(expr),
            location: loc,
        }))
    }

    /// Reinterpret a parsed for-initializer as the left side of for-in/for-of
    fn for_binding(&self, head: &AstNode) -> Result<ForBinding, ParseError> {
        match head {
            AstNode::VarDecl {
                kind,
                declarations,
                location,
            } => {
                if declarations.len() != 1 || declarations[0].init.is_some() {
                    return Err(self.error_at(
                        "for-in/for-of loop variable declaration may not have an initializer",
                        *location,
                    ));
                }
                Ok(ForBinding::Declaration(*kind, declarations[0].target.clone()))
            }
            AstNode::ExpressionStatement { expr, .. } => {
                Ok(ForBinding::Target(self.to_pattern(expr)?))
            }
            other => Err(self.error_at(
                "Invalid left-hand side in for-loop",
                *other.location(),
            )),
        }
    }

    fn parse_switch_statement(&mut self, loc: SourceLocation) -> Result<AstNode, ParseError> {
        self.expect_punct(Punct::LParen)?;
        let expr = self.parse_expression()?;
        self.expect_punct(Punct::RParen)?;
        self.expect_punct(Punct::LBrace)?;

        let mut cases = Vec::new();
        let mut seen_default = false;

        while !self.check_punct(Punct::RBrace) && !self.is_at_end() {
            let case_loc = self.current_location();

            if self.match_keyword(Keyword::Case) {
                let value = self.parse_expression()?;
                self.expect_punct(Punct::Colon)?;
                let statements = self.parse_case_statements()?;
                cases.push(CaseNode::Case {
                    value: Box::new(value),
                    statements,
                    location: case_loc,
                });
            } else if self.match_keyword(Keyword::Default) {
                if seen_default {
                    return Err(self.error_at(
                        "More than one default clause in switch statement",
                        case_loc,
                    ));
                }
                seen_default = true;
                self.expect_punct(Punct::Colon)?;
                let statements = self.parse_case_statements()?;
                cases.push(CaseNode::Default {
                    statements,
                    location: case_loc,
                });
            } else {
                return Err(self.unexpected());
            }
        }

        self.expect_punct(Punct::RBrace)?;

        Ok(AstNode::Switch {
            expr: Box::new(expr),
            cases,
            location: loc,
        })
    }

    fn parse_case_statements(&mut self) -> Result<Vec<AstNode>, ParseError> {
        let mut statements = Vec::new();
        while !self.check_keyword(Keyword::Case)
            && !self.check_keyword(Keyword::Default)
            && !self.check_punct(Punct::RBrace)
            && !self.is_at_end()
        {
            statements.push(self.parse_statement()?);
        }
        Ok(statements)
    }

    fn parse_try_statement(&mut self, loc: SourceLocation) -> Result<AstNode, ParseError> {
        let block = self.parse_braced_block()?;

        let mut param = None;
        let mut handler = None;
        if self.match_keyword(Keyword::Catch) {
            if self.match_punct(Punct::LParen) {
                param = Some(self.parse_binding_target()?);
                self.expect_punct(Punct::RParen)?;
            }
            handler = Some(self.parse_braced_block()?);
        }

        let finalizer = if self.match_keyword(Keyword::Finally) {
            Some(self.parse_braced_block()?)
        } else {
            None
        };

        if handler.is_none() && finalizer.is_none() {
            return Err(self.error_at("Missing catch or finally after try", loc));
        }

        Ok(AstNode::Try {
            block,
            param,
            handler,
            finalizer,
            location: loc,
        })
    }

    fn parse_return_statement(&mut self, loc: SourceLocation) -> Result<AstNode, ParseError> {
        if self.function_depth == 0 {
            return Err(self.error_at("Illegal return statement", loc));
        }

        let ends_here = self.check_punct(Punct::Semicolon)
            || self.check_punct(Punct::RBrace)
            || self.is_at_end()
            || self.has_line_break_before();

        let expr = if ends_here {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        self.consume_semicolon()?;

        Ok(AstNode::Return {
            expr,
            location: loc,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Vec<AstNode> {
        let mut parser = Parser::new(source).unwrap();
        parser.parse_program().unwrap().nodes
    }

    #[test]
    fn test_for_of_with_destructuring() {
        let nodes = parse("for (const [k, v] of pairs) { console.log(k, v) }");
        match &nodes[0] {
            AstNode::ForOf {
                binding: ForBinding::Declaration(VarKind::Const, Pattern::Array { elements, .. }),
                body,
                ..
            } => {
                assert_eq!(elements.len(), 2);
                assert_eq!(body.len(), 1);
            }
            other => panic!("Expected for-of, got {:?}", other),
        }
    }

    #[test]
    fn test_for_in_with_existing_variable() {
        let nodes = parse("let k; for (k in obj) total++;");
        assert!(matches!(
            nodes[1],
            AstNode::ForIn {
                binding: ForBinding::Target(Pattern::Identifier(..)),
                ..
            }
        ));
    }

    #[test]
    fn test_classic_for_with_in_operator_in_condition() {
        let nodes = parse("for (let i = 0; 'x' in o && i < 3; i++) {}");
        match &nodes[0] {
            AstNode::For {
                init: Some(init),
                condition: Some(_),
                increment: Some(_),
                ..
            } => assert!(matches!(**init, AstNode::VarDecl { .. })),
            other => panic!("Expected for loop, got {:?}", other),
        }
    }

    #[test]
    fn test_switch_with_default() {
        let nodes = parse("switch (x) { case 1: a(); case 2: b(); break; default: c() }");
        match &nodes[0] {
            AstNode::Switch { cases, .. } => {
                assert_eq!(cases.len(), 3);
                assert!(matches!(cases[2], CaseNode::Default { .. }));
            }
            other => panic!("Expected switch, got {:?}", other),
        }
    }

    #[test]
    fn test_try_catch_without_binding() {
        let nodes = parse("try { risky() } catch { recover() } finally { done() }");
        assert!(matches!(
            nodes[0],
            AstNode::Try {
                param: None,
                handler: Some(_),
                finalizer: Some(_),
                ..
            }
        ));
    }

    #[test]
    fn test_labeled_continue() {
        let nodes = parse("outer: for (;;) { for (;;) { continue outer } }");
        assert!(matches!(nodes[0], AstNode::Labeled { .. }));
    }

    #[test]
    fn test_const_requires_initializer() {
        let mut parser = Parser::new("const x;").unwrap();
        let err = parser.parse_program().unwrap_err();
        assert_eq!(err.message, "Missing initializer in const declaration");
    }
}
