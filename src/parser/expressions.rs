//! Expression parsing implementation
//!
//! This module handles parsing of expressions using precedence climbing
//! for binary operators and recursive descent for other expression forms.
//!
//! # Supported Expressions
//!
//! - Literals: numbers, strings, templates, regular expressions, arrays, objects
//! - Identifiers, `this`, `super.x`, `super(...)`
//! - Binary operators: arithmetic, comparison, logical, bitwise, `in`, `instanceof`
//! - Unary operators: `-`, `+`, `!`, `~`, `typeof`, `void`, `delete`, `++`, `--`
//! - Postfix: `[]`, `.`, `?.`, `()`, `++`, `--`
//! - Ternary `? :`, comma sequences, every assignment operator
//! - Function, arrow function and class expressions
//!
//! # Precedence
//!
//! Binary operators follow JavaScript precedence using a precedence climbing
//! loop; `**` is the only right-associative binary operator.
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::{Keyword, Punct, Token};
use crate::parser::parse::{ParseError, Parser};
use std::rc::Rc;

/// Binary operator classes understood by the precedence climber
#[derive(Clone, Copy)]
enum BinaryKind {
    Arithmetic(BinOp),
    Logical(LogicalOp),
}

impl Parser {
    /// Parse expression (top-level entry point), including comma sequences
    pub(crate) fn parse_expression(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.current_location();
        let first = self.parse_assignment()?;

        if !self.check_punct(Punct::Comma) {
            return Ok(first);
        }

        let mut expressions = vec![first];
        while self.match_punct(Punct::Comma) {
            expressions.push(self.parse_assignment()?);
        }

        Ok(AstNode::Sequence {
            expressions,
            location: loc,
        })
    }

    /// Parse assignment, arrow function or conditional (right-associative)
    pub(crate) fn parse_assignment(&mut self) -> Result<AstNode, ParseError> {
        self.nested(Self::parse_assignment_expr)
    }

    fn parse_assignment_expr(&mut self) -> Result<AstNode, ParseError> {
        if self.is_arrow_function_start() {
            return Ok(AstNode::Function(self.parse_arrow_function()?));
        }

        let expr = self.parse_conditional()?;

        let loc = self.current_location();
        let op = match self.peek() {
            Token::Punct(p, _) => assign_op(*p),
            _ => None,
        };

        let Some(op) = op else {
            if let AstNode::ObjectLiteral { properties, .. } = &expr {
                if let Some(ObjectProperty::ShorthandDefault(_, _, at)) = properties
                    .iter()
                    .find(|p| matches!(p, ObjectProperty::ShorthandDefault(..)))
                {
                    return Err(self.error_at("Invalid shorthand property initializer", *at));
                }
            }
            return Ok(expr);
        };

        self.advance();

        let target = match (&op, &expr) {
            (AssignOp::Assign, AstNode::ArrayLiteral { .. } | AstNode::ObjectLiteral { .. }) => {
                self.to_pattern(&expr)?
            }
            _ => self.simple_target(&expr, "Invalid left-hand side in assignment")?,
        };

        let value = self.parse_assignment()?;

        Ok(AstNode::Assignment {
            op,
            target: Box::new(target),
            value: Box::new(value),
            location: loc,
        })
    }

    /// Identifier or member expression usable as an assignment target
    fn simple_target(&self, expr: &AstNode, message: &str) -> Result<Pattern, ParseError> {
        match expr {
            AstNode::Identifier(name, loc) => Ok(Pattern::Identifier(name.clone(), *loc)),
            AstNode::MemberAccess {
                optional: false, ..
            }
            | AstNode::IndexAccess {
                optional: false, ..
            }
            | AstNode::SuperMember { .. } => Ok(Pattern::Expression(Box::new(expr.clone()))),
            other => Err(self.error_at(message, *other.location())),
        }
    }

    /// Reinterpret an array/object literal (or any simple target) as a
    /// destructuring pattern: `[a, b] = [b, a]`.
    pub(crate) fn to_pattern(&self, expr: &AstNode) -> Result<Pattern, ParseError> {
        match expr {
            AstNode::ArrayLiteral { elements, location } => {
                let mut pattern_elements = Vec::new();
                let mut rest = None;

                for (i, element) in elements.iter().enumerate() {
                    match element {
                        None => pattern_elements.push(None),
                        Some(AstNode::Spread { expr, location }) => {
                            if i + 1 != elements.len() {
                                return Err(self.error_at(
                                    "Rest element must be last element",
                                    *location,
                                ));
                            }
                            rest = Some(Box::new(self.to_pattern(expr)?));
                        }
                        Some(node) => pattern_elements.push(Some(self.to_pattern_element(node)?)),
                    }
                }

                Ok(Pattern::Array {
                    elements: pattern_elements,
                    rest,
                    location: *location,
                })
            }
            AstNode::ObjectLiteral {
                properties,
                location,
            } => {
                let mut pattern_properties = Vec::new();
                let mut rest = None;

                for property in properties {
                    match property {
                        ObjectProperty::KeyValue(key, value) => {
                            pattern_properties.push(ObjectPatternProperty {
                                key: key.clone(),
                                value: self.to_pattern_element(value)?,
                            });
                        }
                        ObjectProperty::Shorthand(name, loc) => {
                            pattern_properties.push(ObjectPatternProperty {
                                key: PropertyKey::Named(name.clone()),
                                value: PatternElement {
                                    target: Pattern::Identifier(name.clone(), *loc),
                                    default: None,
                                },
                            });
                        }
                        ObjectProperty::ShorthandDefault(name, default, loc) => {
                            pattern_properties.push(ObjectPatternProperty {
                                key: PropertyKey::Named(name.clone()),
                                value: PatternElement {
                                    target: Pattern::Identifier(name.clone(), *loc),
                                    default: Some((**default).clone()),
                                },
                            });
                        }
                        ObjectProperty::Spread(expr) => {
                            rest = Some(Box::new(self.to_pattern(expr)?));
                        }
                        ObjectProperty::Method(_, function, _) => {
                            return Err(self.error_at(
                                "Invalid destructuring assignment target",
                                function.location,
                            ));
                        }
                    }
                }

                Ok(Pattern::Object {
                    properties: pattern_properties,
                    rest,
                    location: *location,
                })
            }
            other => self.simple_target(other, "Invalid destructuring assignment target"),
        }
    }

    fn to_pattern_element(&self, node: &AstNode) -> Result<PatternElement, ParseError> {
        match node {
            AstNode::Assignment {
                op: AssignOp::Assign,
                target,
                value,
                ..
            } => Ok(PatternElement {
                target: (**target).clone(),
                default: Some((**value).clone()),
            }),
            other => Ok(PatternElement {
                target: self.to_pattern(other)?,
                default: None,
            }),
        }
    }

    /// `x =>` or `( ... ) =>`, decided by scanning to the matching parenthesis
    fn is_arrow_function_start(&self) -> bool {
        match self.peek() {
            Token::Ident(..) => self
                .peek_ahead(1)
                .is_some_and(|t| t.is_punct(Punct::Arrow) && !self.line_break_before_ahead(1)),
            Token::Punct(Punct::LParen, _) => {
                let mut depth = 0usize;
                let mut offset = 0;
                while let Some(token) = self.peek_ahead(offset) {
                    match token {
                        Token::Punct(Punct::LParen | Punct::LBracket | Punct::LBrace, _) => {
                            depth += 1
                        }
                        Token::Punct(Punct::RParen | Punct::RBracket | Punct::RBrace, _) => {
                            depth = depth.saturating_sub(1);
                            if depth == 0 {
                                return self.peek_ahead(offset + 1).is_some_and(|t| {
                                    t.is_punct(Punct::Arrow)
                                        && !self.line_break_before_ahead(offset + 1)
                                });
                            }
                        }
                        Token::Eof(_) => return false,
                        _ => {}
                    }
                    offset += 1;
                }
                false
            }
            _ => false,
        }
    }

    fn parse_arrow_function(&mut self) -> Result<Rc<FunctionNode>, ParseError> {
        let loc = self.current_location();

        let (params, rest) = if let Token::Ident(name, name_loc) = self.peek_token() {
            self.advance();
            let param = PatternElement {
                target: Pattern::Identifier(name, name_loc),
                default: None,
            };
            (vec![param], None)
        } else {
            self.parse_params()?
        };

        self.expect_punct(Punct::Arrow)?;

        let body = if self.match_punct(Punct::LBrace) {
            let statements = self.parse_function_body()?;
            self.expect_punct(Punct::RBrace)?;
            FunctionBody::Block(statements)
        } else {
            FunctionBody::Expression(Box::new(self.parse_assignment()?))
        };

        Ok(Rc::new(FunctionNode {
            name: None,
            params,
            rest,
            body,
            kind: FunctionKind::Arrow,
            location: loc,
        }))
    }

    /// Parse ternary: condition ? true_expr : false_expr
    fn parse_conditional(&mut self) -> Result<AstNode, ParseError> {
        let expr = self.parse_binary(0)?;

        if self.match_punct(Punct::Question) {
            let loc = self.previous_location();
            let saved_no_in = std::mem::replace(&mut self.no_in, false);
            let true_expr = self.parse_assignment()?;
            self.no_in = saved_no_in;
            self.expect_punct(Punct::Colon)?;
            let false_expr = self.parse_assignment()?;

            return Ok(AstNode::TernaryOp {
                condition: Box::new(expr),
                true_expr: Box::new(true_expr),
                false_expr: Box::new(false_expr),
                location: loc,
            });
        }

        Ok(expr)
    }

    /// Binding power and kind of the binary operator at the current token
    fn binary_operator(&self) -> Option<(u8, BinaryKind)> {
        use BinaryKind::{Arithmetic as A, Logical as L};
        let entry = match self.peek() {
            Token::Punct(p, _) => match p {
                Punct::QuestionQuestion => (1, L(LogicalOp::Nullish)),
                Punct::OrOr => (1, L(LogicalOp::Or)),
                Punct::AndAnd => (2, L(LogicalOp::And)),
                Punct::Pipe => (3, A(BinOp::BitOr)),
                Punct::Caret => (4, A(BinOp::BitXor)),
                Punct::Amp => (5, A(BinOp::BitAnd)),
                Punct::EqEq => (6, A(BinOp::Eq)),
                Punct::NotEq => (6, A(BinOp::Ne)),
                Punct::EqEqEq => (6, A(BinOp::StrictEq)),
                Punct::NotEqEq => (6, A(BinOp::StrictNe)),
                Punct::Lt => (7, A(BinOp::Lt)),
                Punct::Le => (7, A(BinOp::Le)),
                Punct::Gt => (7, A(BinOp::Gt)),
                Punct::Ge => (7, A(BinOp::Ge)),
                Punct::LtLt => (8, A(BinOp::Shl)),
                Punct::GtGt => (8, A(BinOp::Shr)),
                Punct::GtGtGt => (8, A(BinOp::UShr)),
                Punct::Plus => (9, A(BinOp::Add)),
                Punct::Minus => (9, A(BinOp::Sub)),
                Punct::Star => (10, A(BinOp::Mul)),
                Punct::Slash => (10, A(BinOp::Div)),
                Punct::Percent => (10, A(BinOp::Mod)),
                Punct::StarStar => (11, A(BinOp::Exp)),
                _ => return None,
            },
            Token::Keyword(Keyword::InstanceOf, _) => (7, A(BinOp::InstanceOf)),
            Token::Keyword(Keyword::In, _) if !self.no_in => (7, A(BinOp::In)),
            _ => return None,
        };
        Some(entry)
    }

    /// Precedence climbing over every binary and short-circuit operator
    fn parse_binary(&mut self, min_precedence: u8) -> Result<AstNode, ParseError> {
        let mut left = self.parse_unary()?;

        while let Some((precedence, kind)) = self.binary_operator() {
            if precedence < min_precedence {
                break;
            }
            let loc = self.current_location();
            self.advance();

            let right = match kind {
                // Right-associative
                BinaryKind::Arithmetic(BinOp::Exp) => {
                    self.nested(|p| p.parse_binary(precedence))?
                }
                _ => self.nested(|p| p.parse_binary(precedence + 1))?,
            };

            left = match kind {
                BinaryKind::Arithmetic(op) => AstNode::BinaryOp {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                    location: loc,
                },
                BinaryKind::Logical(op) => AstNode::LogicalOp {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                    location: loc,
                },
            };
        }

        Ok(left)
    }

    /// Parse unary operators
    fn parse_unary(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.current_location();

        let op = match self.peek() {
            Token::Punct(Punct::Bang, _) => Some(UnOp::Not),
            Token::Punct(Punct::Minus, _) => Some(UnOp::Neg),
            Token::Punct(Punct::Plus, _) => Some(UnOp::Plus),
            Token::Punct(Punct::Tilde, _) => Some(UnOp::BitNot),
            Token::Keyword(Keyword::TypeOf, _) => Some(UnOp::TypeOf),
            Token::Keyword(Keyword::Void, _) => Some(UnOp::Void),
            Token::Keyword(Keyword::Delete, _) => Some(UnOp::Delete),
            _ => None,
        };

        if let Some(op) = op {
            self.advance();
            let operand = self.nested(Self::parse_unary)?;
            return Ok(AstNode::UnaryOp {
                op,
                operand: Box::new(operand),
                location: loc,
            });
        }

        if self.check_punct(Punct::PlusPlus) || self.check_punct(Punct::MinusMinus) {
            let increment = self.check_punct(Punct::PlusPlus);
            self.advance();
            let target = self.nested(Self::parse_unary)?;
            self.simple_target(&target, "Invalid left-hand side expression in prefix operation")?;
            return Ok(AstNode::Update {
                increment,
                prefix: true,
                target: Box::new(target),
                location: loc,
            });
        }

        if self.check_keyword(Keyword::Await) {
            return Err(self.unexpected());
        }

        self.parse_postfix()
    }

    /// Parse postfix `++` / `--` (no line break allowed before the operator)
    fn parse_postfix(&mut self) -> Result<AstNode, ParseError> {
        let expr = self.parse_left_hand_side()?;

        if (self.check_punct(Punct::PlusPlus) || self.check_punct(Punct::MinusMinus))
            && !self.has_line_break_before()
        {
            let loc = self.current_location();
            let increment = self.check_punct(Punct::PlusPlus);
            self.advance();
            self.simple_target(&expr, "Invalid left-hand side expression in postfix operation")?;
            return Ok(AstNode::Update {
                increment,
                prefix: false,
                target: Box::new(expr),
                location: loc,
            });
        }

        Ok(expr)
    }

    /// Member accesses, calls and `new`, wrapping optional chains
    pub(crate) fn parse_left_hand_side(&mut self) -> Result<AstNode, ParseError> {
        let start = self.current_location();
        let mut expr = if self.check_keyword(Keyword::New) {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };

        let mut in_optional_chain = false;

        loop {
            let loc = self.current_location();

            if self.match_punct(Punct::Dot) {
                let member = self.parse_member_name()?;
                expr = AstNode::MemberAccess {
                    object: Box::new(expr),
                    member,
                    optional: false,
                    location: loc,
                };
            } else if self.match_punct(Punct::QuestionDot) {
                in_optional_chain = true;
                if self.check_punct(Punct::LParen) {
                    let args = self.parse_arguments()?;
                    expr = AstNode::Call {
                        callee: Box::new(expr),
                        args,
                        optional: true,
                        location: loc,
                    };
                } else if self.match_punct(Punct::LBracket) {
                    let index = self.parse_bracketed_index()?;
                    expr = AstNode::IndexAccess {
                        object: Box::new(expr),
                        index: Box::new(index),
                        optional: true,
                        location: loc,
                    };
                } else {
                    let member = self.parse_member_name()?;
                    expr = AstNode::MemberAccess {
                        object: Box::new(expr),
                        member,
                        optional: true,
                        location: loc,
                    };
                }
            } else if self.match_punct(Punct::LBracket) {
                let index = self.parse_bracketed_index()?;
                expr = AstNode::IndexAccess {
                    object: Box::new(expr),
                    index: Box::new(index),
                    optional: false,
                    location: loc,
                };
            } else if self.check_punct(Punct::LParen) {
                let args = self.parse_arguments()?;
                expr = AstNode::Call {
                    callee: Box::new(expr),
                    args,
                    optional: false,
                    location: loc,
                };
            } else if matches!(self.peek(), Token::Template(..)) {
                if in_optional_chain {
                    return Err(self.error_at(
                        "Invalid tagged template on optional chain",
                        loc,
                    ));
                }
                return Err(self.error_at("tagged templates are not supported", loc));
            } else {
                break;
            }
        }

        if in_optional_chain {
            expr = AstNode::OptionalChain {
                expr: Box::new(expr),
                location: start,
            };
        }

        Ok(expr)
    }

    fn parse_bracketed_index(&mut self) -> Result<AstNode, ParseError> {
        let saved_no_in = std::mem::replace(&mut self.no_in, false);
        let index = self.parse_expression()?;
        self.no_in = saved_no_in;
        self.expect_punct(Punct::RBracket)?;
        Ok(index)
    }

    /// `new Callee(args)`; the callee is a member expression without calls
    fn parse_new(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.current_location();
        self.expect_keyword(Keyword::New)?;

        if self.check_punct(Punct::Dot) {
            return Err(self.error_at("new.target is not supported", loc));
        }

        let mut callee = if self.check_keyword(Keyword::New) {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };

        loop {
            let member_loc = self.current_location();
            if self.match_punct(Punct::Dot) {
                let member = self.parse_member_name()?;
                callee = AstNode::MemberAccess {
                    object: Box::new(callee),
                    member,
                    optional: false,
                    location: member_loc,
                };
            } else if self.match_punct(Punct::LBracket) {
                let index = self.parse_bracketed_index()?;
                callee = AstNode::IndexAccess {
                    object: Box::new(callee),
                    index: Box::new(index),
                    optional: false,
                    location: member_loc,
                };
            } else {
                break;
            }
        }

        let args = if self.check_punct(Punct::LParen) {
            self.parse_arguments()?
        } else {
            Vec::new()
        };

        Ok(AstNode::New {
            callee: Box::new(callee),
            args,
            location: loc,
        })
    }

    /// `( arg, ...spread, )`
    fn parse_arguments(&mut self) -> Result<Vec<AstNode>, ParseError> {
        self.expect_punct(Punct::LParen)?;
        let saved_no_in = std::mem::replace(&mut self.no_in, false);
        let mut args = Vec::new();

        while !self.check_punct(Punct::RParen) {
            args.push(self.parse_spread_or_assignment()?);
            if !self.match_punct(Punct::Comma) {
                break;
            }
        }

        self.no_in = saved_no_in;
        if !self.check_punct(Punct::RParen) && !self.is_at_end() {
            return Err(self.error_at(
                "missing ) after argument list",
                self.current_location(),
            ));
        }
        self.expect_punct(Punct::RParen)?;
        Ok(args)
    }

    fn parse_spread_or_assignment(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.current_location();
        if self.match_punct(Punct::Ellipsis) {
            let expr = self.parse_assignment()?;
            return Ok(AstNode::Spread {
                expr: Box::new(expr),
                location: loc,
            });
        }
        self.parse_assignment()
    }

    /// Parse primary expressions (literals, identifiers, grouping, literals)
    fn parse_primary(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.current_location();

        match self.peek_token() {
            Token::Number(n, _) => {
                self.advance();
                Ok(AstNode::NumberLiteral(n, loc))
            }
            Token::String(s, _) => {
                self.advance();
                Ok(AstNode::StringLiteral(s, loc))
            }
            Token::Template(template, _) => {
                self.advance();
                let mut expressions = Vec::with_capacity(template.expressions.len());
                for (source, at) in &template.expressions {
                    let mut nested = Parser::new_at(source, *at)?;
                    nested.nesting = self.nesting;
                    let expr = nested.parse_expression()?;
                    if !nested.is_at_end() {
                        return Err(nested.unexpected());
                    }
                    expressions.push(expr);
                }
                Ok(AstNode::Template {
                    quasis: template.quasis.clone(),
                    expressions,
                    location: loc,
                })
            }
            Token::RegExp(pattern, flags, _) => {
                self.advance();
                Ok(AstNode::RegExpLiteral {
                    pattern,
                    flags,
                    location: loc,
                })
            }
            Token::Ident(name, _) => {
                if name.starts_with('#') {
                    return Err(self.error_at("Unexpected private name", loc));
                }
                self.advance();
                Ok(AstNode::Identifier(name, loc))
            }
            Token::Keyword(keyword, _) => match keyword {
                Keyword::This => {
                    self.advance();
                    Ok(AstNode::This { location: loc })
                }
                Keyword::Null => {
                    self.advance();
                    Ok(AstNode::Null { location: loc })
                }
                Keyword::True | Keyword::False => {
                    self.advance();
                    Ok(AstNode::BoolLiteral(keyword == Keyword::True, loc))
                }
                Keyword::Function => {
                    self.advance();
                    let function = self.parse_function_rest(FunctionKind::Normal, false, loc)?;
                    Ok(AstNode::Function(function))
                }
                Keyword::Class => {
                    self.advance();
                    let class = self.parse_class_rest(false, loc)?;
                    Ok(AstNode::Class(class))
                }
                Keyword::Super => {
                    self.advance();
                    if self.check_punct(Punct::LParen) {
                        let args = self.parse_arguments()?;
                        Ok(AstNode::SuperCall {
                            args,
                            location: loc,
                        })
                    } else if self.match_punct(Punct::Dot) {
                        let property = self.parse_member_name()?;
                        Ok(AstNode::SuperMember {
                            property,
                            location: loc,
                        })
                    } else {
                        Err(self.error_at("'super' keyword unexpected here", loc))
                    }
                }
                _ => Err(self.unexpected()),
            },
            Token::Punct(Punct::LParen, _) => {
                self.advance();
                let saved_no_in = std::mem::replace(&mut self.no_in, false);
                let expr = self.parse_expression()?;
                self.no_in = saved_no_in;
                self.expect_punct(Punct::RParen)?;
                Ok(expr)
            }
            Token::Punct(Punct::LBracket, _) => {
                self.advance();
                self.parse_array_literal(loc)
            }
            Token::Punct(Punct::LBrace, _) => {
                self.advance();
                self.parse_object_literal(loc)
            }
            _ => Err(self.unexpected()),
        }
    }

    fn parse_array_literal(&mut self, loc: SourceLocation) -> Result<AstNode, ParseError> {
        let saved_no_in = std::mem::replace(&mut self.no_in, false);
        let mut elements = Vec::new();

        while !self.check_punct(Punct::RBracket) {
            if self.match_punct(Punct::Comma) {
                elements.push(None);
                continue;
            }
            elements.push(Some(self.parse_spread_or_assignment()?));
            if !self.check_punct(Punct::RBracket) {
                self.expect_punct(Punct::Comma)?;
            }
        }

        self.no_in = saved_no_in;
        self.expect_punct(Punct::RBracket)?;

        Ok(AstNode::ArrayLiteral {
            elements,
            location: loc,
        })
    }

    fn parse_object_literal(&mut self, loc: SourceLocation) -> Result<AstNode, ParseError> {
        let saved_no_in = std::mem::replace(&mut self.no_in, false);
        let mut properties = Vec::new();

        while !self.check_punct(Punct::RBrace) {
            let prop_loc = self.current_location();

            if self.match_punct(Punct::Ellipsis) {
                properties.push(ObjectProperty::Spread(self.parse_assignment()?));
            } else {
                if self.check_keyword(Keyword::Async) || self.check_punct(Punct::Star) {
                    return Err(self.unexpected());
                }

                let kind = self.parse_accessor_prefix();
                let shorthand_name = match self.peek() {
                    Token::Ident(name, _) if kind == MethodKind::Method => Some(name.clone()),
                    _ => None,
                };
                let key = self.parse_property_name()?;

                if self.check_punct(Punct::LParen) {
                    let function_kind = match kind {
                        MethodKind::Method => FunctionKind::Method,
                        MethodKind::Getter => FunctionKind::Getter,
                        MethodKind::Setter => FunctionKind::Setter,
                    };
                    let name = match &key {
                        PropertyKey::Named(n) => Some(n.clone()),
                        PropertyKey::Computed(_) => None,
                    };
                    let function = self.parse_function_signature(name, function_kind, prop_loc)?;
                    properties.push(ObjectProperty::Method(key, function, kind));
                } else if kind != MethodKind::Method {
                    return Err(self.unexpected());
                } else if self.match_punct(Punct::Colon) {
                    properties.push(ObjectProperty::KeyValue(key, self.parse_assignment()?));
                } else if let Some(name) = shorthand_name {
                    if self.match_punct(Punct::Eq) {
                        let default = self.parse_assignment()?;
                        properties.push(ObjectProperty::ShorthandDefault(
                            name,
                            Box::new(default),
                            prop_loc,
                        ));
                    } else {
                        properties.push(ObjectProperty::Shorthand(name, prop_loc));
                    }
                } else {
                    return Err(self.unexpected());
                }
            }

            if !self.check_punct(Punct::RBrace) {
                self.expect_punct(Punct::Comma)?;
            }
        }

        self.no_in = saved_no_in;
        self.expect_punct(Punct::RBrace)?;

        Ok(AstNode::ObjectLiteral {
            properties,
            location: loc,
        })
    }
}

fn assign_op(punct: Punct) -> Option<AssignOp> {
    let op = match punct {
        Punct::Eq => AssignOp::Assign,
        Punct::PlusEq => AssignOp::Compound(BinOp::Add),
        Punct::MinusEq => AssignOp::Compound(BinOp::Sub),
        Punct::StarEq => AssignOp::Compound(BinOp::Mul),
        Punct::SlashEq => AssignOp::Compound(BinOp::Div),
        Punct::PercentEq => AssignOp::Compound(BinOp::Mod),
        Punct::StarStarEq => AssignOp::Compound(BinOp::Exp),
        Punct::AmpEq => AssignOp::Compound(BinOp::BitAnd),
        Punct::PipeEq => AssignOp::Compound(BinOp::BitOr),
        Punct::CaretEq => AssignOp::Compound(BinOp::BitXor),
        Punct::LtLtEq => AssignOp::Compound(BinOp::Shl),
        Punct::GtGtEq => AssignOp::Compound(BinOp::Shr),
        Punct::GtGtGtEq => AssignOp::Compound(BinOp::UShr),
        Punct::AndAndEq => AssignOp::Logical(LogicalOp::And),
        Punct::OrOrEq => AssignOp::Logical(LogicalOp::Or),
        Punct::QuestionQuestionEq => AssignOp::Logical(LogicalOp::Nullish),
        _ => return None,
    };
    Some(op)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_expr(source: &str) -> AstNode {
        let mut parser = Parser::new(source).unwrap();
        let program = parser.parse_program().unwrap();
        match program.nodes.into_iter().next() {
            Some(AstNode::ExpressionStatement { expr, .. }) => *expr,
            other => panic!("Expected expression statement, got {:?}", other),
        }
    }

    #[test]
    fn test_precedence() {
        match parse_expr("1 + 2 * 3") {
            AstNode::BinaryOp {
                op: BinOp::Add,
                right,
                ..
            } => assert!(matches!(*right, AstNode::BinaryOp { op: BinOp::Mul, .. })),
            other => panic!("Expected addition, got {:?}", other),
        }
    }

    #[test]
    fn test_exponent_is_right_associative() {
        match parse_expr("2 ** 3 ** 2") {
            AstNode::BinaryOp {
                op: BinOp::Exp,
                left,
                right,
                ..
            } => {
                assert!(matches!(*left, AstNode::NumberLiteral(n, _) if n == 2.0));
                assert!(matches!(*right, AstNode::BinaryOp { op: BinOp::Exp, .. }));
            }
            other => panic!("Expected exponent, got {:?}", other),
        }
    }

    #[test]
    fn test_arrow_functions() {
        match parse_expr("(a, b = 2) => a + b") {
            AstNode::Function(f) => {
                assert_eq!(f.kind, FunctionKind::Arrow);
                assert_eq!(f.params.len(), 2);
                assert!(matches!(f.body, FunctionBody::Expression(_)));
            }
            other => panic!("Expected arrow function, got {:?}", other),
        }

        match parse_expr("x => { return x * 2 }") {
            AstNode::Function(f) => assert!(matches!(f.body, FunctionBody::Block(_))),
            other => panic!("Expected arrow function, got {:?}", other),
        }
    }

    #[test]
    fn test_parenthesized_expression_is_not_arrow() {
        assert!(matches!(
            parse_expr("(a + b) * c"),
            AstNode::BinaryOp { op: BinOp::Mul, .. }
        ));
    }

    #[test]
    fn test_destructuring_assignment() {
        match parse_expr("[a, b] = [b, a]") {
            AstNode::Assignment { target, .. } => {
                assert!(matches!(*target, Pattern::Array { .. }))
            }
            other => panic!("Expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_optional_chain_wraps_whole_chain() {
        match parse_expr("user?.profile.name") {
            AstNode::OptionalChain { expr, .. } => match *expr {
                AstNode::MemberAccess {
                    optional: false,
                    object,
                    ..
                } => assert!(matches!(*object, AstNode::MemberAccess { optional: true, .. })),
                other => panic!("Expected member access, got {:?}", other),
            },
            other => panic!("Expected optional chain, got {:?}", other),
        }
    }

    #[test]
    fn test_template_substitutions_are_parsed() {
        match parse_expr("`sum: ${a + b}`") {
            AstNode::Template {
                quasis,
                expressions,
                ..
            } => {
                assert_eq!(quasis.len(), 2);
                assert!(matches!(expressions[0], AstNode::BinaryOp { op: BinOp::Add, .. }));
            }
            other => panic!("Expected template, got {:?}", other),
        }
    }

    #[test]
    fn test_object_literal_forms() {
        match parse_expr("({ a, b: 2, [k]: 3, ...rest, m() { return 1 }, get g() { return 2 } })") {
            AstNode::ObjectLiteral { properties, .. } => {
                assert_eq!(properties.len(), 6);
                assert!(matches!(properties[0], ObjectProperty::Shorthand(..)));
                assert!(matches!(properties[3], ObjectProperty::Spread(_)));
                assert!(matches!(
                    properties[5],
                    ObjectProperty::Method(_, _, MethodKind::Getter)
                ));
            }
            other => panic!("Expected object literal, got {:?}", other),
        }
    }

    #[test]
    fn test_new_with_member_callee() {
        match parse_expr("new ns.Point(1, 2).x") {
            AstNode::MemberAccess { object, .. } => {
                assert!(matches!(*object, AstNode::New { .. }))
            }
            other => panic!("Expected member access, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_assignment_target() {
        let mut parser = Parser::new("1 = 2").unwrap();
        let err = parser.parse_program().unwrap_err();
        assert_eq!(err.message, "Invalid left-hand side in assignment");
    }
}
