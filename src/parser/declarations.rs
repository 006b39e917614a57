//! Declaration parsing implementation
//!
//! This module handles the parts of the grammar that introduce bindings:
//!
//! - Functions: `function name(params) { ... }` and method bodies
//! - Parameters: defaults, rest parameters, destructuring
//! - Classes: `class Name extends Base { constructor() {} method() {} }`
//! - Binding patterns: `[a, , b = 1, ...rest]`, `{x, y: alias, ...others}`
//!
//! # Grammar
//!
//! ```text
//! function   ::= "function" identifier? "(" params ")" "{" statements "}"
//! params     ::= (binding_element ",")* ("..." binding_target)?
//! class      ::= "class" identifier? ("extends" lhs_expr)? "{" member* "}"
//! member     ::= "static"? ("get" | "set")? property_name ( "(" params ")" block | ("=" expr)? ";" )
//! binding_element ::= binding_target ("=" assignment_expr)?
//! ```
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::{Keyword, Punct, Token};
use crate::parser::parse::{ParseError, Parser};
use std::rc::Rc;

impl Parser {
    /// Parse a function after the `function` keyword
    pub(crate) fn parse_function_rest(
        &mut self,
        kind: FunctionKind,
        require_name: bool,
        loc: SourceLocation,
    ) -> Result<Rc<FunctionNode>, ParseError> {
        if self.check_punct(Punct::Star) {
            return Err(self.error_at("generators are not supported", self.current_location()));
        }

        let name = if matches!(self.peek(), Token::Ident(..)) {
            Some(self.expect_identifier()?)
        } else if require_name {
            return Err(self.error_at("Function statements require a function name", loc));
        } else {
            None
        };

        self.parse_function_signature(name, kind, loc)
    }

    /// Parameter list and body, shared by functions, methods and accessors
    pub(crate) fn parse_function_signature(
        &mut self,
        name: Option<Rc<str>>,
        kind: FunctionKind,
        loc: SourceLocation,
    ) -> Result<Rc<FunctionNode>, ParseError> {
        let (params, rest) = self.parse_params()?;

        match kind {
            FunctionKind::Getter if !params.is_empty() || rest.is_some() => {
                return Err(self.error_at("Getter must not have any formal parameters.", loc));
            }
            FunctionKind::Setter if params.len() != 1 || rest.is_some() => {
                return Err(
                    self.error_at("Setter must have exactly one formal parameter.", loc)
                );
            }
            _ => {}
        }

        self.expect_punct(Punct::LBrace)?;
        let body = self.parse_function_body()?;
        self.expect_punct(Punct::RBrace)?;

        Ok(Rc::new(FunctionNode {
            name,
            params,
            rest,
            body: FunctionBody::Block(body),
            kind,
            location: loc,
        }))
    }

    /// Statements of a function body; opens a new `return` context
    pub(crate) fn parse_function_body(&mut self) -> Result<Vec<AstNode>, ParseError> {
        self.function_depth += 1;
        let saved_no_in = std::mem::replace(&mut self.no_in, false);
        let body = self.parse_block_statements();
        self.no_in = saved_no_in;
        self.function_depth -= 1;
        body
    }

    /// `( a, [b, c] = [], ...rest )`
    pub(crate) fn parse_params(
        &mut self,
    ) -> Result<(Vec<PatternElement>, Option<Pattern>), ParseError> {
        self.expect_punct(Punct::LParen)?;
        let saved_no_in = std::mem::replace(&mut self.no_in, false);

        let mut params = Vec::new();
        let mut rest = None;

        while !self.check_punct(Punct::RParen) {
            if self.match_punct(Punct::Ellipsis) {
                rest = Some(self.parse_binding_target()?);
                if !self.check_punct(Punct::RParen) {
                    return Err(self.error_at(
                        "Rest parameter must be last formal parameter",
                        self.current_location(),
                    ));
                }
                break;
            }

            params.push(self.parse_binding_element()?);

            if !self.match_punct(Punct::Comma) {
                break;
            }
        }

        self.no_in = saved_no_in;
        self.expect_punct(Punct::RParen)?;
        Ok((params, rest))
    }

    /// Binding target with optional default value
    pub(crate) fn parse_binding_element(&mut self) -> Result<PatternElement, ParseError> {
        let target = self.parse_binding_target()?;
        let default = if self.match_punct(Punct::Eq) {
            Some(self.parse_assignment()?)
        } else {
            None
        };
        Ok(PatternElement { target, default })
    }

    /// Identifier, array pattern or object pattern in a declaration
    pub(crate) fn parse_binding_target(&mut self) -> Result<Pattern, ParseError> {
        self.nested(Self::parse_binding_pattern)
    }

    fn parse_binding_pattern(&mut self) -> Result<Pattern, ParseError> {
        let loc = self.current_location();

        if self.match_punct(Punct::LBracket) {
            let mut elements = Vec::new();
            let mut rest = None;

            while !self.check_punct(Punct::RBracket) {
                if self.match_punct(Punct::Comma) {
                    elements.push(None);
                    continue;
                }
                if self.match_punct(Punct::Ellipsis) {
                    rest = Some(Box::new(self.parse_binding_target()?));
                    break;
                }
                elements.push(Some(self.parse_binding_element()?));
                if !self.check_punct(Punct::RBracket) {
                    self.expect_punct(Punct::Comma)?;
                }
            }
            self.expect_punct(Punct::RBracket)?;

            return Ok(Pattern::Array {
                elements,
                rest,
                location: loc,
            });
        }

        if self.match_punct(Punct::LBrace) {
            let mut properties = Vec::new();
            let mut rest = None;

            while !self.check_punct(Punct::RBrace) {
                if self.match_punct(Punct::Ellipsis) {
                    let name_loc = self.current_location();
                    let name = self.expect_identifier()?;
                    rest = Some(Box::new(Pattern::Identifier(name, name_loc)));
                    break;
                }

                let key_loc = self.current_location();
                let shorthand = matches!(self.peek(), Token::Ident(..));
                let key = self.parse_property_name()?;

                let value = if self.match_punct(Punct::Colon) {
                    self.parse_binding_element()?
                } else {
                    let name = match (&key, shorthand) {
                        (PropertyKey::Named(name), true) => name.clone(),
                        _ => return Err(self.unexpected()),
                    };
                    let default = if self.match_punct(Punct::Eq) {
                        Some(self.parse_assignment()?)
                    } else {
                        None
                    };
                    PatternElement {
                        target: Pattern::Identifier(name, key_loc),
                        default,
                    }
                };
                properties.push(ObjectPatternProperty { key, value });

                if !self.check_punct(Punct::RBrace) {
                    self.expect_punct(Punct::Comma)?;
                }
            }
            self.expect_punct(Punct::RBrace)?;

            return Ok(Pattern::Object {
                properties,
                rest,
                location: loc,
            });
        }

        let name = self.expect_identifier()?;
        Ok(Pattern::Identifier(name, loc))
    }

    /// Parse a class after the `class` keyword
    pub(crate) fn parse_class_rest(
        &mut self,
        require_name: bool,
        loc: SourceLocation,
    ) -> Result<Rc<ClassNode>, ParseError> {
        let name = if matches!(self.peek(), Token::Ident(..)) {
            Some(self.expect_identifier()?)
        } else if require_name {
            return Err(self.unexpected());
        } else {
            None
        };

        let superclass = if self.match_keyword(Keyword::Extends) {
            Some(Box::new(self.parse_left_hand_side()?))
        } else {
            None
        };

        self.expect_punct(Punct::LBrace)?;

        let mut constructor = None;
        let mut members = Vec::new();

        while !self.check_punct(Punct::RBrace) {
            if self.is_at_end() {
                return Err(self.unexpected());
            }
            if self.match_punct(Punct::Semicolon) {
                continue;
            }

            let member_loc = self.current_location();

            let mut is_static = false;
            if self.check_contextual("static")
                && !self.peek_ahead(1).is_some_and(|t| {
                    t.is_punct(Punct::LParen) || t.is_punct(Punct::Eq)
                })
            {
                self.advance();
                is_static = true;
                if self.check_punct(Punct::LBrace) {
                    return Err(self.error_at(
                        "static initialization blocks are not supported",
                        member_loc,
                    ));
                }
            }

            if self.check_keyword(Keyword::Async) || self.check_punct(Punct::Star) {
                return Err(self.unexpected());
            }

            let kind = self.parse_accessor_prefix();
            let key = self.parse_property_name()?;

            if self.check_punct(Punct::LParen) {
                let is_constructor = !is_static
                    && kind == MethodKind::Method
                    && matches!(&key, PropertyKey::Named(n) if &**n == "constructor");

                let function_kind = if is_constructor {
                    FunctionKind::Constructor
                } else {
                    match kind {
                        MethodKind::Method => FunctionKind::Method,
                        MethodKind::Getter => FunctionKind::Getter,
                        MethodKind::Setter => FunctionKind::Setter,
                    }
                };

                let method_name = match &key {
                    PropertyKey::Named(n) => Some(n.clone()),
                    PropertyKey::Computed(_) => None,
                };
                let function = self.parse_function_signature(method_name, function_kind, member_loc)?;

                if is_constructor {
                    if constructor.is_some() {
                        return Err(self.error_at(
                            "A class may only have one constructor",
                            member_loc,
                        ));
                    }
                    constructor = Some(function);
                } else {
                    members.push(ClassMember::Method {
                        key,
                        function,
                        kind,
                        is_static,
                    });
                }
                continue;
            }

            if kind != MethodKind::Method {
                return Err(self.unexpected());
            }

            // Field initializers run with `this` bound to the instance
            let value = if self.match_punct(Punct::Eq) {
                self.function_depth += 1;
                let value = self.parse_assignment();
                self.function_depth -= 1;
                Some(value?)
            } else {
                None
            };
            self.consume_semicolon()?;

            members.push(ClassMember::Field {
                key,
                value,
                is_static,
                location: member_loc,
            });
        }

        self.expect_punct(Punct::RBrace)?;

        Ok(Rc::new(ClassNode {
            name,
            superclass,
            constructor,
            members,
            location: loc,
        }))
    }

    /// Consume a `get`/`set` prefix when it introduces an accessor rather than
    /// naming a method called `get` or `set`.
    pub(crate) fn parse_accessor_prefix(&mut self) -> MethodKind {
        let kind = if self.check_contextual("get") {
            MethodKind::Getter
        } else if self.check_contextual("set") {
            MethodKind::Setter
        } else {
            return MethodKind::Method;
        };

        let names_property = self.peek_ahead(1).is_some_and(|t| {
            matches!(
                t,
                Token::Ident(..) | Token::Keyword(..) | Token::String(..) | Token::Number(..)
            ) || t.is_punct(Punct::LBracket)
        });

        if names_property {
            self.advance();
            kind
        } else {
            MethodKind::Method
        }
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
    fn test_parse_class_members() {
        let nodes = parse(
            r#"
            class Counter extends Base {
                count = 0;
                static instances = 0;
                constructor(start) { super(); this.count = start; }
                get value() { return this.count; }
                set value(v) { this.count = v; }
                static create() { return new Counter(0); }
                increment() { this.count++; }
            }
            "#,
        );

        match &nodes[0] {
            AstNode::ClassDecl(class) => {
                assert_eq!(class.name.as_deref(), Some("Counter"));
                assert!(class.superclass.is_some());
                assert!(class.constructor.is_some());
                assert_eq!(class.members.len(), 6);
                assert!(matches!(
                    class.members[1],
                    ClassMember::Field { is_static: true, .. }
                ));
                assert!(matches!(
                    class.members[2],
                    ClassMember::Method {
                        kind: MethodKind::Getter,
                        ..
                    }
                ));
            }
            other => panic!("Expected class declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_method_named_get() {
        let nodes = parse("class Store { get(key) { return key; } }");
        match &nodes[0] {
            AstNode::ClassDecl(class) => assert!(matches!(
                class.members[0],
                ClassMember::Method {
                    kind: MethodKind::Method,
                    ..
                }
            )),
            other => panic!("Expected class declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_parameter_defaults_and_rest() {
        let nodes = parse("function f(a, {b, c = 2}, d = 3, ...rest) {}");
        match &nodes[0] {
            AstNode::FunctionDecl(f) => {
                assert_eq!(f.params.len(), 3);
                assert!(f.rest.is_some());
                assert_eq!(f.arity(), 2);
            }
            other => panic!("Expected function, got {:?}", other),
        }
    }

    #[test]
    fn test_array_pattern_holes() {
        let nodes = parse("const [, second, ...others] = list;");
        match &nodes[0] {
            AstNode::VarDecl { declarations, .. } => match &declarations[0].target {
                Pattern::Array { elements, rest, .. } => {
                    assert_eq!(elements.len(), 2);
                    assert!(elements[0].is_none());
                    assert!(rest.is_some());
                }
                other => panic!("Expected array pattern, got {:?}", other),
            },
            other => panic!("Expected declaration, got {:?}", other),
        }
    }
}
