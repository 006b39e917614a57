//! Lexer (tokenizer) for snippet source code
//!
//! Converts raw source text into a flat [`Token`] stream consumed by the parser.
//! Besides the usual literals and punctuators it handles the two context
//! sensitive pieces of JavaScript lexing:
//!
//! - regular expression literals, recognised when the previous token cannot end
//!   an expression (so `a / b` divides but `x = /ab+/g` is a regex);
//! - template literals, whose `${...}` substitutions are captured as raw source
//!   fragments and parsed later by a nested parser.
//!
//! The lexer also records, per token, whether a line break preceded it. The
//! parser needs this for automatic semicolon insertion.

use super::ast::SourceLocation;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

/// Reserved words recognised by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Var,
    Let,
    Const,
    Function,
    Return,
    If,
    Else,
    While,
    Do,
    For,
    In,
    InstanceOf,
    TypeOf,
    Void,
    Delete,
    New,
    This,
    Super,
    Class,
    Extends,
    Break,
    Continue,
    Switch,
    Case,
    Default,
    Throw,
    Try,
    Catch,
    Finally,
    Null,
    True,
    False,
    Debugger,
    // Recognised only to reject them with a clear message
    Async,
    Await,
    Yield,
    Import,
    Export,
    With,
}

impl Keyword {
    fn from_ident(ident: &str) -> Option<Self> {
        let keyword = match ident {
            "var" => Keyword::Var,
            "let" => Keyword::Let,
            "const" => Keyword::Const,
            "function" => Keyword::Function,
            "return" => Keyword::Return,
            "if" => Keyword::If,
            "else" => Keyword::Else,
            "while" => Keyword::While,
            "do" => Keyword::Do,
            "for" => Keyword::For,
            "in" => Keyword::In,
            "instanceof" => Keyword::InstanceOf,
            "typeof" => Keyword::TypeOf,
            "void" => Keyword::Void,
            "delete" => Keyword::Delete,
            "new" => Keyword::New,
            "this" => Keyword::This,
            "super" => Keyword::Super,
            "class" => Keyword::Class,
            "extends" => Keyword::Extends,
            "break" => Keyword::Break,
            "continue" => Keyword::Continue,
            "switch" => Keyword::Switch,
            "case" => Keyword::Case,
            "default" => Keyword::Default,
            "throw" => Keyword::Throw,
            "try" => Keyword::Try,
            "catch" => Keyword::Catch,
            "finally" => Keyword::Finally,
            "null" => Keyword::Null,
            "true" => Keyword::True,
            "false" => Keyword::False,
            "debugger" => Keyword::Debugger,
            "async" => Keyword::Async,
            "await" => Keyword::Await,
            "yield" => Keyword::Yield,
            "import" => Keyword::Import,
            "export" => Keyword::Export,
            "with" => Keyword::With,
            _ => return None,
        };
        Some(keyword)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Var => "var",
            Keyword::Let => "let",
            Keyword::Const => "const",
            Keyword::Function => "function",
            Keyword::Return => "return",
            Keyword::If => "if",
            Keyword::Else => "else",
            Keyword::While => "while",
            Keyword::Do => "do",
            Keyword::For => "for",
            Keyword::In => "in",
            Keyword::InstanceOf => "instanceof",
            Keyword::TypeOf => "typeof",
            Keyword::Void => "void",
            Keyword::Delete => "delete",
            Keyword::New => "new",
            Keyword::This => "this",
            Keyword::Super => "super",
            Keyword::Class => "class",
            Keyword::Extends => "extends",
            Keyword::Break => "break",
            Keyword::Continue => "continue",
            Keyword::Switch => "switch",
            Keyword::Case => "case",
            Keyword::Default => "default",
            Keyword::Throw => "throw",
            Keyword::Try => "try",
            Keyword::Catch => "catch",
            Keyword::Finally => "finally",
            Keyword::Null => "null",
            Keyword::True => "true",
            Keyword::False => "false",
            Keyword::Debugger => "debugger",
            Keyword::Async => "async",
            Keyword::Await => "await",
            Keyword::Yield => "yield",
            Keyword::Import => "import",
            Keyword::Export => "export",
            Keyword::With => "with",
        }
    }
}

/// Operators and punctuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Punct {
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Semicolon,
    Comma,
    Dot,
    Ellipsis,
    QuestionDot,
    Question,
    Colon,
    Arrow,
    // Arithmetic
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    StarStar,
    PlusPlus,
    MinusMinus,
    // Comparison
    EqEq,
    NotEq,
    EqEqEq,
    NotEqEq,
    Lt,
    Le,
    Gt,
    Ge,
    // Logical
    AndAnd,
    OrOr,
    QuestionQuestion,
    Bang,
    // Bitwise
    Amp,
    Pipe,
    Caret,
    Tilde,
    LtLt,
    GtGt,
    GtGtGt,
    // Assignment
    Eq,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PercentEq,
    StarStarEq,
    AmpEq,
    PipeEq,
    CaretEq,
    LtLtEq,
    GtGtEq,
    GtGtGtEq,
    AndAndEq,
    OrOrEq,
    QuestionQuestionEq,
}

/// Punctuators ordered longest first so the scanner always takes the
/// longest match.
const PUNCTUATORS: &[(&str, Punct)] = &[
    (">>>=", Punct::GtGtGtEq),
    ("...", Punct::Ellipsis),
    ("===", Punct::EqEqEq),
    ("!==", Punct::NotEqEq),
    ("**=", Punct::StarStarEq),
    ("<<=", Punct::LtLtEq),
    (">>=", Punct::GtGtEq),
    (">>>", Punct::GtGtGt),
    ("&&=", Punct::AndAndEq),
    ("||=", Punct::OrOrEq),
    ("??=", Punct::QuestionQuestionEq),
    ("=>", Punct::Arrow),
    ("==", Punct::EqEq),
    ("!=", Punct::NotEq),
    ("<=", Punct::Le),
    (">=", Punct::Ge),
    ("&&", Punct::AndAnd),
    ("||", Punct::OrOr),
    ("??", Punct::QuestionQuestion),
    ("?.", Punct::QuestionDot),
    ("++", Punct::PlusPlus),
    ("--", Punct::MinusMinus),
    ("+=", Punct::PlusEq),
    ("-=", Punct::MinusEq),
    ("*=", Punct::StarEq),
    ("/=", Punct::SlashEq),
    ("%=", Punct::PercentEq),
    ("&=", Punct::AmpEq),
    ("|=", Punct::PipeEq),
    ("^=", Punct::CaretEq),
    ("**", Punct::StarStar),
    ("<<", Punct::LtLt),
    (">>", Punct::GtGt),
    ("(", Punct::LParen),
    (")", Punct::RParen),
    ("{", Punct::LBrace),
    ("}", Punct::RBrace),
    ("[", Punct::LBracket),
    ("]", Punct::RBracket),
    (";", Punct::Semicolon),
    (",", Punct::Comma),
    (".", Punct::Dot),
    ("?", Punct::Question),
    (":", Punct::Colon),
    ("+", Punct::Plus),
    ("-", Punct::Minus),
    ("*", Punct::Star),
    ("/", Punct::Slash),
    ("%", Punct::Percent),
    ("<", Punct::Lt),
    (">", Punct::Gt),
    ("!", Punct::Bang),
    ("&", Punct::Amp),
    ("|", Punct::Pipe),
    ("^", Punct::Caret),
    ("~", Punct::Tilde),
    ("=", Punct::Eq),
];

impl Punct {
    pub fn as_str(self) -> &'static str {
        PUNCTUATORS
            .iter()
            .find(|(_, p)| *p == self)
            .map(|(s, _)| *s)
            .unwrap_or("?")
    }
}

/// Cooked template literal: `quasis.len() == expressions.len() + 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateToken {
    pub quasis: Vec<Rc<str>>,
    /// Raw source of each `${...}` substitution with the location of its first character
    pub expressions: Vec<(String, SourceLocation)>,
}

/// All token variants produced by the lexer.
///
/// Every variant carries a [`SourceLocation`] so that parse errors can report
/// an accurate line and column without a separate token→location table.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64, SourceLocation),
    String(Rc<str>, SourceLocation),
    Template(Rc<TemplateToken>, SourceLocation),
    RegExp(Rc<str>, Rc<str>, SourceLocation),
    Ident(Rc<str>, SourceLocation),
    Keyword(Keyword, SourceLocation),
    Punct(Punct, SourceLocation),
    Eof(SourceLocation),
}

impl Token {
    /// Returns the source location where this token appears.
    pub fn location(&self) -> SourceLocation {
        match self {
            Token::Number(_, loc)
            | Token::String(_, loc)
            | Token::Template(_, loc)
            | Token::RegExp(_, _, loc)
            | Token::Ident(_, loc)
            | Token::Keyword(_, loc)
            | Token::Punct(_, loc)
            | Token::Eof(loc) => *loc,
        }
    }

    pub fn is_punct(&self, punct: Punct) -> bool {
        matches!(self, Token::Punct(p, _) if *p == punct)
    }

    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        matches!(self, Token::Keyword(k, _) if *k == keyword)
    }

    /// Whether a `/` following this token starts a regular expression.
    fn allows_regex_after(&self) -> bool {
        match self {
            Token::Number(..)
            | Token::String(..)
            | Token::Template(..)
            | Token::RegExp(..)
            | Token::Ident(..) => false,
            Token::Keyword(k, _) => !matches!(
                k,
                Keyword::This | Keyword::Super | Keyword::Null | Keyword::True | Keyword::False
            ),
            Token::Punct(p, _) => !matches!(
                p,
                Punct::RParen
                    | Punct::RBracket
                    | Punct::RBrace
                    | Punct::PlusPlus
                    | Punct::MinusMinus
            ),
            Token::Eof(_) => true,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(..) => write!(f, "number"),
            Token::String(..) => write!(f, "string"),
            Token::Template(..) => write!(f, "template string"),
            Token::RegExp(..) => write!(f, "regular expression"),
            Token::Ident(name, _) => write!(f, "identifier '{}'", name),
            Token::Keyword(k, _) => write!(f, "token '{}'", k.as_str()),
            Token::Punct(p, _) => write!(f, "token '{}'", p.as_str()),
            Token::Eof(_) => write!(f, "end of input"),
        }
    }
}

/// Lexer error type
#[derive(Debug, Clone, Error)]
#[error("{message} (line {}, column {})", location.line, location.column)]
pub struct LexError {
    pub message: String,
    pub location: SourceLocation,
}

/// Lexer for snippet source code
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    saw_newline: bool,
    line_breaks: Vec<bool>,
    regex_allowed: bool,
}

impl Lexer {
    /// Create a new lexer for the given source string.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            saw_newline: false,
            line_breaks: Vec::new(),
            regex_allowed: true,
        }
    }

    /// Create a lexer for a fragment embedded in a larger source (template
    /// substitutions), so token locations stay in the outer coordinates.
    pub fn starting_at(input: &str, location: SourceLocation) -> Self {
        let mut lexer = Self::new(input);
        lexer.line = location.line;
        lexer.column = location.column;
        lexer
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();

        // Hashbang line
        if self.peek() == Some('#') && self.peek_ahead(1) == Some('!') {
            self.skip_line_comment();
        }

        loop {
            self.saw_newline = false;
            self.skip_whitespace_and_comments()?;
            self.line_breaks.push(self.saw_newline);

            if self.is_at_end() {
                tokens.push(Token::Eof(self.current_location()));
                break;
            }

            let token = self.next_token()?;
            self.regex_allowed = token.allows_regex_after();
            tokens.push(token);
        }

        Ok(tokens)
    }

    /// Per-token flags telling whether a line terminator preceded the token.
    /// Only meaningful after [`Lexer::tokenize`].
    pub fn into_line_breaks(self) -> Vec<bool> {
        self.line_breaks
    }

    /// Get next token
    fn next_token(&mut self) -> Result<Token, LexError> {
        let loc = self.current_location();
        let ch = match self.peek() {
            Some(ch) => ch,
            None => return Ok(Token::Eof(loc)),
        };

        match ch {
            '"' | '\'' => {
                self.advance();
                self.string_literal(ch, loc)
            }
            '`' => {
                self.advance();
                self.template_literal(loc)
            }
            '0'..='9' => self.number_literal(loc),
            '.' if self.peek_ahead(1).is_some_and(|c| c.is_ascii_digit()) => {
                self.number_literal(loc)
            }
            '/' if self.regex_allowed => {
                self.advance();
                self.regex_literal(loc)
            }
            c if is_identifier_start(c) || c == '#' => self.identifier_or_keyword(loc),
            _ => self.punctuator(loc),
        }
    }

    fn punctuator(&mut self, loc: SourceLocation) -> Result<Token, LexError> {
        for (text, punct) in PUNCTUATORS {
            if !self.starts_with(text) {
                continue;
            }
            // `a?.5:b` is a conditional, not optional chaining
            if *punct == Punct::QuestionDot
                && self.peek_ahead(2).is_some_and(|c| c.is_ascii_digit())
            {
                continue;
            }
            for _ in 0..text.chars().count() {
                self.advance();
            }
            return Ok(Token::Punct(*punct, loc));
        }

        let ch = self.peek().unwrap_or('\0');
        Err(LexError {
            message: format!("Invalid or unexpected token '{}'", ch),
            location: loc,
        })
    }

    fn starts_with(&self, text: &str) -> bool {
        text.chars()
            .enumerate()
            .all(|(i, c)| self.peek_ahead(i) == Some(c))
    }

    /// Parse string literal (opening quote already consumed)
    fn string_literal(&mut self, quote: char, loc: SourceLocation) -> Result<Token, LexError> {
        let mut string = String::new();

        while let Some(ch) = self.peek() {
            if ch == quote {
                self.advance(); // consume closing quote
                return Ok(Token::String(string.into(), loc));
            }

            match ch {
                '\n' | '\r' => break,
                '\\' => {
                    self.advance();
                    self.escape_sequence(&mut string)?;
                }
                _ => {
                    string.push(ch);
                    self.advance();
                }
            }
        }

        Err(LexError {
            message: "Invalid or unexpected token (unterminated string literal)".to_string(),
            location: loc,
        })
    }

    /// Decode one escape sequence (backslash already consumed) into `out`.
    fn escape_sequence(&mut self, out: &mut String) -> Result<(), LexError> {
        let loc = self.current_location();
        let escaped = self.advance().ok_or_else(|| LexError {
            message: "Invalid or unexpected token (unterminated escape)".to_string(),
            location: loc,
        })?;

        match escaped {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' if !self.peek().is_some_and(|c| c.is_ascii_digit()) => out.push('\0'),
            'x' => {
                let code = self.hex_digits(2, loc)?;
                out.push(char::from_u32(code).unwrap_or('\u{fffd}'));
            }
            'u' => {
                let code = self.unicode_escape(loc)?;
                // Combine surrogate pairs written as two escapes
                if (0xD800..0xDC00).contains(&code)
                    && self.peek() == Some('\\')
                    && self.peek_ahead(1) == Some('u')
                {
                    let saved = (self.position, self.line, self.column);
                    self.advance();
                    self.advance();
                    let low = self.unicode_escape(loc)?;
                    if (0xDC00..0xE000).contains(&low) {
                        let combined = 0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
                        out.push(char::from_u32(combined).unwrap_or('\u{fffd}'));
                        return Ok(());
                    }
                    (self.position, self.line, self.column) = saved;
                }
                out.push(char::from_u32(code).unwrap_or('\u{fffd}'));
            }
            '\r' => {
                // Line continuation
                if self.peek() == Some('\n') {
                    self.advance();
                }
            }
            '\n' | '\u{2028}' | '\u{2029}' => {}
            other => out.push(other),
        }
        Ok(())
    }

    fn unicode_escape(&mut self, loc: SourceLocation) -> Result<u32, LexError> {
        if self.peek() == Some('{') {
            self.advance();
            let mut digits = String::new();
            while let Some(c) = self.peek() {
                self.advance();
                if c == '}' {
                    return u32::from_str_radix(&digits, 16)
                        .ok()
                        .filter(|code| *code <= 0x10FFFF)
                        .ok_or_else(|| LexError {
                            message: "Undefined Unicode code-point".to_string(),
                            location: loc,
                        });
                }
                digits.push(c);
            }
            return Err(LexError {
                message: "Invalid Unicode escape sequence".to_string(),
                location: loc,
            });
        }
        self.hex_digits(4, loc)
    }

    fn hex_digits(&mut self, count: usize, loc: SourceLocation) -> Result<u32, LexError> {
        let mut value = 0u32;
        for _ in 0..count {
            let digit = self
                .peek()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| LexError {
                    message: "Invalid hexadecimal escape sequence".to_string(),
                    location: loc,
                })?;
            self.advance();
            value = value * 16 + digit;
        }
        Ok(value)
    }

    /// Parse a template literal (opening backtick already consumed)
    fn template_literal(&mut self, loc: SourceLocation) -> Result<Token, LexError> {
        let mut quasis = Vec::new();
        let mut expressions = Vec::new();
        let mut current = String::new();

        loop {
            let ch = self.peek().ok_or_else(|| LexError {
                message: "Unterminated template literal".to_string(),
                location: loc,
            })?;

            match ch {
                '`' => {
                    self.advance();
                    quasis.push(Rc::from(current));
                    let template = TemplateToken {
                        quasis,
                        expressions,
                    };
                    return Ok(Token::Template(Rc::new(template), loc));
                }
                '\\' => {
                    self.advance();
                    self.escape_sequence(&mut current)?;
                }
                '$' if self.peek_ahead(1) == Some('{') => {
                    self.advance();
                    self.advance();
                    quasis.push(Rc::from(std::mem::take(&mut current)));
                    let expr_loc = self.current_location();
                    let source = self.substitution_source(expr_loc)?;
                    expressions.push((source, expr_loc));
                }
                '\r' => {
                    self.advance();
                    if self.peek() == Some('\n') {
                        self.advance();
                    }
                    current.push('\n');
                }
                _ => {
                    current.push(ch);
                    self.advance();
                }
            }
        }
    }

    /// Capture the raw source of a `${...}` substitution up to its closing brace.
    fn substitution_source(&mut self, loc: SourceLocation) -> Result<String, LexError> {
        let start = self.position;
        let mut depth = 1usize;

        while let Some(ch) = self.peek() {
            match ch {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        let source: String = self.input[start..self.position].iter().collect();
                        self.advance();
                        return Ok(source);
                    }
                }
                '"' | '\'' => {
                    self.advance();
                    self.skip_quoted(ch);
                    continue;
                }
                '`' => {
                    self.advance();
                    // Nested template: lex it fully and discard, we only need its extent
                    self.template_literal(loc)?;
                    continue;
                }
                _ => {}
            }
            self.advance();
        }

        Err(LexError {
            message: "Unterminated template substitution".to_string(),
            location: loc,
        })
    }

    fn skip_quoted(&mut self, quote: char) {
        while let Some(ch) = self.advance() {
            if ch == '\\' {
                self.advance();
            } else if ch == quote || ch == '\n' {
                break;
            }
        }
    }

    /// Parse a regular expression literal (opening slash already consumed)
    fn regex_literal(&mut self, loc: SourceLocation) -> Result<Token, LexError> {
        let mut pattern = String::new();
        let mut in_class = false;

        loop {
            let ch = match self.peek() {
                Some(c) if c != '\n' && c != '\r' => c,
                _ => {
                    return Err(LexError {
                        message: "Invalid regular expression: missing /".to_string(),
                        location: loc,
                    })
                }
            };
            self.advance();

            match ch {
                '\\' => {
                    pattern.push('\\');
                    if let Some(next) = self.advance() {
                        pattern.push(next);
                    }
                }
                '[' => {
                    in_class = true;
                    pattern.push(ch);
                }
                ']' => {
                    in_class = false;
                    pattern.push(ch);
                }
                '/' if !in_class => break,
                _ => pattern.push(ch),
            }
        }

        let mut flags = String::new();
        while let Some(c) = self.peek() {
            if is_identifier_part(c) {
                flags.push(c);
                self.advance();
            } else {
                break;
            }
        }

        Ok(Token::RegExp(pattern.into(), flags.into(), loc))
    }

    /// Parse numeric literal
    fn number_literal(&mut self, loc: SourceLocation) -> Result<Token, LexError> {
        let radix = match (self.peek(), self.peek_ahead(1)) {
            (Some('0'), Some('x' | 'X')) => Some(16),
            (Some('0'), Some('o' | 'O')) => Some(8),
            (Some('0'), Some('b' | 'B')) => Some(2),
            _ => None,
        };

        let value = if let Some(radix) = radix {
            self.advance();
            self.advance();
            let mut value = 0f64;
            let mut digits = 0;
            while let Some(c) = self.peek() {
                if c == '_' {
                    self.advance();
                    continue;
                }
                match c.to_digit(radix) {
                    Some(d) => {
                        value = value * radix as f64 + d as f64;
                        digits += 1;
                        self.advance();
                    }
                    None => break,
                }
            }
            if digits == 0 {
                return Err(LexError {
                    message: "Invalid or unexpected token (missing digits)".to_string(),
                    location: loc,
                });
            }
            value
        } else {
            let mut text = String::new();
            self.take_digits(&mut text);
            if self.peek() == Some('.') {
                text.push('.');
                self.advance();
                self.take_digits(&mut text);
            }
            if matches!(self.peek(), Some('e' | 'E')) {
                let sign = self.peek_ahead(1);
                let exponent_follows = match sign {
                    Some('+' | '-') => self.peek_ahead(2).is_some_and(|c| c.is_ascii_digit()),
                    Some(c) => c.is_ascii_digit(),
                    None => false,
                };
                if exponent_follows {
                    text.push('e');
                    self.advance();
                    if let Some(s @ ('+' | '-')) = self.peek() {
                        text.push(s);
                        self.advance();
                    }
                    self.take_digits(&mut text);
                }
            }
            text.parse::<f64>().map_err(|_| LexError {
                message: format!("Invalid number literal: {}", text),
                location: loc,
            })?
        };

        if self.peek() == Some('n') {
            return Err(LexError {
                message: "BigInt literals are not supported".to_string(),
                location: loc,
            });
        }
        if self.peek().is_some_and(is_identifier_start) {
            return Err(LexError {
                message: "Invalid or unexpected token".to_string(),
                location: self.current_location(),
            });
        }

        Ok(Token::Number(value, loc))
    }

    fn take_digits(&mut self, text: &mut String) {
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
                self.advance();
            } else if c == '_' && self.peek_ahead(1).is_some_and(|n| n.is_ascii_digit()) {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Parse identifier or keyword
    fn identifier_or_keyword(&mut self, loc: SourceLocation) -> Result<Token, LexError> {
        let mut ident = String::new();
        if let Some(first) = self.advance() {
            ident.push(first);
        }

        while let Some(ch) = self.peek() {
            if is_identifier_part(ch) {
                ident.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if ident == "#" {
            return Err(LexError {
                message: "Invalid or unexpected token '#'".to_string(),
                location: loc,
            });
        }

        Ok(match Keyword::from_ident(&ident) {
            Some(keyword) => Token::Keyword(keyword, loc),
            None => Token::Ident(ident.into(), loc),
        })
    }

    /// Skip whitespace and comments
    fn skip_whitespace_and_comments(&mut self) -> Result<(), LexError> {
        loop {
            match self.peek() {
                Some('\n' | '\r' | '\u{2028}' | '\u{2029}') => {
                    self.saw_newline = true;
                    self.advance();
                }
                Some(c) if c.is_whitespace() || c == '\u{feff}' => {
                    self.advance();
                }
                Some('/') => {
                    if self.peek_ahead(1) == Some('/') {
                        self.skip_line_comment();
                    } else if self.peek_ahead(1) == Some('*') {
                        self.skip_block_comment()?;
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    /// Skip single-line comment (// ...), leaving the newline in place
    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' || ch == '\r' {
                break;
            }
            self.advance();
        }
    }

    /// Skip multi-line comment (/* ... */)
    fn skip_block_comment(&mut self) -> Result<(), LexError> {
        let start_loc = self.current_location();
        self.advance(); // skip '/'
        self.advance(); // skip '*'

        while !self.is_at_end() {
            if self.peek() == Some('*') && self.peek_ahead(1) == Some('/') {
                self.advance(); // skip '*'
                self.advance(); // skip '/'
                return Ok(());
            }
            if self.peek() == Some('\n') {
                self.saw_newline = true;
            }
            self.advance();
        }

        Err(LexError {
            message: "Invalid or unexpected token (unterminated comment)".to_string(),
            location: start_loc,
        })
    }

    /// Peek at current character without consuming
    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    /// Peek ahead n characters
    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    /// Advance to next character
    fn advance(&mut self) -> Option<char> {
        let ch = self.input.get(self.position).copied()?;
        self.position += 1;

        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(ch)
    }

    /// Check if at end of input
    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    /// Get current source location
    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_identifier_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$' || c == '\u{200c}' || c == '\u{200d}'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<Token> {
        Lexer::new(source).tokenize().unwrap()
    }

    #[test]
    fn test_simple_tokens() {
        let tokens = lex("const x = 42;");

        assert!(tokens[0].is_keyword(Keyword::Const));
        assert!(matches!(tokens[1], Token::Ident(ref s, _) if &**s == "x"));
        assert!(tokens[2].is_punct(Punct::Eq));
        assert!(matches!(tokens[3], Token::Number(n, _) if n == 42.0));
        assert!(tokens[4].is_punct(Punct::Semicolon));
        assert!(matches!(tokens[5], Token::Eof(_)));
    }

    #[test]
    fn test_longest_match_operators() {
        let tokens = lex("=== !== ** **= >>> ?. ?? ??= => ...");
        let puncts: Vec<Punct> = tokens
            .iter()
            .filter_map(|t| match t {
                Token::Punct(p, _) => Some(*p),
                _ => None,
            })
            .collect();

        assert_eq!(
            puncts,
            vec![
                Punct::EqEqEq,
                Punct::NotEqEq,
                Punct::StarStar,
                Punct::StarStarEq,
                Punct::GtGtGt,
                Punct::QuestionDot,
                Punct::QuestionQuestion,
                Punct::QuestionQuestionEq,
                Punct::Arrow,
                Punct::Ellipsis,
            ]
        );
    }

    #[test]
    fn test_conditional_with_decimal_is_not_optional_chain() {
        let tokens = lex("a?.5:1");
        assert!(tokens[1].is_punct(Punct::Question));
        assert!(matches!(tokens[2], Token::Number(n, _) if n == 0.5));
    }

    #[test]
    fn test_number_forms() {
        let tokens = lex("0xff 0b101 0o17 1_000 .5 2e3 1.5e-2");
        let numbers: Vec<f64> = tokens
            .iter()
            .filter_map(|t| match t {
                Token::Number(n, _) => Some(*n),
                _ => None,
            })
            .collect();
        assert_eq!(numbers, vec![255.0, 5.0, 15.0, 1000.0, 0.5, 2000.0, 0.015]);
    }

    #[test]
    fn test_string_escapes() {
        let tokens = lex(r#"'it\'s' "tab\there" "A\x42\u{1F600}""#);
        assert!(matches!(tokens[0], Token::String(ref s, _) if &**s == "it's"));
        assert!(matches!(tokens[1], Token::String(ref s, _) if &**s == "tab\there"));
        assert!(matches!(tokens[2], Token::String(ref s, _) if &**s == "AB\u{1F600}"));
    }

    #[test]
    fn test_regex_versus_division() {
        let tokens = lex("a / b; x = /ab+c/gi;");
        assert!(tokens[1].is_punct(Punct::Slash));
        assert!(matches!(
            tokens[6],
            Token::RegExp(ref p, ref f, _) if &**p == "ab+c" && &**f == "gi"
        ));
    }

    #[test]
    fn test_regex_with_slash_in_class() {
        let tokens = lex(r"const re = /[/]+/;");
        assert!(matches!(tokens[3], Token::RegExp(ref p, _, _) if &**p == "[/]+"));
    }

    #[test]
    fn test_template_literal() {
        let tokens = lex("`Hello ${name}, you have ${count + 1} items`");
        match &tokens[0] {
            Token::Template(t, _) => {
                assert_eq!(t.quasis.len(), 3);
                assert_eq!(&*t.quasis[0], "Hello ");
                assert_eq!(t.expressions[0].0, "name");
                assert_eq!(t.expressions[1].0, "count + 1");
                assert_eq!(&*t.quasis[2], " items");
            }
            other => panic!("Expected template, got {:?}", other),
        }
    }

    #[test]
    fn test_nested_template_substitution() {
        let tokens = lex("`a ${ `b ${ {x: 1}.x }` } c`");
        match &tokens[0] {
            Token::Template(t, _) => {
                assert_eq!(t.expressions.len(), 1);
                assert_eq!(t.expressions[0].0.trim(), "`b ${ {x: 1}.x }`");
            }
            other => panic!("Expected template, got {:?}", other),
        }
    }

    #[test]
    fn test_comments_and_line_breaks() {
        let mut lexer = Lexer::new("let a = 1 // one\nlet b /* two\n */ = 2");
        let tokens = lexer.tokenize().unwrap();
        let breaks = lexer.into_line_breaks();

        assert!(tokens[0].is_keyword(Keyword::Let));
        assert!(tokens[4].is_keyword(Keyword::Let));
        assert!(breaks[4]);
        assert!(!breaks[3]);
        assert!(breaks[6]);
    }

    #[test]
    fn test_unterminated_string_is_error() {
        assert!(Lexer::new("'abc").tokenize().is_err());
    }
}
