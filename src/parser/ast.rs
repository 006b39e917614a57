// AST (Abstract Syntax Tree) definitions for the snippet interpreter

use std::rc::Rc;

/// Source location information for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Declaration keyword of a variable binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Var,
    Let,
    Const,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Exp,
    // Comparison
    Eq,
    Ne,
    StrictEq,
    StrictNe,
    Lt,
    Le,
    Gt,
    Ge,
    // Bitwise
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    UShr,
    // Relational keywords
    In,
    InstanceOf,
}

/// Short-circuiting operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
    Nullish,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,    // -x
    Plus,   // +x
    Not,    // !x
    BitNot, // ~x
    TypeOf,
    Void,
    Delete,
}

/// Assignment operators (`=`, `+=`, `&&=`, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Compound(BinOp),
    Logical(LogicalOp),
}

/// Property name in object literals, classes and patterns
#[derive(Debug, Clone)]
pub enum PropertyKey {
    Named(Rc<str>),
    Computed(Box<AstNode>),
}

/// Binding or assignment target
#[derive(Debug, Clone)]
pub enum Pattern {
    Identifier(Rc<str>, SourceLocation),
    Array {
        elements: Vec<Option<PatternElement>>,
        rest: Option<Box<Pattern>>,
        location: SourceLocation,
    },
    Object {
        properties: Vec<ObjectPatternProperty>,
        rest: Option<Box<Pattern>>,
        location: SourceLocation,
    },
    /// Member expression target, only valid in assignments
    Expression(Box<AstNode>),
}

impl Pattern {
    pub fn location(&self) -> SourceLocation {
        match self {
            Pattern::Identifier(_, loc) => *loc,
            Pattern::Array { location, .. } | Pattern::Object { location, .. } => *location,
            Pattern::Expression(node) => *node.location(),
        }
    }

    /// Collect every identifier bound by this pattern
    pub fn bound_names(&self, names: &mut Vec<Rc<str>>) {
        match self {
            Pattern::Identifier(name, _) => names.push(name.clone()),
            Pattern::Array { elements, rest, .. } => {
                for element in elements.iter().flatten() {
                    element.target.bound_names(names);
                }
                if let Some(rest) = rest {
                    rest.bound_names(names);
                }
            }
            Pattern::Object {
                properties, rest, ..
            } => {
                for prop in properties {
                    prop.value.target.bound_names(names);
                }
                if let Some(rest) = rest {
                    rest.bound_names(names);
                }
            }
            Pattern::Expression(_) => {}
        }
    }
}

/// Pattern with an optional default value
#[derive(Debug, Clone)]
pub struct PatternElement {
    pub target: Pattern,
    pub default: Option<AstNode>,
}

#[derive(Debug, Clone)]
pub struct ObjectPatternProperty {
    pub key: PropertyKey,
    pub value: PatternElement,
}

/// Kind of callable produced by a function node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    Normal,
    Arrow,
    Method,
    Getter,
    Setter,
    Constructor,
}

#[derive(Debug, Clone)]
pub enum FunctionBody {
    Block(Vec<AstNode>),
    Expression(Box<AstNode>),
}

/// Function declaration, expression, arrow, or method
#[derive(Debug, Clone)]
pub struct FunctionNode {
    pub name: Option<Rc<str>>,
    pub params: Vec<PatternElement>,
    pub rest: Option<Pattern>,
    pub body: FunctionBody,
    pub kind: FunctionKind,
    pub location: SourceLocation,
}

impl FunctionNode {
    /// Number of parameters before the first default or rest (`fn.length`)
    pub fn arity(&self) -> usize {
        self.params
            .iter()
            .take_while(|p| p.default.is_none())
            .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Method,
    Getter,
    Setter,
}

/// Class body element
#[derive(Debug, Clone)]
pub enum ClassMember {
    Method {
        key: PropertyKey,
        function: Rc<FunctionNode>,
        kind: MethodKind,
        is_static: bool,
    },
    Field {
        key: PropertyKey,
        value: Option<AstNode>,
        is_static: bool,
        location: SourceLocation,
    },
}

#[derive(Debug, Clone)]
pub struct ClassNode {
    pub name: Option<Rc<str>>,
    pub superclass: Option<Box<AstNode>>,
    pub constructor: Option<Rc<FunctionNode>>,
    pub members: Vec<ClassMember>,
    pub location: SourceLocation,
}

/// Object literal member
#[derive(Debug, Clone)]
pub enum ObjectProperty {
    KeyValue(PropertyKey, AstNode),
    Shorthand(Rc<str>, SourceLocation),
    /// `{ a = 1 }`, only legal once reinterpreted as a destructuring pattern
    ShorthandDefault(Rc<str>, Box<AstNode>, SourceLocation),
    Method(PropertyKey, Rc<FunctionNode>, MethodKind),
    Spread(AstNode),
}

/// Switch case
#[derive(Debug, Clone)]
pub enum CaseNode {
    Case {
        value: Box<AstNode>,
        statements: Vec<AstNode>,
        location: SourceLocation,
    },
    Default {
        statements: Vec<AstNode>,
        location: SourceLocation,
    },
}

/// Left side of `for-in` / `for-of`
#[derive(Debug, Clone)]
pub enum ForBinding {
    Declaration(VarKind, Pattern),
    Target(Pattern),
}

/// A single declarator in `let a = 1, b;`
#[derive(Debug, Clone)]
pub struct Declarator {
    pub target: Pattern,
    pub init: Option<AstNode>,
}

/// AST nodes representing statements and expressions
#[derive(Debug, Clone)]
pub enum AstNode {
    // Declarations
    VarDecl {
        kind: VarKind,
        declarations: Vec<Declarator>,
        location: SourceLocation,
    },
    FunctionDecl(Rc<FunctionNode>),
    ClassDecl(Rc<ClassNode>),

    // Statements
    Return {
        expr: Option<Box<AstNode>>,
        location: SourceLocation,
    },
    If {
        condition: Box<AstNode>,
        then_branch: Vec<AstNode>,
        else_branch: Option<Vec<AstNode>>,
        location: SourceLocation,
    },
    While {
        condition: Box<AstNode>,
        body: Vec<AstNode>,
        location: SourceLocation,
    },
    DoWhile {
        body: Vec<AstNode>,
        condition: Box<AstNode>,
        location: SourceLocation,
    },
    For {
        init: Option<Box<AstNode>>,
        condition: Option<Box<AstNode>>,
        increment: Option<Box<AstNode>>,
        body: Vec<AstNode>,
        location: SourceLocation,
    },
    ForIn {
        binding: ForBinding,
        object: Box<AstNode>,
        body: Vec<AstNode>,
        location: SourceLocation,
    },
    ForOf {
        binding: ForBinding,
        iterable: Box<AstNode>,
        body: Vec<AstNode>,
        location: SourceLocation,
    },
    Switch {
        expr: Box<AstNode>,
        cases: Vec<CaseNode>,
        location: SourceLocation,
    },
    Break {
        label: Option<Rc<str>>,
        location: SourceLocation,
    },
    Continue {
        label: Option<Rc<str>>,
        location: SourceLocation,
    },
    Labeled {
        label: Rc<str>,
        body: Box<AstNode>,
        location: SourceLocation,
    },
    Throw {
        expr: Box<AstNode>,
        location: SourceLocation,
    },
    Try {
        block: Vec<AstNode>,
        param: Option<Pattern>,
        handler: Option<Vec<AstNode>>,
        finalizer: Option<Vec<AstNode>>,
        location: SourceLocation,
    },
    Block {
        statements: Vec<AstNode>,
        location: SourceLocation,
    },
    Empty {
        location: SourceLocation,
    },
    ExpressionStatement {
        expr: Box<AstNode>,
        location: SourceLocation,
    },

    // Expressions
    NumberLiteral(f64, SourceLocation),
    StringLiteral(Rc<str>, SourceLocation),
    BoolLiteral(bool, SourceLocation),
    Null {
        location: SourceLocation,
    },
    Template {
        quasis: Vec<Rc<str>>,
        expressions: Vec<AstNode>,
        location: SourceLocation,
    },
    RegExpLiteral {
        pattern: Rc<str>,
        flags: Rc<str>,
        location: SourceLocation,
    },
    Identifier(Rc<str>, SourceLocation),
    This {
        location: SourceLocation,
    },
    ArrayLiteral {
        elements: Vec<Option<AstNode>>,
        location: SourceLocation,
    },
    ObjectLiteral {
        properties: Vec<ObjectProperty>,
        location: SourceLocation,
    },
    Function(Rc<FunctionNode>),
    Class(Rc<ClassNode>),
    BinaryOp {
        op: BinOp,
        left: Box<AstNode>,
        right: Box<AstNode>,
        location: SourceLocation,
    },
    LogicalOp {
        op: LogicalOp,
        left: Box<AstNode>,
        right: Box<AstNode>,
        location: SourceLocation,
    },
    UnaryOp {
        op: UnOp,
        operand: Box<AstNode>,
        location: SourceLocation,
    },
    Update {
        increment: bool,
        prefix: bool,
        target: Box<AstNode>,
        location: SourceLocation,
    },
    Assignment {
        op: AssignOp,
        target: Box<Pattern>,
        value: Box<AstNode>,
        location: SourceLocation,
    },
    TernaryOp {
        condition: Box<AstNode>,
        true_expr: Box<AstNode>,
        false_expr: Box<AstNode>,
        location: SourceLocation,
    },
    Sequence {
        expressions: Vec<AstNode>,
        location: SourceLocation,
    },
    Call {
        callee: Box<AstNode>,
        args: Vec<AstNode>,
        optional: bool,
        location: SourceLocation,
    },
    New {
        callee: Box<AstNode>,
        args: Vec<AstNode>,
        location: SourceLocation,
    },
    SuperCall {
        args: Vec<AstNode>,
        location: SourceLocation,
    },
    SuperMember {
        property: Rc<str>,
        location: SourceLocation,
    },
    MemberAccess {
        object: Box<AstNode>,
        member: Rc<str>,
        optional: bool,
        location: SourceLocation,
    },
    IndexAccess {
        object: Box<AstNode>,
        index: Box<AstNode>,
        optional: bool,
        location: SourceLocation,
    },
    /// Boundary of an optional chain (`a?.b.c`); short-circuits to `undefined`
    OptionalChain {
        expr: Box<AstNode>,
        location: SourceLocation,
    },
    Spread {
        expr: Box<AstNode>,
        location: SourceLocation,
    },
}

impl AstNode {
    /// Get the source location of this node
    pub fn location(&self) -> &SourceLocation {
        match self {
            AstNode::FunctionDecl(f) | AstNode::Function(f) => &f.location,
            AstNode::ClassDecl(c) | AstNode::Class(c) => &c.location,
            AstNode::NumberLiteral(_, loc)
            | AstNode::StringLiteral(_, loc)
            | AstNode::BoolLiteral(_, loc)
            | AstNode::Identifier(_, loc) => loc,
            AstNode::VarDecl { location, .. }
            | AstNode::Return { location, .. }
            | AstNode::If { location, .. }
            | AstNode::While { location, .. }
            | AstNode::DoWhile { location, .. }
            | AstNode::For { location, .. }
            | AstNode::ForIn { location, .. }
            | AstNode::ForOf { location, .. }
            | AstNode::Switch { location, .. }
            | AstNode::Break { location, .. }
            | AstNode::Continue { location, .. }
            | AstNode::Labeled { location, .. }
            | AstNode::Throw { location, .. }
            | AstNode::Try { location, .. }
            | AstNode::Block { location, .. }
            | AstNode::Empty { location }
            | AstNode::ExpressionStatement { location, .. }
            | AstNode::Null { location }
            | AstNode::Template { location, .. }
            | AstNode::RegExpLiteral { location, .. }
            | AstNode::This { location }
            | AstNode::ArrayLiteral { location, .. }
            | AstNode::ObjectLiteral { location, .. }
            | AstNode::BinaryOp { location, .. }
            | AstNode::LogicalOp { location, .. }
            | AstNode::UnaryOp { location, .. }
            | AstNode::Update { location, .. }
            | AstNode::Assignment { location, .. }
            | AstNode::TernaryOp { location, .. }
            | AstNode::Sequence { location, .. }
            | AstNode::Call { location, .. }
            | AstNode::New { location, .. }
            | AstNode::SuperCall { location, .. }
            | AstNode::SuperMember { location, .. }
            | AstNode::MemberAccess { location, .. }
            | AstNode::IndexAccess { location, .. }
            | AstNode::OptionalChain { location, .. }
            | AstNode::Spread { location, .. } => location,
        }
    }

    /// True for anonymous function and class expressions, which take their
    /// name from the binding they are assigned to.
    pub fn is_anonymous_definition(&self) -> bool {
        match self {
            AstNode::Function(f) => f.name.is_none(),
            AstNode::Class(c) => c.name.is_none(),
            _ => false,
        }
    }
}

/// Top-level program structure
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub nodes: Vec<AstNode>,
}

impl Program {
    pub fn new() -> Self {
        Program::default()
    }
}
