use std::fmt;
use std::fmt::{Display, Formatter};

use beaver_core::Type;

// Nodes own their children outright and are never mutated after parsing. Positions are not kept
// on purpose, so two parses of equivalent sources compare equal.

/// Shared capability of every node: a literal for diagnostics, with `Display` as the canonical
/// source reconstruction.
pub trait Node: Display {
    fn token_literal(&self) -> String;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockStatement {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Let { name: Identifier, value: Expression },
    Return { value: Expression },
    Expression { expression: Expression },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixOperator {
    Bang,
    Minus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfixOperator {
    Plus,
    Minus,
    Star,
    Slash,
    Less,
    Greater,
    Equal,
    NotEqual,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    Identifier(Identifier),
    Integer {
        value: i64,
    },
    Str {
        value: String,
    },
    Boolean {
        value: bool,
    },
    Prefix {
        operator: PrefixOperator,
        right: Box<Expression>,
    },
    Infix {
        operator: InfixOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    If {
        condition: Box<Expression>,
        consequence: BlockStatement,
        alternative: Option<BlockStatement>,
    },
    Function {
        parameters: Vec<Identifier>,
        body: BlockStatement,
    },
    Call {
        callee: Box<Expression>,
        arguments: Vec<Expression>,
    },
}

pub trait StatementVisitor {
    type Item;

    fn visit_statement(&mut self, stmt: &Statement) -> Self::Item {
        match stmt {
            Statement::Let { name, value } => self.visit_let(name, value),
            Statement::Return { value } => self.visit_return(value),
            Statement::Expression { expression } => self.visit_expression_statement(expression),
        }
    }

    fn visit_let(&mut self, name: &Identifier, value: &Expression) -> Self::Item;
    fn visit_return(&mut self, value: &Expression) -> Self::Item;
    fn visit_expression_statement(&mut self, expression: &Expression) -> Self::Item;
    fn visit_block(&mut self, block: &BlockStatement) -> Self::Item;
}

pub trait ExpressionVisitor {
    type Item;

    fn visit_expression(&mut self, expr: &Expression) -> Self::Item {
        match expr {
            Expression::Identifier(ident) => self.visit_identifier(ident),
            Expression::Integer { value } => self.visit_integer(*value),
            Expression::Str { value } => self.visit_string(value),
            Expression::Boolean { value } => self.visit_boolean(*value),
            Expression::Prefix { operator, right } => self.visit_prefix(*operator, right),
            Expression::Infix {
                operator,
                left,
                right,
            } => self.visit_infix(*operator, left, right),
            Expression::If {
                condition,
                consequence,
                alternative,
            } => self.visit_if(condition, consequence, alternative.as_ref()),
            Expression::Function { parameters, body } => self.visit_function(parameters, body),
            Expression::Call { callee, arguments } => self.visit_call(callee, arguments),
        }
    }

    fn visit_identifier(&mut self, ident: &Identifier) -> Self::Item;
    fn visit_integer(&mut self, value: i64) -> Self::Item;
    fn visit_string(&mut self, value: &str) -> Self::Item;
    fn visit_boolean(&mut self, value: bool) -> Self::Item;
    fn visit_prefix(&mut self, operator: PrefixOperator, right: &Expression) -> Self::Item;
    fn visit_infix(
        &mut self,
        operator: InfixOperator,
        left: &Expression,
        right: &Expression,
    ) -> Self::Item;
    fn visit_if(
        &mut self,
        condition: &Expression,
        consequence: &BlockStatement,
        alternative: Option<&BlockStatement>,
    ) -> Self::Item;
    fn visit_function(&mut self, parameters: &[Identifier], body: &BlockStatement) -> Self::Item;
    fn visit_call(&mut self, callee: &Expression, arguments: &[Expression]) -> Self::Item;
}

impl Identifier {
    pub fn new(name: impl Into<String>) -> Self {
        Identifier { name: name.into() }
    }
}

impl PrefixOperator {
    pub fn from_type(ty: Type) -> Option<Self> {
        match ty {
            Type::Bang => Some(PrefixOperator::Bang),
            Type::Minus => Some(PrefixOperator::Minus),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PrefixOperator::Bang => "!",
            PrefixOperator::Minus => "-",
        }
    }
}

impl InfixOperator {
    pub fn from_type(ty: Type) -> Option<Self> {
        match ty {
            Type::Plus => Some(InfixOperator::Plus),
            Type::Minus => Some(InfixOperator::Minus),
            Type::Star => Some(InfixOperator::Star),
            Type::Slash => Some(InfixOperator::Slash),
            Type::Less => Some(InfixOperator::Less),
            Type::Greater => Some(InfixOperator::Greater),
            Type::EqualEqual => Some(InfixOperator::Equal),
            Type::BangEqual => Some(InfixOperator::NotEqual),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InfixOperator::Plus => "+",
            InfixOperator::Minus => "-",
            InfixOperator::Star => "*",
            InfixOperator::Slash => "/",
            InfixOperator::Less => "<",
            InfixOperator::Greater => ">",
            InfixOperator::Equal => "==",
            InfixOperator::NotEqual => "!=",
        }
    }
}

// Creator methods, mostly to keep the parser and the tests short.
impl Statement {
    pub fn let_(name: Identifier, value: Expression) -> Self {
        Statement::Let { name, value }
    }

    pub fn return_(value: Expression) -> Self {
        Statement::Return { value }
    }

    pub fn expression(expression: Expression) -> Self {
        Statement::Expression { expression }
    }
}

impl Expression {
    pub fn identifier(name: impl Into<String>) -> Self {
        Expression::Identifier(Identifier::new(name))
    }

    pub fn integer(value: i64) -> Self {
        Expression::Integer { value }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expression::Str {
            value: value.into(),
        }
    }

    pub fn boolean(value: bool) -> Self {
        Expression::Boolean { value }
    }

    pub fn prefix(operator: PrefixOperator, right: Expression) -> Self {
        Expression::Prefix {
            operator,
            right: Box::new(right),
        }
    }

    pub fn infix(left: Expression, operator: InfixOperator, right: Expression) -> Self {
        Expression::Infix {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn if_(
        condition: Expression,
        consequence: BlockStatement,
        alternative: Option<BlockStatement>,
    ) -> Self {
        Expression::If {
            condition: Box::new(condition),
            consequence,
            alternative,
        }
    }

    pub fn function(parameters: Vec<Identifier>, body: BlockStatement) -> Self {
        Expression::Function { parameters, body }
    }

    pub fn call(callee: Expression, arguments: Vec<Expression>) -> Self {
        Expression::Call {
            callee: Box::new(callee),
            arguments,
        }
    }
}

impl BlockStatement {
    pub fn new(statements: Vec<Statement>) -> Self {
        BlockStatement { statements }
    }
}

impl Node for Program {
    fn token_literal(&self) -> String {
        self.statements
            .first()
            .map(Node::token_literal)
            .unwrap_or_default()
    }
}

impl Node for BlockStatement {
    fn token_literal(&self) -> String {
        String::from("{")
    }
}

impl Node for Identifier {
    fn token_literal(&self) -> String {
        self.name.clone()
    }
}

impl Node for Statement {
    fn token_literal(&self) -> String {
        match self {
            Statement::Let { .. } => String::from("let"),
            Statement::Return { .. } => String::from("return"),
            Statement::Expression { expression } => expression.token_literal(),
        }
    }
}

impl Node for Expression {
    fn token_literal(&self) -> String {
        match self {
            Expression::Identifier(ident) => ident.token_literal(),
            Expression::Integer { value } => value.to_string(),
            Expression::Str { value } => value.clone(),
            Expression::Boolean { value } => value.to_string(),
            Expression::Prefix { operator, .. } => String::from(operator.as_str()),
            Expression::Infix { operator, .. } => String::from(operator.as_str()),
            Expression::If { .. } => String::from("if"),
            Expression::Function { .. } => String::from("function"),
            Expression::Call { .. } => String::from("("),
        }
    }
}

// An expression statement followed by another statement needs its `;` back, otherwise `a` then
// `(b)` would read as the call `a(b)`.
fn fmt_statements(f: &mut Formatter<'_>, statements: &[Statement]) -> fmt::Result {
    for (i, stmt) in statements.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{}", stmt)?;
        if matches!(stmt, Statement::Expression { .. }) && i + 1 < statements.len() {
            f.write_str(";")?;
        }
    }
    Ok(())
}

fn fmt_list<T: Display>(f: &mut Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl Display for Program {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        fmt_statements(f, &self.statements)
    }
}

impl Display for BlockStatement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.statements.is_empty() {
            return f.write_str("{ }");
        }

        f.write_str("{ ")?;
        fmt_statements(f, &self.statements)?;
        f.write_str(" }")
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Let { name, value } => write!(f, "let {} = {};", name, value),
            Statement::Return { value } => write!(f, "return {};", value),
            Statement::Expression { expression } => write!(f, "{}", expression),
        }
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Identifier(ident) => write!(f, "{}", ident),
            Expression::Integer { value } => write!(f, "{}", value),
            Expression::Str { value } => write!(f, "\"{}\"", value),
            Expression::Boolean { value } => write!(f, "{}", value),
            Expression::Prefix { operator, right } => {
                write!(f, "({}{})", operator.as_str(), right)
            }
            Expression::Infix {
                operator,
                left,
                right,
            } => write!(f, "({} {} {})", left, operator.as_str(), right),
            Expression::If {
                condition,
                consequence,
                alternative,
            } => {
                write!(f, "if ({}) {}", condition, consequence)?;
                if let Some(alternative) = alternative {
                    write!(f, " else {}", alternative)?;
                }
                Ok(())
            }
            Expression::Function { parameters, body } => {
                f.write_str("function(")?;
                fmt_list(f, parameters)?;
                write!(f, ") {}", body)
            }
            Expression::Call { callee, arguments } => {
                write!(f, "{}(", callee)?;
                fmt_list(f, arguments)?;
                f.write_str(")")
            }
        }
    }
}
