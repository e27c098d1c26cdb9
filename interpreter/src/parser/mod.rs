use ahash::AHashMap;
use beaver_core::{Token, Type};

use crate::ast::{
    BlockStatement, Expression, Identifier, InfixOperator, PrefixOperator, Program, Statement,
};
use crate::error::ParseError;
use crate::limits::MAX_NESTING_DEPTH;
use trace::Tracer;

pub mod trace;

// Helper aliases for the Pratt tables. Every routine returns `None` once it has recorded a
// diagnostic, and the enclosing statement is dropped from the tree.
type PrefixParseFn<I> = fn(&mut Parser<I>) -> Option<Expression>;
type InfixParseFn<I> = fn(&mut Parser<I>, Expression) -> Option<Expression>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    Equals,
    LessGreater,
    Sum,
    Product,
    Prefix,
    Call,
}

impl Precedence {
    fn of(ty: Type) -> Self {
        match ty {
            Type::EqualEqual | Type::BangEqual => Precedence::Equals,
            Type::Less | Type::Greater => Precedence::LessGreater,
            Type::Plus | Type::Minus => Precedence::Sum,
            Type::Star | Type::Slash => Precedence::Product,
            Type::LeftParen => Precedence::Call,
            _ => Precedence::Lowest,
        }
    }
}

pub struct Parser<I>
where
    I: Iterator<Item = Token>,
{
    tokens: I,
    current: Token,
    peek: Token,
    errors: Vec<ParseError>,
    nesting: usize,

    prefix_parse_fns: AHashMap<Type, PrefixParseFn<I>>,
    infix_parse_fns: AHashMap<Type, InfixParseFn<I>>,

    tracer: Tracer,
}

impl<I> Parser<I>
where
    I: Iterator<Item = Token>,
{
    pub fn new(tokens: I) -> Self {
        Self::with_tracer(tokens, Tracer::default())
    }

    pub fn with_tracing(tokens: I) -> Self {
        Self::with_tracer(tokens, Tracer::new(true))
    }

    /// Parses the whole stream in one go, returning the best-effort program together with every
    /// diagnostic collected on the way.
    pub fn parse(tokens: I) -> (Program, Vec<ParseError>) {
        let mut parser = Self::new(tokens);
        let program = parser.parse_program();
        (program, parser.errors)
    }

    fn with_tracer(tokens: I, tracer: Tracer) -> Self {
        let mut parser = Parser {
            tokens,
            current: Token::new(Type::Eof, String::new(), 1, 0),
            peek: Token::new(Type::Eof, String::new(), 1, 0),
            errors: Vec::new(),
            nesting: 0,
            prefix_parse_fns: AHashMap::new(),
            infix_parse_fns: AHashMap::new(),
            tracer,
        };

        parser.register_prefix(Type::Identifier, Self::parse_identifier);
        parser.register_prefix(Type::Int, Self::parse_integer_literal);
        parser.register_prefix(Type::String, Self::parse_string_literal);
        parser.register_prefix(Type::True, Self::parse_boolean);
        parser.register_prefix(Type::False, Self::parse_boolean);
        parser.register_prefix(Type::Bang, Self::parse_prefix_expression);
        parser.register_prefix(Type::Minus, Self::parse_prefix_expression);
        parser.register_prefix(Type::LeftParen, Self::parse_grouped_expression);
        parser.register_prefix(Type::If, Self::parse_if_expression);
        parser.register_prefix(Type::Function, Self::parse_function_literal);

        for ty in [
            Type::Plus,
            Type::Minus,
            Type::Star,
            Type::Slash,
            Type::Less,
            Type::Greater,
            Type::EqualEqual,
            Type::BangEqual,
        ] {
            parser.register_infix(ty, Self::parse_infix_expression);
        }
        parser.register_infix(Type::LeftParen, Self::parse_call_expression);

        // read two tokens so both `current` and `peek` are set
        parser.next_token();
        parser.next_token();
        parser
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn parse_program(&mut self) -> Program {
        let mut program = Program::default();

        while !self.current_is(Type::Eof) {
            if let Some(stmt) = self.parse_statement() {
                program.statements.push(stmt);
            }
            self.next_token();
        }

        program
    }

    fn register_prefix(&mut self, ty: Type, func: PrefixParseFn<I>) {
        self.prefix_parse_fns.insert(ty, func);
    }

    fn register_infix(&mut self, ty: Type, func: InfixParseFn<I>) {
        self.infix_parse_fns.insert(ty, func);
    }

    fn traced<T>(&mut self, name: &str, func: impl FnOnce(&mut Self) -> T) -> T {
        self.tracer.enter(name);
        let res = func(self);
        self.tracer.exit(name);
        res
    }

    fn parse_statement(&mut self) -> Option<Statement> {
        let res = match self.current.ty {
            Type::Let => self.parse_let_statement(),
            Type::Return => self.parse_return_statement(),
            _ => self.parse_expression_statement(),
        };

        if res.is_none() {
            self.synchronize();
        }

        res
    }

    fn parse_let_statement(&mut self) -> Option<Statement> {
        self.traced("let_statement", |p| {
            p.expect_peek(Type::Identifier)?;
            let name = Identifier::new(p.current.lexeme.clone());

            p.expect_peek(Type::Assign)?;
            p.next_token();
            let value = p.parse_expression(Precedence::Lowest)?;

            p.skip_semicolon();
            Some(Statement::let_(name, value))
        })
    }

    fn parse_return_statement(&mut self) -> Option<Statement> {
        self.traced("return_statement", |p| {
            p.next_token();
            let value = p.parse_expression(Precedence::Lowest)?;

            p.skip_semicolon();
            Some(Statement::return_(value))
        })
    }

    fn parse_expression_statement(&mut self) -> Option<Statement> {
        self.traced("expression_statement", |p| {
            let expression = p.parse_expression(Precedence::Lowest)?;

            p.skip_semicolon();
            Some(Statement::expression(expression))
        })
    }

    fn parse_block_statement(&mut self) -> BlockStatement {
        self.traced("block_statement", |p| {
            let mut statements = Vec::new();
            p.next_token();

            while !p.current_is(Type::RightBrace) && !p.current_is(Type::Eof) {
                if let Some(stmt) = p.parse_statement() {
                    statements.push(stmt);
                }
                p.next_token();
            }

            BlockStatement::new(statements)
        })
    }

    // Every nested construct (grouping, prefix operand, if, function body, call argument) goes
    // through here, so this is the one place the nesting depth is bounded.
    fn parse_expression(&mut self, precedence: Precedence) -> Option<Expression> {
        if self.nesting >= MAX_NESTING_DEPTH {
            self.errors.push(ParseError::nesting_too_deep(&self.current));
            return None;
        }

        self.nesting += 1;
        let res = self.parse_expression_at(precedence);
        self.nesting -= 1;
        res
    }

    fn parse_expression_at(&mut self, precedence: Precedence) -> Option<Expression> {
        self.traced("expression", |p| {
            let prefix = match p.prefix_parse_fns.get(&p.current.ty) {
                Some(prefix) => *prefix,
                None => {
                    p.errors.push(ParseError::no_prefix_parse_fn(&p.current));
                    return None;
                }
            };

            let mut left = prefix(p)?;
            while !p.peek_is(Type::SemiColon) && precedence < p.peek_precedence() {
                let infix = match p.infix_parse_fns.get(&p.peek.ty) {
                    Some(infix) => *infix,
                    None => return Some(left),
                };

                p.next_token();
                left = infix(p, left)?;
            }

            Some(left)
        })
    }

    fn parse_identifier(&mut self) -> Option<Expression> {
        Some(Expression::identifier(self.current.lexeme.clone()))
    }

    fn parse_integer_literal(&mut self) -> Option<Expression> {
        match self.current.lexeme.parse::<i64>() {
            Ok(value) => Some(Expression::integer(value)),
            Err(_) => {
                self.errors.push(ParseError::invalid_integer(&self.current));
                None
            }
        }
    }

    fn parse_string_literal(&mut self) -> Option<Expression> {
        Some(Expression::string(self.current.lexeme.clone()))
    }

    fn parse_boolean(&mut self) -> Option<Expression> {
        Some(Expression::boolean(self.current_is(Type::True)))
    }

    fn parse_prefix_expression(&mut self) -> Option<Expression> {
        self.traced("prefix_expression", |p| {
            let operator = PrefixOperator::from_type(p.current.ty)?;
            p.next_token();
            let right = p.parse_expression(Precedence::Prefix)?;
            Some(Expression::prefix(operator, right))
        })
    }

    fn parse_infix_expression(&mut self, left: Expression) -> Option<Expression> {
        self.traced("infix_expression", |p| {
            let operator = InfixOperator::from_type(p.current.ty)?;
            let precedence = p.current_precedence();
            p.next_token();
            let right = p.parse_expression(precedence)?;
            Some(Expression::infix(left, operator, right))
        })
    }

    fn parse_grouped_expression(&mut self) -> Option<Expression> {
        self.next_token();
        let expression = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(Type::RightParen)?;
        Some(expression)
    }

    fn parse_if_expression(&mut self) -> Option<Expression> {
        self.traced("if_expression", |p| {
            p.expect_peek(Type::LeftParen)?;
            p.next_token();
            let condition = p.parse_expression(Precedence::Lowest)?;
            p.expect_peek(Type::RightParen)?;

            p.expect_peek(Type::LeftBrace)?;
            let consequence = p.parse_block_statement();

            let mut alternative = None;
            if p.peek_is(Type::Else) {
                p.next_token();
                p.expect_peek(Type::LeftBrace)?;
                alternative = Some(p.parse_block_statement());
            }

            Some(Expression::if_(condition, consequence, alternative))
        })
    }

    fn parse_function_literal(&mut self) -> Option<Expression> {
        self.traced("function_literal", |p| {
            p.expect_peek(Type::LeftParen)?;
            let parameters = p.parse_function_parameters()?;

            p.expect_peek(Type::LeftBrace)?;
            let body = p.parse_block_statement();

            Some(Expression::function(parameters, body))
        })
    }

    fn parse_function_parameters(&mut self) -> Option<Vec<Identifier>> {
        let mut parameters = Vec::new();

        if self.peek_is(Type::RightParen) {
            self.next_token();
            return Some(parameters);
        }

        self.expect_peek(Type::Identifier)?;
        parameters.push(Identifier::new(self.current.lexeme.clone()));

        while self.peek_is(Type::Comma) {
            self.next_token();
            self.expect_peek(Type::Identifier)?;
            parameters.push(Identifier::new(self.current.lexeme.clone()));
        }

        self.expect_peek(Type::RightParen)?;
        Some(parameters)
    }

    fn parse_call_expression(&mut self, callee: Expression) -> Option<Expression> {
        self.traced("call_expression", |p| {
            let arguments = p.parse_expression_list(Type::RightParen)?;
            Some(Expression::call(callee, arguments))
        })
    }

    fn parse_expression_list(&mut self, end: Type) -> Option<Vec<Expression>> {
        let mut list = Vec::new();

        if self.peek_is(end) {
            self.next_token();
            return Some(list);
        }

        self.next_token();
        list.push(self.parse_expression(Precedence::Lowest)?);

        while self.peek_is(Type::Comma) {
            self.next_token();
            self.next_token();
            list.push(self.parse_expression(Precedence::Lowest)?);
        }

        self.expect_peek(end)?;
        Some(list)
    }

    // Skips the rest of a malformed statement, so that one mistake yields one diagnostic instead
    // of a cascade. Stops before a token that can only open a new statement or close a block.
    fn synchronize(&mut self) {
        while !self.current_is(Type::SemiColon) && !self.current_is(Type::Eof) {
            if matches!(self.peek.ty, Type::Let | Type::Return | Type::RightBrace) {
                return;
            }
            self.next_token();
        }
    }

    fn next_token(&mut self) {
        let (line, col) = (self.peek.line, self.peek.col);
        // The stream may end early (e.g. on a scanner error), treat that as end of input
        let next = self
            .tokens
            .next()
            .unwrap_or_else(|| Token::new(Type::Eof, String::new(), line, col));

        self.current = std::mem::replace(&mut self.peek, next);
    }

    fn skip_semicolon(&mut self) {
        if self.peek_is(Type::SemiColon) {
            self.next_token();
        }
    }

    fn current_is(&self, ty: Type) -> bool {
        self.current.is(ty)
    }

    fn peek_is(&self, ty: Type) -> bool {
        self.peek.is(ty)
    }

    fn expect_peek(&mut self, ty: Type) -> Option<()> {
        if self.peek_is(ty) {
            self.next_token();
            Some(())
        } else {
            self.errors.push(ParseError::unexpected_token(ty, &self.peek));
            None
        }
    }

    fn peek_precedence(&self) -> Precedence {
        Precedence::of(self.peek.ty)
    }

    fn current_precedence(&self) -> Precedence {
        Precedence::of(self.current.ty)
    }
}
