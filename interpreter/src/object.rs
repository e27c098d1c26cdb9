use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::rc::Rc;

use crate::ast::{BlockStatement, Identifier};
use crate::env::Env;

pub const TRUE: Object = Object::Boolean(true);
pub const FALSE: Object = Object::Boolean(false);
pub const NULL: Object = Object::Null;

#[derive(Debug, Clone)]
pub enum Object {
    Integer(i64),
    Boolean(bool),
    Str(Rc<str>),
    Null,

    // Only lives between a `return` and the function call (or program) that unwraps it
    ReturnValue(Box<Object>),
    Error(String),
    Function(Rc<Function>),
}

pub struct Function {
    pub parameters: Vec<Identifier>,
    pub body: BlockStatement,

    // The scope the literal was evaluated in, not the caller's
    pub env: Env,
}

impl Function {
    pub fn new(parameters: &[Identifier], body: &BlockStatement, env: Env) -> Self {
        Function {
            parameters: Vec::from(parameters),
            body: body.clone(),
            env,
        }
    }
}

impl Object {
    pub fn native_bool(value: bool) -> Self {
        if value {
            TRUE
        } else {
            FALSE
        }
    }

    pub fn error(msg: fmt::Arguments) -> Self {
        Object::Error(format!("{}", msg))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Integer(_) => "INTEGER",
            Object::Boolean(_) => "BOOLEAN",
            Object::Str(_) => "STRING",
            Object::Null => "NULL",
            Object::ReturnValue(_) => "RETURN_VALUE",
            Object::Error(_) => "ERROR",
            Object::Function(_) => "FUNCTION",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Object::Error(_))
    }

    /// `null` and `false` are falsy, every other value is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Object::Null | Object::Boolean(false))
    }

    /// Equality as the language's `==` sees it for anything but two integers. Booleans and null
    /// behave as singletons, heap values are only equal to the very same allocation.
    pub fn is_identical(&self, other: &Object) -> bool {
        match (self, other) {
            (Object::Boolean(lhs), Object::Boolean(rhs)) => lhs == rhs,
            (Object::Null, Object::Null) => true,
            (Object::Str(lhs), Object::Str(rhs)) => Rc::ptr_eq(lhs, rhs),
            (Object::Function(lhs), Object::Function(rhs)) => Rc::ptr_eq(lhs, rhs),
            _ => false,
        }
    }
}

// Structural equality for the host side (tests, environment lookups). The language itself goes
// through `is_identical` instead.
impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Object::Integer(lhs), Object::Integer(rhs)) => lhs == rhs,
            (Object::Boolean(lhs), Object::Boolean(rhs)) => lhs == rhs,
            (Object::Str(lhs), Object::Str(rhs)) => lhs == rhs,
            (Object::Null, Object::Null) => true,
            (Object::ReturnValue(lhs), Object::ReturnValue(rhs)) => lhs == rhs,
            (Object::Error(lhs), Object::Error(rhs)) => lhs == rhs,
            (Object::Function(lhs), Object::Function(rhs)) => Rc::ptr_eq(lhs, rhs),
            _ => false,
        }
    }
}

impl From<bool> for Object {
    fn from(value: bool) -> Self {
        Object::native_bool(value)
    }
}

impl From<String> for Object {
    fn from(value: String) -> Self {
        Object::Str(Rc::from(value))
    }
}

impl From<&str> for Object {
    fn from(value: &str) -> Self {
        Object::Str(Rc::from(value))
    }
}

macro_rules! impl_from_int_for_object {
    ( $( $t:ident )* ) => {
        $(
            impl From<$t> for Object {
                fn from(n: $t) -> Object {
                    Object::Integer(i64::from(n))
                }
            }
        )*
    }
}

impl_from_int_for_object!(u8 i8 u16 i16 u32 i32 i64);

impl Display for Object {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Object::Integer(val) => write!(f, "{}", val),
            Object::Boolean(val) => write!(f, "{}", val),
            Object::Str(val) => write!(f, "{}", val),
            Object::Null => write!(f, "null"),
            Object::ReturnValue(val) => write!(f, "{}", val),
            Object::Error(msg) => write!(f, "{}", msg),
            Object::Function(function) => write!(f, "{}", function),
        }
    }
}

impl Display for Function {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let params: Vec<&str> = self.parameters.iter().map(|p| p.name.as_str()).collect();
        write!(f, "function({}) {}", params.join(", "), self.body)
    }
}

// The captured scope usually contains this very function, don't walk into it.
impl Debug for Function {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "<function/{}>", self.parameters.len())
    }
}
