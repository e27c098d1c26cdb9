use std::rc::Rc;

use log::{debug, trace};

use crate::ast::{
    BlockStatement, Expression, ExpressionVisitor, Identifier, InfixOperator, PrefixOperator,
    Program, StatementVisitor,
};
use crate::env::{Env, Environment};
use crate::limits::MAX_CALL_DEPTH;
use crate::object::{Function, Object, NULL};

// Runtime errors are plain values. Every evaluation that can produce one is checked right away
// and the error handed back unchanged.
macro_rules! propagate {
    ($obj:expr) => {
        match $obj {
            err @ Object::Error(_) => return err,
            obj => obj,
        }
    };
}

/// Evaluates `program` against `env`. Returns `None` when the last statement produced no value,
/// e.g. an empty program or a trailing `let`.
pub fn eval(program: &Program, env: &Env) -> Option<Object> {
    Evaluator::new(Rc::clone(env)).eval_program(program)
}

pub struct Evaluator {
    env: Env,
    depth: usize,
}

impl Evaluator {
    pub fn new(env: Env) -> Self {
        Evaluator { env, depth: 0 }
    }

    #[cfg(test)]
    fn env(&self) -> &Env {
        &self.env
    }

    pub fn eval_program(&mut self, program: &Program) -> Option<Object> {
        let mut result = None;

        for stmt in &program.statements {
            match self.visit_statement(stmt) {
                Some(Object::ReturnValue(value)) => return Some(*value),
                Some(err @ Object::Error(_)) => return Some(err),
                other => result = other,
            }
        }

        result
    }

    // A block in expression position always has a value, an empty one is null.
    fn eval_block_value(&mut self, block: &BlockStatement) -> Object {
        self.visit_block(block).unwrap_or(NULL)
    }

    fn with_env<T>(&mut self, env: Env, func: impl FnOnce(&mut Self) -> T) -> T {
        let previous = std::mem::replace(&mut self.env, env);
        let res = func(self);
        self.env = previous;
        res
    }

    fn apply_function(&mut self, function: Rc<Function>, args: Vec<Object>) -> Object {
        if self.depth >= MAX_CALL_DEPTH {
            debug!("call depth limit of {} reached", MAX_CALL_DEPTH);
            return Object::error(format_args!(
                "stack overflow: maximum call depth of {} exceeded",
                MAX_CALL_DEPTH
            ));
        }

        // Arity is not checked: extra arguments are dropped, missing ones stay unbound.
        let env = Environment::enclosed_by(&function.env);
        for (param, arg) in function.parameters.iter().zip(args) {
            env.borrow_mut().set(&param.name, arg);
        }

        trace!("call {} at depth {}", function, self.depth);
        self.depth += 1;
        let result = self.with_env(env, |evaluator| {
            evaluator.eval_block_value(&function.body)
        });
        self.depth -= 1;

        match result {
            Object::ReturnValue(value) => *value,
            other => other,
        }
    }

    fn eval_prefix(operator: PrefixOperator, right: Object) -> Object {
        match operator {
            PrefixOperator::Bang => Object::native_bool(!right.is_truthy()),
            PrefixOperator::Minus => match right {
                Object::Integer(value) => Object::Integer(value.wrapping_neg()),
                other => Object::error(format_args!("unknown operator: -{}", other.type_name())),
            },
        }
    }

    fn eval_infix(operator: InfixOperator, left: Object, right: Object) -> Object {
        match (&left, &right) {
            (Object::Integer(lhs), Object::Integer(rhs)) => {
                Self::eval_integer_infix(operator, *lhs, *rhs)
            }
            _ => match operator {
                InfixOperator::Equal => Object::native_bool(left.is_identical(&right)),
                InfixOperator::NotEqual => Object::native_bool(!left.is_identical(&right)),
                _ if left.type_name() != right.type_name() => Object::error(format_args!(
                    "type mismatch: {} {} {}",
                    left.type_name(),
                    operator.as_str(),
                    right.type_name()
                )),
                _ => Object::error(format_args!(
                    "unknown operator: {} {} {}",
                    left.type_name(),
                    operator.as_str(),
                    right.type_name()
                )),
            },
        }
    }

    // Two's complement wrapping on overflow, truncating division.
    fn eval_integer_infix(operator: InfixOperator, lhs: i64, rhs: i64) -> Object {
        match operator {
            InfixOperator::Plus => Object::Integer(lhs.wrapping_add(rhs)),
            InfixOperator::Minus => Object::Integer(lhs.wrapping_sub(rhs)),
            InfixOperator::Star => Object::Integer(lhs.wrapping_mul(rhs)),
            InfixOperator::Slash => {
                if rhs == 0 {
                    Object::error(format_args!("division by zero"))
                } else {
                    Object::Integer(lhs.wrapping_div(rhs))
                }
            }
            InfixOperator::Less => Object::native_bool(lhs < rhs),
            InfixOperator::Greater => Object::native_bool(lhs > rhs),
            InfixOperator::Equal => Object::native_bool(lhs == rhs),
            InfixOperator::NotEqual => Object::native_bool(lhs != rhs),
        }
    }
}

impl StatementVisitor for Evaluator {
    type Item = Option<Object>;

    fn visit_let(&mut self, name: &Identifier, value: &Expression) -> Option<Object> {
        let value = self.visit_expression(value);
        if value.is_error() {
            return Some(value);
        }

        self.env.borrow_mut().set(&name.name, value);
        None
    }

    fn visit_return(&mut self, value: &Expression) -> Option<Object> {
        let value = self.visit_expression(value);
        if value.is_error() {
            return Some(value);
        }

        Some(Object::ReturnValue(Box::new(value)))
    }

    fn visit_expression_statement(&mut self, expression: &Expression) -> Option<Object> {
        Some(self.visit_expression(expression))
    }

    // Unlike a program, a block hands a return value on still wrapped, so that it keeps unwinding
    // up to the function call.
    fn visit_block(&mut self, block: &BlockStatement) -> Option<Object> {
        let mut result = None;

        for stmt in &block.statements {
            result = self.visit_statement(stmt);
            if matches!(result, Some(Object::ReturnValue(_)) | Some(Object::Error(_))) {
                return result;
            }
        }

        result
    }
}

impl ExpressionVisitor for Evaluator {
    type Item = Object;

    fn visit_identifier(&mut self, ident: &Identifier) -> Object {
        self.env
            .borrow()
            .get(&ident.name)
            .unwrap_or_else(|| Object::error(format_args!("identifier not found: {}", ident)))
    }

    fn visit_integer(&mut self, value: i64) -> Object {
        Object::Integer(value)
    }

    fn visit_string(&mut self, value: &str) -> Object {
        Object::from(value)
    }

    fn visit_boolean(&mut self, value: bool) -> Object {
        Object::native_bool(value)
    }

    fn visit_prefix(&mut self, operator: PrefixOperator, right: &Expression) -> Object {
        let right = propagate!(self.visit_expression(right));
        Self::eval_prefix(operator, right)
    }

    fn visit_infix(
        &mut self,
        operator: InfixOperator,
        left: &Expression,
        right: &Expression,
    ) -> Object {
        let left = propagate!(self.visit_expression(left));
        let right = propagate!(self.visit_expression(right));
        Self::eval_infix(operator, left, right)
    }

    fn visit_if(
        &mut self,
        condition: &Expression,
        consequence: &BlockStatement,
        alternative: Option<&BlockStatement>,
    ) -> Object {
        let condition = propagate!(self.visit_expression(condition));

        if condition.is_truthy() {
            self.eval_block_value(consequence)
        } else if let Some(alternative) = alternative {
            self.eval_block_value(alternative)
        } else {
            NULL
        }
    }

    fn visit_function(&mut self, parameters: &[Identifier], body: &BlockStatement) -> Object {
        let function = Function::new(parameters, body, Rc::clone(&self.env));
        Object::Function(Rc::new(function))
    }

    fn visit_call(&mut self, callee: &Expression, arguments: &[Expression]) -> Object {
        let function = match propagate!(self.visit_expression(callee)) {
            Object::Function(function) => function,
            other => {
                return Object::error(format_args!("not a function: {}", other.type_name()))
            }
        };

        let mut args = Vec::with_capacity(arguments.len());
        for arg in arguments {
            args.push(propagate!(self.visit_expression(arg)));
        }

        self.apply_function(function, args)
    }
}

#[cfg(test)]
mod tests {
    use crate::env::{Env, Environment};
    use crate::evaluator::{eval, Evaluator};
    use crate::object::{Object, NULL};
    use crate::parser::Parser;
    use beaver_core::Scanner;

    fn eval_with(src: &str, env: &Env) -> Option<Object> {
        let mut scanner = Scanner::new();
        let (program, errors) = Parser::parse(scanner.scan_tokens(src));
        assert!(errors.is_empty(), "{:?} produced errors {:?}", src, errors);

        eval(&program, env)
    }

    fn eval_src(src: &str) -> Object {
        eval_with(src, &Environment::new_shared())
            .unwrap_or_else(|| panic!("{:?} produced no value", src))
    }

    fn assert_all(tests: &[(&str, Object)]) {
        for (src, expected) in tests {
            assert_eq!(&eval_src(src), expected, "evaluating {:?}", src);
        }
    }

    fn assert_errors(tests: &[(&str, &str)]) {
        for (src, msg) in tests {
            assert_eq!(
                eval_src(src),
                Object::Error(msg.to_string()),
                "evaluating {:?}",
                src
            );
        }
    }

    #[test]
    fn test_integer_expressions() {
        assert_all(&[
            ("5", Object::from(5)),
            ("10", Object::from(10)),
            ("-5", Object::from(-5)),
            ("-10", Object::from(-10)),
            ("5 + 20", Object::from(25)),
            ("5 + 3 + 5 - 20", Object::from(-7)),
            ("-1000 + 400 - 20", Object::from(-620)),
            ("2 * 4 * 8 * 16", Object::from(1024)),
            ("2 * 2 + 3 * 6", Object::from(22)),
            ("-8 + 3 * 100 - 6 / 2", Object::from(289)),
            ("(2 + 4) * 3", Object::from(18)),
            ("(2 + 4) * 3 + 5 - ((2 + 6) * 4) / 2", Object::from(7)),
            ("-20 * -2 * (10 + 4) / -2", Object::from(-280)),
            ("7 / 2", Object::from(3)),
            ("-7 / 2", Object::from(-3)),
        ]);
    }

    #[test]
    fn test_integer_overflow_wraps() {
        assert_all(&[
            ("9223372036854775807 + 1", Object::Integer(i64::MIN)),
            ("-9223372036854775807 - 2", Object::Integer(i64::MAX)),
            ("(-9223372036854775807 - 1) / -1", Object::Integer(i64::MIN)),
            ("-(-9223372036854775807 - 1)", Object::Integer(i64::MIN)),
        ]);
    }

    #[test]
    fn test_boolean_expressions() {
        assert_all(&[
            ("true", Object::from(true)),
            ("false", Object::from(false)),
            ("1 < 2", Object::from(true)),
            ("1 > 2", Object::from(false)),
            ("1 == 1", Object::from(true)),
            ("1 != 1", Object::from(false)),
            ("3 == 3", Object::from(true)),
            ("true == true", Object::from(true)),
            ("false == false", Object::from(true)),
            ("true == false", Object::from(false)),
            ("true != false", Object::from(true)),
            ("(1 < 2) == true", Object::from(true)),
            ("(1 > 2) == true", Object::from(false)),
        ]);
    }

    #[test]
    fn test_bang_operator() {
        assert_all(&[
            ("!true", Object::from(false)),
            ("!false", Object::from(true)),
            ("!5", Object::from(false)),
            ("!!true", Object::from(true)),
            ("!!false", Object::from(false)),
            ("!!5", Object::from(true)),
            ("!\"\"", Object::from(false)),
            ("!if (false) { 1 }", Object::from(true)),
        ]);
    }

    #[test]
    fn test_identity_equality() {
        assert_all(&[
            ("let s = \"a\"; s == s", Object::from(true)),
            ("\"a\" == \"a\"", Object::from(false)),
            ("\"a\" != \"a\"", Object::from(true)),
            ("let f = function() { 1 }; f == f", Object::from(true)),
            (
                "function() { 1 } == function() { 1 }",
                Object::from(false),
            ),
            ("1 == true", Object::from(false)),
            ("true != 1", Object::from(true)),
            ("if (false) { 1 } == if (false) { 2 }", Object::from(true)),
        ]);
    }

    #[test]
    fn test_string_literal() {
        assert_all(&[("\"hello world\"", Object::from("hello world"))]);
    }

    #[test]
    fn test_if_else_expressions() {
        assert_all(&[
            ("if (true) { 10 }", Object::from(10)),
            ("if (false) { 10 }", NULL),
            ("if (1) { 10 }", Object::from(10)),
            ("if (1 < 2) { 10 }", Object::from(10)),
            ("if (1 > 2) { 10 }", NULL),
            ("if (1 > 2) { 10 } else { 20 }", Object::from(20)),
            ("if (1 < 2) { 10 } else { 20 }", Object::from(10)),
            ("if (true) { }", NULL),
        ]);
    }

    #[test]
    fn test_return_statements() {
        assert_all(&[
            ("return 10;", Object::from(10)),
            ("return 10; 9;", Object::from(10)),
            ("return 2 * 5; 9;", Object::from(10)),
            ("9; return 2 * 5; 9;", Object::from(10)),
            (
                "if (10 > 1) { if (10 > 1) { return 10; } return 1; }",
                Object::from(10),
            ),
            (
                "let f = function(x) { if (x > 1) { if (x > 2) { return 3; } 99; } 1 }; f(5)",
                Object::from(3),
            ),
            (
                "let f = function() { return 1; 2 }; f() + 10",
                Object::from(11),
            ),
        ]);
    }

    #[test]
    fn test_error_handling() {
        assert_errors(&[
            ("5 + true;", "type mismatch: INTEGER + BOOLEAN"),
            ("5 + true; 5;", "type mismatch: INTEGER + BOOLEAN"),
            ("-true", "unknown operator: -BOOLEAN"),
            ("-\"a\"", "unknown operator: -STRING"),
            ("true + false;", "unknown operator: BOOLEAN + BOOLEAN"),
            ("100; false + true; 25;", "unknown operator: BOOLEAN + BOOLEAN"),
            (
                "if (10 > 1) { true + false; }",
                "unknown operator: BOOLEAN + BOOLEAN",
            ),
            (
                "if (10 > 1) { if (10 > 1) { return true + false; } return 1; }",
                "unknown operator: BOOLEAN + BOOLEAN",
            ),
            ("foobar", "identifier not found: foobar"),
            ("x + y", "identifier not found: x"),
            ("1 + y", "identifier not found: y"),
            ("\"a\" - \"b\"", "unknown operator: STRING - STRING"),
            ("\"a\" + 1", "type mismatch: STRING + INTEGER"),
            ("5(1)", "not a function: INTEGER"),
            ("5(missing)", "not a function: INTEGER"),
            ("10 / 0", "division by zero"),
            ("let f = function(x) { x }; f(1, nope)", "identifier not found: nope"),
            ("if (nope) { 1 }", "identifier not found: nope"),
            ("!nope", "identifier not found: nope"),
        ]);
    }

    #[test]
    fn test_error_stops_following_statements() {
        let env = Environment::new_shared();
        let res = eval_with("let a = 1; false + true; let a = 2;", &env);

        assert_eq!(
            res,
            Some(Object::Error(String::from(
                "unknown operator: BOOLEAN + BOOLEAN"
            )))
        );
        assert_eq!(env.borrow().get("a"), Some(Object::from(1)));
    }

    #[test]
    fn test_let_statements() {
        assert_all(&[
            ("let a = 5; a;", Object::from(5)),
            ("let a = 5 * 5; a;", Object::from(25)),
            ("let a = 5; let b = a; b;", Object::from(5)),
            (
                "let a = 5; let b = a; let c = a + b + 5; c;",
                Object::from(15),
            ),
        ]);

        assert_eq!(eval_with("let x = 1;", &Environment::new_shared()), None);
        assert_eq!(eval_with("", &Environment::new_shared()), None);
    }

    #[test]
    fn test_failed_let_does_not_bind() {
        let env = Environment::new_shared();
        let res = eval_with("let a = b;", &env);

        assert_eq!(
            res,
            Some(Object::Error(String::from("identifier not found: b")))
        );
        assert_eq!(env.borrow().get("a"), None);
    }

    #[test]
    fn test_function_object() {
        match eval_src("function(x) { x + 2; };") {
            Object::Function(function) => {
                assert_eq!(function.parameters.len(), 1);
                assert_eq!(function.parameters[0].name, "x");
                assert_eq!(function.body.to_string(), "{ (x + 2) }");
            }
            other => panic!("expected a function, got {:?}", other),
        }
    }

    #[test]
    fn test_function_application() {
        assert_all(&[
            ("let identity = function(x) { x; }; identity(5);", Object::from(5)),
            (
                "let identity = function(x) { return x; }; identity(5);",
                Object::from(5),
            ),
            (
                "let double = function(x) { x * 2; }; double(5);",
                Object::from(10),
            ),
            ("let add = function(x, y) { x + y; }; add(5, 5);", Object::from(10)),
            (
                "let add = function(x, y) { x + y; }; add(5 + 5, add(5, 5));",
                Object::from(20),
            ),
            ("function(x) { x; }(5)", Object::from(5)),
            ("let f = function() { 1; 2 }; f()", Object::from(2)),
            ("let f = function() { }; f()", NULL),
            ("let f = function() { let y = 1; }; f()", NULL),
        ]);
    }

    #[test]
    fn test_closures() {
        assert_all(&[
            (
                "let newAdder = function(x) { return function(y) { return y + x; } }; \
                 let addTwo = newAdder(2); addTwo(2);",
                Object::from(4),
            ),
            // the captured scope is live, a later `let` in it is visible
            (
                "let x = 1; let f = function() { x }; let x = 2; f()",
                Object::from(2),
            ),
            // a binding inside the function body shadows instead of overwriting
            (
                "let x = 1; let f = function() { let x = 2; x }; f(); x",
                Object::from(1),
            ),
            (
                "let fib = function(n) { if (n < 2) { return n; } fib(n - 1) + fib(n - 2) }; fib(15)",
                Object::from(610),
            ),
        ]);
    }

    #[test]
    fn test_callee_scope_is_not_caller_scope() {
        assert_errors(&[(
            "let f = function() { y }; let g = function(y) { f() }; g(1)",
            "identifier not found: y",
        )]);
    }

    // Arity is deliberately not validated
    #[test]
    fn test_lenient_arity() {
        assert_errors(&[(
            "let f = function(x) { x }; f()",
            "identifier not found: x",
        )]);
        assert_all(&[("let f = function(x) { x }; f(1, 2)", Object::from(1))]);
    }

    #[test]
    fn test_environment_survives_between_programs() {
        let env = Environment::new_shared();
        eval_with("let counter = 41;", &env);
        eval_with("let bump = function(n) { n + 1 };", &env);

        assert_eq!(eval_with("bump(counter)", &env), Some(Object::from(42)));
    }

    #[test]
    fn test_call_depth_limit() {
        let src = "let f = function(n) { f(n + 1) }; f(0)";

        assert_eq!(
            eval_src(src),
            Object::Error("stack overflow: maximum call depth of 128 exceeded".into())
        );
    }

    #[test]
    fn test_deep_prefix_nesting() {
        let negated = format!("{}5", "-".repeat(100));
        let inverted = format!("{}true", "!".repeat(101));

        assert_eq!(eval_src(&negated), Object::from(5));
        assert_eq!(eval_src(&inverted), Object::from(false));
    }

    #[test]
    fn test_evaluator_restores_scope() {
        let env = Environment::new_shared();
        let mut scanner = Scanner::new();
        let (program, _) = Parser::parse(scanner.scan_tokens(
            "let f = function(a) { let inner = a; inner }; f(3)",
        ));

        let mut evaluator = Evaluator::new(env.clone());
        assert_eq!(evaluator.eval_program(&program), Some(Object::from(3)));
        assert!(std::rc::Rc::ptr_eq(evaluator.env(), &env));
        assert_eq!(env.borrow().get("inner"), None);
    }
}
