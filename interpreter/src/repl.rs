use std::io::{BufRead, Write};

use beaver_core::Scanner;
use log::debug;

use crate::env::{Env, Environment};
use crate::error::{Error, ParseError, ShellResult};
use crate::evaluator::eval;
use crate::object::Object;
use crate::parser::Parser;

pub const PROMPT: &str = "beaver>> ";

const BEAVER: &str = r"
     __________
    /  _    _  \
  _/   _    _   \_
 |_|  | |  | |  |_|
  \   |_|  |_|   /
   |      _     |
   |    | | |   |
   |____________|

";

#[derive(Debug)]
pub enum Outcome {
    Value(Object),
    Nothing,
    ParseErrors(Vec<ParseError>),
}

/// Lexes, parses and evaluates `src` against `env`. The program only runs when it parsed
/// without diagnostics.
pub fn interpret(src: &str, env: &Env, trace_parser: bool) -> ShellResult<Outcome> {
    let mut scanner = Scanner::new();
    let mut stream = scanner.scan_tokens(src);

    let (program, errors) = {
        let mut parser = if trace_parser {
            Parser::with_tracing(stream.by_ref())
        } else {
            Parser::new(stream.by_ref())
        };
        let program = parser.parse_program();
        (program, parser.errors().to_vec())
    };

    if let Some(err) = stream.error() {
        return Err(Error::from(err.clone()));
    }

    if !errors.is_empty() {
        debug!("{} parse error(s), skipping evaluation", errors.len());
        return Ok(Outcome::ParseErrors(errors));
    }

    Ok(match eval(&program, env) {
        Some(obj) => Outcome::Value(obj),
        None => Outcome::Nothing,
    })
}

/// Runs a whole program, printing its final value or its diagnostics to `out`.
pub fn run_source<W: Write>(
    src: &str,
    env: &Env,
    out: &mut W,
    trace_parser: bool,
) -> ShellResult<()> {
    report(out, interpret(src, env, trace_parser), false)
}

fn report<W: Write>(out: &mut W, outcome: ShellResult<Outcome>, banner: bool) -> ShellResult<()> {
    match outcome {
        Ok(Outcome::Value(obj)) => writeln!(out, "{}", obj)?,
        Ok(Outcome::Nothing) => {}
        Ok(Outcome::ParseErrors(errors)) => print_parse_errors(out, &errors, banner)?,
        Err(err @ Error::ScannerError { .. }) => writeln!(out, "{}", err)?,
        Err(err) => return Err(err),
    }
    Ok(())
}

fn print_parse_errors<W: Write>(
    out: &mut W,
    errors: &[ParseError],
    banner: bool,
) -> ShellResult<()> {
    if banner {
        out.write_all(BEAVER.as_bytes())?;
    }

    writeln!(out, "Woops! Something got wrong here:")?;
    for err in errors {
        writeln!(out, "\t{}", err)?;
    }
    Ok(())
}

/// Interactive session. Every line runs against the same environment, so bindings carry over
/// from one line to the next.
pub struct Repl<R, W> {
    input: R,
    output: W,
    env: Env,
    trace_parser: bool,
}

impl<R, W> Repl<R, W>
where
    R: BufRead,
    W: Write,
{
    pub fn new(input: R, output: W) -> Self {
        Repl {
            input,
            output,
            env: Environment::new_shared(),
            trace_parser: false,
        }
    }

    pub fn with_parser_tracing(mut self, enabled: bool) -> Self {
        self.trace_parser = enabled;
        self
    }

    #[cfg(test)]
    fn env(&self) -> &Env {
        &self.env
    }

    pub fn run(&mut self) -> ShellResult<()> {
        let mut line = String::new();

        loop {
            write!(self.output, "{}", PROMPT)?;
            self.output.flush()?;

            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                debug!("end of input, leaving the session");
                writeln!(self.output)?;
                return Ok(());
            }

            let outcome = interpret(&line, &self.env, self.trace_parser);
            report(&mut self.output, outcome, true)?;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use crate::env::Environment;
    use crate::object::Object;
    use crate::repl::{interpret, run_source, Outcome, Repl, PROMPT};

    fn session(input: &str) -> String {
        let mut output = Vec::new();
        Repl::new(Cursor::new(input), &mut output).run().unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_bindings_carry_over_lines() {
        let output = session("let a = 5;\nlet double = function(x) { x * 2 };\ndouble(a)\n");

        assert_eq!(output, format!("{p}{p}{p}10\n{p}\n", p = PROMPT));
    }

    #[test]
    fn test_runtime_error_is_printed() {
        let output = session("missing + 1\n");

        assert_eq!(
            output,
            format!("{p}identifier not found: missing\n{p}\n", p = PROMPT)
        );
    }

    #[test]
    fn test_parse_errors_are_reported() {
        let output = session("let x 5;\n1 + 1\n");

        assert!(output.contains(
            "Woops! Something got wrong here:\n\texpected next token to be =, got INT instead\n"
        ));
        assert!(output.ends_with(&format!("{p}2\n{p}\n", p = PROMPT)));
    }

    #[test]
    fn test_scanner_error_is_reported() {
        let output = session("\"open\n");

        assert_eq!(
            output,
            format!(
                "{p}[line 1] scanner error: unterminated string\n{p}\n",
                p = PROMPT
            )
        );
    }

    #[test]
    fn test_repl_env_is_shared() {
        let mut output = Vec::new();
        let mut repl = Repl::new(Cursor::new("let kept = 3;\n"), &mut output);
        repl.run().unwrap();

        assert_eq!(repl.env().borrow().get("kept"), Some(Object::from(3)));
    }

    #[test]
    fn test_interpret_outcomes() {
        let env = Environment::new_shared();

        assert!(matches!(
            interpret("let x = 2;", &env, false).unwrap(),
            Outcome::Nothing
        ));
        assert!(matches!(
            interpret("x * 21", &env, true).unwrap(),
            Outcome::Value(Object::Integer(42))
        ));
        assert!(matches!(
            interpret("let = 1;", &env, false).unwrap(),
            Outcome::ParseErrors(errors) if errors.len() == 1
        ));
    }

    #[test]
    fn test_run_source_has_no_banner() {
        let mut output = Vec::new();
        run_source("let;", &Environment::new_shared(), &mut output, false).unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "Woops! Something got wrong here:\n\texpected next token to be IDENT, got ; instead\n"
        );
    }
}
