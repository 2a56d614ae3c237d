/*!
Tensorlang unit testing library

This is a crate for writing table driven tests for code that uses Tensorlang.
Each test parses some input in a fresh [`Session`] and checks the outcome.

## Test types

### Definition tests

Run using [`run_definition_test`].
These tests verify the names a parse defines, in order of first definition.

### Value tests

Run using [`run_value_test`].
These tests verify the values left in the namespace after a parse.
A value is compared through its [Display](std::fmt::Display) form,
    so an array is written as nested lists like `[[1, 0], [0, 1]]`.

### Expression tests

Run using [`run_expression_test`].
These tests verify the result of [`Session::parse_expression`].

### Failure tests

Run using [`run_failure_test`].
These tests verify that a parse fails with a specific [`ErrorKind`].

## The `test_suite` macro

Tests are usually written with the [`test_suite!`] macro:

```
use tensorlang_testing::*;

test_suite![
    options(TestOption::Preamble("% define nosym vU (3)")),
    definition_tests(
        (scalar, "x = 2", ["x"]),
    ),
    value_tests(
        (vector, "v^i = 0", [("vU", "[0, 0, 0]")]),
    ),
    failure_tests(
        (no_basis, r"w_i = \partial_i f", tensorlang::ErrorKind::NoBasis),
    ),
];
```
*/

use tensorlang::{ErrorKind, Session};

pub use tensorlang;

/// Option passed to a test runner.
pub enum TestOption<'a> {
    /// Source parsed in the same session before the test input.
    ///
    /// Preambles are parsed in the order given.
    Preamble(&'a str),

    /// Whether the session retains declarations across parses.
    ///
    /// Overrides previous `Retention` options.
    Retention(bool),

    /// Whether redefinitions are recorded as notices.
    ///
    /// Overrides previous `IgnoreOverride` options.
    IgnoreOverride(bool),
}

struct ResolvedOptions<'a> {
    preambles: Vec<&'a str>,
    retention: bool,
    ignore_override: bool,
}

impl<'a> ResolvedOptions<'a> {
    fn new(options: &[TestOption<'a>]) -> Self {
        let mut resolved = Self {
            preambles: vec![],
            retention: true,
            ignore_override: false,
        };
        for option in options {
            match option {
                TestOption::Preamble(source) => resolved.preambles.push(source),
                TestOption::Retention(retention) => resolved.retention = *retention,
                TestOption::IgnoreOverride(ignore) => resolved.ignore_override = *ignore,
            }
        }
        resolved
    }
}

/// Creates a session configured by the options, with every preamble parsed.
pub fn initialize_session(options: &[TestOption]) -> Session {
    let options = ResolvedOptions::new(options);
    let mut session = Session::new();
    session.set_retention(options.retention);
    session.ignore_override(options.ignore_override);
    for preamble in options.preambles {
        if let Err(err) = session.parse(preamble) {
            panic!("failed to parse the preamble:\n{err}");
        }
    }
    session
}

fn parse(session: &mut Session, input: &str) -> Vec<String> {
    match session.parse(input) {
        Ok(defined) => defined,
        Err(err) => panic!("parse failed:\n{err}"),
    }
}

/// Run a definition test.
///
/// The test passes if parsing the input defines exactly the given names, in
/// order.
pub fn run_definition_test(input: &str, want: &[&str], options: &[TestOption]) {
    let mut session = initialize_session(options);
    let got = parse(&mut session, input);
    similar_asserts::assert_eq!(got, want);
}

/// Run a value test.
///
/// The test passes if, after parsing the input, each given symbol is bound to
/// a value that displays as the given string.
pub fn run_value_test(input: &str, want: &[(&str, &str)], options: &[TestOption]) {
    let mut session = initialize_session(options);
    parse(&mut session, input);
    for (symbol, want) in want {
        let Some(value) = session.get(symbol) else {
            panic!(
                "symbol '{symbol}' is not defined; defined symbols are {:?}",
                session.symbols()
            );
        };
        similar_asserts::assert_eq!(value.to_string(), *want, "value of '{}'", symbol);
    }
}

/// Run an expression test.
///
/// The test passes if the input parses as an expression that displays as the
/// given string.
pub fn run_expression_test(input: &str, want: &str, options: &[TestOption]) {
    let mut session = initialize_session(options);
    match session.parse_expression(input) {
        Ok(got) => similar_asserts::assert_eq!(got.to_string(), want),
        Err(err) => panic!("expression failed to parse:\n{err}"),
    }
}

/// Run a failure test.
///
/// The test passes if parsing the input fails with the given error kind.
pub fn run_failure_test(input: &str, want: &ErrorKind, options: &[TestOption]) {
    let mut session = initialize_session(options);
    match session.parse(input) {
        Ok(defined) => {
            println!("Parse succeeded and defined {defined:?}");
            panic!("Failure test did not pass: parse successful");
        }
        Err(err) => {
            println!("{err}");
            similar_asserts::assert_eq!(err.kind(), want);
        }
    }
}

/// Macro to generate a suite of unit tests
///
/// The general use of this macro looks like this:
/// ```ignore
/// test_suite![
///     options(TestOption::Preamble("% define nosym vU (3)")),
///     definition_tests(
///         (definition_test_1, "input_1", ["name_1", "name_2"]),
///     ),
///     value_tests(
///         (value_test_1, "input_1", [("symbol", "value")]),
///     ),
///     expression_tests(
///         (expression_test_1, "input_1", "expression"),
///     ),
///     failure_tests(
///         (failure_test_1, "input_1", ErrorKind::NoBasis),
///     ),
/// ];
/// ```
///
/// The `options` argument can be omitted,
///     in which case every test runs in a default session.
/// Each section may be given any number of times and in any order.
#[macro_export]
macro_rules! test_suite {
    ( options $options: tt, definition_tests ( $( ($name: ident, $input: expr, [ $( $want: expr ),* $(,)? ] $(,)? ) ),* $(,)? ) $(,)? ) => (
        $(
            #[test]
            fn $name() {
                let input = $input;
                let options = vec! $options;
                let want: Vec<&str> = vec![ $( $want ),* ];
                $crate::run_definition_test(&input, &want, &options);
            }
        )*
    );
    ( options $options: tt, value_tests ( $( ($name: ident, $input: expr, [ $( ($symbol: expr, $want: expr) ),* $(,)? ] $(,)? ) ),* $(,)? ) $(,)? ) => (
        $(
            #[test]
            fn $name() {
                let input = $input;
                let options = vec! $options;
                let want: Vec<(&str, &str)> = vec![ $( ($symbol, $want) ),* ];
                $crate::run_value_test(&input, &want, &options);
            }
        )*
    );
    ( options $options: tt, expression_tests ( $( ($name: ident, $input: expr, $want: expr $(,)? ) ),* $(,)? ) $(,)? ) => (
        $(
            #[test]
            fn $name() {
                let input = $input;
                let options = vec! $options;
                $crate::run_expression_test(&input, $want, &options);
            }
        )*
    );
    ( options $options: tt, failure_tests ( $( ($name: ident, $input: expr, $want: expr $(,)? ) ),* $(,)? ) $(,)? ) => (
        $(
            #[test]
            fn $name() {
                let input = $input;
                let options = vec! $options;
                let want: $crate::tensorlang::ErrorKind = $want;
                $crate::run_failure_test(&input, &want, &options);
            }
        )*
    );
    ( options $options: tt, $test_kind: ident $test_cases: tt $(,)? ) => (
        compile_error!("Invalid keyword: test_suite! only accepts the following keywords: `options`, `definition_tests`, `value_tests`, `expression_tests`, `failure_tests`");
    );
    ( options $options: tt, $( $test_kind: ident $test_cases: tt ),+ $(,)? ) => (
        $(
            $crate::test_suite![options $options, $test_kind $test_cases,];
        )+
    );
    ( $( $test_kind: ident $test_cases: tt ),+ $(,)? ) => (
        $crate::test_suite![options (), $( $test_kind $test_cases, )+ ];
    );
}
