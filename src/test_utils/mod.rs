//! Shared test utilities for skillsync.

pub mod fakes;
pub mod fixtures;

/// One row of a table-driven test.
#[derive(Debug, Clone)]
pub struct TestCase<I, E> {
    pub name: &'static str,
    pub input: I,
    pub expected: E,
}

/// Run every case and report all mismatches together.
///
/// Panics inside `test_fn` are not caught; they fail the calling test as usual.
pub fn run_table_tests<I, E, F>(cases: Vec<TestCase<I, E>>, test_fn: F) -> Result<(), String>
where
    I: std::fmt::Debug,
    E: std::fmt::Debug + PartialEq,
    F: Fn(I) -> E,
{
    let mut failures = Vec::new();
    for TestCase {
        name,
        input,
        expected,
    } in cases
    {
        println!("[TEST] {name}: {input:?}");
        let actual = test_fn(input);
        if actual == expected {
            println!("[TEST] PASSED: {name}");
        } else {
            failures.push(format!("{name}: expected {expected:?}, got {actual:?}"));
        }
    }
    if failures.is_empty() {
        Ok(())
    } else {
        Err(failures.join("\n"))
    }
}
