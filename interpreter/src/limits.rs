// Every language-level call costs several host stack frames, keep well below what a default
// thread stack can take.
pub(crate) const MAX_CALL_DEPTH: usize = 128;

// Nested expressions the parser accepts before giving up with a diagnostic. Left-associative
// chains such as `a + b + c` stay at a constant depth, only brackets, prefixes and nested blocks
// count.
pub(crate) const MAX_NESTING_DEPTH: usize = 128;
