//! Black-box tests for the assembled gateway live in `tests/`.
