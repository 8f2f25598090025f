mod cleanup_tests;
pub(crate) mod mocks;
