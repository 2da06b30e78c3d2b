mod error_tests;
mod mock_provider;
mod sandbox_tests;
