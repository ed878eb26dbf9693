pub mod fake_providers;
pub mod test_server;
