//! Tests for server module
//!
//! This module contains all tests for the server components.

#[cfg(test)]
mod tests {
    use crate::server::builder::ServerBuilder;
    use crate::server::server::HttpServer;

    #[test]
    fn test_server_builder() {
        let _builder = ServerBuilder::new();
        // ServerBuilder exists and can be instantiated
    }

    #[test]
    fn test_app_state_creation() {
        // Basic test to ensure module compiles
        // HttpServer requires config, so we just test that the type exists
        assert_eq!(
            std::mem::size_of::<HttpServer>(),
            std::mem::size_of::<HttpServer>()
        );
    }
}
