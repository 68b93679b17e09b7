mod engine_tests;
mod mcp_tests;
