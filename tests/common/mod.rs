pub use reasonloop_test_utils::init_tracing;
