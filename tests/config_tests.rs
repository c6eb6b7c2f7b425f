use chunkdrop::config::Config;
use std::env;

// helper to clear env vars
fn clear_env() {
    env::remove_var("STAGING_DIR");
    env::remove_var("HOST");
    env::remove_var("PORT");
    env::remove_var("MAX_CHUNK_SIZE");
    env::remove_var("WORKER_THREADS");
}

#[test]
fn test_config_behavior() {
    // Run these sequentially to avoid race conditions with environment variables

    // 1. Test Defaults
    clear_env();

    let config = Config::from_env();

    assert_eq!(config.staging_dir.to_str().unwrap(), "./uploads");
    assert_eq!(config.host, "127.0.0.1");
    assert_eq!(config.port, 3000);
    assert_eq!(config.max_chunk_size, 512 * 1024 * 1024);
    assert_eq!(config.worker_threads, 8);

    // 2. Test From Env
    clear_env();

    env::set_var("STAGING_DIR", "/tmp/test_uploads");
    env::set_var("PORT", "9090");
    env::set_var("MAX_CHUNK_SIZE", "1048576");
    env::set_var("WORKER_THREADS", "4");

    let config = Config::from_env();

    assert_eq!(config.staging_dir.to_str().unwrap(), "/tmp/test_uploads");
    assert_eq!(config.port, 9090);
    assert_eq!(config.max_chunk_size, 1_048_576);
    assert_eq!(config.worker_threads, 4);

    // 3. Unparsable values fall back to defaults
    clear_env();
    env::set_var("PORT", "not-a-port");

    let config = Config::from_env();
    assert_eq!(config.port, 3000);

    // Cleanup
    clear_env();
}
