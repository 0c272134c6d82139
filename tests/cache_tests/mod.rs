mod engine_cache_test;
