/// Unit tests over the public domain, ranking and configuration API
mod config_tests;
mod domain_tests;
mod rank_tests;
