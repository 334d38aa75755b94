//! Integration tests for keiba-racecard
//!
//! These tests use wiremock to stand in for the race site and run the plain
//! HTTP tier and the orchestrator end-to-end.

mod scrape_tests;
