mod credential_tests;
mod state_tests;
mod viewport_tests;
