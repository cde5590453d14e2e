//! Unit tests for the command module.

mod outcome;
