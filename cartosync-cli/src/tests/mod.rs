//! Shared test harness modules for the cartosync CLI.

use super::*;

mod diff_steps;
mod helpers;
