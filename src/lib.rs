pub mod domain;
pub mod infra;
pub mod run;
pub mod util;
