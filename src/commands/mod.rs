pub mod compile;
pub mod exec;
pub mod run;
