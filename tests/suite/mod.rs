#[cfg(unix)]
mod check;
#[cfg(unix)]
mod compile;
mod config;
mod serve;
mod symbols;
