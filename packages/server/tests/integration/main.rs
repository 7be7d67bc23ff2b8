mod common;

mod titles;
mod users;
