pub mod account;
pub mod catalog;
pub mod confirmation;
pub mod content;
pub mod jwt;
pub mod mail;
pub mod rating;
pub mod title;
