pub mod check;
pub mod export;
pub mod find;
pub mod url;
