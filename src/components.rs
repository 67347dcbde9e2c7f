pub mod disambiguate;
pub mod extract;
pub mod proposals;
pub mod summarize;
pub mod text2cypher;
