pub mod assignment;
pub mod db;
pub mod score;
pub mod take;
pub mod test;
pub mod token;
