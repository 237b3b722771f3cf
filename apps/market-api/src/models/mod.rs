pub mod need;
pub mod offer;
pub mod order;
pub mod seller;
