pub mod connections;
pub mod store;

#[cfg(test)]
pub mod testing;
