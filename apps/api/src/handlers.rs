pub mod access;
pub mod admin;
pub mod health;

#[cfg(test)]
mod test_support;
