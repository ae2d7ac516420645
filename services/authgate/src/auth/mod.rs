pub mod access;
pub mod accounts;
pub mod bearer;
pub mod gate;
pub mod login_id;
pub mod password;
pub mod revocation;
pub mod session;
