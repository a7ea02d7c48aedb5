//! Routes for signed-in store admins. Every route here sits behind
//! [`admins_authorization`](crate::core::middleware::admins_authorization).

pub mod orders;
