pub mod dispatch;
pub mod keygen;
pub mod sign;
pub mod status;
pub mod thumbprint;
pub mod validate;

pub use dispatch::dispatch;
